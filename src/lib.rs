pub mod aggregate;
pub mod args;
pub mod commands;
mod config;
mod db;
pub mod digest;
mod error;
pub mod explore;
pub mod model;
pub mod parse;
pub mod store;
pub mod trend;
mod utils;


pub use config::Config;
pub use error::Error;
pub use error::Result;
