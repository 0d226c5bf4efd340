use clap::Parser;
use inflow::args::{Args, Command};
use inflow::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().inflow_home().path();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Ingest(ingest_args) => {
            let config = Config::load(home).await?;
            commands::ingest(config, ingest_args.clone()).await?.print()
        }

        Command::List => commands::list(Config::load(home).await?).await?.print(),

        Command::Show(show_args) => {
            let config = Config::load(home).await?;
            commands::show(config, show_args.clone()).await?.print()
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            commands::delete(config, delete_args.clone()).await?.print()
        }

        Command::Compare(compare_args) => {
            let config = Config::load(home).await?;
            commands::compare(config, compare_args.clone())
                .await?
                .print()
        }

        Command::Timeline(timeline_args) => {
            let config = Config::load(home).await?;
            commands::timeline(config, timeline_args.clone())
                .await?
                .print()
        }

        Command::Explore(explore_args) => {
            let config = Config::load(home).await?;
            commands::explore(config, explore_args.clone())
                .await?
                .print()
        }

        Command::Shares(shares_args) => {
            let config = Config::load(home).await?;
            commands::shares(config, shares_args.clone()).await?.print()
        }

        Command::Digest(digest_args) => {
            let config = Config::load(home).await?;
            commands::digest(config, digest_args.clone()).await?.print()
        }

        Command::Schema => commands::schema()?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => {
            // only this crate's output at the requested level
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
