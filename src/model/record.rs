use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(crate) const UNKNOWN_BRANCH: &str = "Unknown Branch";
pub(crate) const UNKNOWN_DEALERSHIP: &str = "Unknown Dealership";
pub(crate) const UNKNOWN_MODEL: &str = "Unknown Model";

/// One line of a sales-event export.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SaleRecord {
    pub(crate) client: String,
    pub(crate) mobile_no: String,
    /// The town or region office the sale was booked through.
    pub(crate) branch_office: String,
    /// Raw dealership string, often `"Group, Outlet"`.
    pub(crate) dealership: String,
    pub(crate) disbursed_on_date: String,
    pub(crate) registration_no: String,
    pub(crate) chasis_no: String,
    pub(crate) make: String,
    pub(crate) model: String,
    /// Record type or asset category, used to filter records before aggregation.
    #[serde(rename = "type")]
    pub(crate) record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<String>,
}

impl SaleRecord {
    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn mobile_no(&self) -> &str {
        &self.mobile_no
    }

    pub fn branch_office(&self) -> &str {
        &self.branch_office
    }

    pub fn dealership(&self) -> &str {
        &self.dealership
    }

    pub fn disbursed_on_date(&self) -> &str {
        &self.disbursed_on_date
    }

    pub fn registration_no(&self) -> &str {
        &self.registration_no
    }

    pub fn chasis_no(&self) -> &str {
        &self.chasis_no
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Returns the value of `field`. A missing status reads as the empty string.
    pub fn get(&self, field: RecordField) -> &str {
        match field {
            RecordField::Client => &self.client,
            RecordField::MobileNo => &self.mobile_no,
            RecordField::BranchOffice => &self.branch_office,
            RecordField::Dealership => &self.dealership,
            RecordField::DisbursedOnDate => &self.disbursed_on_date,
            RecordField::RegistrationNo => &self.registration_no,
            RecordField::ChasisNo => &self.chasis_no,
            RecordField::Make => &self.make,
            RecordField::Model => &self.model,
            RecordField::Type => &self.record_type,
            RecordField::Status => self.status.as_deref().unwrap_or_default(),
        }
    }

    pub(crate) fn set(&mut self, field: RecordField, value: String) {
        match field {
            RecordField::Client => self.client = value,
            RecordField::MobileNo => self.mobile_no = value,
            RecordField::BranchOffice => self.branch_office = value,
            RecordField::Dealership => self.dealership = value,
            RecordField::DisbursedOnDate => self.disbursed_on_date = value,
            RecordField::RegistrationNo => self.registration_no = value,
            RecordField::ChasisNo => self.chasis_no = value,
            RecordField::Make => self.make = value,
            RecordField::Model => self.model = value,
            RecordField::Type => self.record_type = value,
            RecordField::Status => {
                self.status = if value.is_empty() { None } else { Some(value) }
            }
        }
    }
}

/// The logical fields of a `SaleRecord`.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum RecordField {
    Client,
    MobileNo,
    BranchOffice,
    Dealership,
    DisbursedOnDate,
    RegistrationNo,
    ChasisNo,
    Make,
    Model,
    Type,
    Status,
}

serde_plain::derive_display_from_serialize!(RecordField);
serde_plain::derive_fromstr_from_deserialize!(RecordField);

impl RecordField {
    pub const ALL: [RecordField; 11] = [
        RecordField::Client,
        RecordField::MobileNo,
        RecordField::BranchOffice,
        RecordField::Dealership,
        RecordField::DisbursedOnDate,
        RecordField::RegistrationNo,
        RecordField::ChasisNo,
        RecordField::Make,
        RecordField::Model,
        RecordField::Type,
        RecordField::Status,
    ];

    /// The value substituted when the column is missing or the cell is blank.
    pub(crate) fn placeholder(self) -> &'static str {
        match self {
            RecordField::BranchOffice => UNKNOWN_BRANCH,
            RecordField::Dealership => UNKNOWN_DEALERSHIP,
            RecordField::Model => UNKNOWN_MODEL,
            _ => "",
        }
    }
}
