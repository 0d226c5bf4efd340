//! Resolves logical record fields to column positions in a header row.
//!
//! Export headers drift between sources, so resolution is best-effort: each field has an ordered
//! list of candidate names and every candidate goes through `match_header`.

use crate::model::RecordField;

/// Candidate header names for each field, in the order they are tried.
pub(crate) const COLUMN_CANDIDATES: &[(RecordField, &[&str])] = &[
    (RecordField::Client, &["client"]),
    (RecordField::MobileNo, &["mobile no"]),
    (RecordField::BranchOffice, &["branch office"]),
    (RecordField::Dealership, &["dealership"]),
    (RecordField::DisbursedOnDate, &["disbursedon_date", "date"]),
    (RecordField::RegistrationNo, &["registration_no"]),
    (RecordField::ChasisNo, &["chasis_no"]),
    (RecordField::Make, &["make"]),
    (RecordField::Model, &["model"]),
    (RecordField::Type, &["type"]),
    (RecordField::Status, &["status"]),
];

/// Finds the column for `name` among lower-cased `headers`.
///
/// An exact case-insensitive match wins. Otherwise the first header that contains `name`, or is
/// contained in it, is used. Blank headers never match by substring.
pub fn match_header<S: AsRef<str>>(headers: &[S], name: &str) -> Option<usize> {
    let name = name.trim().to_lowercase();
    if let Some(ix) = headers.iter().position(|h| h.as_ref() == name) {
        return Some(ix);
    }
    headers.iter().position(|h| {
        let h = h.as_ref();
        !h.is_empty() && (h.contains(name.as_str()) || name.contains(h))
    })
}

/// The resolved column index of every `RecordField` for one header row.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ColumnMap {
    indices: Vec<(RecordField, Option<usize>)>,
}

impl ColumnMap {
    /// Resolves every field against `headers`, which must already be trimmed and lower-cased.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let indices = COLUMN_CANDIDATES
            .iter()
            .map(|(field, candidates)| {
                let ix = candidates
                    .iter()
                    .find_map(|candidate| match_header(headers, candidate));
                (*field, ix)
            })
            .collect();
        Self { indices }
    }

    pub fn index(&self, field: RecordField) -> Option<usize> {
        self.indices
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, ix)| *ix)
    }

    pub fn fields(&self) -> impl Iterator<Item = (RecordField, Option<usize>)> + '_ {
        self.indices.iter().copied()
    }

    pub fn unresolved(&self) -> Vec<RecordField> {
        self.fields()
            .filter(|(_, ix)| ix.is_none())
            .map(|(field, _)| field)
            .collect()
    }
}
