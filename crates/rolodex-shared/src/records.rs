//! Agency and contact rows loaded from the static CSV exports.
//!
//! Every column is optional; a missing or empty cell becomes an empty
//! string. The loaded rows are an immutable snapshot for the life of the
//! process.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A person attached to an agency or firm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub title: String,
    pub email_type: String,
    pub contact_form_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub agency_id: String,
    pub firm_id: String,
    pub department: String,
}

/// An organisation (school district, agency, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub state: String,
    pub state_code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub population: String,
    pub website: String,
    pub total_schools: String,
    pub total_students: String,
    pub mailing_address: String,
    pub grade_span: String,
    pub locale: String,
    pub csa_cbsa: String,
    pub domain_name: String,
    pub physical_address: String,
    pub phone: String,
    pub status: String,
    pub student_teacher_ratio: String,
    pub supervisory_union: String,
    pub county: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Parse header-keyed CSV rows into `T`.
pub fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, RecordError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut rows = Vec::new();
    for row in csv.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn load_contacts(path: &Path) -> Result<Vec<Contact>, RecordError> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

pub fn load_agencies(path: &Path) -> Result<Vec<Agency>, RecordError> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}
