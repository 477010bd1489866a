//! FHIR wire/boundary support for the appointment scheduling client.
//!
//! This crate provides **wire models** and **translation helpers** for the JSON resources
//! exchanged with the external Appointment API:
//! - `Patient` resources returned by patient search
//! - `Slot` resources returned by the slot listing
//! - `Appointment` resources returned by booking
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the subset of fields the scheduler reads
//! - serialisation/deserialisation with field-path error reporting
//! - translation between domain-level types and wire structs
//!
//! Transport (HTTP) lives in `appt-core`; nothing here performs I/O.

pub mod appointment;
pub mod patient;
pub mod slot;

// Re-export facades
pub use appointment::Appointment;
pub use patient::Patient;
pub use slot::Slot;

// Re-export public domain-level types
pub use appointment::{AppointmentDetails, BookedSlot};
pub use patient::{
    Address, ContactPoint, Identifier, NameUse, Narrative, PatientData, PatientMeta, PatientName,
};
pub use slot::{SlotData, SlotStatus};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialize `json_text` into `T`, reporting the failing field path on schema mismatch.
///
/// `resource` names the resource in the error message (e.g. `"Patient"`).
pub(crate) fn from_json_with_path<T>(json_text: &str, resource: &str) -> FhirResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => {
            deserializer.end()?;
            Ok(parsed)
        }
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(FhirError::Translation(format!(
                "{resource} schema mismatch at {path}: {source}"
            )))
        }
    }
}

/// Check an optional `resourceType` discriminator against the expected value.
///
/// The scheduling API omits `resourceType` on some payloads, so absence is accepted.
pub(crate) fn check_resource_type(found: Option<&str>, expected: &str) -> FhirResult<()> {
    match found {
        Some(found) if found != expected => Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{expected}', got '{found}'"
        ))),
        _ => Ok(()),
    }
}
