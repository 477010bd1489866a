//! FHIR-aligned appointment wire model for booking confirmations.
//!
//! The booking endpoint answers with an `Appointment` resource. The scheduler only reads its id
//! and the referenced slots; the first slot's `start` is the canonical appointment time.

use crate::slot::parse_instant;
use crate::{check_resource_type, from_json_with_path, FhirError};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// A slot as echoed back inside a booked appointment.
///
/// Servers are inconsistent about how much of the slot they echo, so every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookedSlot {
    pub id: Option<String>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

/// Result of a successful booking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentDetails {
    pub id: String,
    pub status: Option<String>,
    pub slots: Vec<BookedSlot>,
}

impl AppointmentDetails {
    /// Start of the first booked slot, if the server sent one.
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.slots.first().and_then(|s| s.start)
    }
}

/// Appointment resource operations.
pub struct Appointment;

impl Appointment {
    /// Parse the booking endpoint's response body.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] on malformed JSON, a `resourceType` other than `"Appointment"`, a
    /// blank id, or a slot timestamp that is present but not RFC 3339.
    pub fn parse(json_text: &str) -> Result<AppointmentDetails, FhirError> {
        let wire: AppointmentWire = from_json_with_path(json_text, "Appointment")?;
        check_resource_type(wire.resource_type.as_deref(), "Appointment")?;

        if wire.id.trim().is_empty() {
            return Err(FhirError::Translation("Invalid appointment ID: empty".into()));
        }

        let slots = wire
            .slot
            .into_iter()
            .map(|s| {
                Ok(BookedSlot {
                    id: s.id,
                    start: s
                        .start
                        .as_deref()
                        .map(|v| parse_instant(v, "start"))
                        .transpose()?,
                    end: s
                        .end
                        .as_deref()
                        .map(|v| parse_instant(v, "end"))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>, FhirError>>()?;

        Ok(AppointmentDetails {
            id: wire.id,
            status: wire.status,
            slots,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AppointmentWire {
    #[serde(rename = "resourceType", default)]
    resource_type: Option<String>,

    id: String,

    #[serde(default)]
    status: Option<String>,

    #[serde(default)]
    slot: Vec<BookedSlotWire>,
}

#[derive(Debug, Deserialize)]
struct BookedSlotWire {
    #[serde(default)]
    id: Option<String>,

    #[serde(default)]
    start: Option<String>,

    #[serde(default)]
    end: Option<String>,
}
