//! FHIR-aligned slot wire models.
//!
//! A slot is a bookable time window. Only `free` slots may be booked; every other status is
//! carried through verbatim so it can be shown and compared.

use crate::{check_resource_type, from_json_with_path, FhirError};
use appt_types::NonEmptyText;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Availability of a slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    /// Bookable.
    Free,
    /// Any other status (`busy`, `busy-unavailable`, ...), kept as sent by the server.
    Other(String),
}

impl SlotStatus {
    const FREE: &'static str = "free";

    pub fn from_wire(s: &str) -> Self {
        if s == Self::FREE {
            SlotStatus::Free
        } else {
            SlotStatus::Other(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SlotStatus::Free => Self::FREE,
            SlotStatus::Other(s) => s,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, SlotStatus::Free)
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotData {
    pub id: NonEmptyText,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub status: SlotStatus,
}

impl SlotData {
    pub fn is_free(&self) -> bool {
        self.status.is_free()
    }
}

/// Slot resource operations.
pub struct Slot;

impl Slot {
    /// Parse the JSON array returned by the slot listing endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the body is not an array of slots, if any entry has a blank id,
    /// a `resourceType` other than `"Slot"`, or a `start`/`end` that is not an RFC 3339
    /// timestamp.
    pub fn parse_list(json_text: &str) -> Result<Vec<SlotData>, FhirError> {
        let wire: Vec<SlotWire> = from_json_with_path(json_text, "Slot list")?;
        wire.into_iter()
            .enumerate()
            .map(|(index, slot)| {
                wire_to_domain(slot).map_err(|e| match e {
                    FhirError::Translation(msg) => {
                        FhirError::Translation(format!("slot [{index}]: {msg}"))
                    }
                    other => other,
                })
            })
            .collect()
    }

    /// Parse a single slot resource.
    pub fn parse(json_text: &str) -> Result<SlotData, FhirError> {
        let wire: SlotWire = from_json_with_path(json_text, "Slot")?;
        wire_to_domain(wire)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct SlotWire {
    #[serde(rename = "resourceType", default)]
    pub resource_type: Option<String>,

    pub id: String,

    pub start: String,

    pub end: String,

    pub status: String,
}

pub(crate) fn parse_instant(value: &str, field: &str) -> Result<DateTime<FixedOffset>, FhirError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| FhirError::Translation(format!("invalid {field} timestamp '{value}': {e}")))
}

fn wire_to_domain(wire: SlotWire) -> Result<SlotData, FhirError> {
    check_resource_type(wire.resource_type.as_deref(), "Slot")?;

    let id = NonEmptyText::new(&wire.id)
        .map_err(|e| FhirError::Translation(format!("Invalid slot ID: {e}")))?;

    Ok(SlotData {
        id,
        start: parse_instant(&wire.start, "start")?,
        end: parse_instant(&wire.end, "end")?,
        status: SlotStatus::from_wire(&wire.status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slot_listing() {
        let input = r#"[
  {"resourceType": "Slot", "id": "s1", "start": "2024-07-01T09:00:00Z", "end": "2024-07-01T09:30:00Z", "status": "free"},
  {"id": "s2", "start": "2024-07-01T10:00:00+01:00", "end": "2024-07-01T10:30:00+01:00", "status": "busy"}
]"#;

        let slots = Slot::parse_list(input).expect("parse slots");
        assert_eq!(slots.len(), 2);
        assert!(slots[0].is_free());
        assert_eq!(slots[1].status, SlotStatus::Other("busy".into()));
        assert_eq!(slots[1].status.as_str(), "busy");
        assert_eq!(slots[1].start.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn empty_listing_is_valid() {
        assert!(Slot::parse_list("[]").expect("empty list").is_empty());
    }

    #[test]
    fn rejects_unparseable_start() {
        let input = r#"[{"id": "s1", "start": "tomorrow", "end": "2024-07-01T09:30:00Z", "status": "free"}]"#;
        let err = Slot::parse_list(input).expect_err("bad timestamp");
        match err {
            FhirError::Translation(msg) => {
                assert!(msg.contains("slot [0]"), "{msg}");
                assert!(msg.contains("start"), "{msg}");
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn reports_path_of_missing_fields() {
        let input = r#"[{"id": "s1", "start": "2024-07-01T09:00:00Z", "end": "2024-07-01T09:30:00Z"}]"#;
        let err = Slot::parse_list(input).expect_err("missing status");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("status"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_slot_resource() {
        let input = r#"{"resourceType": "Patient", "id": "s1", "start": "2024-07-01T09:00:00Z", "end": "2024-07-01T09:30:00Z", "status": "free"}"#;
        assert!(matches!(Slot::parse(input), Err(FhirError::InvalidInput(_))));
    }
}
