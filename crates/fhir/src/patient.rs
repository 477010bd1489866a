//! FHIR-aligned patient wire models and translation helpers.
//!
//! This module provides both domain-level types and wire models for the `Patient` resource
//! returned by the patient search endpoint.
//!
//! Responsibilities:
//! - Define public domain-level types for the workflow layer
//! - Define a wire model for JSON serialisation/deserialisation
//! - Provide translation helpers between domain types and the wire model
//! - Derive the display strings shown on the result card
//!
//! Notes:
//! - The wire model tolerates unknown keys: the resource comes from an external API and may
//!   carry extensions and other fields the scheduler never reads
//! - A patient is immutable once fetched

use crate::{check_resource_type, from_json_with_path, FhirError};
use appt_types::NonEmptyText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Purpose of a human name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameUse {
    /// Official name.
    Official,
    /// Usual/preferred name.
    Usual,
    /// Temporary name.
    Temp,
    /// Nickname or informal name.
    Nickname,
    /// Anonymous name.
    Anonymous,
    /// Old name (no longer in use).
    Old,
    /// Maiden name.
    Maiden,
}

impl NameUse {
    /// Convert to FHIR wire format string.
    fn to_wire(self) -> &'static str {
        match self {
            NameUse::Official => "official",
            NameUse::Usual => "usual",
            NameUse::Temp => "temp",
            NameUse::Nickname => "nickname",
            NameUse::Anonymous => "anonymous",
            NameUse::Old => "old",
            NameUse::Maiden => "maiden",
        }
    }

    /// Parse from FHIR wire format string.
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "official" => Some(NameUse::Official),
            "usual" => Some(NameUse::Usual),
            "temp" => Some(NameUse::Temp),
            "nickname" => Some(NameUse::Nickname),
            "anonymous" => Some(NameUse::Anonymous),
            "old" => Some(NameUse::Old),
            "maiden" => Some(NameUse::Maiden),
            _ => None,
        }
    }
}

/// A human name entry (`Patient.name[]`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientName {
    pub use_type: Option<NameUse>,
    pub text: Option<String>,
    pub family: Option<String>,
    pub given: Vec<String>,
}

/// A business identifier (`Patient.identifier[]`), e.g. a medical record number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identifier {
    pub use_type: Option<String>,
    pub type_text: Option<String>,
    pub system: Option<String>,
    pub value: Option<String>,
}

/// A contact detail (`Patient.telecom[]`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactPoint {
    /// `phone`, `email`, ...
    pub system: Option<String>,
    pub value: Option<String>,
}

/// A postal address (`Patient.address[]`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub use_type: Option<String>,
    pub line: Vec<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Resource metadata (`Patient.meta`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientMeta {
    pub version_id: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

/// Human-readable summary (`Patient.text`). `div` is XHTML and is carried, never rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Narrative {
    pub status: Option<String>,
    pub div: Option<String>,
}

/// Domain-level carrier for a patient returned by search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientData {
    /// Server-assigned logical id; this is what gets sent as `patientId` when booking.
    pub id: NonEmptyText,

    pub names: Vec<PatientName>,

    pub identifiers: Vec<Identifier>,

    pub telecom: Vec<ContactPoint>,

    pub gender: Option<String>,

    /// Date of birth as sent by the server (ISO 8601, usually `YYYY-MM-DD`).
    pub birth_date: Option<String>,

    pub addresses: Vec<Address>,

    pub meta: Option<PatientMeta>,

    pub narrative: Option<Narrative>,
}

impl PatientData {
    /// The first name entry, which the scheduler treats as the primary name.
    pub fn primary_name(&self) -> Option<&PatientName> {
        self.names.first()
    }

    /// Given names joined by a space, followed by the family name.
    ///
    /// Falls back to the name's free-text form and finally to the patient id, so there is always
    /// something to show.
    pub fn display_name(&self) -> String {
        let Some(name) = self.primary_name() else {
            return self.id.to_string();
        };

        let mut parts: Vec<&str> = name.given.iter().map(String::as_str).collect();
        if let Some(family) = name.family.as_deref() {
            parts.push(family);
        }
        let joined = parts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !joined.is_empty() {
            joined
        } else if let Some(text) = name.text.as_deref().filter(|t| !t.trim().is_empty()) {
            text.to_string()
        } else {
            self.id.to_string()
        }
    }

    /// All telecom values joined with `", "`.
    pub fn contact_summary(&self) -> String {
        self.telecom
            .iter()
            .filter_map(|t| t.value.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The first address as `line1, line2, city, state, country`, skipping missing parts.
    pub fn address_summary(&self) -> Option<String> {
        let address = self.addresses.first()?;
        let parts: Vec<&str> = address
            .line
            .iter()
            .map(String::as_str)
            .chain(address.city.as_deref())
            .chain(address.state.as_deref())
            .chain(address.country.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
pub struct Patient;

impl Patient {
    /// Parse a patient resource from JSON text.
    ///
    /// Schema mismatches are reported with the path of the failing field (e.g. `name[0].given`).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a patient resource,
    /// - any known field has an unexpected type,
    /// - `resourceType` is present and not `"Patient"`,
    /// - `id` is blank.
    pub fn parse(json_text: &str) -> Result<PatientData, FhirError> {
        let wire: PatientWire = from_json_with_path(json_text, "Patient")?;
        check_resource_type(wire.resource_type.as_deref(), "Patient")?;
        wire_to_domain(wire)
    }

    /// Render a patient resource as pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render(data: &PatientData) -> Result<String, FhirError> {
        let wire = domain_to_wire(data);
        serde_json::to_string_pretty(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct PatientWire {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PatientMetaWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<NarrativeWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<FullNameWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<AddressWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct PatientMetaWire {
    #[serde(rename = "versionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct NarrativeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub div: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct IdentifierTypeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct IdentifierWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<IdentifierTypeWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct FullNameWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ContactPointWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct AddressWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(rename = "postalCode", default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: PatientWire) -> Result<PatientData, FhirError> {
    let id = NonEmptyText::new(&wire.id)
        .map_err(|e| FhirError::Translation(format!("Invalid patient ID: {e}")))?;

    let names = wire
        .name
        .into_iter()
        .map(|n| PatientName {
            use_type: n.use_type.as_deref().and_then(NameUse::from_wire),
            text: n.text,
            family: n.family,
            given: n.given,
        })
        .collect();

    let identifiers = wire
        .identifier
        .into_iter()
        .map(|i| Identifier {
            use_type: i.use_type,
            type_text: i.type_.and_then(|t| t.text),
            system: i.system,
            value: i.value,
        })
        .collect();

    let telecom = wire
        .telecom
        .into_iter()
        .map(|t| ContactPoint {
            system: t.system,
            value: t.value,
        })
        .collect();

    let addresses = wire
        .address
        .into_iter()
        .map(|a| Address {
            use_type: a.use_type,
            line: a.line,
            city: a.city,
            district: a.district,
            state: a.state,
            postal_code: a.postal_code,
            country: a.country,
        })
        .collect();

    // An unparseable lastUpdated is dropped rather than failing the whole search.
    let meta = wire.meta.map(|m| PatientMeta {
        version_id: m.version_id,
        last_updated: m
            .last_updated
            .as_deref()
            .and_then(|s| s.parse::<DateTime<Utc>>().ok()),
        source: m.source,
    });

    Ok(PatientData {
        id,
        names,
        identifiers,
        telecom,
        gender: wire.gender,
        birth_date: wire.birth_date,
        addresses,
        meta,
        narrative: wire.text.map(|t| Narrative {
            status: t.status,
            div: t.div,
        }),
    })
}

fn domain_to_wire(data: &PatientData) -> PatientWire {
    PatientWire {
        resource_type: Some("Patient".to_string()),
        id: data.id.to_string(),
        meta: data.meta.as_ref().map(|m| PatientMetaWire {
            version_id: m.version_id.clone(),
            last_updated: m.last_updated.map(|dt| dt.to_rfc3339()),
            source: m.source.clone(),
        }),
        text: data.narrative.as_ref().map(|n| NarrativeWire {
            status: n.status.clone(),
            div: n.div.clone(),
        }),
        identifier: data
            .identifiers
            .iter()
            .map(|i| IdentifierWire {
                use_type: i.use_type.clone(),
                type_: i
                    .type_text
                    .clone()
                    .map(|text| IdentifierTypeWire { text: Some(text) }),
                system: i.system.clone(),
                value: i.value.clone(),
            })
            .collect(),
        name: data
            .names
            .iter()
            .map(|n| FullNameWire {
                use_type: n.use_type.map(|u| u.to_wire().to_string()),
                text: n.text.clone(),
                family: n.family.clone(),
                given: n.given.clone(),
            })
            .collect(),
        telecom: data
            .telecom
            .iter()
            .map(|t| ContactPointWire {
                system: t.system.clone(),
                value: t.value.clone(),
            })
            .collect(),
        gender: data.gender.clone(),
        birth_date: data.birth_date.clone(),
        address: data
            .addresses
            .iter()
            .map(|a| AddressWire {
                use_type: a.use_type.clone(),
                line: a.line.clone(),
                city: a.city.clone(),
                district: a.district.clone(),
                state: a.state.clone(),
                postal_code: a.postal_code.clone(),
                country: a.country.clone(),
            })
            .collect(),
    }
}
