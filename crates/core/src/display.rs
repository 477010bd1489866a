//! Text rendering shared by the binaries.

use chrono::{DateTime, FixedOffset};
use fhir::{PatientData, SlotData};

/// `2024-07-01 09:00 +00:00`: the instant in the offset the server sent.
pub fn format_instant(instant: &DateTime<FixedOffset>) -> String {
    instant.format("%Y-%m-%d %H:%M %:z").to_string()
}

/// One line of the slot list.
pub fn slot_line(slot: &SlotData) -> String {
    format!(
        "Start: {} - End: {}",
        format_instant(&slot.start),
        format_instant(&slot.end)
    )
}

/// The lines of the "Patient Found" card.
pub fn patient_card(patient: &PatientData) -> Vec<String> {
    let mut lines = vec![
        format!("Name: {}", patient.display_name()),
        format!("DOB: {}", patient.birth_date.as_deref().unwrap_or("-")),
    ];
    let contact = patient.contact_summary();
    lines.push(format!(
        "Contact: {}",
        if contact.is_empty() { "-" } else { contact.as_str() }
    ));
    lines.push(format!(
        "Address: {}",
        patient.address_summary().as_deref().unwrap_or("-")
    ));
    lines
}
