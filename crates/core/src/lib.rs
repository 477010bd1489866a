//! # Appointment scheduling core
//!
//! Client-side logic for the patient appointment scheduling wizard:
//! - session state shared by the views (found/selected patient, search criteria)
//! - view routing with a one-shot payload from date selection to the slot list
//! - the patient search, date selection and slot list/booking workflows
//! - the [`AppointmentApi`] seam and its HTTP implementation
//!
//! **No presentation concerns**: prompts, terminal output and process setup belong in the
//! binaries. Scheduling rules (conflicts, availability) belong to the remote API.

pub mod api;
pub mod booking;
pub mod config;
pub mod constants;
pub mod date_picker;
pub mod display;
pub mod error;
pub mod navigation;
pub mod notice;
pub mod search;
pub mod session;
pub mod slots;

#[cfg(test)]
mod testing;

pub use api::{AppointmentApi, BookingRequest, HttpAppointmentApi};
pub use booking::{
    ensure_bookable, AppointmentTime, BookingState, Confirmation, SlotAction, SlotsView,
};
pub use config::ClientConfig;
pub use date_picker::DatePicker;
pub use error::{ApiError, ApiResult, Operation, SchedulerError, SchedulerResult};
pub use navigation::{Navigator, Route, SlotsPayload, ViewToken};
pub use search::{PatientSearch, SearchPhase};
pub use session::{CriteriaField, SearchCriteria, SessionHandle, SessionProvider, SessionState};
pub use slots::{PageControl, Pagination, SortDirection, SortKey, SortOrder};

// Re-export shared primitives so callers need only this crate.
pub use appt_types::{CalendarDate, NonEmptyText};
