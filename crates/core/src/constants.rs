//! Constants used throughout the scheduling core.
//!
//! Endpoint paths, user-facing messages and paging parameters live here so the workflows and
//! the binaries agree on them.

use std::time::Duration;

/// Environment variable holding the Appointment API base URL.
pub const API_BASE_URL_ENV: &str = "APPT_API_BASE_URL";

/// Environment variable holding the HTTP request timeout in whole seconds.
pub const HTTP_TIMEOUT_ENV: &str = "APPT_HTTP_TIMEOUT_SECS";

/// Request timeout used when none is configured.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Path (relative to the base URL) of the patient search endpoint.
pub const SEARCH_PATIENTS_PATH: &str = "search-patients";

/// Path (relative to the base URL) of the slot listing endpoint.
pub const SLOTS_PATH: &str = "slots";

/// Path (relative to the base URL) of the booking endpoint.
pub const BOOK_APPOINTMENT_PATH: &str = "book-appointment";

/// Number of slots revealed initially and per "show more".
pub const SLOT_PAGE_SIZE: usize = 5;

/// How long a validation message stays on screen.
pub const VALIDATION_NOTICE_TTL: Duration = Duration::from_secs(3);

pub const EMPTY_CRITERIA_MESSAGE: &str = "Please fill in at least one search criteria.";
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search patients. Please try again.";
pub const SLOTS_FAILED_MESSAGE: &str = "Failed to fetch slots. Please try again.";
pub const BOOKING_FAILED_MESSAGE: &str = "Failed to book appointment. Please try again.";
pub const BOOKING_SUCCESS_MESSAGE: &str = "Appointment successfully booked";

/// Title shown on the landing view.
pub const HOME_TITLE: &str = "Appt. Scheduler";
