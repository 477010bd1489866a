use crate::constants::{BOOKING_FAILED_MESSAGE, SEARCH_FAILED_MESSAGE, SLOTS_FAILED_MESSAGE};

/// The remote operation a request error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    SearchPatients,
    ListSlots,
    BookAppointment,
}

impl Operation {
    /// The generic message shown to the user when this operation fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::SearchPatients => SEARCH_FAILED_MESSAGE,
            Operation::ListSlots => SLOTS_FAILED_MESSAGE,
            Operation::BookAppointment => BOOKING_FAILED_MESSAGE,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::SearchPatients => "search patients",
            Operation::ListSlots => "list slots",
            Operation::BookAppointment => "book appointment",
        })
    }
}

/// Failures talking to the external Appointment API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode response: {0}")]
    Decode(#[from] fhir::FhirError),
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Client-side input check failed; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("failed to {operation}: {source}")]
    Request {
        operation: Operation,
        #[source]
        source: ApiError,
    },
    /// The slot view was entered without its transition payload.
    #[error("slot view opened without slot data")]
    MissingState,
    #[error("session state used without an active session provider")]
    NoActiveSession,
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SchedulerError {
    pub(crate) fn request(operation: Operation, source: ApiError) -> Self {
        SchedulerError::Request { operation, source }
    }

    /// The text shown to the user for this error.
    ///
    /// Request failures never surface API detail, only the generic per-operation message.
    pub fn user_message(&self) -> String {
        match self {
            SchedulerError::Validation(msg) => msg.clone(),
            SchedulerError::Request { operation, .. } => operation.failure_message().to_string(),
            other => other.to_string(),
        }
    }
}

pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
