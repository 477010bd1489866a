//! Shared session state.
//!
//! One [`SessionProvider`] exists per session (one run of the wizard). It owns the state and
//! hands out [`SessionHandle`]s to the workflows. A handle never keeps the state alive on its
//! own: once the provider is dropped, every handle fails with
//! [`SchedulerError::NoActiveSession`] instead of quietly returning defaults.
//!
//! The store is a plain value holder. Each field has a single writing workflow:
//! - `search_criteria` and `found_patient`: patient search
//! - `selected_patient`: patient search, on "proceed"

use crate::error::{SchedulerError, SchedulerResult};
use fhir::PatientData;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Patient search form input, sent verbatim as the search request body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchCriteria {
    pub firstname: String,
    pub lastname: String,
    /// Date of birth as typed (`YYYY-MM-DD` from a date input).
    pub dob: String,
    pub phone: String,
}

/// One field of [`SearchCriteria`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CriteriaField {
    Firstname,
    Lastname,
    Dob,
    Phone,
}

impl CriteriaField {
    pub const ALL: [CriteriaField; 4] = [
        CriteriaField::Firstname,
        CriteriaField::Lastname,
        CriteriaField::Dob,
        CriteriaField::Phone,
    ];

    /// Form label for the field.
    pub fn label(self) -> &'static str {
        match self {
            CriteriaField::Firstname => "First Name",
            CriteriaField::Lastname => "Last Name",
            CriteriaField::Dob => "Date of Birth",
            CriteriaField::Phone => "Phone",
        }
    }
}

impl SearchCriteria {
    pub fn get(&self, field: CriteriaField) -> &str {
        match field {
            CriteriaField::Firstname => &self.firstname,
            CriteriaField::Lastname => &self.lastname,
            CriteriaField::Dob => &self.dob,
            CriteriaField::Phone => &self.phone,
        }
    }

    pub fn set(&mut self, field: CriteriaField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CriteriaField::Firstname => self.firstname = value,
            CriteriaField::Lastname => self.lastname = value,
            CriteriaField::Dob => self.dob = value,
            CriteriaField::Phone => self.phone = value,
        }
    }

    /// True when at least one field has non-whitespace content.
    pub fn is_submittable(&self) -> bool {
        CriteriaField::ALL
            .iter()
            .any(|&field| !self.get(field).trim().is_empty())
    }
}

/// The values held for the lifetime of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub found_patient: Option<PatientData>,
    pub selected_patient: Option<PatientData>,
    pub search_criteria: SearchCriteria,
}

/// Owner of the session state. Dropping it ends the session.
#[derive(Debug)]
pub struct SessionProvider {
    state: Arc<RwLock<SessionState>>,
}

impl SessionProvider {
    /// Start a session with initial values: no patients, empty criteria.
    pub fn start() -> Self {
        tracing::debug!("session started");
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    /// Restore initial values without ending the session.
    pub fn reset(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = SessionState::default();
        tracing::debug!("session reset");
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        tracing::debug!("session ended");
    }
}

/// Cheap, cloneable access to the session state.
///
/// `SessionHandle::default()` is a handle that was never attached to a provider; every access
/// through it fails.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
    state: Weak<RwLock<SessionState>>,
}

impl SessionHandle {
    fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> SchedulerResult<R> {
        let state = self.state.upgrade().ok_or(SchedulerError::NoActiveSession)?;
        let guard = state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&guard))
    }

    fn with_state_mut<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> SchedulerResult<R> {
        let state = self.state.upgrade().ok_or(SchedulerError::NoActiveSession)?;
        let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut guard))
    }

    /// Whether the owning provider is still alive.
    pub fn is_active(&self) -> bool {
        self.state.strong_count() > 0
    }

    pub fn snapshot(&self) -> SchedulerResult<SessionState> {
        self.with_state(SessionState::clone)
    }

    pub fn found_patient(&self) -> SchedulerResult<Option<PatientData>> {
        self.with_state(|s| s.found_patient.clone())
    }

    pub fn selected_patient(&self) -> SchedulerResult<Option<PatientData>> {
        self.with_state(|s| s.selected_patient.clone())
    }

    pub fn search_criteria(&self) -> SchedulerResult<SearchCriteria> {
        self.with_state(|s| s.search_criteria.clone())
    }

    pub fn set_found_patient(&self, patient: Option<PatientData>) -> SchedulerResult<()> {
        self.with_state_mut(|s| s.found_patient = patient)
    }

    pub fn set_selected_patient(&self, patient: Option<PatientData>) -> SchedulerResult<()> {
        self.with_state_mut(|s| s.selected_patient = patient)
    }

    pub fn update_search_criteria(
        &self,
        field: CriteriaField,
        value: impl Into<String>,
    ) -> SchedulerResult<()> {
        let value = value.into();
        self.with_state_mut(|s| s.search_criteria.set(field, value))
    }
}
