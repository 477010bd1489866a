//! View routing and one-shot transition payloads.
//!
//! The navigator tracks which view is current and carries the only payload that travels
//! between views outside the session store: the slot list and date handed from date
//! selection to the slot view. That payload is consumed at most once and is discarded by any
//! further navigation.
//!
//! Every navigation bumps a generation counter. Workflows capture a [`ViewToken`] when they
//! issue a request and compare it when the response arrives, so a late response for a view
//! the user has already left is dropped.

use appt_types::CalendarDate;
use fhir::SlotData;

/// The four views of the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    PatientSearch,
    DatePicker,
    Slots,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::PatientSearch => "/patient-search",
            Route::DatePicker => "/date-picker",
            Route::Slots => "/slots",
        }
    }

    /// Resolve a path; anything unknown lands on the home view.
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/patient-search" => Route::PatientSearch,
            "/date-picker" => Route::DatePicker,
            "/slots" => Route::Slots,
            _ => Route::Home,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Slot list and date handed from date selection to the slot view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotsPayload {
    pub slots: Vec<SlotData>,
    pub date: CalendarDate,
}

/// Identifies one visit to a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewToken {
    route: Route,
    generation: u64,
}

impl ViewToken {
    pub fn route(&self) -> Route {
        self.route
    }
}

#[derive(Debug)]
pub struct Navigator {
    current: Route,
    generation: u64,
    payload: Option<SlotsPayload>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// A navigator on the home view.
    pub fn new() -> Self {
        Self::at(Route::Home)
    }

    /// A navigator opened directly on `route`, as when a path is entered by hand.
    pub fn at(route: Route) -> Self {
        Self {
            current: route,
            generation: 0,
            payload: None,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn token(&self) -> ViewToken {
        ViewToken {
            route: self.current,
            generation: self.generation,
        }
    }

    /// Whether `token` still refers to the current visit.
    pub fn is_current(&self, token: ViewToken) -> bool {
        token == self.token()
    }

    /// Move to `route` without a payload. Any unconsumed payload is discarded.
    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(from = %self.current, to = %route, "navigate");
        self.current = route;
        self.generation += 1;
        self.payload = None;
    }

    /// Move to the slot view carrying `payload`.
    pub fn navigate_to_slots(&mut self, payload: SlotsPayload) {
        self.navigate(Route::Slots);
        self.payload = Some(payload);
    }

    /// Consume the slot payload. Only the slot view may take it, and only once.
    pub fn take_slots_payload(&mut self) -> Option<SlotsPayload> {
        if self.current != Route::Slots {
            return None;
        }
        self.payload.take()
    }

    /// The landing view's only action.
    pub fn get_started(&mut self) {
        self.navigate(Route::PatientSearch);
    }
}
