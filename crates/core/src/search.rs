//! Patient search workflow.
//!
//! Collects criteria into the session store, validates that at least one field is filled in,
//! submits a single search request and exposes the result card. "Proceed" copies the found
//! patient into the selected slot of the session and moves on to date selection.
//!
//! Requests are split into `begin_search` / `complete_search` so that a driver can keep
//! handling input while a request is in flight. [`PatientSearch::search`] runs both halves
//! back to back.

use crate::api::AppointmentApi;
use crate::constants::{EMPTY_CRITERIA_MESSAGE, VALIDATION_NOTICE_TTL};
use crate::error::{ApiResult, Operation, SchedulerError, SchedulerResult};
use crate::navigation::{Navigator, Route, ViewToken};
use crate::notice::{self, Notice};
use crate::session::{CriteriaField, SearchCriteria, SessionHandle};
use fhir::PatientData;
use std::time::Instant;

/// What the search view shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchPhase {
    /// The search form.
    Ready,
    /// Form hidden, loading indicator shown.
    Loading,
    /// Result card for the found patient.
    Found,
}

/// An issued search, to be handed back to [`PatientSearch::complete_search`].
#[derive(Debug)]
#[must_use]
pub struct SearchTicket {
    sequence: u64,
    token: ViewToken,
    criteria: SearchCriteria,
}

impl SearchTicket {
    /// The criteria to send, captured when the search was issued.
    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }
}

#[derive(Debug)]
pub struct PatientSearch {
    session: SessionHandle,
    in_flight: bool,
    issued: u64,
    notice: Option<Notice>,
}

impl PatientSearch {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            in_flight: false,
            issued: 0,
            notice: None,
        }
    }

    pub fn phase(&self) -> SchedulerResult<SearchPhase> {
        if self.in_flight {
            return Ok(SearchPhase::Loading);
        }
        Ok(match self.session.found_patient()? {
            Some(_) => SearchPhase::Found,
            None => SearchPhase::Ready,
        })
    }

    pub fn criteria(&self) -> SchedulerResult<SearchCriteria> {
        self.session.search_criteria()
    }

    /// Form input: write one criteria field to the session.
    pub fn update_criterion(
        &self,
        field: CriteriaField,
        value: impl Into<String>,
    ) -> SchedulerResult<()> {
        self.session.update_search_criteria(field, value)
    }

    pub fn found_patient(&self) -> SchedulerResult<Option<PatientData>> {
        self.session.found_patient()
    }

    /// The message currently on screen, if any.
    pub fn notice(&self, now: Instant) -> Option<&str> {
        notice::visible(self.notice.as_ref(), now)
    }

    /// Validate the session's criteria and issue a search.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Validation` when every field is blank; the message is shown for
    /// [`VALIDATION_NOTICE_TTL`] and nothing is sent.
    pub fn begin_search(&mut self, nav: &Navigator, now: Instant) -> SchedulerResult<SearchTicket> {
        let criteria = self.session.search_criteria()?;
        if !criteria.is_submittable() {
            self.notice = Some(Notice::transient(
                EMPTY_CRITERIA_MESSAGE,
                now,
                VALIDATION_NOTICE_TTL,
            ));
            return Err(SchedulerError::Validation(EMPTY_CRITERIA_MESSAGE.into()));
        }

        self.notice = None;
        self.in_flight = true;
        self.issued += 1;
        Ok(SearchTicket {
            sequence: self.issued,
            token: nav.token(),
            criteria,
        })
    }

    /// Apply the response to an issued search.
    ///
    /// Returns `Ok(None)` when the response was dropped: the user has left the view since the
    /// search was issued, or a newer search has been issued (the most recently issued search
    /// wins).
    ///
    /// # Errors
    ///
    /// `SchedulerError::Request` when the search failed; the generic failure message stays on
    /// screen and the form is shown again.
    pub fn complete_search(
        &mut self,
        nav: &Navigator,
        ticket: SearchTicket,
        result: ApiResult<PatientData>,
    ) -> SchedulerResult<Option<PatientData>> {
        if !nav.is_current(ticket.token) {
            tracing::warn!("dropping search response for a view that is no longer shown");
            // Nothing newer is outstanding, so the form is ready again on return.
            if ticket.sequence == self.issued {
                self.in_flight = false;
            }
            return Ok(None);
        }
        if ticket.sequence != self.issued {
            tracing::debug!(
                sequence = ticket.sequence,
                latest = self.issued,
                "dropping superseded search response"
            );
            return Ok(None);
        }

        self.in_flight = false;
        match result {
            Ok(patient) => {
                tracing::info!(patient_id = %patient.id, "patient found");
                self.session.set_found_patient(Some(patient.clone()))?;
                Ok(Some(patient))
            }
            Err(source) => {
                tracing::warn!(error = %source, "patient search failed");
                self.notice = Some(Notice::persistent(
                    Operation::SearchPatients.failure_message(),
                ));
                Err(SchedulerError::request(Operation::SearchPatients, source))
            }
        }
    }

    /// Validate, send and apply a search in one go.
    pub async fn search<A: AppointmentApi>(
        &mut self,
        api: &A,
        nav: &Navigator,
    ) -> SchedulerResult<Option<PatientData>> {
        let ticket = self.begin_search(nav, Instant::now())?;
        let result = api.search_patients(ticket.criteria()).await;
        self.complete_search(nav, ticket, result)
    }

    /// "Proceed": carry the found patient forward and open date selection.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Validation` when no patient has been found yet.
    pub fn select(&mut self, nav: &mut Navigator) -> SchedulerResult<PatientData> {
        let patient = self.session.found_patient()?.ok_or_else(|| {
            SchedulerError::Validation("search for a patient before proceeding".into())
        })?;
        self.session.set_selected_patient(Some(patient.clone()))?;
        tracing::info!(patient_id = %patient.id, "patient selected");
        nav.navigate(Route::DatePicker);
        Ok(patient)
    }

    /// Discard the result card and show the form again.
    pub fn clear_result(&mut self) -> SchedulerResult<()> {
        self.notice = None;
        self.session.set_found_patient(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionProvider;
    use crate::testing::{patient, Call, FakeApi};
    use std::time::Duration;

    fn search_view() -> (SessionProvider, PatientSearch, Navigator) {
        let provider = SessionProvider::start();
        let view = PatientSearch::new(provider.handle());
        (provider, view, Navigator::at(Route::PatientSearch))
    }

    #[tokio::test]
    async fn blank_criteria_never_reach_the_api() {
        let (_provider, mut view, nav) = search_view();
        let api = FakeApi::default();
        view.update_criterion(CriteriaField::Firstname, "  ").unwrap();

        let err = view.search(&api, &nav).await.expect_err("validation");
        assert!(matches!(err, SchedulerError::Validation(_)));
        assert_eq!(err.user_message(), EMPTY_CRITERIA_MESSAGE);
        assert!(api.calls().is_empty());
        assert_eq!(view.phase().unwrap(), SearchPhase::Ready);
    }

    #[test]
    fn validation_notice_clears_after_three_seconds() {
        let (_provider, mut view, nav) = search_view();
        let now = Instant::now();

        assert!(view.begin_search(&nav, now).is_err());
        assert_eq!(view.notice(now), Some(EMPTY_CRITERIA_MESSAGE));
        assert_eq!(view.notice(now + Duration::from_secs(3)), None);
    }

    #[tokio::test]
    async fn one_filled_field_sends_exactly_one_request() {
        let (_provider, mut view, nav) = search_view();
        let api = FakeApi {
            patient: Some(patient("p-1", "Sarah", "Williams")),
            ..FakeApi::default()
        };
        view.update_criterion(CriteriaField::Phone, "555-0100").unwrap();

        let found = view.search(&api, &nav).await.expect("search");
        assert_eq!(found.map(|p| p.id.to_string()), Some("p-1".into()));

        let expected = SearchCriteria {
            phone: "555-0100".into(),
            ..SearchCriteria::default()
        };
        assert_eq!(api.calls(), vec![Call::Search(expected)]);
        assert_eq!(view.phase().unwrap(), SearchPhase::Found);
        assert!(view.found_patient().unwrap().is_some());
    }

    #[test]
    fn form_is_hidden_while_loading() {
        let (_provider, mut view, nav) = search_view();
        view.update_criterion(CriteriaField::Lastname, "Williams").unwrap();

        let ticket = view.begin_search(&nav, Instant::now()).expect("valid");
        assert_eq!(view.phase().unwrap(), SearchPhase::Loading);

        let result = Ok(patient("p-1", "Sarah", "Williams"));
        view.complete_search(&nav, ticket, result).unwrap();
        assert_eq!(view.phase().unwrap(), SearchPhase::Found);
    }

    #[tokio::test]
    async fn failure_shows_generic_message_and_returns_to_form() {
        let (_provider, mut view, nav) = search_view();
        let api = FakeApi::default();
        view.update_criterion(CriteriaField::Lastname, "Nobody").unwrap();

        let err = view.search(&api, &nav).await.expect_err("500");
        assert_eq!(err.user_message(), "Failed to search patients. Please try again.");
        assert_eq!(view.phase().unwrap(), SearchPhase::Ready);
        assert_eq!(
            view.notice(Instant::now() + Duration::from_secs(60)),
            Some("Failed to search patients. Please try again.")
        );
    }

    #[test]
    fn latest_issued_search_wins() {
        let (provider, mut view, nav) = search_view();
        view.update_criterion(CriteriaField::Lastname, "Williams").unwrap();

        let first = view.begin_search(&nav, Instant::now()).unwrap();
        let second = view.begin_search(&nav, Instant::now()).unwrap();

        let newer = view
            .complete_search(&nav, second, Ok(patient("p-2", "Sam", "Williams")))
            .unwrap();
        assert!(newer.is_some());

        let older = view
            .complete_search(&nav, first, Ok(patient("p-1", "Sarah", "Williams")))
            .unwrap();
        assert!(older.is_none());

        let found = provider.handle().found_patient().unwrap().unwrap();
        assert_eq!(found.id.as_str(), "p-2");
    }

    #[test]
    fn response_after_navigation_is_ignored() {
        let (provider, mut view, mut nav) = search_view();
        view.update_criterion(CriteriaField::Firstname, "Sarah").unwrap();
        let ticket = view.begin_search(&nav, Instant::now()).unwrap();

        nav.navigate(Route::Home);
        let applied = view
            .complete_search(&nav, ticket, Ok(patient("p-1", "Sarah", "Williams")))
            .unwrap();

        assert!(applied.is_none());
        assert!(provider.handle().found_patient().unwrap().is_none());
    }

    #[test]
    fn returning_after_a_dropped_response_shows_the_form() {
        let (_provider, mut view, mut nav) = search_view();
        view.update_criterion(CriteriaField::Firstname, "Sarah").unwrap();
        let ticket = view.begin_search(&nav, Instant::now()).unwrap();

        nav.navigate(Route::Home);
        let applied = view
            .complete_search(&nav, ticket, Ok(patient("p-1", "Sarah", "Williams")))
            .unwrap();
        assert!(applied.is_none());

        nav.navigate(Route::PatientSearch);
        assert_eq!(view.phase().unwrap(), SearchPhase::Ready);
    }

    #[test]
    fn dropped_older_response_keeps_newer_search_loading() {
        let (_provider, mut view, mut nav) = search_view();
        view.update_criterion(CriteriaField::Firstname, "Sarah").unwrap();
        let older = view.begin_search(&nav, Instant::now()).unwrap();

        nav.navigate(Route::Home);
        nav.navigate(Route::PatientSearch);
        let _newer = view.begin_search(&nav, Instant::now()).unwrap();

        let applied = view
            .complete_search(&nav, older, Ok(patient("p-1", "Sarah", "Williams")))
            .unwrap();
        assert!(applied.is_none());
        assert_eq!(view.phase().unwrap(), SearchPhase::Loading);
    }

    #[tokio::test]
    async fn select_copies_found_patient_and_opens_date_picker() {
        let (provider, mut view, mut nav) = search_view();
        let api = FakeApi {
            patient: Some(patient("p-1", "Sarah", "Williams")),
            ..FakeApi::default()
        };
        view.update_criterion(CriteriaField::Firstname, "Sarah").unwrap();
        view.search(&api, &nav).await.unwrap();

        let selected = view.select(&mut nav).expect("select");
        assert_eq!(selected.id.as_str(), "p-1");
        assert_eq!(nav.current(), Route::DatePicker);
        assert_eq!(provider.handle().selected_patient().unwrap(), Some(selected));
    }

    #[test]
    fn select_requires_a_found_patient() {
        let (_provider, mut view, mut nav) = search_view();
        assert!(matches!(
            view.select(&mut nav),
            Err(SchedulerError::Validation(_))
        ));
        assert_eq!(nav.current(), Route::PatientSearch);
    }

    #[test]
    fn search_after_session_end_fails_loudly() {
        let (provider, mut view, nav) = search_view();
        drop(provider);
        assert!(matches!(
            view.begin_search(&nav, Instant::now()),
            Err(SchedulerError::NoActiveSession)
        ));
    }
}
