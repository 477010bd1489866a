//! Date selection workflow.
//!
//! Takes a calendar date, asks the API for that day's slots and hands the result to the slot
//! view through the navigator's one-shot payload. Nothing from this view is written to the
//! session store.

use crate::api::AppointmentApi;
use crate::constants::VALIDATION_NOTICE_TTL;
use crate::error::{ApiResult, Operation, SchedulerError, SchedulerResult};
use crate::navigation::{Navigator, SlotsPayload, ViewToken};
use crate::notice::{self, Notice};
use crate::session::SessionHandle;
use appt_types::CalendarDate;
use fhir::SlotData;
use std::time::Instant;

#[derive(Debug)]
#[must_use]
pub struct SlotsTicket {
    sequence: u64,
    date: CalendarDate,
    token: ViewToken,
}

impl SlotsTicket {
    pub fn date(&self) -> CalendarDate {
        self.date
    }
}

#[derive(Debug)]
pub struct DatePicker {
    session: SessionHandle,
    loading: bool,
    issued: u64,
    notice: Option<Notice>,
}

impl DatePicker {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            loading: false,
            issued: 0,
            notice: None,
        }
    }

    /// Heading for the selected patient, when one is selected.
    pub fn selected_patient_name(&self) -> SchedulerResult<Option<String>> {
        Ok(self
            .session
            .selected_patient()?
            .map(|patient| patient.display_name()))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self, now: Instant) -> Option<&str> {
        notice::visible(self.notice.as_ref(), now)
    }

    /// Validate `date` and issue a slot request for it.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Validation` when `date` is not a `YYYY-MM-DD` calendar day.
    pub fn begin_check_slots(
        &mut self,
        nav: &Navigator,
        date: &str,
        now: Instant,
    ) -> SchedulerResult<SlotsTicket> {
        let date = CalendarDate::parse(date).map_err(|e| {
            let message = format!("Please pick a valid date ({e}).");
            self.notice = Some(Notice::transient(&message, now, VALIDATION_NOTICE_TTL));
            SchedulerError::Validation(message)
        })?;

        self.notice = None;
        self.loading = true;
        self.issued += 1;
        Ok(SlotsTicket {
            sequence: self.issued,
            date,
            token: nav.token(),
        })
    }

    /// Apply the slot response: on success, open the slot view with the list and date.
    ///
    /// Returns `Ok(false)` when the response was dropped because the user already left.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Request` when the request failed; the view stays on date selection.
    pub fn complete_check_slots(
        &mut self,
        nav: &mut Navigator,
        ticket: SlotsTicket,
        result: ApiResult<Vec<SlotData>>,
    ) -> SchedulerResult<bool> {
        if !nav.is_current(ticket.token) {
            tracing::warn!(date = %ticket.date, "dropping slot response for a view that is no longer shown");
            if ticket.sequence == self.issued {
                self.loading = false;
            }
            return Ok(false);
        }

        self.loading = false;
        match result {
            Ok(slots) => {
                tracing::info!(date = %ticket.date, count = slots.len(), "slots fetched");
                nav.navigate_to_slots(SlotsPayload {
                    slots,
                    date: ticket.date,
                });
                Ok(true)
            }
            Err(source) => {
                tracing::warn!(date = %ticket.date, error = %source, "fetching slots failed");
                self.notice = Some(Notice::persistent(Operation::ListSlots.failure_message()));
                Err(SchedulerError::request(Operation::ListSlots, source))
            }
        }
    }

    /// Validate, fetch and hand over in one go.
    pub async fn check_slots<A: AppointmentApi>(
        &mut self,
        api: &A,
        nav: &mut Navigator,
        date: &str,
    ) -> SchedulerResult<bool> {
        let ticket = self.begin_check_slots(nav, date, Instant::now())?;
        let result = api.list_slots(ticket.date()).await;
        self.complete_check_slots(nav, ticket, result)
    }
}
