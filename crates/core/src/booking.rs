//! Slot list view and booking workflow.
//!
//! The view is built from the one-shot payload left by date selection. It owns the slot list
//! in the order the server sent it, a sort order, a reveal count and the booking state
//! machine:
//!
//! ```text
//! Idle ──book(free slot)──> Booking(slot) ──ok──> Succeeded(details)
//!   ^                             │
//!   └────────────err──────────────┘  (Failed, which accepts a new attempt like Idle)
//! ```
//!
//! Booking is single-flight per view: while one request is outstanding, further attempts are
//! ignored. After a success the list and its controls are hidden for good; only leaving the
//! view gets rid of the confirmation.

use crate::api::{AppointmentApi, BookingRequest};
use crate::constants::BOOKING_SUCCESS_MESSAGE;
use crate::error::{ApiResult, Operation, SchedulerError, SchedulerResult};
use crate::navigation::{Navigator, Route, ViewToken};
use crate::notice::{self, Notice};
use crate::session::SessionHandle;
use crate::slots::{sort_slots, PageControl, Pagination, SortKey, SortOrder};
use appt_types::{CalendarDate, NonEmptyText};
use chrono::{DateTime, FixedOffset};
use fhir::{AppointmentDetails, PatientData, SlotData};
use std::time::Instant;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingState {
    Idle,
    Booking { slot_id: NonEmptyText },
    Succeeded(AppointmentDetails),
    Failed,
}

/// What a slot's action button shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotAction {
    /// Free and bookable now.
    Book,
    /// This slot's booking is in flight.
    Booking,
    /// Not free.
    Unavailable,
}

impl SlotAction {
    pub fn label(self) -> &'static str {
        match self {
            SlotAction::Book => "Book",
            SlotAction::Booking => "Booking...",
            SlotAction::Unavailable => "Unavailable",
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, SlotAction::Book)
    }
}

/// An issued booking, to be handed back to [`SlotsView::complete_booking`].
#[derive(Debug)]
#[must_use]
pub struct BookingTicket {
    request: BookingRequest,
    token: ViewToken,
}

impl BookingTicket {
    pub fn request(&self) -> &BookingRequest {
        &self.request
    }
}

/// Content of the success display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub message: &'static str,
    pub appointment_id: String,
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    /// Start of the first booked slot, or the picked date when the server sent no time.
    pub appointment_time: AppointmentTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppointmentTime {
    At(DateTime<FixedOffset>),
    OnDate(CalendarDate),
}

impl std::fmt::Display for AppointmentTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentTime::At(start) => write!(f, "{}", start.format("%Y-%m-%d %H:%M %:z")),
            AppointmentTime::OnDate(date) => write!(f, "{date}"),
        }
    }
}

#[derive(Debug)]
pub struct SlotsView {
    session: SessionHandle,
    date: CalendarDate,
    received: Vec<SlotData>,
    sorted: Vec<SlotData>,
    order: SortOrder,
    pages: Pagination,
    booking: BookingState,
    notice: Option<Notice>,
}

impl SlotsView {
    /// Open the slot view, consuming the navigator's payload.
    ///
    /// # Errors
    ///
    /// `SchedulerError::MissingState` when there is no payload (the view was reached directly
    /// or the payload was already used). The navigator has then been redirected to date
    /// selection and no view exists.
    pub fn enter(session: SessionHandle, nav: &mut Navigator) -> SchedulerResult<Self> {
        let Some(payload) = nav.take_slots_payload() else {
            tracing::debug!("slot view opened without slot data, redirecting");
            nav.navigate(Route::DatePicker);
            return Err(SchedulerError::MissingState);
        };

        let order = SortOrder::default();
        let mut sorted = payload.slots.clone();
        sort_slots(&mut sorted, order);

        Ok(Self {
            session,
            date: payload.date,
            received: payload.slots,
            sorted,
            order,
            pages: Pagination::default(),
            booking: BookingState::Idle,
            notice: None,
        })
    }

    pub fn date(&self) -> CalendarDate {
        self.date
    }

    pub fn total(&self) -> usize {
        self.received.len()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    pub fn booking_state(&self) -> &BookingState {
        &self.booking
    }

    pub fn is_booked(&self) -> bool {
        matches!(self.booking, BookingState::Succeeded(_))
    }

    /// Whether the slot list and its sort/reveal controls are shown.
    pub fn is_list_visible(&self) -> bool {
        !self.is_booked()
    }

    pub fn selected_patient_name(&self) -> SchedulerResult<Option<String>> {
        Ok(self.session.selected_patient()?.map(|p| p.display_name()))
    }

    pub fn notice(&self, now: Instant) -> Option<&str> {
        notice::visible(self.notice.as_ref(), now)
    }

    /// Sort control. Ignored once booked.
    pub fn choose_sort(&mut self, key: SortKey) {
        if !self.is_list_visible() {
            return;
        }
        self.order.choose(key);
        // Always re-sort the server order so ties never depend on earlier sorts.
        self.sorted = self.received.clone();
        sort_slots(&mut self.sorted, self.order);
    }

    /// The revealed slots in display order; empty once booked.
    pub fn visible_slots(&self) -> &[SlotData] {
        if !self.is_list_visible() {
            return &[];
        }
        self.pages.page(&self.sorted)
    }

    /// The reveal control on offer; none once booked.
    pub fn page_control(&self) -> Option<PageControl> {
        self.is_list_visible()
            .then(|| self.pages.control(self.total()))
    }

    pub fn show_more(&mut self) {
        if self.page_control() == Some(PageControl::ShowMore) {
            self.pages.show_more();
        }
    }

    pub fn show_less(&mut self) {
        if self.page_control() == Some(PageControl::ShowLess) {
            self.pages.show_less();
        }
    }

    pub fn slot_action(&self, slot: &SlotData) -> SlotAction {
        match &self.booking {
            BookingState::Booking { slot_id } if *slot_id == slot.id => SlotAction::Booking,
            _ if slot.is_free() => SlotAction::Book,
            _ => SlotAction::Unavailable,
        }
    }

    fn find_slot(&self, slot_id: &str) -> Option<&SlotData> {
        self.received.iter().find(|s| s.id.as_str() == slot_id)
    }

    /// Try to start booking `slot_id` for the selected patient.
    ///
    /// Returns `Ok(None)`, sending nothing, when the slot is unknown or not free, when another
    /// booking is in flight, or when this view has already booked.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Validation` when no patient is selected in the session.
    pub fn begin_booking(
        &mut self,
        nav: &Navigator,
        slot_id: &str,
    ) -> SchedulerResult<Option<BookingTicket>> {
        match &self.booking {
            BookingState::Booking { slot_id: in_flight } => {
                tracing::debug!(requested = slot_id, %in_flight, "booking already in flight, ignoring");
                return Ok(None);
            }
            BookingState::Succeeded(_) => return Ok(None),
            BookingState::Idle | BookingState::Failed => {}
        }

        let Some(slot) = self.find_slot(slot_id) else {
            tracing::debug!(slot_id, "booking requested for an unknown slot, ignoring");
            return Ok(None);
        };
        if !slot.is_free() {
            tracing::debug!(slot_id, status = %slot.status, "slot is not free, ignoring");
            return Ok(None);
        }
        let slot_id = slot.id.clone();

        let patient: PatientData = self.session.selected_patient()?.ok_or_else(|| {
            SchedulerError::Validation("select a patient before booking".into())
        })?;

        self.notice = None;
        self.booking = BookingState::Booking {
            slot_id: slot_id.clone(),
        };
        Ok(Some(BookingTicket {
            request: BookingRequest {
                patient_id: patient.id,
                slot_id,
            },
            token: nav.token(),
        }))
    }

    /// Apply a booking response.
    ///
    /// Returns `Ok(None)` when the user has left the view since booking started; the response
    /// is dropped (the server-side booking stands).
    ///
    /// # Errors
    ///
    /// `SchedulerError::Request` when booking failed; the view returns to accepting bookings.
    pub fn complete_booking(
        &mut self,
        nav: &Navigator,
        ticket: BookingTicket,
        result: ApiResult<AppointmentDetails>,
    ) -> SchedulerResult<Option<AppointmentDetails>> {
        if !nav.is_current(ticket.token) {
            tracing::warn!(slot_id = %ticket.request.slot_id, "dropping booking response for a view that is no longer shown");
            return Ok(None);
        }

        match result {
            Ok(details) => {
                tracing::info!(appointment_id = %details.id, slot_id = %ticket.request.slot_id, "appointment booked");
                self.notice = None;
                self.booking = BookingState::Succeeded(details.clone());
                Ok(Some(details))
            }
            Err(source) => {
                tracing::warn!(slot_id = %ticket.request.slot_id, error = %source, "booking failed");
                self.booking = BookingState::Failed;
                self.notice = Some(Notice::persistent(
                    Operation::BookAppointment.failure_message(),
                ));
                Err(SchedulerError::request(Operation::BookAppointment, source))
            }
        }
    }

    /// Start, send and apply a booking in one go.
    ///
    /// Returns `Ok(None)` when the attempt was a no-op (see [`SlotsView::begin_booking`]).
    pub async fn book<A: AppointmentApi>(
        &mut self,
        api: &A,
        nav: &Navigator,
        slot_id: &str,
    ) -> SchedulerResult<Option<AppointmentDetails>> {
        let Some(ticket) = self.begin_booking(nav, slot_id)? else {
            return Ok(None);
        };
        let result = api.book_appointment(ticket.request()).await;
        self.complete_booking(nav, ticket, result)
    }

    /// The success display, once booked.
    pub fn confirmation(&self) -> SchedulerResult<Option<Confirmation>> {
        let BookingState::Succeeded(details) = &self.booking else {
            return Ok(None);
        };
        let patient = self.session.selected_patient()?;

        Ok(Some(Confirmation {
            message: BOOKING_SUCCESS_MESSAGE,
            appointment_id: details.id.clone(),
            patient_name: patient.as_ref().map(PatientData::display_name),
            patient_id: patient.as_ref().map(|p| p.id.to_string()),
            appointment_time: details
                .start()
                .map(AppointmentTime::At)
                .unwrap_or(AppointmentTime::OnDate(self.date)),
        }))
    }
}

/// Check that `slot_id` names a free slot in `slots`.
///
/// Used where a booking is issued without a slot view, e.g. from a script.
pub fn ensure_bookable<'a>(slots: &'a [SlotData], slot_id: &str) -> SchedulerResult<&'a SlotData> {
    let slot = slots
        .iter()
        .find(|s| s.id.as_str() == slot_id)
        .ok_or_else(|| SchedulerError::Validation(format!("no slot '{slot_id}' on that date")))?;
    if !slot.is_free() {
        return Err(SchedulerError::Validation(format!(
            "slot '{slot_id}' is {}, only free slots can be booked",
            slot.status
        )));
    }
    Ok(slot)
}
