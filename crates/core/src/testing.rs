//! In-memory [`AppointmentApi`] used by the workflow tests.

use crate::api::{AppointmentApi, BookingRequest};
use crate::error::{ApiError, ApiResult};
use crate::session::SearchCriteria;
use appt_types::CalendarDate;
use fhir::{AppointmentDetails, PatientData, SlotData};
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Search(SearchCriteria),
    Slots(CalendarDate),
    Book(BookingRequest),
}

/// Answers every call with the canned result, or a 500 when none is set.
#[derive(Default)]
pub struct FakeApi {
    pub patient: Option<PatientData>,
    pub slots: Option<Vec<SlotData>>,
    pub appointment: Option<AppointmentDetails>,
    pub(crate) calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn server_error() -> ApiError {
    ApiError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
}

impl AppointmentApi for FakeApi {
    async fn search_patients(&self, criteria: &SearchCriteria) -> ApiResult<PatientData> {
        self.record(Call::Search(criteria.clone()));
        self.patient.clone().ok_or_else(server_error)
    }

    async fn list_slots(&self, date: CalendarDate) -> ApiResult<Vec<SlotData>> {
        self.record(Call::Slots(date));
        self.slots.clone().ok_or_else(server_error)
    }

    async fn book_appointment(&self, request: &BookingRequest) -> ApiResult<AppointmentDetails> {
        self.record(Call::Book(request.clone()));
        self.appointment.clone().ok_or_else(server_error)
    }
}

pub fn patient(id: &str, given: &str, family: &str) -> PatientData {
    fhir::Patient::parse(&format!(
        r#"{{"resourceType": "Patient", "id": "{id}", "name": [{{"given": ["{given}"], "family": "{family}"}}]}}"#
    ))
    .expect("patient json")
}

/// A slot on 2024-07-01 starting at `hh:mm` UTC.
pub fn slot(id: &str, hh_mm: &str, status: &str) -> SlotData {
    fhir::Slot::parse(&format!(
        r#"{{"id": "{id}", "start": "2024-07-01T{hh_mm}:00Z", "end": "2024-07-01T{hh_mm}:30Z", "status": "{status}"}}"#
    ))
    .expect("slot json")
}

pub fn appointment(id: &str, start: &str) -> AppointmentDetails {
    fhir::Appointment::parse(&format!(
        r#"{{"resourceType": "Appointment", "id": "{id}", "slot": [{{"start": "{start}"}}]}}"#
    ))
    .expect("appointment json")
}

pub fn date(s: &str) -> CalendarDate {
    CalendarDate::parse(s).expect("date")
}
