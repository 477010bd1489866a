//! Client for the external Appointment API.
//!
//! [`AppointmentApi`] is the seam between the workflows and the network: workflows are generic
//! over it, the binaries use [`HttpAppointmentApi`], and tests substitute in-memory fakes.
//!
//! Every call is a single attempt. There are no retries; any transport failure or non-2xx
//! status is returned to the caller as an [`ApiError`].

use crate::config::ClientConfig;
use crate::constants::{BOOK_APPOINTMENT_PATH, SEARCH_PATIENTS_PATH, SLOTS_PATH};
use crate::error::{ApiError, ApiResult};
use crate::session::SearchCriteria;
use appt_types::{CalendarDate, NonEmptyText};
use fhir::{AppointmentDetails, PatientData, SlotData};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Body of a booking request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub patient_id: NonEmptyText,
    pub slot_id: NonEmptyText,
}

/// The three operations the scheduler consumes.
pub trait AppointmentApi {
    /// `POST /search-patients` with the criteria as body; answers a single patient.
    fn search_patients(
        &self,
        criteria: &SearchCriteria,
    ) -> impl Future<Output = ApiResult<PatientData>> + Send;

    /// `GET /slots?date=YYYY-MM-DD`; answers the slots for that day.
    fn list_slots(&self, date: CalendarDate)
        -> impl Future<Output = ApiResult<Vec<SlotData>>> + Send;

    /// `POST /book-appointment` with `{patientId, slotId}`; answers the booked appointment.
    fn book_appointment(
        &self,
        request: &BookingRequest,
    ) -> impl Future<Output = ApiResult<AppointmentDetails>> + Send;
}

/// [`AppointmentApi`] over HTTP/JSON.
#[derive(Clone, Debug)]
pub struct HttpAppointmentApi {
    client: reqwest::Client,
    cfg: Arc<ClientConfig>,
}

impl HttpAppointmentApi {
    /// Build a client using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the underlying HTTP client cannot be constructed
    /// (e.g. TLS backend initialisation fails).
    pub fn new(cfg: Arc<ClientConfig>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .user_agent(concat!("appt-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, cfg })
    }

    /// Read the body of a successful response; non-2xx statuses become `ApiError::Status`.
    async fn success_body(response: reqwest::Response) -> ApiResult<String> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, url = %response.url(), "appointment API returned an error status");
            return Err(ApiError::Status(status));
        }
        Ok(response.text().await?)
    }
}

impl AppointmentApi for HttpAppointmentApi {
    async fn search_patients(&self, criteria: &SearchCriteria) -> ApiResult<PatientData> {
        let url = self.cfg.endpoint(SEARCH_PATIENTS_PATH)?;
        tracing::info!(%url, "searching patients");

        let response = self.client.post(url).json(criteria).send().await?;
        let body = Self::success_body(response).await?;
        Ok(fhir::Patient::parse(&body)?)
    }

    async fn list_slots(&self, date: CalendarDate) -> ApiResult<Vec<SlotData>> {
        let mut url = self.cfg.endpoint(SLOTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("date", &date.to_string());
        tracing::info!(%url, "fetching slots");

        let response = self.client.get(url).send().await?;
        let body = Self::success_body(response).await?;
        let slots = fhir::Slot::parse_list(&body)?;
        tracing::debug!(count = slots.len(), %date, "slots received");
        Ok(slots)
    }

    async fn book_appointment(&self, request: &BookingRequest) -> ApiResult<AppointmentDetails> {
        let url = self.cfg.endpoint(BOOK_APPOINTMENT_PATH)?;
        tracing::info!(%url, slot_id = %request.slot_id, "booking appointment");

        let response = self.client.post(url).json(request).send().await?;
        let body = Self::success_body(response).await?;
        Ok(fhir::Appointment::parse(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_HTTP_TIMEOUT;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Requests seen by the stand-in server, as `(path, query-or-body)`.
    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    async fn search_handler(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
        seen.lock().unwrap().push(("/search-patients".into(), body));
        Json(json!({
            "resourceType": "Patient",
            "id": "p-1",
            "name": [{"family": "Williams", "given": ["Sarah"]}]
        }))
    }

    async fn slots_handler(
        State(seen): State<Seen>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        seen.lock().unwrap().push(("/slots".into(), json!(query)));
        Json(json!([
            {"resourceType": "Slot", "id": "s1", "start": "2024-07-01T09:00:00Z", "end": "2024-07-01T09:30:00Z", "status": "free"},
            {"resourceType": "Slot", "id": "s2", "start": "2024-07-01T10:00:00Z", "end": "2024-07-01T10:30:00Z", "status": "busy"}
        ]))
    }

    async fn book_handler(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
        seen.lock().unwrap().push(("/book-appointment".into(), body));
        Json(json!({
            "resourceType": "Appointment",
            "id": "appt-1",
            "slot": [{"start": "2024-07-01T09:00:00Z"}]
        }))
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        // A base path exercises endpoint resolution beneath it.
        format!("http://{addr}/api")
    }

    async fn api_with_stub() -> (HttpAppointmentApi, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/api/search-patients", post(search_handler))
            .route("/api/slots", get(slots_handler))
            .route("/api/book-appointment", post(book_handler))
            .with_state(seen.clone());
        let base = serve(app).await;
        let cfg = ClientConfig::new(&base, DEFAULT_HTTP_TIMEOUT).expect("config");
        let api = HttpAppointmentApi::new(Arc::new(cfg)).expect("client");
        (api, seen)
    }

    #[tokio::test]
    async fn search_posts_criteria_as_json() {
        let (api, seen) = api_with_stub().await;
        let criteria = SearchCriteria {
            lastname: "Williams".into(),
            ..SearchCriteria::default()
        };

        let patient = api.search_patients(&criteria).await.expect("search");
        assert_eq!(patient.id.as_str(), "p-1");
        assert_eq!(patient.display_name(), "Sarah Williams");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "/search-patients");
        assert_eq!(
            seen[0].1,
            json!({"firstname": "", "lastname": "Williams", "dob": "", "phone": ""})
        );
    }

    #[tokio::test]
    async fn slots_are_requested_by_date_query() {
        let (api, seen) = api_with_stub().await;
        let date = CalendarDate::parse("2024-07-01").unwrap();

        let slots = api.list_slots(date).await.expect("slots");
        assert_eq!(slots.len(), 2);
        assert!(slots[0].is_free());

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], ("/slots".to_string(), json!({"date": "2024-07-01"})));
    }

    #[tokio::test]
    async fn booking_sends_camel_case_ids() {
        let (api, seen) = api_with_stub().await;
        let request = BookingRequest {
            patient_id: NonEmptyText::new("p-1").unwrap(),
            slot_id: NonEmptyText::new("s1").unwrap(),
        };

        let details = api.book_appointment(&request).await.expect("book");
        assert_eq!(details.id, "appt-1");
        assert!(details.start().is_some());

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[0],
            (
                "/book-appointment".to_string(),
                json!({"patientId": "p-1", "slotId": "s1"})
            )
        );
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let app = Router::new().route(
            "/api/search-patients",
            post(|| async { (StatusCode::NOT_FOUND, "no such patient") }),
        );
        let base = serve(app).await;
        let cfg = ClientConfig::new(&base, DEFAULT_HTTP_TIMEOUT).unwrap();
        let api = HttpAppointmentApi::new(Arc::new(cfg)).unwrap();

        let criteria = SearchCriteria {
            phone: "555".into(),
            ..SearchCriteria::default()
        };
        let err = api.search_patients(&criteria).await.expect_err("404");
        assert!(matches!(err, ApiError::Status(s) if s == reqwest::StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_failure() {
        let app = Router::new().route(
            "/api/slots",
            get(|| async { Json(json!({"not": "a list"})) }),
        );
        let base = serve(app).await;
        let cfg = ClientConfig::new(&base, DEFAULT_HTTP_TIMEOUT).unwrap();
        let api = HttpAppointmentApi::new(Arc::new(cfg)).unwrap();

        let err = api
            .list_slots(CalendarDate::parse("2024-07-01").unwrap())
            .await
            .expect_err("object instead of array");
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let cfg = ClientConfig::new(&format!("http://{addr}"), DEFAULT_HTTP_TIMEOUT).unwrap();
        let api = HttpAppointmentApi::new(Arc::new(cfg)).unwrap();
        let err = api
            .list_slots(CalendarDate::parse("2024-07-01").unwrap())
            .await
            .expect_err("connection refused");
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
