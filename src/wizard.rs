//! Terminal rendition of the scheduling wizard.
//!
//! One view is shown at a time, chosen by the navigator's current route. Input is read line by
//! line; every view accepts `h` (home) and `q` (quit) besides its own commands.

use appt_core::{
    constants::HOME_TITLE, display, AppointmentApi, CriteriaField, DatePicker, Navigator,
    PageControl, PatientSearch, Route, SchedulerError, SearchPhase, SessionProvider, SlotsView,
    SortDirection, SortKey,
};
use std::io::Write;
use tokio::io::{AsyncBufRead, Lines};

enum Step {
    Continue,
    Quit,
}

pub struct Wizard<A, R, W> {
    api: A,
    session: SessionProvider,
    nav: Navigator,
    search: PatientSearch,
    picker: DatePicker,
    slots: Option<SlotsView>,
    input: Lines<R>,
    out: W,
}

impl<A, R, W> Wizard<A, R, W>
where
    A: AppointmentApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(api: A, nav: Navigator, input: Lines<R>, out: W) -> Self {
        let session = SessionProvider::start();
        let search = PatientSearch::new(session.handle());
        let picker = DatePicker::new(session.handle());
        Self {
            api,
            session,
            nav,
            search,
            picker,
            slots: None,
            input,
            out,
        }
    }

    pub fn current(&self) -> Route {
        self.nav.current()
    }

    /// Run until the user quits or input ends.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            if self.nav.current() != Route::Slots {
                self.slots = None;
            }
            let step = match self.nav.current() {
                Route::Home => self.home().await?,
                Route::PatientSearch => self.patient_search().await?,
                Route::DatePicker => self.date_picker().await?,
                Route::Slots => self.slot_list().await?,
            };
            if let Step::Quit = step {
                tracing::debug!("wizard finished");
                return Ok(());
            }
        }
    }

    async fn prompt(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(self
            .input
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }

    fn report(&mut self, err: &SchedulerError) -> anyhow::Result<()> {
        if let SchedulerError::NoActiveSession = err {
            anyhow::bail!("session store used after the session ended");
        }
        writeln!(self.out, "! {}", err.user_message())?;
        Ok(())
    }

    async fn home(&mut self) -> anyhow::Result<Step> {
        writeln!(self.out, "\n== {HOME_TITLE} ==")?;
        match self.prompt("Press Enter to get started (q to quit): ").await?.as_deref() {
            None | Some("q") => Ok(Step::Quit),
            Some(_) => {
                self.nav.get_started();
                Ok(Step::Continue)
            }
        }
    }

    async fn patient_search(&mut self) -> anyhow::Result<Step> {
        writeln!(self.out, "\n== Patient Search ==")?;

        if self.search.phase()? == SearchPhase::Found {
            if let Some(patient) = self.search.found_patient()? {
                writeln!(self.out, "Patient Found")?;
                for line in display::patient_card(&patient) {
                    writeln!(self.out, "  {line}")?;
                }
            }
            let Some(cmd) = self
                .prompt("[p]roceed, [n]ew search, [h]ome, [q]uit: ")
                .await?
            else {
                return Ok(Step::Quit);
            };
            match cmd.as_str() {
                "p" => {
                    if let Err(e) = self.search.select(&mut self.nav) {
                        self.report(&e)?;
                    }
                }
                "n" => self.search.clear_result()?,
                "h" => self.nav.navigate(Route::Home),
                "q" => return Ok(Step::Quit),
                other => writeln!(self.out, "Unknown command '{other}'")?,
            }
            return Ok(Step::Continue);
        }

        let Some(cmd) = self.prompt("[s]earch, [h]ome, [q]uit: ").await? else {
            return Ok(Step::Quit);
        };
        match cmd.as_str() {
            "s" => {}
            "h" => {
                self.nav.navigate(Route::Home);
                return Ok(Step::Continue);
            }
            "q" => return Ok(Step::Quit),
            other => {
                writeln!(self.out, "Unknown command '{other}'")?;
                return Ok(Step::Continue);
            }
        }

        writeln!(self.out, "Enter keeps the shown value, '-' clears it.")?;
        let criteria = self.search.criteria()?;
        for field in CriteriaField::ALL {
            let text = format!("{} [{}]: ", field.label(), criteria.get(field));
            let Some(value) = self.prompt(&text).await? else {
                return Ok(Step::Quit);
            };
            match value.as_str() {
                "" => {}
                "-" => self.search.update_criterion(field, "")?,
                _ => self.search.update_criterion(field, value)?,
            }
        }

        writeln!(self.out, "Searching...")?;
        if let Err(e) = self.search.search(&self.api, &self.nav).await {
            self.report(&e)?;
        }
        Ok(Step::Continue)
    }

    async fn date_picker(&mut self) -> anyhow::Result<Step> {
        writeln!(self.out, "\n== Select a Date ==")?;
        if let Some(name) = self.picker.selected_patient_name()? {
            writeln!(self.out, "Patient: {name}")?;
        }

        let Some(input) = self
            .prompt("Date (YYYY-MM-DD), [b]ack, [h]ome, [q]uit: ")
            .await?
        else {
            return Ok(Step::Quit);
        };
        match input.as_str() {
            "b" => self.nav.navigate(Route::PatientSearch),
            "h" => self.nav.navigate(Route::Home),
            "q" => return Ok(Step::Quit),
            date => {
                writeln!(self.out, "Checking slots...")?;
                if let Err(e) = self
                    .picker
                    .check_slots(&self.api, &mut self.nav, date)
                    .await
                {
                    self.report(&e)?;
                }
            }
        }
        Ok(Step::Continue)
    }

    async fn slot_list(&mut self) -> anyhow::Result<Step> {
        if self.slots.is_none() {
            match SlotsView::enter(self.session.handle(), &mut self.nav) {
                Ok(view) => self.slots = Some(view),
                // The navigator has been sent back to date selection.
                Err(SchedulerError::MissingState) => return Ok(Step::Continue),
                Err(e) => return Err(e.into()),
            }
        }
        let Some(view) = self.slots.as_mut() else {
            return Ok(Step::Continue);
        };

        writeln!(self.out, "\n== Available Slots for {} ==", view.date())?;
        if let Some(name) = view.selected_patient_name()? {
            writeln!(self.out, "Patient: {name}")?;
        }

        if let Some(confirmation) = view.confirmation()? {
            writeln!(self.out, "{}", confirmation.message)?;
            writeln!(self.out, "  Appointment ID: {}", confirmation.appointment_id)?;
            if let Some(name) = &confirmation.patient_name {
                writeln!(self.out, "  Patient: {name}")?;
            }
            if let Some(id) = &confirmation.patient_id {
                writeln!(self.out, "  Patient ID: {id}")?;
            }
            writeln!(self.out, "  Appointment Date: {}", confirmation.appointment_time)?;

            let Some(cmd) = self.prompt("[d]ate, [h]ome, [q]uit: ").await? else {
                return Ok(Step::Quit);
            };
            match cmd.as_str() {
                "d" => self.nav.navigate(Route::DatePicker),
                "h" => self.nav.navigate(Route::Home),
                "q" => return Ok(Step::Quit),
                other => writeln!(self.out, "Unknown command '{other}'")?,
            }
            return Ok(Step::Continue);
        }

        let order = view.sort_order();
        writeln!(
            self.out,
            "Sorted by {} ({})",
            match order.key {
                SortKey::Date => "date",
                SortKey::Status => "status",
            },
            match order.direction {
                SortDirection::Asc => "ascending",
                SortDirection::Desc => "descending",
            }
        )?;
        if view.total() == 0 {
            writeln!(self.out, "No slots on this date.")?;
        }
        for (n, slot) in view.visible_slots().iter().enumerate() {
            writeln!(
                self.out,
                "  {:>2}. {} [{}] {}",
                n + 1,
                display::slot_line(slot),
                slot.status,
                view.slot_action(slot).label()
            )?;
        }
        let reveal = match view.page_control() {
            Some(PageControl::ShowMore) => ", [m]ore",
            Some(PageControl::ShowLess) => ", [l]ess",
            None => "",
        };

        let text = format!("[b N] book, [s date|status] sort{reveal}, [d]ate, [h]ome, [q]uit: ");
        let Some(cmd) = self.prompt(&text).await? else {
            return Ok(Step::Quit);
        };
        let Some(view) = self.slots.as_mut() else {
            return Ok(Step::Continue);
        };

        let mut words = cmd.split_whitespace();
        match (words.next(), words.next()) {
            (Some("b"), Some(n)) => {
                let slot_id = n
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| view.visible_slots().get(i))
                    .map(|slot| slot.id.to_string());
                let Some(slot_id) = slot_id else {
                    writeln!(self.out, "No slot numbered {n}")?;
                    return Ok(Step::Continue);
                };
                match view.book(&self.api, &self.nav, &slot_id).await {
                    Ok(Some(_)) => {}
                    Ok(None) => writeln!(self.out, "That slot cannot be booked.")?,
                    Err(e) => self.report(&e)?,
                }
            }
            (Some("s"), Some(key)) => match key.parse::<SortKey>() {
                Ok(key) => view.choose_sort(key),
                Err(e) => writeln!(self.out, "{e}")?,
            },
            (Some("m"), None) => view.show_more(),
            (Some("l"), None) => view.show_less(),
            (Some("d"), None) => self.nav.navigate(Route::DatePicker),
            (Some("h"), None) => self.nav.navigate(Route::Home),
            (Some("q"), None) => return Ok(Step::Quit),
            _ => writeln!(self.out, "Unknown command '{cmd}'")?,
        }
        Ok(Step::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appt_core::{ApiError, ApiResult, BookingRequest, CalendarDate, SearchCriteria};
    use fhir::{AppointmentDetails, PatientData, SlotData};
    use std::sync::Mutex;
    use tokio::io::AsyncBufReadExt;

    #[derive(Default)]
    struct ScriptedApi {
        patient: Option<PatientData>,
        slots: Vec<SlotData>,
        appointment: Option<AppointmentDetails>,
        booked: Mutex<Vec<BookingRequest>>,
    }

    fn unavailable() -> ApiError {
        ApiError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)
    }

    // By reference, so a test can inspect the recorded bookings after the run.
    impl AppointmentApi for &ScriptedApi {
        async fn search_patients(&self, _criteria: &SearchCriteria) -> ApiResult<PatientData> {
            self.patient.clone().ok_or_else(unavailable)
        }

        async fn list_slots(&self, _date: CalendarDate) -> ApiResult<Vec<SlotData>> {
            Ok(self.slots.clone())
        }

        async fn book_appointment(&self, request: &BookingRequest) -> ApiResult<AppointmentDetails> {
            self.booked.lock().unwrap().push(request.clone());
            self.appointment.clone().ok_or_else(unavailable)
        }
    }

    fn slot(id: &str, hh_mm: &str, status: &str) -> SlotData {
        fhir::Slot::parse(&format!(
            r#"{{"id": "{id}", "start": "2024-07-01T{hh_mm}:00Z", "end": "2024-07-01T{hh_mm}:30Z", "status": "{status}"}}"#
        ))
        .unwrap()
    }

    fn api() -> ScriptedApi {
        ScriptedApi {
            patient: Some(
                fhir::Patient::parse(
                    r#"{"resourceType": "Patient", "id": "p-1", "name": [{"given": ["Sarah"], "family": "Williams"}]}"#,
                )
                .unwrap(),
            ),
            slots: vec![slot("s-10", "10:00", "free"), slot("s-09", "09:00", "busy")],
            appointment: Some(
                fhir::Appointment::parse(
                    r#"{"resourceType": "Appointment", "id": "a-1", "slot": [{"start": "2024-07-01T10:00:00Z"}]}"#,
                )
                .unwrap(),
            ),
            booked: Mutex::default(),
        }
    }

    async fn run_script(api: &ScriptedApi, nav: Navigator, script: &str) -> (String, Route) {
        let mut out = Vec::new();
        let mut wizard = Wizard::new(api, nav, script.as_bytes().lines(), &mut out);
        wizard.run().await.unwrap();
        let route = wizard.current();
        drop(wizard);
        (String::from_utf8(out).unwrap(), route)
    }

    #[tokio::test]
    async fn walks_from_home_to_a_booking() {
        let api = api();
        let script = "\ns\n\nWilliams\n\n\np\n2024-07-01\nb 1\n";
        let (out, route) = run_script(&api, Navigator::new(), script).await;

        assert!(out.contains("Appt. Scheduler"));
        assert!(out.contains("Name: Sarah Williams"));
        // Date ascending puts the busy 09:00 slot first, so "b 1" is a no-op.
        assert!(out.contains("That slot cannot be booked."));
        assert!(api.booked.lock().unwrap().is_empty());
        assert_eq!(route, Route::Slots);
    }

    #[tokio::test]
    async fn status_sort_then_book_shows_confirmation() {
        let api = api();
        let script = "\ns\n\nWilliams\n\n\np\n2024-07-01\ns status\nb 1\n";
        let (out, _) = run_script(&api, Navigator::new(), script).await;

        let booked = api.booked.lock().unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].slot_id.as_str(), "s-10");
        assert_eq!(booked[0].patient_id.as_str(), "p-1");
        assert!(out.contains("Appointment successfully booked"));
        assert!(out.contains("Appointment ID: a-1"));
        assert!(out.contains("Appointment Date: 2024-07-01 10:00 +00:00"));
    }

    #[tokio::test]
    async fn empty_search_is_rejected_without_a_request() {
        let api = ScriptedApi::default();
        let (out, route) =
            run_script(&api, Navigator::at(Route::PatientSearch), "s\n\n\n\n\n").await;

        assert!(out.contains("! Please fill in at least one search criteria."));
        assert_eq!(route, Route::PatientSearch);
    }

    #[tokio::test]
    async fn failed_search_shows_generic_message() {
        let api = ScriptedApi::default();
        let (out, _) =
            run_script(&api, Navigator::at(Route::PatientSearch), "s\nSarah\n\n\n\n").await;
        assert!(out.contains("! Failed to search patients. Please try again."));
    }

    #[tokio::test]
    async fn opening_slots_directly_lands_on_date_selection() {
        let api = api();
        let (out, route) = run_script(&api, Navigator::at(Route::Slots), "").await;
        assert!(out.contains("== Select a Date =="));
        assert!(!out.contains("Available Slots"));
        assert_eq!(route, Route::DatePicker);
    }

    #[tokio::test]
    async fn bad_date_is_reported() {
        let api = api();
        let (out, route) = run_script(&api, Navigator::at(Route::DatePicker), "soon\n").await;
        assert!(out.contains("! Please pick a valid date"));
        assert_eq!(route, Route::DatePicker);
    }
}
