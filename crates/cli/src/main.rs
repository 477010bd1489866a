use appt_core::{
    config::config_from_env_values, constants::API_BASE_URL_ENV, constants::HTTP_TIMEOUT_ENV,
    display, ensure_bookable, AppointmentApi, BookingRequest, CalendarDate, CriteriaField,
    DatePicker, HttpAppointmentApi, Navigator, NonEmptyText, Operation, PageControl,
    PatientSearch, Route, SchedulerError, SessionProvider, SlotsView, SortKey,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "appt")]
#[command(about = "Patient appointment scheduling CLI")]
struct Cli {
    /// Appointment API base URL (overrides APPT_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a patient (at least one criterion required)
    Search {
        #[arg(long, default_value = "")]
        firstname: String,
        #[arg(long, default_value = "")]
        lastname: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        dob: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// Print the patient resource as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// List slots for a date
    Slots {
        /// Date (YYYY-MM-DD)
        date: String,
        /// Sort key: date or status
        #[arg(long, default_value = "date")]
        sort: SortKey,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Pages of five slots to show
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Show every slot
        #[arg(long, conflicts_with = "pages")]
        all: bool,
    },
    /// Book a free slot for a patient
    Book {
        /// Date the slot is on (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot_id: String,
        #[arg(long)]
        patient_id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appt_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'appt --help' for commands");
        return Ok(());
    };

    let cfg = config_from_env_values(
        cli.base_url,
        std::env::var(API_BASE_URL_ENV).ok(),
        std::env::var(HTTP_TIMEOUT_ENV).ok(),
    )?;
    let api = HttpAppointmentApi::new(Arc::new(cfg))?;

    let outcome = match command {
        Commands::Search {
            firstname,
            lastname,
            dob,
            phone,
            json,
        } => search(&api, [firstname, lastname, dob, phone], json).await,
        Commands::Slots {
            date,
            sort,
            desc,
            pages,
            all,
        } => slots(&api, &date, sort, desc, if all { None } else { Some(pages) }).await,
        Commands::Book {
            date,
            slot_id,
            patient_id,
        } => book(&api, &date, &slot_id, &patient_id).await,
    };

    outcome.map_err(|e| {
        tracing::debug!(error = ?e, "command failed");
        anyhow::anyhow!(e.user_message())
    })
}

async fn search<A: AppointmentApi>(
    api: &A,
    values: [String; 4],
    json: bool,
) -> Result<(), SchedulerError> {
    let session = SessionProvider::start();
    let nav = Navigator::at(Route::PatientSearch);
    let mut view = PatientSearch::new(session.handle());

    for (field, value) in CriteriaField::ALL.into_iter().zip(values) {
        view.update_criterion(field, value)?;
    }

    let Some(patient) = view.search(api, &nav).await? else {
        return Ok(());
    };

    if json {
        let rendered =
            fhir::Patient::render(&patient).map_err(|e| SchedulerError::Request {
                operation: Operation::SearchPatients,
                source: e.into(),
            })?;
        println!("{rendered}");
    } else {
        println!("Patient Found");
        println!("ID: {}", patient.id);
        for line in display::patient_card(&patient) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn slots<A: AppointmentApi>(
    api: &A,
    date: &str,
    sort: SortKey,
    desc: bool,
    pages: Option<usize>,
) -> Result<(), SchedulerError> {
    let session = SessionProvider::start();
    let mut nav = Navigator::at(Route::DatePicker);
    let mut picker = DatePicker::new(session.handle());

    if !picker.check_slots(api, &mut nav, date).await? {
        return Ok(());
    }
    let mut view = SlotsView::enter(session.handle(), &mut nav)?;

    // The view starts on date ascending; choosing walks it to the requested order.
    if sort != view.sort_order().key {
        view.choose_sort(sort);
    }
    if desc {
        view.choose_sort(sort);
    }

    match pages {
        Some(pages) => {
            for _ in 1..pages {
                view.show_more();
            }
        }
        None => {
            while view.page_control() == Some(PageControl::ShowMore) {
                view.show_more();
            }
        }
    }

    println!("Available Slots for {}", view.date());
    for slot in view.visible_slots() {
        println!(
            "{:<12} {} [{}]",
            slot.id,
            display::slot_line(slot),
            view.slot_action(slot).label()
        );
    }
    println!("{} of {} shown", view.visible_slots().len(), view.total());
    Ok(())
}

async fn book<A: AppointmentApi>(
    api: &A,
    date: &str,
    slot_id: &str,
    patient_id: &str,
) -> Result<(), SchedulerError> {
    let date = CalendarDate::parse(date)
        .map_err(|e| SchedulerError::Validation(format!("invalid date: {e}")))?;
    let patient_id = NonEmptyText::new(patient_id)
        .map_err(|_| SchedulerError::Validation("patient id cannot be empty".into()))?;

    let slots = api
        .list_slots(date)
        .await
        .map_err(|source| SchedulerError::Request {
            operation: Operation::ListSlots,
            source,
        })?;
    let slot = ensure_bookable(&slots, slot_id)?;

    let request = BookingRequest {
        patient_id,
        slot_id: slot.id.clone(),
    };
    let details = api
        .book_appointment(&request)
        .await
        .map_err(|source| SchedulerError::Request {
            operation: Operation::BookAppointment,
            source,
        })?;

    println!("{}", appt_core::constants::BOOKING_SUCCESS_MESSAGE);
    println!("Appointment ID: {}", details.id);
    println!("Patient ID: {}", request.patient_id);
    let when = details
        .start()
        .map(|start| display::format_instant(&start))
        .unwrap_or_else(|| date.to_string());
    println!("Appointment Date: {when}");
    Ok(())
}
