use appt_core::{
    config::config_from_env_values,
    constants::{API_BASE_URL_ENV, HTTP_TIMEOUT_ENV},
    HttpAppointmentApi, Navigator, Route,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod wizard;

use wizard::Wizard;

/// Main entry point for the interactive scheduling wizard
///
/// Opens on the home view, or on the view named by the first argument (e.g. `/patient-search`).
/// Unknown paths open the home view.
///
/// # Environment Variables
/// - `APPT_API_BASE_URL`: Appointment API base URL (required)
/// - `APPT_HTTP_TIMEOUT_SECS`: request timeout in seconds (default: 30)
/// - `RUST_LOG`: log filter; logs go to stderr
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appt_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = config_from_env_values(
        None,
        std::env::var(API_BASE_URL_ENV).ok(),
        std::env::var(HTTP_TIMEOUT_ENV).ok(),
    )?;
    tracing::info!("++ Starting appointment wizard against {}", cfg.base_url());

    let api = HttpAppointmentApi::new(Arc::new(cfg))?;
    let nav = match std::env::args().nth(1) {
        Some(path) => Navigator::at(Route::from_path(&path)),
        None => Navigator::new(),
    };
    let input = BufReader::new(tokio::io::stdin()).lines();

    Wizard::new(api, nav, input, std::io::stdout()).run().await
}
