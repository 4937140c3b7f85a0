//! Wiring shared by the server and the `send-reminders` job.

use axum::{routing::get, Router};
use hms_booking::{
    routes::routes, sweep_reminders, EngineSettings, ReservationEngine, SweepReport, SystemClock,
};
use hms_common::error::{Context, HmsError};
use hms_common::models::ReminderLead;
use hms_config::AppConfig;
use hms_db::{
    BookingStore, BookingStoreFactory, DbClient, RepositoryFactory, SlotRepository,
    SqlBookingStore,
};
use hms_notify::NotificationDispatcher;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Connects to the configured database and makes sure the tables exist.
pub async fn connect_sql_store(config: &AppConfig) -> Result<SqlBookingStore, HmsError> {
    let client = DbClient::new(config)
        .await
        .context("Failed to connect to the database")?;
    if !client.is_healthy().await {
        warn!("Database health check failed, continuing anyway");
    }

    let store = BookingStoreFactory::new().create_repository(client);
    store
        .init_schema()
        .await
        .context("Failed to initialize the database schema")?;
    info!("SQL booking store ready");
    Ok(store)
}

/// Builds the reservation engine with the configured notification channels.
pub async fn build_engine<S: BookingStore>(
    config: &AppConfig,
    store: S,
) -> Result<Arc<ReservationEngine<S>>, HmsError> {
    let settings = EngineSettings::from_config(&config.booking)?;
    let notifier = Arc::new(NotificationDispatcher::from_config(config).await);
    info!(
        "Notification channels: {:?}, clinic time zone: {}",
        notifier.channel_names(),
        settings.time_zone
    );

    Ok(Arc::new(ReservationEngine::new(
        store,
        notifier,
        Arc::new(SystemClock),
        settings,
    )))
}

/// The HTTP application, nested under `/api`.
pub fn app_router<S: BookingStore>(engine: Arc<ReservationEngine<S>>) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the clinic booking API!" }))
        .merge(routes(engine));

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
}

/// Runs one sweep per lead, in order. A failing lead is logged and skipped.
pub async fn run_sweeps<S: BookingStore>(
    engine: &ReservationEngine<S>,
    leads: &[ReminderLead],
) -> Vec<Result<SweepReport, HmsError>> {
    let mut reports = Vec::with_capacity(leads.len());
    for &lead in leads {
        let result = sweep_reminders(engine, lead).await.map_err(HmsError::from);
        if let Err(err) = &result {
            error!("Reminder sweep for {} failed: {}", lead, err);
        }
        reports.push(result);
    }
    reports
}

/// Spawns the periodic reminder sweep.
pub fn spawn_sweeper<S: BookingStore>(
    engine: Arc<ReservationEngine<S>>,
    every: Duration,
) -> JoinHandle<()> {
    info!("Reminder sweep every {:?}", every);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            for report in run_sweeps(&engine, &ReminderLead::ALL).await.into_iter().flatten() {
                debug!(
                    "Sweep {}: {} due, {} sent",
                    report.lead, report.due, report.sent
                );
            }
        }
    })
}

/// The configured sweep period, if any. Zero disables the sweep.
pub fn sweep_interval(config: &AppConfig) -> Option<Duration> {
    match config.reminders.sweep_interval_secs {
        Some(0) => {
            warn!("reminders.sweep_interval_secs is 0, periodic sweep disabled");
            None
        }
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    }
}

/// Parses the `--type` argument of `send-reminders`.
pub fn parse_reminder_type(value: &str) -> Result<Vec<ReminderLead>, String> {
    if value.trim() == "all" {
        return Ok(ReminderLead::ALL.to_vec());
    }
    ReminderLead::from_str(value).map(|lead| vec![lead])
}

/// Reads `[--type 24h|1h|all]` from the command line arguments (program name excluded).
pub fn leads_from_args(args: &[String]) -> Result<Vec<ReminderLead>, String> {
    match args {
        [] => Ok(ReminderLead::ALL.to_vec()),
        [flag, value] if flag == "--type" => parse_reminder_type(value),
        [flag] if flag.starts_with("--type=") => {
            parse_reminder_type(flag.trim_start_matches("--type="))
        }
        _ => Err(format!("unexpected arguments: {}", args.join(" "))),
    }
}
