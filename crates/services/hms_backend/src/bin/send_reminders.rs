//! One-shot reminder sweep against the SQL store, for cron.
//!
//! Usage: send-reminders [--type 24h|1h|all]

use hms_backend::app::{build_engine, connect_sql_store, leads_from_args, run_sweeps};
use hms_common::error::{Context, HmsError};
use hms_common::models::ReminderLead;
use hms_config::load_config;
use std::env;
use tracing::error;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let leads = match leads_from_args(&args) {
        Ok(leads) => leads,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Usage: send-reminders [--type 24h|1h|all]");
            std::process::exit(2);
        }
    };

    match run(&leads).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!("send-reminders failed: {}", err);
            eprintln!("send-reminders failed: {}", err);
            std::process::exit(1);
        }
    }
}

/// Returns false when at least one sweep failed.
async fn run(leads: &[ReminderLead]) -> Result<bool, HmsError> {
    let config = load_config().context("Failed to load config")?;
    let _log_guard = hms_common::logging::init_from_config(&config.logging);
    if config.database.is_none() {
        return Err(HmsError::ConfigError(
            "send-reminders needs a [database] section".to_string(),
        ));
    }

    let store = connect_sql_store(&config).await?;
    let engine = build_engine(&config, store).await?;

    let mut all_ok = true;
    for (lead, result) in leads.iter().zip(run_sweeps(&engine, leads).await) {
        match result {
            Ok(report) => println!(
                "{} reminders: {} due, {} sent",
                report.lead, report.due, report.sent
            ),
            Err(err) => {
                println!("{} reminders: failed ({})", lead, err);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}
