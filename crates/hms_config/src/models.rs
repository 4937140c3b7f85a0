// --- File: crates/hms_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://data/hms.db, loaded via HMS_DATABASE__URL
    #[serde(default)]
    pub max_connections: Option<u32>,
}

// --- Booking Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// IANA time zone the slot dates and times are expressed in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Lead time of the short reminder class.
    #[serde(default = "default_hour_reminder_lead")]
    pub hour_reminder_lead_hours: i64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            hour_reminder_lead_hours: default_hour_reminder_lead(),
        }
    }
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_hour_reminder_lead() -> i64 {
    1
}

// --- Notification Config ---
// The email service endpoint replaces the global EMAIL_SERVICE_URL setting.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationConfig {
    pub email_service_url: Option<String>,
    #[serde(default = "default_notification_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            email_service_url: None,
            timeout_secs: default_notification_timeout(),
        }
    }
}

fn default_notification_timeout() -> u64 {
    5
}

// --- Reminder Sweep Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ReminderConfig {
    /// When set, the backend runs the reminder sweep on this interval.
    pub sweep_interval_secs: Option<u64>,
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily rolling log files; stdout only when absent.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// --- Google Calendar Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub key_path: Option<String>,    // service account key, may be "secret_from_env"
    pub calendar_id: Option<String>, // calendar receiving the appointment events
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_email: bool,
    #[serde(default)]
    pub use_gcal: bool,

    // --- Sections with defaults ---
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
}
