// --- File: crates/hms_common/src/lib.rs ---

pub mod error; // Error handling
pub mod features; // Feature flag handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Domain data structures
pub mod services; // Service abstractions


// Re-export error types and utilities for easier access
pub use error::{forbidden, not_found, validation_error, Context, HmsError, HttpStatusCode};

// Re-export HTTP utilities for easier access
pub use http::client::create_client;

// Re-export logging utilities for easier access
pub use logging::{init, init_from_config, init_with_level};

// Re-export feature flag handling utilities for easier access
pub use features::{is_email_enabled, is_feature_enabled, is_gcal_enabled};

// This crate provides functionality shared by the booking, persistence and
// notification crates: domain models, the presentation error type, logging
// setup and the notification channel abstraction.
