//! Runtime feature flag handling.
//!
//! Optional integrations are switched on in two places: at compile time via
//! cargo features (`gcal`, `openapi`) and at runtime via the `use_*` flags in
//! the configuration. A runtime flag only takes effect when its configuration
//! section is present as well.

use hms_config::AppConfig;

/// Check if a feature is enabled at runtime based on configuration.
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `use_feature` - The configuration flag that enables the feature
/// * `feature_config` - The configuration section for the feature
pub fn is_feature_enabled<T>(
    _config: &AppConfig,
    use_feature: bool,
    feature_config: Option<&T>,
) -> bool {
    use_feature && feature_config.is_some()
}

/// Check if delivery through the external email service is enabled.
pub fn is_email_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(
        config,
        config.use_email,
        config.notifications.email_service_url.as_ref(),
    )
}

/// Check if the Google Calendar channel is enabled.
pub fn is_gcal_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config, config.use_gcal, config.gcal.as_ref())
}
