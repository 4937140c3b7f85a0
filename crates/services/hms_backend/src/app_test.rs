#[cfg(test)]
mod tests {
    use crate::app::{leads_from_args, parse_reminder_type, sweep_interval};
    use hms_common::models::ReminderLead;
    use hms_config::{AppConfig, ReminderConfig};
    use serde_json::json;
    use std::time::Duration;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_reminder_type_parsing() {
        assert_eq!(parse_reminder_type("24h").unwrap(), vec![ReminderLead::DayBefore]);
        assert_eq!(parse_reminder_type("1h").unwrap(), vec![ReminderLead::HourBefore]);
        assert_eq!(parse_reminder_type("all").unwrap(), ReminderLead::ALL.to_vec());
        assert!(parse_reminder_type("2h").is_err());
    }

    #[test]
    fn test_leads_from_args() {
        assert_eq!(leads_from_args(&[]).unwrap(), ReminderLead::ALL.to_vec());
        assert_eq!(
            leads_from_args(&args(&["--type", "1h"])).unwrap(),
            vec![ReminderLead::HourBefore]
        );
        assert_eq!(
            leads_from_args(&args(&["--type=24h"])).unwrap(),
            vec![ReminderLead::DayBefore]
        );
        assert!(leads_from_args(&args(&["--kind", "1h"])).is_err());
        assert!(leads_from_args(&args(&["--type"])).is_err());
    }

    #[test]
    fn test_sweep_interval() {
        let mut config: AppConfig =
            serde_json::from_value(json!({"server": {"host": "127.0.0.1", "port": 0}})).unwrap();
        assert_eq!(sweep_interval(&config), None);

        config.reminders = ReminderConfig {
            sweep_interval_secs: Some(300),
        };
        assert_eq!(sweep_interval(&config), Some(Duration::from_secs(300)));

        config.reminders.sweep_interval_secs = Some(0);
        assert_eq!(sweep_interval(&config), None);
    }
}
