#[cfg(test)]
mod tests {
    use crate::email::EmailRequest;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use hms_common::models::{AppointmentInfo, NotificationEvent, Recipient, ReminderLead, Role};
    use serde_json::json;
    use uuid::Uuid;

    fn recipient() -> Recipient {
        Recipient {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    fn appointment() -> AppointmentInfo {
        AppointmentInfo {
            reservation_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2030, 1, 11).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            starts_at: Utc.with_ymd_and_hms(2030, 1, 11, 10, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2030, 1, 11, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_welcome_payload_uses_role_display_name() {
        let event = NotificationEvent::Welcome {
            recipient: recipient(),
            role: Role::Provider,
        };
        let body = serde_json::to_value(EmailRequest::from_event(&event)).unwrap();

        assert_eq!(
            body,
            json!({
                "action": "SIGNUP_WELCOME",
                "recipient_email": "ada@example.com",
                "recipient_name": "Ada Lovelace",
                "role": "Doctor",
            })
        );
    }

    #[test]
    fn test_provider_confirmation_names_the_patient() {
        let event = NotificationEvent::ProviderReservationConfirmed {
            recipient: recipient(),
            consumer_name: "Alan Turing".to_string(),
            appointment: appointment(),
        };
        let body = serde_json::to_value(EmailRequest::from_event(&event)).unwrap();

        assert_eq!(
            body,
            json!({
                "action": "BOOKING_CONFIRMATION_DOCTOR",
                "recipient_email": "ada@example.com",
                "recipient_name": "Ada Lovelace",
                "patient_name": "Alan Turing",
                "date": "2030-01-11",
                "time": "10:00:00",
            })
        );
    }

    #[test]
    fn test_reminder_payload_carries_hours_before() {
        let event = NotificationEvent::Reminder {
            recipient: recipient(),
            provider_name: "Dr. House".to_string(),
            lead: ReminderLead::DayBefore,
            appointment: appointment(),
        };
        let request = EmailRequest::from_event(&event);

        assert_eq!(request.action, "APPOINTMENT_REMINDER");
        assert_eq!(request.doctor_name, Some("Dr. House"));
        assert_eq!(request.hours_before, Some(24));
        assert_eq!(request.patient_name, None);
    }

    #[test]
    fn test_cancellation_action() {
        let event = NotificationEvent::ReservationCancelled {
            recipient: recipient(),
            provider_name: "Dr. House".to_string(),
            appointment: appointment(),
        };
        let request = EmailRequest::from_event(&event);

        assert_eq!(request.action, "BOOKING_CANCELLED");
        assert_eq!(request.date.as_deref(), Some("2030-01-11"));
        assert_eq!(request.time.as_deref(), Some("10:00:00"));
    }
}
