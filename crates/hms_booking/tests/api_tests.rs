//! The booking API exercised in-process through the axum router.


use axum::http::StatusCode;
use fixtures::{create_slot, create_test_app, create_user};
use hms_common::models::Role;
use hms_db::{ReservationLedger, SlotRepository, UserRepository};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_register_user() {
    let app = create_test_app();
    let user = hms_common::models::UserProfile {
        id: Uuid::new_v4(),
        full_name: String::new(),
        email: String::new(),
        role: Role::Consumer,
    };

    let (status, body) = app
        .call(
            "POST",
            "/api/users",
            Some(&user),
            Some(json!({"full_name": "Alan Turing", "email": "alan@example.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "consumer");
    let stored = app.engine.store().get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.email, "alan@example.com");

    let (status, body) = app
        .call(
            "POST",
            "/api/users",
            Some(&user),
            Some(json!({"full_name": "Alan Turing", "email": "not-an-email"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Enter a valid email address.");
}

#[tokio::test]
async fn test_booking_flow() {
    let app = create_test_app();
    let doctor = create_user(&app.engine, "Gregory House", Role::Provider).await;
    let patient = create_user(&app.engine, "Alan Turing", Role::Consumer).await;

    let (status, body) = app
        .call(
            "POST",
            "/api/slots",
            Some(&doctor),
            Some(json!({"date": "2030-01-11", "start_time": "10:00:00", "end_time": "10:30:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Availability slot created successfully.");
    let slot_id = body["slot"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.call("GET", "/api/slots", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/slots/{}/reserve", slot_id);
    let (status, body) = app.call("POST", &uri, Some(&patient), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Appointment booked successfully!");
    assert_eq!(body["reservation"]["slot_id"], slot_id);

    let (_, body) = app.call("GET", "/api/slots", None, None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app
        .call("GET", "/api/reservations/me", Some(&patient), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"]["id"], slot_id);
    assert_eq!(body["slot"]["booked"], true);

    let (status, body) = app
        .call("DELETE", "/api/reservations/me", Some(&patient), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Booking cancelled successfully.");

    let (status, body) = app
        .call("DELETE", "/api/reservations/me", Some(&patient), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "No booking found.");
    assert_eq!(body["error"]["code"], 404);
}

#[tokio::test]
async fn test_reserve_errors_map_to_statuses() {
    let app = create_test_app();
    let doctor = create_user(&app.engine, "Gregory House", Role::Provider).await;
    let first = create_user(&app.engine, "Alan Turing", Role::Consumer).await;
    let second = create_user(&app.engine, "Ada Lovelace", Role::Consumer).await;
    let slot = create_slot(&app.engine, &doctor, 11, 10).await;
    let other = create_slot(&app.engine, &doctor, 11, 11).await;

    let uri = format!("/api/slots/{}/reserve", slot.id);
    let (status, _) = app.call("POST", &uri, Some(&first), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.call("POST", &uri, Some(&second), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "This slot is no longer available.");

    let other_uri = format!("/api/slots/{}/reserve", other.id);
    let (status, body) = app.call("POST", &other_uri, Some(&first), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"]["message"],
        "You already have a booking. Cancel it first to book another."
    );

    let missing = format!("/api/slots/{}/reserve", Uuid::new_v4());
    let (status, body) = app.call("POST", &missing, Some(&second), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Slot not found.");

    let (status, body) = app.call("POST", &other_uri, Some(&doctor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "Only patients can book appointments.");

    let (status, _) = app.call("POST", &other_uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_provider_slot_management() {
    let app = create_test_app();
    let doctor = create_user(&app.engine, "Gregory House", Role::Provider).await;
    let patient = create_user(&app.engine, "Alan Turing", Role::Consumer).await;
    let free = create_slot(&app.engine, &doctor, 11, 10).await;
    let taken = create_slot(&app.engine, &doctor, 11, 11).await;
    app.engine.reserve(patient.id, taken.id).await.unwrap();

    let (status, body) = app
        .call(
            "POST",
            "/api/slots",
            Some(&doctor),
            Some(json!({"date": "2030-01-11", "start_time": "10:00:00", "end_time": "10:30:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"].is_string());

    let (status, body) = app
        .call(
            "POST",
            "/api/slots",
            Some(&doctor),
            Some(json!({"date": "2030-01-01", "start_time": "10:00:00", "end_time": "10:30:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Slot date must be in the future.");

    let (status, _) = app
        .call(
            "POST",
            "/api/slots",
            Some(&patient),
            Some(json!({"date": "2030-01-12", "start_time": "10:00:00", "end_time": "10:30:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("DELETE", &format!("/api/slots/{}", taken.id), Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Cannot delete a booked slot.");

    let (status, _) = app
        .call("DELETE", &format!("/api/slots/{}", free.id), Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.engine.store().get_slot(free.id).await.unwrap().is_none());

    let (status, body) = app
        .call("GET", "/api/providers/me/overview", Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots_count"], 1);
    assert_eq!(body["booked_slots_count"], 1);
    assert_eq!(body["total_bookings"], 1);

    let (status, body) = app
        .call("GET", "/api/providers/me/reservations", Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["reservation"]["consumer_id"], patient.id.to_string());

    let (status, body) = app
        .call("GET", "/api/providers/me/slots", Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reminder_trigger() {
    let app = create_test_app();
    let doctor = create_user(&app.engine, "Gregory House", Role::Provider).await;
    let patient = create_user(&app.engine, "Alan Turing", Role::Consumer).await;
    let slot = create_slot(&app.engine, &doctor, 11, 10).await;
    let reservation = app.engine.reserve(patient.id, slot.id).await.unwrap();

    let (status, _) = app.call("POST", "/api/admin/reminders/24h", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .call("POST", "/api/admin/reminders/24h", Some(&patient), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!app
        .engine
        .store()
        .get_reservation(reservation.id)
        .await
        .unwrap()
        .unwrap()
        .reminder_sent_24h);

    let (status, body) = app
        .call("POST", "/api/admin/reminders/24h", Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"lead": "24h", "due": 1, "sent": 1}));
    let stored = app
        .engine
        .store()
        .get_reservation(reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.reminder_sent_24h);

    let (status, _) = app
        .call("POST", "/api/admin/reminders/2h", Some(&doctor), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
