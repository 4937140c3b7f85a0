// File: crates/hms_booking/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use crate::handlers::{
    MessageResponse, OpenSlotsQuery, RegisterUserRequest, ReservationResponse, SlotResponse,
};
use crate::reminders::SweepReport;
use hms_common::models::{
    NewSlot, ProviderOverview, ReminderLead, Reservation, ReservedSlot, Role, Slot, UserProfile,
};
use utoipa::OpenApi;

#[utoipa::path(
    post,
    path = "/users",
    request_body(content = RegisterUserRequest, example = json!({
        "full_name": "Grace Hopper",
        "email": "grace@example.com"
    })),
    params(
        ("x-user-id" = String, Header, description = "Authenticated user id"),
        ("x-user-role" = String, Header, description = "provider or consumer")
    ),
    responses(
        (status = 201, description = "Profile stored, welcome notice sent", body = UserProfile),
        (status = 400, description = "Invalid name or email"),
        (status = 401, description = "Missing identity headers")
    ),
    tag = "Booking"
)]
fn doc_register_user_handler() {}

#[utoipa::path(
    get,
    path = "/slots",
    params(OpenSlotsQuery),
    responses(
        (status = 200, description = "Slots that can still be reserved", body = [Slot])
    ),
    tag = "Booking"
)]
fn doc_list_open_slots_handler() {}

#[utoipa::path(
    post,
    path = "/slots",
    request_body(content = NewSlot, example = json!({
        "date": "2030-01-11",
        "start_time": "10:00:00",
        "end_time": "10:30:00"
    })),
    responses(
        (status = 201, description = "Slot published", body = SlotResponse),
        (status = 400, description = "Slot in the past or start not before end"),
        (status = 403, description = "Caller is not a provider"),
        (status = 409, description = "Same slot already published")
    ),
    tag = "Booking"
)]
fn doc_create_slot_handler() {}

#[utoipa::path(
    delete,
    path = "/slots/{slot_id}",
    params(("slot_id" = String, Path, description = "Slot to delete")),
    responses(
        (status = 200, description = "Slot deleted", body = MessageResponse),
        (status = 404, description = "Slot not found"),
        (status = 409, description = "Cannot delete a booked slot.")
    ),
    tag = "Booking"
)]
fn doc_delete_slot_handler() {}

#[utoipa::path(
    post,
    path = "/slots/{slot_id}/reserve",
    params(("slot_id" = String, Path, description = "Slot to reserve")),
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 403, description = "Caller is not a consumer"),
        (status = 404, description = "Slot not found."),
        (status = 409, description = "Slot no longer available, or a booking is already held",
         example = json!({
             "error": { "message": "This slot is no longer available.", "code": 409 }
         })
        )
    ),
    tag = "Booking"
)]
fn doc_reserve_slot_handler() {}

#[utoipa::path(
    get,
    path = "/reservations/me",
    responses(
        (status = 200, description = "The caller's reservation", body = ReservedSlot),
        (status = 404, description = "No booking found.")
    ),
    tag = "Booking"
)]
fn doc_my_reservation_handler() {}

#[utoipa::path(
    delete,
    path = "/reservations/me",
    responses(
        (status = 200, description = "Reservation cancelled, slot freed", body = ReservationResponse),
        (status = 404, description = "No booking found.")
    ),
    tag = "Booking"
)]
fn doc_cancel_reservation_handler() {}

#[utoipa::path(
    get,
    path = "/providers/me/slots",
    responses((status = 200, description = "All slots of the provider", body = [Slot])),
    tag = "Provider"
)]
fn doc_provider_slots_handler() {}

#[utoipa::path(
    get,
    path = "/providers/me/reservations",
    responses((status = 200, description = "Bookings, newest first", body = [ReservedSlot])),
    tag = "Provider"
)]
fn doc_provider_reservations_handler() {}

#[utoipa::path(
    get,
    path = "/providers/me/overview",
    responses((status = 200, description = "Dashboard counters", body = ProviderOverview)),
    tag = "Provider"
)]
fn doc_provider_overview_handler() {}

#[utoipa::path(
    post,
    path = "/admin/reminders/{lead}",
    params(("lead" = String, Path, description = "24h or 1h")),
    responses(
        (status = 200, description = "Sweep result", body = SweepReport),
        (status = 400, description = "Unknown reminder type"),
        (status = 401, description = "Missing caller identity"),
        (status = 403, description = "Caller is not clinic staff")
    ),
    tag = "Admin"
)]
fn doc_run_reminders_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_register_user_handler,
        doc_list_open_slots_handler,
        doc_create_slot_handler,
        doc_delete_slot_handler,
        doc_reserve_slot_handler,
        doc_my_reservation_handler,
        doc_cancel_reservation_handler,
        doc_provider_slots_handler,
        doc_provider_reservations_handler,
        doc_provider_overview_handler,
        doc_run_reminders_handler,
    ),
    components(schemas(
        RegisterUserRequest,
        SlotResponse,
        ReservationResponse,
        MessageResponse,
        SweepReport,
        NewSlot,
        Slot,
        Reservation,
        ReservedSlot,
        ProviderOverview,
        ReminderLead,
        Role,
        UserProfile
    )),
    tags(
        (name = "Booking", description = "Slot listing, reservation and cancellation"),
        (name = "Provider", description = "Provider dashboard"),
        (name = "Admin", description = "Scheduled jobs")
    )
)]
pub struct BookingApiDoc;
