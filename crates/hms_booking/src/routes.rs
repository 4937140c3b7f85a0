// --- File: crates/hms_booking/src/routes.rs ---

use crate::engine::ReservationEngine;
use crate::handlers::{
    cancel_reservation_handler, create_slot_handler, delete_slot_handler,
    list_open_slots_handler, my_reservation_handler, provider_overview_handler,
    provider_reservations_handler, provider_slots_handler, register_user_handler,
    reserve_slot_handler, run_reminders_handler, BookingState,
};
use axum::{
    routing::{delete, get, post},
    Router,
};
use hms_db::BookingStore;
use std::sync::Arc;

/// Creates a router containing all booking routes, to be nested under `/api`.
pub fn routes<S: BookingStore>(engine: Arc<ReservationEngine<S>>) -> Router {
    let state = BookingState { engine };

    Router::new()
        .route("/users", post(register_user_handler::<S>))
        .route(
            "/slots",
            get(list_open_slots_handler::<S>).post(create_slot_handler::<S>),
        )
        .route("/slots/{slot_id}", delete(delete_slot_handler::<S>))
        .route("/slots/{slot_id}/reserve", post(reserve_slot_handler::<S>))
        .route(
            "/reservations/me",
            get(my_reservation_handler::<S>).delete(cancel_reservation_handler::<S>),
        )
        .route("/providers/me/slots", get(provider_slots_handler::<S>))
        .route(
            "/providers/me/reservations",
            get(provider_reservations_handler::<S>),
        )
        .route("/providers/me/overview", get(provider_overview_handler::<S>))
        .route("/admin/reminders/{lead}", post(run_reminders_handler::<S>))
        .with_state(state)
}
