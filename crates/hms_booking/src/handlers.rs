// File: crates/hms_booking/src/handlers.rs
use crate::engine::ReservationEngine;
use crate::reminders::{sweep_reminders, SweepReport};
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::Json,
};
use hms_common::models::{
    NewSlot, ProviderOverview, ReminderLead, Reservation, ReservedSlot, Role, Slot, UserProfile,
};
use hms_common::{forbidden, not_found, validation_error, HmsError};
use hms_db::BookingStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Header carrying the authenticated user id, set by the trusted upstream.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

const PROVIDER_ONLY: &str = "You don't have permission to access this page.";

// Shared state of the booking routes
pub struct BookingState<S: BookingStore> {
    pub engine: Arc<ReservationEngine<S>>,
}

impl<S: BookingStore> Clone for BookingState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

/// The caller as vouched for by the upstream session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    fn require(self, role: Role, message: &str) -> Result<Self, HmsError> {
        if self.role == role {
            Ok(self)
        } else {
            debug!("{} {} refused: needs {}", self.role, self.user_id, role);
            Err(forbidden(message))
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, HmsError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HmsError::AuthError(format!("Missing {} header", name)))
}

impl<St: Send + Sync> FromRequestParts<St> for Identity {
    type Rejection = HmsError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let user_id = Uuid::parse_str(header(parts, USER_ID_HEADER)?)
            .map_err(|_| HmsError::AuthError(format!("Invalid {} header", USER_ID_HEADER)))?;
        let role = Role::from_str(header(parts, USER_ROLE_HEADER)?).map_err(HmsError::AuthError)?;
        Ok(Identity { user_id, role })
    }
}

// --- Request and response bodies ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterUserRequest {
    pub full_name: String,
    pub email: String,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct OpenSlotsQuery {
    /// Only list slots of this provider
    pub provider_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SlotResponse {
    pub message: String,
    pub slot: Slot,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReservationResponse {
    pub message: String,
    pub reservation: Reservation,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

// --- Users ---

pub async fn register_user_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), HmsError> {
    let full_name = request.full_name.trim();
    let email = request.email.trim();
    if full_name.is_empty() {
        return Err(validation_error("Full name is required."));
    }
    if !email.contains('@') {
        return Err(validation_error("Enter a valid email address."));
    }

    let profile = state
        .engine
        .register_user(UserProfile {
            id: identity.user_id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            role: identity.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

// --- Slots ---

pub async fn list_open_slots_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    Query(query): Query<OpenSlotsQuery>,
) -> Result<Json<Vec<Slot>>, HmsError> {
    Ok(Json(state.engine.open_slots(query.provider_id).await?))
}

pub async fn create_slot_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
    Json(new_slot): Json<NewSlot>,
) -> Result<(StatusCode, Json<SlotResponse>), HmsError> {
    let identity = identity.require(Role::Provider, PROVIDER_ONLY)?;
    let slot = state.engine.create_slot(identity.user_id, new_slot).await?;
    Ok((
        StatusCode::CREATED,
        Json(SlotResponse {
            message: "Availability slot created successfully.".to_string(),
            slot,
        }),
    ))
}

pub async fn delete_slot_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HmsError> {
    let identity = identity.require(Role::Provider, PROVIDER_ONLY)?;
    state.engine.delete_slot(identity.user_id, slot_id).await?;
    Ok(Json(MessageResponse {
        message: "Availability slot deleted successfully.".to_string(),
    }))
}

// --- Reservations ---

pub async fn reserve_slot_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
    Path(slot_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReservationResponse>), HmsError> {
    let identity = identity.require(Role::Consumer, "Only patients can book appointments.")?;
    let reservation = state.engine.reserve(identity.user_id, slot_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            message: "Appointment booked successfully!".to_string(),
            reservation,
        }),
    ))
}

pub async fn my_reservation_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
) -> Result<Json<ReservedSlot>, HmsError> {
    let identity = identity.require(Role::Consumer, "Only patients have bookings.")?;
    state
        .engine
        .reservation_for_consumer(identity.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("No booking found."))
}

pub async fn cancel_reservation_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
) -> Result<Json<ReservationResponse>, HmsError> {
    let identity = identity.require(Role::Consumer, "Only patients can cancel bookings.")?;
    let reservation = state.engine.cancel(identity.user_id).await?;
    Ok(Json(ReservationResponse {
        message: "Booking cancelled successfully.".to_string(),
        reservation,
    }))
}

// --- Provider dashboard ---

pub async fn provider_slots_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
) -> Result<Json<Vec<Slot>>, HmsError> {
    let identity = identity.require(Role::Provider, PROVIDER_ONLY)?;
    Ok(Json(state.engine.provider_slots(identity.user_id).await?))
}

pub async fn provider_reservations_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
) -> Result<Json<Vec<ReservedSlot>>, HmsError> {
    let identity = identity.require(Role::Provider, PROVIDER_ONLY)?;
    let reservations = state.engine.provider_reservations(identity.user_id).await?;
    Ok(Json(reservations))
}

pub async fn provider_overview_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
) -> Result<Json<ProviderOverview>, HmsError> {
    let identity = identity.require(Role::Provider, PROVIDER_ONLY)?;
    Ok(Json(state.engine.provider_overview(identity.user_id).await?))
}

// --- Reminder trigger ---

/// Runs one reminder sweep on behalf of clinic staff.
pub async fn run_reminders_handler<S: BookingStore>(
    State(state): State<BookingState<S>>,
    identity: Identity,
    Path(lead): Path<String>,
) -> Result<Json<SweepReport>, HmsError> {
    identity.require(Role::Provider, PROVIDER_ONLY)?;
    let lead = ReminderLead::from_str(&lead).map_err(HmsError::ValidationError)?;
    Ok(Json(sweep_reminders(&state.engine, lead).await?))
}
