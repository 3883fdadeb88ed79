//! REST endpoint handlers.
//!
//! Every handler is a thin translation between HTTP and
//! [`CampusStore`](campus_registry::CampusStore) calls. Status codes for
//! failures come from [`ApiError`]. Routes marked *admin* need an
//! [`AdminUser`]; the others that act on someone's behalf need an
//! [`ActingUser`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness check |
//! | `GET` | `/api/events` | List events (`?category=`) |
//! | `POST` | `/api/events` | Create an event (admin) |
//! | `GET` | `/api/events/{id}` | Get one event |
//! | `DELETE` | `/api/events/{id}` | Delete an event without registrations (admin) |
//! | `GET` | `/api/events/{id}/registrations` | Registrations for an event |
//! | `POST` | `/api/registrations` | Register the acting user |
//! | `DELETE` | `/api/registrations/{id}` | Cancel a registration (its holder or an admin) |
//! | `GET` | `/api/registrations/user/{id}` | Registrations of a user |
//! | `GET` | `/api/registrations/student/{studentNo}` | Registrations of a student number |
//! | `GET` | `/api/my/registrations` | Registrations of the acting user |
//! | `GET` | `/api/users` | List accounts |
//! | `POST` | `/api/users` | Create an account (admin) |
//! | `GET` | `/api/users/{id}` | Get one account |
//! | `GET` | `/api/current-user`, `/api/currentUser` | The acting user's account |
//! | `GET` | `/api/audit` | Seat-accounting audit |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use campus_types::{
    Category, EventFilter, EventId, NewEvent, NewUser, RegisterRequest, RegistrationId, UserId,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ActingUser, AdminUser};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/events`.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Only return events of this category (`akademik`, `sosyal`, ...).
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// List events ordered by date and time, optionally filtered by category.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = params
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "all")
        .map(|c| {
            Category::parse(c).ok_or_else(|| ApiError::InvalidQuery(format!("unknown category {c}")))
        })
        .transpose()?;

    let events = state.store.list_events(EventFilter { category }).await?;
    tracing::debug!(count = events.len(), ?category, "Listed events");
    Ok(Json(events))
}

/// Create an event. Responds `201 Created` with the stored event.
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) = payload?;
    let event = state.store.create_event(draft).await?;
    tracing::info!(event_id = %event.id, admin_id = %admin.id, "Event created over HTTP");
    Ok((StatusCode::CREATED, Json(event)))
}

/// Fetch one event.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = EventId::from(parse_uuid(&id_str)?);
    let event = state.store.get_event(event_id).await?;
    Ok(Json(event))
}

/// Delete an event. Refused with `409 Conflict` while seats are taken.
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = EventId::from(parse_uuid(&id_str)?);
    state.store.delete_event(event_id).await?;
    tracing::info!(%event_id, admin_id = %admin.id, "Event deleted over HTTP");
    Ok(StatusCode::NO_CONTENT)
}

/// Registrations for one event, oldest first.
pub async fn list_event_registrations(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = EventId::from(parse_uuid(&id_str)?);
    let registrations = state.store.list_by_event(event_id).await?;
    tracing::debug!(%event_id, count = registrations.len(), "Listed event registrations");
    Ok(Json(registrations))
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

/// Register the acting user for the event named in the body.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ActingUser(user): ActingUser,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let registration = state.store.register(request.event_id, user.id).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// Cancel a registration, releasing its seat. Only the holder or an
/// administrator may cancel.
pub async fn cancel_registration(
    State(state): State<Arc<AppState>>,
    ActingUser(user): ActingUser,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let registration_id = RegistrationId::from(parse_uuid(&id_str)?);
    let registration = state.store.get_registration(registration_id).await?;
    if registration.user_id != user.id && !user.is_admin() {
        tracing::warn!(
            %registration_id,
            user_id = %user.id,
            "Cancel of another user's seat refused"
        );
        return Err(ApiError::Forbidden(format!(
            "registration {registration_id} belongs to another user"
        )));
    }

    state.store.cancel(registration_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Registrations held by one user, newest first.
pub async fn list_user_registrations(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from(parse_uuid(&id_str)?);
    let registrations = state.store.list_by_user(user_id).await?;
    tracing::debug!(%user_id, count = registrations.len(), "Listed user registrations");
    Ok(Json(registrations))
}

/// Registrations held by the account with a student number, newest first.
pub async fn list_student_registrations(
    State(state): State<Arc<AppState>>,
    Path(student_no): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.find_user_by_student_no(&student_no).await?;
    let registrations = state.store.list_by_user(user.id).await?;
    Ok(Json(registrations))
}

/// Registrations held by the acting user, newest first.
pub async fn my_registrations(
    State(state): State<Arc<AppState>>,
    ActingUser(user): ActingUser,
) -> Result<impl IntoResponse, ApiError> {
    let registrations = state.store.list_by_user(user.id).await?;
    Ok(Json(registrations))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// List every account.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users))
}

/// Create an account. Responds `201 Created` with the stored account.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let user = state.store.create_user(input).await?;
    tracing::debug!(user_id = %user.id, admin_id = %admin.id, "Account created over HTTP");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Fetch one account.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::from(parse_uuid(&id_str)?);
    let user = state.store.get_user(user_id).await?;
    Ok(Json(user))
}

/// The acting user's own account.
pub async fn current_user(ActingUser(user): ActingUser) -> impl IntoResponse {
    Json(user)
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Run the seat-accounting audit over a consistent snapshot.
pub async fn audit(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let result = state.store.audit().await?;
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID from a path segment, returning an [`ApiError`] on failure.
fn parse_uuid(s: &str) -> Result<Uuid, ApiError> {
    s.parse::<Uuid>()
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}
