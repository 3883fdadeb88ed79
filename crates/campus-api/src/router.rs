//! Axum router construction.
//!
//! Assembles every route into a single [`Router`] with CORS enabled for
//! the browser client and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router. See [`handlers`] for the endpoint table.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Events
        .route(
            "/api/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route(
            "/api/events/{id}",
            get(handlers::get_event).delete(handlers::delete_event),
        )
        .route(
            "/api/events/{id}/registrations",
            get(handlers::list_event_registrations),
        )
        // Registrations
        .route("/api/registrations", post(handlers::register))
        .route(
            "/api/registrations/{id}",
            delete(handlers::cancel_registration),
        )
        .route(
            "/api/registrations/user/{id}",
            get(handlers::list_user_registrations),
        )
        .route(
            "/api/registrations/student/{student_no}",
            get(handlers::list_student_registrations),
        )
        .route("/api/my/registrations", get(handlers::my_registrations))
        // Accounts
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/users/{id}", get(handlers::get_user))
        .route("/api/current-user", get(handlers::current_user))
        .route("/api/currentUser", get(handlers::current_user))
        // Audit
        .route("/api/audit", get(handlers::audit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
