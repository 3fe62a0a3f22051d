use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Agenda endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/appointments", post(handler::schedule_handler))
        .route(
            "/v1/appointments/:id",
            get(handler::get_appointment_handler).delete(handler::unschedule_handler),
        )
        .route("/v1/appointments/:id/move", post(handler::move_handler))
        .route(
            "/v1/appointments/:id/invitations",
            get(handler::list_invitations_handler).post(handler::invite_handler),
        )
        .route(
            "/v1/appointments/:id/invitations/:invitation/uninvite",
            post(handler::uninvite_handler),
        )
        .route(
            "/v1/appointments/:id/invitations/:invitation/approve",
            post(handler::approve_handler),
        )
        .route(
            "/v1/appointments/:id/invitations/:invitation/deny",
            post(handler::deny_handler),
        )
        .route(
            "/v1/owners/:identity/appointments",
            get(handler::owner_appointments_handler),
        )
        .route("/v1/notifications", get(handler::notifications_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
