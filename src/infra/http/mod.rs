//! HTTP surface: routes, envelopes and request logging.

pub mod envelope;
mod health;
mod jokes;
mod middleware;
mod state;
mod users;

pub use state::HttpState;

use axum::{
    Json, Router,
    http::{Method, StatusCode, Uri},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::ErrorReport;
use envelope::ErrorEnvelope;
use middleware::trace_requests;

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/jokes", get(jokes::get_joke))
        .route("/user", get(users::list_users).post(users::create_user))
        .route(
            "/user/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/health", get(health::health))
        .fallback(route_not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(trace_requests))
}

async fn route_not_found(method: Method, uri: Uri) -> Response {
    let message = format!("Cannot {method} {}", uri.path());
    let body = ErrorEnvelope::new(StatusCode::NOT_FOUND, vec![message.clone()]);
    let mut response = (StatusCode::NOT_FOUND, Json(body)).into_response();
    ErrorReport::from_message("infra::http::fallback", StatusCode::NOT_FOUND, message)
        .attach(&mut response);
    response
}
