use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;

use super::state::HttpState;

/// 204 when both the cache and the user store answer, 503 otherwise.
pub async fn health(State(state): State<HttpState>) -> Response {
    let cache_ok = state.cache.ping().await;
    let origin = state.users.check_origin().await;

    match (cache_ok, origin) {
        (true, Ok(())) => StatusCode::NO_CONTENT.into_response(),
        (false, _) => unavailable(ErrorReport::from_message(
            "infra::http::health",
            StatusCode::SERVICE_UNAVAILABLE,
            "cache did not answer ping",
        )),
        (true, Err(err)) => unavailable(ErrorReport::from_error(
            "infra::http::health",
            StatusCode::SERVICE_UNAVAILABLE,
            &err,
        )),
    }
}

fn unavailable(report: ErrorReport) -> Response {
    let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
    report.attach(&mut response);
    response
}
