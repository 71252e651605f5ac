use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::application::jokes::JokeError;
use crate::application::repos::RepoError;
use crate::application::users::UserError;
use crate::infra::error::InfraError;
use crate::infra::http::envelope::ErrorEnvelope;

/// Diagnostic chain attached to error responses for the request logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Users(#[from] UserError),
    #[error(transparent)]
    Jokes(#[from] JokeError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Users(UserError::NotFound { .. })
            | AppError::Users(UserError::Origin(RepoError::NotFound)) => StatusCode::NOT_FOUND,
            AppError::Users(UserError::InvalidInput(_))
            | AppError::Users(UserError::Origin(RepoError::InvalidInput { .. }))
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Users(UserError::Origin(RepoError::Duplicate { .. })) => StatusCode::CONFLICT,
            AppError::Users(UserError::Origin(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Jokes(JokeError::Origin(_)) => StatusCode::BAD_GATEWAY,
            AppError::Users(UserError::CacheWrite(_))
            | AppError::Jokes(JokeError::CacheWrite(_))
            | AppError::Infra(_)
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn presentation_messages(&self) -> Vec<String> {
        let message = match self {
            AppError::Users(UserError::NotFound { .. })
            | AppError::Users(UserError::Origin(RepoError::NotFound)) => "User not found".to_string(),
            AppError::Users(UserError::InvalidInput(err)) => err.message(),
            AppError::Users(UserError::Origin(RepoError::InvalidInput { message })) => {
                message.clone()
            }
            AppError::Users(UserError::Origin(RepoError::Duplicate { .. })) => {
                "A user with this email already exists".to_string()
            }
            AppError::Users(UserError::Origin(_)) => "User store temporarily unavailable".to_string(),
            AppError::Jokes(JokeError::Origin(_)) => "Failed to get joke".to_string(),
            AppError::Users(UserError::CacheWrite(_)) | AppError::Jokes(JokeError::CacheWrite(_)) => {
                "Failed to update cache".to_string()
            }
            AppError::Validation(message) => message.clone(),
            AppError::Infra(_) | AppError::Unexpected(_) => "Internal server error".to_string(),
        };
        vec![message]
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorEnvelope::new(status, self.presentation_messages());
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::application::jokes::JokeSourceError;
    use crate::cache::{CacheError, CacheWriteError};
    use crate::domain::error::DomainError;

    #[test]
    fn user_errors_map_to_statuses() {
        let cases = [
            (
                AppError::from(UserError::NotFound { id: Uuid::nil() }),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(UserError::InvalidInput(DomainError::validation(
                    "email",
                    "must be a valid address",
                ))),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(UserError::Origin(RepoError::Duplicate {
                    constraint: "users_email_key".into(),
                })),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(UserError::Origin(RepoError::Timeout)),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::from(UserError::CacheWrite(CacheWriteError {
                    op: "set",
                    key: "user:1".into(),
                    source: CacheError::transport("connection refused"),
                })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error}");
        }
    }

    #[test]
    fn upstream_joke_failure_is_bad_gateway() {
        let error = AppError::from(JokeError::Origin(JokeSourceError::Status { status: 503 }));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.presentation_messages(), vec!["Failed to get joke"]);
    }

    #[test]
    fn validation_message_names_the_field() {
        let error = AppError::from(UserError::InvalidInput(DomainError::validation(
            "first_name",
            "must not be empty",
        )));
        assert_eq!(error.presentation_messages(), vec!["first_name must not be empty"]);
    }

    #[test]
    fn report_walks_the_source_chain() {
        let error = AppError::from(UserError::Origin(RepoError::from_persistence("pool closed")));
        let report = ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &error);
        assert_eq!(
            report.messages,
            vec![
                "user store request failed".to_string(),
                "persistence error: pool closed".to_string(),
            ]
        );
    }
}
