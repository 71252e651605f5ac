use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::domain::users::{NewUser, UserChanges, UserRecord};

use super::envelope::Reply;
use super::state::HttpState;

fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("`{raw}` is not a valid user id")))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

pub async fn create_user(
    State(state): State<HttpState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Reply<UserRecord>, AppError> {
    let input = json_body(payload)?;
    let user = state.users.create_user(input).await?;
    Ok(Reply::created("User created successfully", user))
}

pub async fn list_users(
    State(state): State<HttpState>,
) -> Result<Reply<Vec<UserRecord>>, AppError> {
    let listing = state.users.get_all_users().await?;
    Ok(Reply::ok("Users fetched successfully", listing.value).cache_status(listing.source))
}

pub async fn get_user(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Reply<UserRecord>, AppError> {
    let id = parse_user_id(&id)?;
    let user = state.users.get_user(id).await?;
    Ok(Reply::ok("User fetched successfully", user.value).cache_status(user.source))
}

pub async fn update_user(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    payload: Result<Json<UserChanges>, JsonRejection>,
) -> Result<Reply<UserRecord>, AppError> {
    let id = parse_user_id(&id)?;
    let changes = json_body(payload)?;
    let user = state.users.update_user(id, changes).await?;
    Ok(Reply::ok("User updated successfully", user))
}

pub async fn delete_user(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Reply<UserRecord>, AppError> {
    let id = parse_user_id(&id)?;
    let user = state.users.delete_user(id).await?;
    Ok(Reply::ok("User deleted successfully", user))
}
