use axum::{
    extract::State,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use super::dto::{
    ProfileResponse, ProfileUpdatedResponse, PublicProfileResponse, UpdateProfileRequest,
};
use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser, repo_types::Role},
    error::AppError,
    extract::{AppJson, AppPath},
    state::AppState,
};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me).patch(update_me))
        .route("/users/public/:id", get(get_public_profile))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(delete_user))
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User with ID {id} not found"))
}

#[instrument(skip(state, user), fields(account_id = user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<AppJson<ProfileResponse>, AppError> {
    user.require(Role::ANY)?;
    let account = state
        .store
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| not_found(user.id))?;
    Ok(AppJson(account.into()))
}

#[instrument(skip(state, user, payload), fields(account_id = user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<AppJson<ProfileUpdatedResponse>, AppError> {
    user.require(Role::ANY)?;
    let update = payload.into_update()?;
    let account = state
        .store
        .update_profile(user.id, update)
        .await?
        .ok_or_else(|| not_found(user.id))?;
    info!("profile updated");
    Ok(AppJson(ProfileUpdatedResponse {
        message: "Profile updated successfully".into(),
        user: account.into(),
    }))
}

/// Another account as any signed-in user may see it: no email, no
/// verification state.
#[instrument(skip(state, user), fields(account_id = user.id))]
pub async fn get_public_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<AppJson<PublicProfileResponse>, AppError> {
    user.require(Role::ANY)?;
    let account = state.store.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(AppJson(account.into()))
}

#[instrument(skip(state, user), fields(account_id = user.id))]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<AppJson<Vec<ProfileResponse>>, AppError> {
    user.require(&[Role::Admin])?;
    let accounts = state.store.list().await?;
    Ok(AppJson(accounts.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user), fields(account_id = user.id))]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<AppJson<ProfileResponse>, AppError> {
    user.require(&[Role::Admin])?;
    let account = state.store.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(AppJson(account.into()))
}

#[instrument(skip(state, user), fields(account_id = user.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<AppJson<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;
    if !state.store.delete(id).await? {
        return Err(not_found(id));
    }
    info!(deleted_id = id, "user deleted");
    Ok(AppJson(MessageResponse::new("User deleted successfully")))
}
