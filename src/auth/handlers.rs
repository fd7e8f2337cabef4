use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Router,
};
use tracing::instrument;

use super::{
    dto::{
        ChangePasswordRequest, EmailRequest, LoginRequest, LoginResponse, MessageResponse,
        RegisterRequest, RegisterResponse, ResetPasswordRequest, TokenRequest,
    },
    extractors::AuthUser,
    repo_types::Role,
    reset, services, verification,
};
use crate::{error::AppError, extract::AppJson, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
        .route("/auth/change-password", patch(change_password))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<LoginRequest>,
) -> Result<AppJson<LoginResponse>, AppError> {
    payload.validate()?;
    Ok(AppJson(services::login(&state, &payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, AppJson<RegisterResponse>), AppError> {
    payload.validate()?;
    let res = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, AppJson(res)))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<AppJson<MessageResponse>, AppError> {
    payload.validate()?;
    verification::consume(state.store.as_ref(), &payload.token).await?;
    Ok(AppJson(MessageResponse::new("Email verified successfully")))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<EmailRequest>,
) -> Result<AppJson<MessageResponse>, AppError> {
    payload.validate()?;
    verification::resend(&state, &payload.email).await?;
    Ok(AppJson(MessageResponse::new("Verification email sent")))
}

#[instrument(skip(state, user, payload), fields(account_id = user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<AppJson<MessageResponse>, AppError> {
    user.require(Role::ANY)?;
    payload.validate()?;
    services::change_password(
        state.store.as_ref(),
        user.id,
        &payload.old_password,
        &payload.new_password,
    )
    .await?;
    Ok(AppJson(MessageResponse::new("Password changed successfully")))
}

/// Unknown emails get a 404, which tells a caller whether an account exists.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<EmailRequest>,
) -> Result<AppJson<MessageResponse>, AppError> {
    payload.validate()?;
    reset::request(&state, &payload.email).await?;
    Ok(AppJson(MessageResponse::new("Password reset email sent")))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<AppJson<MessageResponse>, AppError> {
    payload.validate()?;
    reset::consume(state.store.as_ref(), &payload.token, &payload.new_password).await?;
    Ok(AppJson(MessageResponse::new(
        "Password has been reset successfully",
    )))
}
