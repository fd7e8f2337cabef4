//! Password-reset tokens: one outstanding token per account, valid for an hour.
//!
//! Expiry is only ever checked when a token is presented. An expired token
//! stays stored until a later request overwrites it or it is consumed.
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use super::{password::hash_password, repo::AccountStore, tokens::generate_token};
use crate::{error::AppError, state::AppState};

pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// Issue a reset token for `email` and mail it. Unknown emails are NotFound.
pub async fn request(st: &AppState, email: &str) -> Result<String, AppError> {
    request_at(st, email, OffsetDateTime::now_utc()).await
}

#[instrument(skip(st, now))]
pub(crate) async fn request_at(
    st: &AppState,
    email: &str,
    now: OffsetDateTime,
) -> Result<String, AppError> {
    let account = st
        .store
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User with this email not found".into()))?;

    let token = generate_token();
    // Concurrent requests race here; the last write wins.
    if !st
        .store
        .set_reset_token(account.id, &token, now + RESET_TOKEN_TTL)
        .await?
    {
        return Err(AppError::NotFound("User with this email not found".into()));
    }

    st.mailer
        .send_password_reset_email(&account.email, &token)
        .await
        .map_err(|e| {
            warn!(error = %e, account_id = account.id, "password reset email failed");
            AppError::Dispatch("Failed to send password reset email".into())
        })?;
    info!(account_id = account.id, "password reset requested");
    Ok(token)
}

/// Set a new password using a reset token.
pub async fn consume(
    store: &dyn AccountStore,
    token: &str,
    new_password: &str,
) -> Result<i64, AppError> {
    consume_at(store, token, new_password, OffsetDateTime::now_utc()).await
}

/// Unknown and expired tokens fail identically.
pub(crate) async fn consume_at(
    store: &dyn AccountStore,
    token: &str,
    new_password: &str,
    now: OffsetDateTime,
) -> Result<i64, AppError> {
    let hash = hash_password(new_password)?;
    match store.consume_reset_token(token, &hash, now).await? {
        Some(id) => {
            info!(account_id = id, "password reset");
            Ok(id)
        }
        None => {
            warn!("reset token invalid or expired");
            Err(AppError::BadRequest("Invalid or expired token".into()))
        }
    }
}
