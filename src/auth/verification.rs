//! Email verification tokens: issue, consume once, resend while unverified.
use tracing::{info, instrument, warn};

use super::{repo::AccountStore, tokens::generate_token};
use crate::{error::AppError, state::AppState};

/// Store a fresh token on the account, replacing any earlier one.
pub async fn issue_for_account(store: &dyn AccountStore, account_id: i64) -> Result<String, AppError> {
    let token = generate_token();
    if !store.set_verification_token(account_id, &token).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    Ok(token)
}

/// Mark the token's holder verified. The check and the clear are one store
/// operation, so a token can succeed at most once.
pub async fn consume(store: &dyn AccountStore, token: &str) -> Result<i64, AppError> {
    match store.consume_verification_token(token).await? {
        Some(id) => {
            info!(account_id = id, "email verified");
            Ok(id)
        }
        None => {
            warn!("verification token not found");
            Err(AppError::BadRequest("Invalid or expired verification token".into()))
        }
    }
}

/// Reissue and send a token for an unverified account.
#[instrument(skip(st))]
pub async fn resend(st: &AppState, email: &str) -> Result<String, AppError> {
    let account = st
        .store
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User with this email not found".into()))?;

    if account.is_verified {
        return Err(AppError::BadRequest("Email is already verified".into()));
    }

    let token = issue_for_account(st.store.as_ref(), account.id).await?;
    st.mailer
        .send_verification_email(&account.email, &token)
        .await
        .map_err(|e| {
            warn!(error = %e, account_id = account.id, "verification email failed");
            AppError::Dispatch("Failed to send verification email".into())
        })?;
    info!(account_id = account.id, "verification email resent");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::NewAccount;

    async fn seed(st: &AppState, email: &str) -> i64 {
        st.store
            .insert(NewAccount {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                email: email.into(),
                password_hash: "$argon2id$unused".into(),
                verification_token: "initial-token".into(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn consume_is_single_use() {
        let fake = AppState::fake();
        let id = seed(&fake.state, "jane@x.com").await;

        assert_eq!(consume(fake.store.as_ref(), "initial-token").await.unwrap(), id);
        let account = fake.store.find_by_id(id).await.unwrap().unwrap();
        assert!(account.is_verified);
        assert_eq!(account.verification_token, None);

        let err = consume(fake.store.as_ref(), "initial-token").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let fake = AppState::fake();
        seed(&fake.state, "jane@x.com").await;
        let err = consume(fake.store.as_ref(), "initial-tokeN").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn concurrent_consumes_succeed_once() {
        let fake = AppState::fake();
        seed(&fake.state, "jane@x.com").await;
        let (a, b) = tokio::join!(
            consume(fake.store.as_ref(), "initial-token"),
            consume(fake.store.as_ref(), "initial-token"),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn resend_overwrites_previous_token() {
        let fake = AppState::fake();
        let id = seed(&fake.state, "jane@x.com").await;

        let fresh = resend(&fake.state, "jane@x.com").await.unwrap();
        assert_ne!(fresh, "initial-token");
        assert_eq!(fake.mailer.last_verification_token(), Some(fresh.clone()));

        assert!(consume(fake.store.as_ref(), "initial-token").await.is_err());
        assert_eq!(consume(fake.store.as_ref(), &fresh).await.unwrap(), id);
    }

    #[tokio::test]
    async fn resend_refuses_verified_or_unknown() {
        let fake = AppState::fake();
        seed(&fake.state, "jane@x.com").await;
        consume(fake.store.as_ref(), "initial-token").await.unwrap();

        let err = resend(&fake.state, "jane@x.com").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = resend(&fake.state, "nobody@x.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn dispatch_failure_keeps_new_token() {
        let fake = AppState::fake();
        let id = seed(&fake.state, "jane@x.com").await;
        fake.mailer.set_failing(true);

        let err = resend(&fake.state, "jane@x.com").await.unwrap_err();
        assert!(matches!(err, AppError::Dispatch(_)));

        let stored = fake.store.find_by_id(id).await.unwrap().unwrap();
        let token = stored.verification_token.expect("token committed");
        assert_ne!(token, "initial-token");
        assert_eq!(consume(fake.store.as_ref(), &token).await.unwrap(), id);
    }
}
