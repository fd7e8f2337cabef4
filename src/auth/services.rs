use tracing::{info, warn};

use super::{
    dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse},
    password::{hash_password, verify_dummy, verify_password},
    repo::AccountStore,
    repo_types::NewAccount,
    tokens::generate_token,
};
use crate::{error::AppError, state::AppState};

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

/// Check credentials and open a session. `req` must already be validated.
pub async fn login(st: &AppState, req: &LoginRequest) -> Result<LoginResponse, AppError> {
    let Some(account) = st.store.find_by_email(&req.email).await? else {
        verify_dummy(&req.password);
        warn!(email = %req.email, "login unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&req.password, &account.password_hash)? {
        warn!(account_id = account.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let access_token = st.keys.sign(account.id, &account.email, account.role)?;
    info!(account_id = account.id, "user logged in");
    Ok(LoginResponse {
        access_token,
        user: PublicUser::from(&account),
    })
}

/// Create an unverified account, mail its verification token and open a
/// session. `req` must already be validated.
pub async fn register(st: &AppState, req: RegisterRequest) -> Result<RegisterResponse, AppError> {
    // Friendlier error for the common case; the unique index is what
    // actually guarantees it.
    if st.store.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let verification_token = generate_token();
    let account = st
        .store
        .insert(NewAccount {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash: hash_password(&req.password)?,
            verification_token: verification_token.clone(),
        })
        .await?;

    st.mailer
        .send_verification_email(&account.email, &verification_token)
        .await
        .map_err(|e| {
            warn!(error = %e, account_id = account.id, "verification email failed");
            AppError::Dispatch(
                "Account created but the verification email could not be sent".into(),
            )
        })?;

    let token = st.keys.sign(account.id, &account.email, account.role)?;
    info!(account_id = account.id, "user registered");
    Ok(RegisterResponse {
        message: "User registered successfully".into(),
        token,
        user: PublicUser::from(&account),
    })
}

/// Replace the password of a signed-in account after checking the old one.
pub async fn change_password(
    store: &dyn AccountStore,
    account_id: i64,
    old_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let account = store
        .find_by_id(account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(old_password, &account.password_hash)? {
        warn!(account_id, "change password: old password mismatch");
        return Err(AppError::Unauthorized("Invalid old password".into()));
    }

    let hash = hash_password(new_password)?;
    if !store.update_password(account_id, &hash).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(account_id, "password changed");
    Ok(())
}
