use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{jwt::JwtKeys, repo_types::Role};
use crate::{error::AppError, state::AppState};

/// Identity of the caller, resolved from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// Resolve an `Authorization` header value into an identity.
/// Any failure is `Unauthorized`; nothing here looks at roles.
pub fn authenticate(keys: &JwtKeys, header: Option<&str>) -> Result<AuthUser, AppError> {
    let header =
        header.ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    // Expect "Bearer <token>"
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let identity = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    Ok(AuthUser {
        id: identity.id,
        email: identity.email,
        role: identity.role,
    })
}

/// Allow iff `role` is in `allowed`.
pub fn authorize(role: Role, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role {} is not allowed to access this resource",
            role.as_str()
        )))
    }
}

impl AuthUser {
    pub fn require(&self, allowed: &[Role]) -> Result<&Self, AppError> {
        authorize(self.role, allowed).map_err(|e| {
            warn!(account_id = self.id, role = self.role.as_str(), "forbidden");
            e
        })?;
        Ok(self)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        authenticate(&state.keys, header)
    }
}
