use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    auth::repo_types::{Account, ProfileUpdate, Role},
    error::AppError,
    validation::{normalize_email, Checks},
};

/// Profile as shown to the account itself and to administrators.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Account> for ProfileResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            first_name: a.first_name,
            last_name: a.last_name,
            role: a.role,
            bio: a.bio,
            avatar: a.avatar,
            is_verified: a.is_verified,
            created_at: a.created_at,
        }
    }
}

/// What other signed-in users may see of an account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Account> for PublicProfileResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            first_name: a.first_name,
            last_name: a.last_name,
            role: a.role,
            bio: a.bio,
            avatar: a.avatar,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub user: ProfileResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    /// Validate the fields that are present and turn them into a store update.
    pub fn into_update(self) -> Result<ProfileUpdate, AppError> {
        let first_name = self.first_name.map(|v| v.trim().to_owned());
        let last_name = self.last_name.map(|v| v.trim().to_owned());
        let email = self.email.as_deref().map(normalize_email);

        let mut checks = Checks::new();
        if let Some(v) = &first_name {
            checks.name("firstName", v);
        }
        if let Some(v) = &last_name {
            checks.name("lastName", v);
        }
        if let Some(v) = &email {
            checks.email("email", v);
        }
        checks.finish()?;

        Ok(ProfileUpdate {
            first_name,
            last_name,
            email,
            bio: self.bio,
        })
    }
}
