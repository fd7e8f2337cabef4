use serde::{Deserialize, Serialize};

use super::repo_types::{Account, Role};
use crate::{
    error::AppError,
    validation::{normalize_email, Checks, PasswordPolicy},
};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterRequest {
    /// Normalizes the email in place, then checks every field.
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email);
        self.first_name = self.first_name.trim().to_owned();
        self.last_name = self.last_name.trim().to_owned();
        Checks::new()
            .name("firstName", &self.first_name)
            .name("lastName", &self.last_name)
            .email("email", &self.email)
            .password("password", &self.password, PasswordPolicy::STRONG)
            .required("confirmPassword", &self.confirm_password)
            .matches(
                "confirmPassword",
                &self.confirm_password,
                "password",
                &self.password,
            )
            .finish()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email);
        Checks::new()
            .email("email", &self.email)
            .required("password", &self.password)
            .finish()
    }
}

/// Single-field body shared by verify-email and anything else keyed by token.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

impl TokenRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Checks::new().required("token", &self.token).finish()
    }
}

/// Body for resend-verification and forgot-password.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

impl EmailRequest {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email);
        Checks::new().email("email", &self.email).finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Checks::new()
            .required("oldPassword", &self.old_password)
            .password("newPassword", &self.new_password, PasswordPolicy::BASIC)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Checks::new()
            .required("token", &self.token)
            .password("newPassword", &self.new_password, PasswordPolicy::BASIC)
            .finish()
    }
}

/// Public part of the account returned with a session token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&Account> for PublicUser {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            email: a.email.clone(),
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            role: a.role,
        }
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: PublicUser,
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
