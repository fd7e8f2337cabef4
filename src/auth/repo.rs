use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;

use crate::auth::repo_types::{Account, NewAccount, ProfileUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique index on the normalized email rejected the write.
    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted account records. Every method is a single statement, so the
/// token consumes below check and clear in one step.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>>;

    async fn list(&self) -> StoreResult<Vec<Account>>;

    /// Insert a new account; a normalized-email collision is `DuplicateEmail`.
    async fn insert(&self, account: NewAccount) -> StoreResult<Account>;

    /// Returns `false` when no account has this id.
    async fn set_verification_token(&self, id: i64, token: &str) -> StoreResult<bool>;

    /// Mark the holder of `token` verified and clear the token.
    /// Returns the account id, or `None` if nothing matched.
    async fn consume_verification_token(&self, token: &str) -> StoreResult<Option<i64>>;

    /// Overwrite any outstanding reset token/expiry pair.
    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<bool>;

    /// Swap in `password_hash` for the holder of `token` if its expiry is
    /// strictly after `now`, clearing the reset pair. Expired tokens are left
    /// in place.
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<i64>>;

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool>;

    async fn update_profile(&self, id: i64, update: ProfileUpdate)
        -> StoreResult<Option<Account>>;

    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, email, password_hash, role, avatar, bio, \
     is_verified, verification_token, reset_token, reset_token_expiry, created_at, updated_at";

fn map_unique(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(accounts)
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, verification_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.verification_token)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique)
    }

    async fn set_verification_token(&self, id: i64, token: &str) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET verification_token = $2, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn consume_verification_token(&self, token: &str) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
               SET is_verified = TRUE, verification_token = NULL, updated_at = now()
             WHERE verification_token = $1
            RETURNING id
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(id)
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET reset_token = $2, reset_token_expiry = $3, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
               SET password_hash = $2,
                   reset_token = NULL,
                   reset_token_expiry = NULL,
                   updated_at = now()
             WHERE reset_token = $1
               AND reset_token_expiry > $3
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        Ok(id)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE users
               SET first_name = COALESCE($2, first_name),
                   last_name  = COALESCE($3, last_name),
                   email      = COALESCE($4, email),
                   bio        = COALESCE($5, bio),
                   updated_at = now()
             WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.email)
        .bind(update.bio)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
