//! In-memory `AccountStore` with the same matching rules as the Postgres one.
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::{AccountStore, StoreError, StoreResult};
use super::repo_types::{Account, NewAccount, ProfileUpdate, Role};

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
    last_id: AtomicI64,
}

impl MemoryAccountStore {
    /// Test hook: change a role directly, as an administrator would.
    pub fn set_role(&self, id: i64, role: Role) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(a) = accounts.iter_mut().find(|a| a.id == id) {
            a.role = role;
        }
    }
}

fn email_taken(accounts: &[Account], email: &str, except: Option<i64>) -> bool {
    accounts
        .iter()
        .any(|a| Some(a.id) != except && a.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn insert(&self, account: NewAccount) -> StoreResult<Account> {
        let mut accounts = self.accounts.lock().unwrap();
        if email_taken(&accounts, &account.email, None) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Account {
            id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            password_hash: account.password_hash,
            role: Role::default(),
            avatar: None,
            bio: None,
            is_verified: false,
            verification_token: Some(account.verification_token),
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        accounts.push(created.clone());
        Ok(created)
    }

    async fn set_verification_token(&self, id: i64, token: &str) -> StoreResult<bool> {
        let mut accounts = self.accounts.lock().unwrap();
        Ok(match accounts.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.verification_token = Some(token.to_owned());
                a.updated_at = OffsetDateTime::now_utc();
                true
            }
            None => false,
        })
    }

    async fn consume_verification_token(&self, token: &str) -> StoreResult<Option<i64>> {
        let mut accounts = self.accounts.lock().unwrap();
        let found = accounts
            .iter_mut()
            .find(|a| a.verification_token.as_deref() == Some(token));
        Ok(found.map(|a| {
            a.verification_token = None;
            a.is_verified = true;
            a.updated_at = OffsetDateTime::now_utc();
            a.id
        }))
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<bool> {
        let mut accounts = self.accounts.lock().unwrap();
        Ok(match accounts.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.reset_token = Some(token.to_owned());
                a.reset_token_expiry = Some(expires_at);
                a.updated_at = OffsetDateTime::now_utc();
                true
            }
            None => false,
        })
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<i64>> {
        let mut accounts = self.accounts.lock().unwrap();
        let found = accounts.iter_mut().find(|a| {
            a.reset_token.as_deref() == Some(token)
                && a.reset_token_expiry.is_some_and(|exp| exp > now)
        });
        Ok(found.map(|a| {
            a.password_hash = password_hash.to_owned();
            a.reset_token = None;
            a.reset_token_expiry = None;
            a.updated_at = OffsetDateTime::now_utc();
            a.id
        }))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<bool> {
        let mut accounts = self.accounts.lock().unwrap();
        Ok(match accounts.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.password_hash = password_hash.to_owned();
                a.updated_at = OffsetDateTime::now_utc();
                true
            }
            None => false,
        })
    }

    async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(email) = &update.email {
            if email_taken(&accounts, email, Some(id)) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        Ok(accounts.iter_mut().find(|a| a.id == id).map(|a| {
            if let Some(v) = update.first_name {
                a.first_name = v;
            }
            if let Some(v) = update.last_name {
                a.last_name = v;
            }
            if let Some(v) = update.email {
                a.email = v;
            }
            if let Some(v) = update.bio {
                a.bio = Some(v);
            }
            a.updated_at = OffsetDateTime::now_utc();
            a.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut accounts = self.accounts.lock().unwrap();
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        Ok(accounts.len() != before)
    }
}
