use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::{claims::Claims, repo_types::Role};
use crate::config::JwtConfig;

/// Longest session a token may grant: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Holds JWT signing and verification keys with config data.
/// Built once at startup; refuses an absent or blank secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> anyhow::Result<Self> {
        let secret = cfg.secret.trim();
        if secret.is_empty() {
            anyhow::bail!("JWT secret is empty; refusing to start");
        }
        if !(1..=MAX_TTL_MINUTES).contains(&cfg.ttl_minutes) {
            anyhow::bail!(
                "JWT ttl must be between 1 and {MAX_TTL_MINUTES} minutes, got {}",
                cfg.ttl_minutes
            );
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes as u64) * 60),
        })
    }

    pub fn sign(&self, account_id: i64, email: &str, role: Role) -> anyhow::Result<String> {
        self.sign_at(account_id, email, role, OffsetDateTime::now_utc())
    }

    fn sign_at(
        &self,
        account_id: i64,
        email: &str,
        role: Role,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_owned(),
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id, role = role.as_str(), "jwt signed");
        Ok(token)
    }

    /// Checks signature, issuer, audience and expiry (no leeway).
    pub fn verify(&self, token: &str) -> anyhow::Result<Identity> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("malformed subject claim"))?;
        debug!(account_id = id, "jwt verified");
        Ok(Identity {
            id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }
}
