use async_trait::async_trait;
use tracing::info;

use crate::config::MailConfig;

/// Delivers verification and password-reset messages.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send_verification_email(&self, to: &str, token: &str) -> anyhow::Result<()>;
    async fn send_password_reset_email(&self, to: &str, token: &str) -> anyhow::Result<()>;
}

/// Renders the messages and hands them to the log instead of an SMTP relay.
pub struct LogDispatcher {
    frontend_url: String,
    from: String,
}

impl LogDispatcher {
    pub fn new(cfg: &MailConfig) -> Self {
        Self {
            frontend_url: cfg.frontend_url.trim_end_matches('/').to_owned(),
            from: cfg.from.clone(),
        }
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}/{}?token={}", self.frontend_url, path, token)
    }
}

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn send_verification_email(&self, to: &str, token: &str) -> anyhow::Result<()> {
        let link = self.link("verify-email", token);
        info!(from = %self.from, %to, subject = "Verify your email", %link, "mail queued");
        Ok(())
    }

    async fn send_password_reset_email(&self, to: &str, token: &str) -> anyhow::Result<()> {
        let link = self.link("reset-password", token);
        info!(from = %self.from, %to, subject = "Password Reset Request", %link, "mail queued");
        Ok(())
    }
}

#[cfg(test)]
pub use recording::RecordingDispatcher;

#[cfg(test)]
mod recording {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Verification { to: String, token: String },
        PasswordReset { to: String, token: String },
    }

    /// Keeps every message; can be switched to fail delivery.
    #[derive(Default)]
    pub struct RecordingDispatcher {
        sent: Mutex<Vec<Sent>>,
        failing: AtomicBool,
    }

    impl RecordingDispatcher {
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        pub fn last_verification_token(&self) -> Option<String> {
            self.sent().into_iter().rev().find_map(|s| match s {
                Sent::Verification { token, .. } => Some(token),
                _ => None,
            })
        }

        pub fn last_reset_token(&self) -> Option<String> {
            self.sent().into_iter().rev().find_map(|s| match s {
                Sent::PasswordReset { token, .. } => Some(token),
                _ => None,
            })
        }

        fn record(&self, sent: Sent) -> anyhow::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("smtp relay unavailable");
            }
            self.sent.lock().unwrap().push(sent);
            Ok(())
        }
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn send_verification_email(&self, to: &str, token: &str) -> anyhow::Result<()> {
            self.record(Sent::Verification {
                to: to.into(),
                token: token.into(),
            })
        }

        async fn send_password_reset_email(&self, to: &str, token: &str) -> anyhow::Result<()> {
            self.record(Sent::PasswordReset {
                to: to.into(),
                token: token.into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_point_at_frontend() {
        let d = LogDispatcher::new(&MailConfig {
            frontend_url: "https://blog.example/".into(),
            from: "noreply@blog.example".into(),
        });
        assert_eq!(
            d.link("verify-email", "abc"),
            "https://blog.example/verify-email?token=abc"
        );
    }

    #[tokio::test]
    async fn recording_dispatcher_can_fail() {
        let d = RecordingDispatcher::default();
        d.send_verification_email("a@b.com", "t1").await.unwrap();
        d.set_failing(true);
        assert!(d.send_password_reset_email("a@b.com", "t2").await.is_err());
        assert_eq!(d.last_verification_token().as_deref(), Some("t1"));
        assert_eq!(d.last_reset_token(), None);
    }
}
