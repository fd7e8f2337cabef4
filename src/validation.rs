//! Request validation. Rules are plain data; every check appends a message so
//! a request reports all of its problems at once.
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub const MAX_EMAIL_LEN: usize = 200;
pub const MAX_NAME_LEN: usize = 30;

/// Password strength requirements.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_len: usize,
    pub min_lowercase: usize,
    pub min_uppercase: usize,
    pub min_digits: usize,
    pub min_symbols: usize,
}

impl PasswordPolicy {
    /// New registrations.
    pub const STRONG: PasswordPolicy = PasswordPolicy {
        min_len: 8,
        min_lowercase: 1,
        min_uppercase: 1,
        min_digits: 1,
        min_symbols: 1,
    };

    /// Change and reset.
    pub const BASIC: PasswordPolicy = PasswordPolicy {
        min_len: 6,
        min_lowercase: 0,
        min_uppercase: 0,
        min_digits: 0,
        min_symbols: 0,
    };

    pub fn violations(&self, field: &str, password: &str) -> Vec<String> {
        let mut out = Vec::new();
        if password.chars().count() < self.min_len {
            out.push(format!(
                "{field} must be at least {} characters long",
                self.min_len
            ));
        }
        let count = |f: fn(&char) -> bool| password.chars().filter(f).count();
        let weak = count(char::is_ascii_lowercase) < self.min_lowercase
            || count(char::is_ascii_uppercase) < self.min_uppercase
            || count(char::is_ascii_digit) < self.min_digits
            || count(|c| !c.is_alphanumeric() && !c.is_whitespace()) < self.min_symbols;
        if weak {
            out.push(format!("{field} is too weak"));
        }
        out
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Collects field violations for one request.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<String>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.errors.push(format!("{field} is required"));
        } else if !is_valid_email(value) {
            self.errors.push(format!("{field} must be a valid email address"));
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(format!("{field} is required"));
        }
        self
    }

    pub fn name(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(format!("{field} is required"));
        } else if value.chars().count() > MAX_NAME_LEN {
            self.errors
                .push(format!("{field} must be at most {MAX_NAME_LEN} characters"));
        }
        self
    }

    pub fn password(&mut self, field: &str, value: &str, policy: PasswordPolicy) -> &mut Self {
        if value.is_empty() {
            self.errors.push(format!("{field} is required"));
        } else {
            self.errors.extend(policy.violations(field, value));
        }
        self
    }

    pub fn matches(&mut self, field: &str, value: &str, other: &str, expected: &str) -> &mut Self {
        if value != expected {
            self.errors.push(format!("{field} must match {other}"));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(is_valid_email("jane@x.com"));
        assert!(!is_valid_email("jane@x"));
        assert!(!is_valid_email("jane x@y.com"));
        assert!(!is_valid_email(&format!("{}@x.com", "a".repeat(200))));
        assert_eq!(normalize_email("  A@B.com "), "a@b.com");
    }

    #[test]
    fn strong_policy() {
        assert!(PasswordPolicy::STRONG.violations("password", "Str0ngP@ss1").is_empty());
        assert_eq!(
            PasswordPolicy::STRONG.violations("password", "short"),
            vec![
                "password must be at least 8 characters long".to_string(),
                "password is too weak".to_string(),
            ]
        );
        assert_eq!(
            PasswordPolicy::STRONG.violations("password", "alllowercase1!"),
            vec!["password is too weak".to_string()]
        );
    }

    #[test]
    fn basic_policy_only_checks_length() {
        assert!(PasswordPolicy::BASIC.violations("newPassword", "abcdef").is_empty());
        assert_eq!(PasswordPolicy::BASIC.violations("newPassword", "abc").len(), 1);
    }

    #[test]
    fn checks_collect_every_violation() {
        let err = Checks::new()
            .name("firstName", "")
            .email("email", "nope")
            .matches("confirmPassword", "a", "password", "b")
            .finish()
            .unwrap_err();
        match err {
            AppError::Validation(msgs) => assert_eq!(msgs.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn checks_pass_when_clean() {
        assert!(Checks::new()
            .name("firstName", "Jane")
            .email("email", "jane@x.com")
            .password("password", "Str0ngP@ss1", PasswordPolicy::STRONG)
            .finish()
            .is_ok());
    }
}
