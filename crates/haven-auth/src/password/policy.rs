//! Composition rules and strength floor for new passwords.

use haven_core::config::AuthConfig;
use haven_core::error::AppError;
use haven_core::result::AppResult;

/// Validates new passwords against the configured policy.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validates a candidate password.
    ///
    /// `user_inputs` (email, names) feed the strength estimator; a
    /// password built from the user's own details scores poorly.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> AppResult<()> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Passwords need at least {} characters",
                self.min_length
            )));
        }

        let classes: [(&str, fn(char) -> bool); 3] = [
            ("one uppercase letter", char::is_uppercase),
            ("one lowercase letter", char::is_lowercase),
            ("one digit", |c| c.is_ascii_digit()),
        ];
        for (label, belongs) in classes {
            if !password.chars().any(belongs) {
                return Err(AppError::validation(format!("Passwords need at least {label}")));
            }
        }

        let strength = zxcvbn::zxcvbn(password, user_inputs);
        if strength.score() < zxcvbn::Score::Three {
            return Err(AppError::validation(
                "Password is too easy to guess. Please choose a stronger password.",
            ));
        }

        Ok(())
    }

    /// Requires that a new password differs from the current one.
    pub fn validate_not_same(&self, current: &str, new: &str) -> AppResult<()> {
        if current == new {
            return Err(AppError::validation(
                "The new password must differ from the current one",
            ));
        }
        Ok(())
    }
}
