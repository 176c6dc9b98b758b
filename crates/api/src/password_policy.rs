// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password policy for user accounts.

use thiserror::Error;

/// Password policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    /// Password and confirmation differ.
    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,

    /// Password is shorter than the minimum.
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// Password draws on too few character classes.
    #[error(
        "Password must mix at least {required} of: uppercase letters, lowercase letters, digits, symbols (found {found})"
    )]
    InsufficientComplexity { required: usize, found: usize },

    /// Password contains the user name.
    #[error("Password must not contain the user name")]
    ContainsUserName,
}

/// Password policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum length in characters.
    pub min_length: usize,
    /// Minimum number of character classes (out of 4).
    pub min_classes: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            min_classes: 3,
        }
    }
}

impl PasswordPolicy {
    /// Checks a new password for `user_name`.
    ///
    /// The user name check is case-insensitive and ignores names shorter than
    /// three characters.
    ///
    /// # Errors
    ///
    /// Returns the first rule the password breaks.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        user_name: &str,
    ) -> Result<(), PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }

        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }

        let found: usize = character_classes(password);
        if found < self.min_classes {
            return Err(PasswordPolicyError::InsufficientComplexity {
                required: self.min_classes,
                found,
            });
        }

        let name: String = user_name.trim().to_lowercase();
        if name.chars().count() >= 3 && password.to_lowercase().contains(&name) {
            return Err(PasswordPolicyError::ContainsUserName);
        }

        Ok(())
    }
}

/// Counts the character classes present: uppercase, lowercase, digit, symbol.
fn character_classes(password: &str) -> usize {
    let checks: [fn(&char) -> bool; 4] = [
        char::is_ascii_uppercase,
        char::is_ascii_lowercase,
        char::is_ascii_digit,
        |c: &char| !c.is_ascii_alphanumeric() && !c.is_whitespace(),
    ];
    checks
        .iter()
        .filter(|check| password.chars().any(|c| check(&c)))
        .count()
}
