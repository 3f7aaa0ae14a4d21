// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Export passphrase policy.

use thiserror::Error;

/// Passphrase policy errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PassphraseError {
    /// Passphrase is too short.
    #[error("Passphrase must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// Passphrase is only whitespace.
    #[error("Passphrase must not be blank")]
    Blank,
}

/// Passphrase policy configuration.
pub struct PassphrasePolicy {
    /// Minimum length in characters.
    pub min_length: usize,
}

impl Default for PassphrasePolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PassphrasePolicy {
    /// Validates a passphrase against the policy.
    ///
    /// # Errors
    ///
    /// Returns a `PassphraseError` if the passphrase is blank or too short.
    pub fn validate(&self, passphrase: &str) -> Result<(), PassphraseError> {
        if passphrase.trim().is_empty() {
            return Err(PassphraseError::Blank);
        }

        if passphrase.chars().count() < self.min_length {
            return Err(PassphraseError::TooShort {
                min_length: self.min_length,
            });
        }

        Ok(())
    }
}
