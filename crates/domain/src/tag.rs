// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tag identifier normalization.
//!
//! Readers report the same physical tag in either byte order and either
//! letter case. Identifiers are normalized to uppercase hex, and lookups
//! cover every case/order variant.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// A normalized (uppercase, separator-free) hexadecimal tag identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagId(String);

impl TagId {
    /// Normalizes a raw identifier.
    ///
    /// Whitespace, `:` and `-` separators and a leading `0x` are removed
    /// and the remainder is uppercased.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty, contains non-hex
    /// characters, or has an odd number of digits.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let stripped: &str = raw.trim();
        let stripped: &str = stripped
            .strip_prefix("0x")
            .or_else(|| stripped.strip_prefix("0X"))
            .unwrap_or(stripped);

        let digits: String = stripped
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();

        if digits.is_empty() {
            return Err(DomainError::InvalidTagId {
                raw: raw.to_string(),
                reason: String::from("identifier is empty"),
            });
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidTagId {
                raw: raw.to_string(),
                reason: String::from("identifier is not hexadecimal"),
            });
        }
        if digits.len() % 2 != 0 {
            return Err(DomainError::InvalidTagId {
                raw: raw.to_string(),
                reason: String::from("identifier has an odd number of digits"),
            });
        }

        Ok(Self(digits))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The same identifier with its byte order reversed.
    #[must_use]
    pub fn byte_reversed(&self) -> Self {
        let bytes: Vec<&str> = self
            .0
            .as_bytes()
            .chunks(2)
            .filter_map(|pair| std::str::from_utf8(pair).ok())
            .collect();
        Self(bytes.into_iter().rev().collect())
    }

    /// Every stored form this tag may have been imported as: upper and
    /// lower case of both byte orders, without duplicates.
    #[must_use]
    pub fn lookup_variants(&self) -> Vec<String> {
        let reversed: Self = self.byte_reversed();
        let candidates: [String; 4] = [
            self.0.clone(),
            self.0.to_ascii_lowercase(),
            reversed.0.clone(),
            reversed.0.to_ascii_lowercase(),
        ];

        let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !variants.contains(&candidate) {
                variants.push(candidate);
            }
        }
        variants
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
