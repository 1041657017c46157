use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Characters used in generated identifiers.
const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated identifiers.
const ID_LENGTH: usize = 16;

/// Opaque, globally-unique record identifier.
///
/// An `Id` is an owned string of lowercase letters and digits. Identifiers
/// are generated once, never reassigned, and never reused: a record keeps its
/// id for its whole life, across serialization and store reopen. Equality and
/// hashing are plain string comparison — the store never interprets the
/// contents.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let chars: String = (0..ID_LENGTH)
            .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
            .collect();
        Self(chars)
    }

    /// Parse an identifier from a string. Fails on the empty string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(s.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
