//! # Error Types
//!
//! Errors raised while decoding LoRaWAN identifiers from their wire form.

use thiserror::Error;

/// Errors from strict lowercase hex decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    /// Input does not have exactly `2 * N` characters.
    #[error("expected {expected} hex characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    /// Input contains a character outside `[0-9a-f]`.
    #[error("invalid character {character:?} at position {index}")]
    InvalidCharacter { character: char, index: usize },
}
