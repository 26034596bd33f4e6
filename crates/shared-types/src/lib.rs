//! # Shared Types Crate
//!
//! LoRaWAN entities exchanged between the registration intake and the
//! routing layer.
//!
//! ## Design Principles
//!
//! - **Strict hex**: identifiers and keys travel as lowercase hex strings of
//!   an exact length. Anything else is rejected at the edge, so in-memory
//!   values are always the raw bytes.
//! - **No registry**: a [`Registration`] is a plain value. Whoever receives
//!   it decides whether and where to persist it.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
