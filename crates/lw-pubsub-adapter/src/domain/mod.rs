//! Domain types for the registration intake.
//!
//! Configuration, error taxonomy and handoff identifiers. The handoff queue
//! itself lives in the adapters layer.

pub mod config;
pub mod error;
pub mod handoff_id;

pub use config::{ConfigError, IntakeConfig};
pub use error::{AckError, AdapterError, NackReason, ParseError, StructuralError, ValidationError};
pub use handoff_id::HandoffId;
