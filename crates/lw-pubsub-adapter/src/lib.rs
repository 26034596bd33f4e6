#![allow(missing_docs)]

//! LoRaWAN pub/sub adapter - HTTP intake for end-device registrations.
//!
//! Application servers subscribe to the uplinks of an end-device by
//! registering it with the network. The adapter accepts those registrations
//! over HTTP and hands them, one at a time, to the routing layer. The HTTP
//! response is held until the routing layer acknowledges the registration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      PUB/SUB ADAPTER                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   PUT /end-devices/{devAddr}        (port 3021 by default)       │
//! │                 │                                                │
//! │  ┌──────────────┴──────────────────┐                             │
//! │  │  RequestSpan → Gate → BodyLimit │   405 → 404 → 415 → 413     │
//! │  └──────────────┬──────────────────┘                             │
//! │                 │                                                │
//! │  ┌──────────────┴──────────────────┐                             │
//! │  │  RegistrationParser             │   405 → 404 → 415 → 400     │
//! │  └──────────────┬──────────────────┘                             │
//! │                 │ Registration                                   │
//! │  ┌──────────────┴──────────────────┐                             │
//! │  │  Handoff queue (FIFO)           │   request suspended         │
//! │  │  oneshot per registration       │   until ack / nack          │
//! │  └──────────────┬──────────────────┘                             │
//! └─────────────────┼────────────────────────────────────────────────┘
//!                   │ next_registration()
//!                   ▼
//!             routing layer ── ack() → 200
//!                           ── nack(Operational) → 503
//!                           ── nack(Behavioural) → 409
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use lw_pubsub_adapter::{IntakeConfig, JsonRegistrationParser, PubSubAdapter};
//!
//! let adapter = PubSubAdapter::bind(IntakeConfig::default(), JsonRegistrationParser).await?;
//! let (registration, mut ack) = adapter.next_registration().await?;
//! ack.ack()?;
//! adapter.shutdown().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod parser;
pub mod service;

pub use adapters::{AckHandle, Delivery};
pub use domain::{
    AckError, AdapterError, ConfigError, HandoffId, IntakeConfig, NackReason, ParseError,
    StructuralError, ValidationError,
};
pub use middleware::{IntakeMetrics, MetricsSnapshot};
pub use parser::{JsonRegistrationParser, RawRequest, RegistrationParser};
pub use service::PubSubAdapter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
