//! Adapters for the registration intake.
//!
//! Async infrastructure that connects HTTP handlers to the consumer.

pub mod handoff;

pub use handoff::{handoff_channel, AckHandle, Delivery, HandoffReceiver, HandoffSender};
