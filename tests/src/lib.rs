//! # LoRaWAN Core Test Suite
//!
//! End-to-end tests driving the registration intake over real HTTP.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs            # Adapter on 127.0.0.1:0, request helpers
//!     ├── registration_flow.rs  # Accept, ack/nack, FIFO, round trip
//!     ├── rejection.rs          # 405/404/415/413/400, nothing delivered
//!     └── lifecycle.rs          # Shutdown, dropped handles, metrics
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lw-tests
//! cargo test -p lw-tests integration::rejection::
//! ```

pub mod integration;
