//! # Integration Tests
//!
//! Every test binds its own adapter to an ephemeral localhost port and talks
//! to it with `reqwest`, standing in for an application server. The test body
//! plays the routing layer through `next_registration`.


pub mod lifecycle;
pub mod rejection;
