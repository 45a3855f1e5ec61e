//! Membrane Testing Infrastructure
//!
//! Shared proptest strategies, store fixtures and a recording broadcast for
//! the membrane crates' tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! membrane-testkit = { path = "../membrane-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,no_run
//! use membrane_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     let fixture = TreeFixture::new();
//!     assert_eq!(fixture.store.len(), 3);
//! }
//! ```

pub mod broadcast;
pub mod fixtures;
pub mod strategies;

pub use broadcast::RecordingBroadcast;
pub use fixtures::*;
pub use strategies::*;
