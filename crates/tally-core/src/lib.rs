//! Core types and trait definitions for the Tally economy tracker.
//!
//! This crate is deliberately free of HTTP, regex, and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod chat;
pub mod error;
pub mod event;
pub mod id;
pub mod key;
pub mod store;
pub mod topic;

pub use error::{Error, Result};
