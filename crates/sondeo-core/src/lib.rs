//! Core types and trait definitions for the Sondeo citizen-survey platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod classify;
pub mod eligibility;
pub mod error;
pub mod points;
pub mod respondent;
pub mod response;
pub mod results;
pub mod store;
pub mod survey;

pub use error::{Error, Result};
