//! SQLite backend for the Sondeo survey store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Submission ingestion runs inside
//! an `IMMEDIATE` transaction so the response-cap check and the writes it
//! guards are a single atomic unit.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
