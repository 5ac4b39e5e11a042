//! SQLite backend for the Roster person store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every [`roster_core::store::PersonStore`]
//! operation runs as exactly one transaction on that thread.

mod addresses;
mod encode;
mod identity;
mod locations;
mod schema;
mod store;
mod uow;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
