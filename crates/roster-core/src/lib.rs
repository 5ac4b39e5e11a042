//! Core types and trait definitions for the Roster self-service profile store.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::PersonStore`]; everything they need to build
//! ownership-scoped statements lives in [`query`] and [`table`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod auth;
pub mod error;
pub mod identity;
pub mod location;
pub mod person;
pub mod phone;
pub mod query;
pub mod store;
pub mod table;

pub use error::{Error, ErrorKind, Result};
