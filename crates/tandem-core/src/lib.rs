//! Core types and trait definitions for Tandem.
//!
//! Holds the connection-request state machine, the feed paging rules and the
//! [`store::TandemStore`] abstraction. This crate has no HTTP or database
//! dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod connection;
pub mod error;
pub mod feed;
pub mod session;
pub mod store;
pub mod user;

pub use error::{Classify, Error, ErrorKind, Result};
