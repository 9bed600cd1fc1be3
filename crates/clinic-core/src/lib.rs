//! Core types and trait definitions for the clinic appointment service.
//!
//! This crate is free of HTTP and database dependencies. It owns the
//! appointment lifecycle: the status state machine, the archive derivation,
//! and the presentation ordering shared by admin and patient views.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod appointment;
pub mod archive;
pub mod calendar;
pub mod error;
pub mod message;
pub mod ordering;
pub mod profile;
pub mod schedule;
pub mod store;

pub use error::{Error, ErrorKind, Result, StoreError};
