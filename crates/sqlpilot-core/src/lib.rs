//! Core types and trait definitions for SQLPilot.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends, the engine client and the server all depend on it.

// Native `async fn` in traits; futures are declared `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod dashboard;
pub mod dialect;
pub mod error;
pub mod project;
pub mod query;
pub mod store;
pub mod user;

mod validate;

pub use dialect::Dialect;
pub use error::{Error, Result};
