//! FinSight currency service library
//!
//! Exposes the history cache, upstream clients and HTTP router so the binary
//! and the integration tests share one implementation.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod data;
pub mod history;
pub mod server;
pub mod simulation;
