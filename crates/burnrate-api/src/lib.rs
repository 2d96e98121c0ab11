//! Player-facing HTTP API for Burnrate.
//!
//! Every mutating endpoint builds an action and routes it through the
//! core action processor under the world's write guard; every read
//! endpoint serves from the same in-memory world under the read guard.
//! Errors surface as the stable `{code, message, correlation_id}` body.
//!
//! # Modules
//!
//! - [`state`] -- shared application state and the write-through path
//! - [`router`] -- route table, CORS, tracing
//! - [`handlers`] -- endpoint handlers by domain
//! - [`auth`] -- API key extraction
//! - [`ratelimit`] -- global per-IP request floor
//! - [`error`] -- error-to-response mapping
//! - [`server`] -- listener bootstrap

pub mod auth;
pub mod error;
pub mod handlers;
pub mod ratelimit;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::spawn_server;
pub use state::AppState;
