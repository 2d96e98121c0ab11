//! `PostgreSQL` persistence layer for Burnrate.
//!
//! The storage contract the core needs is narrow: aggregate rows with
//! JSONB bodies, an append-only event table, a batch-write primitive
//! (one transaction per world snapshot), and a CAS tick claim. Game
//! rules never live here; the only constraints this layer enforces are
//! referential shape and uniqueness.
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool and migrations
//! - [`world_store`] -- aggregate snapshot save/load
//! - [`event_store`] -- append-only events
//! - [`tick_persist`] -- tick claim (CAS) and commit
//! - [`error`] -- classified error kinds

pub mod error;
pub mod event_store;
pub mod postgres;
pub mod tick_persist;
pub mod world_store;

pub use error::DbError;
pub use event_store::EventStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use tick_persist::TickPersist;
pub use world_store::WorldStore;
