//! Simulation core for Burnrate: the world clock, the in-memory world
//! model, the ordered tick pipeline, and the action processor.
//!
//! The core is synchronous and storage-free by design: the tick pipeline
//! and every action handler are pure functions over [`state::WorldState`].
//! The engine binary wraps the state in an async lock and bolts
//! persistence, scheduling, and webhook delivery on around this crate, so
//! every rule in here is testable without a database or a runtime.
//!
//! # Modules
//!
//! - [`clock`] -- tick counter, seasons, quota days
//! - [`config`] -- environment-driven engine configuration
//! - [`state`] -- the in-memory world model
//! - [`tick`] -- the per-tick pipeline
//! - [`actions`] -- the action processor and per-domain handlers
//! - [`intercept`] -- interception probability and combat rolls
//! - [`intel`] -- freshness projection for intel reports
//! - [`factions`] -- rank permission matrix and treasury rules
//! - [`season`] -- scoring and the season reset
//! - [`prng`] -- deterministic seeding for combat rolls

pub mod actions;
pub mod clock;
pub mod config;
pub mod factions;
pub mod intel;
pub mod intercept;
pub mod prng;
pub mod season;
pub mod state;
pub mod tick;

pub use actions::{Action, ActionError, ActionOutcome};
pub use clock::WorldClock;
pub use config::EngineConfig;
pub use state::WorldState;
pub use tick::{TickReport, run_tick};
