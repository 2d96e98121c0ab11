//! World graph, recipes, and starting-world generation for Burnrate.
//!
//! This crate owns the spatial model: zones, directed routes, adjacency
//! queries, and shipment-path validation. It also carries the fixed
//! production recipes and the deterministic world generator used at
//! `init-world` time.

pub mod error;
pub mod graph;
pub mod recipes;
pub mod starting_world;

pub use error::WorldError;
pub use graph::WorldGraph;
pub use starting_world::generate_world;
