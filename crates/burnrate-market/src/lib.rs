//! Order books and matching for the Burnrate simulation.
//!
//! Per (zone, resource) the market keeps two price-time sorted lists and
//! matches at the resting order's price. Conditional and TWAP variants
//! live outside the books and are fed in by the tick pipeline: TWAP
//! slices are injected as plain limit orders, conditionals convert once
//! their price trigger crosses.
//!
//! This crate is pure bookkeeping: it moves no credits and no goods.
//! Settlement (escrow release, inventory transfer) is the caller's job,
//! driven by the returned [`Trade`] records.

pub mod book;
pub mod error;
pub mod market;

pub use book::{Book, Trade};
pub use error::MarketError;
pub use market::{CancelledOrder, MarketState};
