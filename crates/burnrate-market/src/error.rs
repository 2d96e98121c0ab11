//! Error types for market operations.

use burnrate_types::OrderId;

/// Errors that can occur when placing or cancelling orders.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// The order does not exist in any book.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The caller does not own the order.
    #[error("order {0} belongs to another player")]
    NotOwner(OrderId),

    /// Quantity must be strictly positive.
    #[error("order quantity must be positive")]
    ZeroQuantity,

    /// Price must be strictly positive.
    #[error("order price must be positive")]
    ZeroPrice,

    /// A TWAP slice must be positive and no larger than the total.
    #[error("TWAP slice must be between 1 and the total quantity")]
    BadSlice,
}
