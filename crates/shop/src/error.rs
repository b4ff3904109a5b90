//! Shop error types.

use catalog::CatalogError;
use common::{OrderId, PartId};
use thiserror::Error;

use crate::order::OrderStoreError;
use crate::session::SessionError;

/// Caller-correctable checkout failures.
///
/// These surface before any mutation; a rejected checkout leaves the cart,
/// the catalog, and the order store untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Checkout was attempted with nothing to order.
    #[error("Order has no items")]
    EmptyOrder,

    /// The requested quantity is not a positive number.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// A line has no fixed price and cannot be checked out.
    #[error("Part {part_id} is inquiry-only and cannot be ordered")]
    InquiryOnlyItem { part_id: PartId },

    /// A line asks for more units than are in stock.
    #[error("Insufficient stock for {part_id}: requested {requested}, available {available}")]
    InsufficientStock {
        part_id: PartId,
        requested: u32,
        available: u32,
    },

    /// A guest order is missing one of its required contact fields.
    #[error("Guest order is missing required field: {field}")]
    IncompleteGuestContact { field: &'static str },
}

/// Errors that can occur during shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// A caller-correctable validation failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The referenced part does not exist.
    #[error("Part not found: {0}")]
    PartNotFound(PartId),

    /// An error occurred in the part store.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An error occurred in the order store.
    #[error("Order store error: {0}")]
    OrderStore(#[from] OrderStoreError),

    /// An error occurred in the session store.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type for shop operations.
pub type Result<T> = std::result::Result<T, ShopError>;
