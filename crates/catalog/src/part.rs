//! The part read model consumed by the order core.

use common::{Money, PartId};
use serde::{Deserialize, Serialize};

/// A purchasable part as the order core sees it.
///
/// The full catalog record carries car models, categories, images, and so
/// on; none of that matters for ordering, so only the pricing and stock
/// fields are modeled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Part identifier.
    pub id: PartId,

    /// Display title, snapshotted onto order items at checkout.
    pub title: String,

    /// Unit price. `None` means the part has no fixed price and is sold
    /// by inquiry only.
    pub price: Option<Money>,

    /// Units currently in stock.
    pub stock: u32,
}

impl Part {
    /// Creates a new part.
    pub fn new(
        id: impl Into<PartId>,
        title: impl Into<String>,
        price: Option<Money>,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            stock,
        }
    }

    /// Returns the fixed price, normalizing a stored zero to "no fixed price".
    ///
    /// Admins enter 0 to mean "call for price", so zero and absent are the
    /// same thing to the ordering flow.
    pub fn fixed_price(&self) -> Option<Money> {
        self.price.filter(Money::is_positive)
    }

    /// Returns true if this part cannot be purchased at a fixed price.
    pub fn is_inquiry_only(&self) -> bool {
        self.fixed_price().is_none()
    }
}
