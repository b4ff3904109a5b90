//! Order record and its line items.

use catalog::Part;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, PartId, UserId};
use serde::{Deserialize, Serialize};

use crate::identity::{GuestContact, PasswordHasher};

use super::OrderStatus;

/// The party an order belongs to.
///
/// Exactly one of "member" or "guest contact set" is populated, by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Buyer {
    /// A registered member's order.
    Member(UserId),

    /// A guest order, identified later by name plus password.
    Guest(GuestContact),
}

impl Buyer {
    /// Returns true for guest orders.
    pub fn is_guest(&self) -> bool {
        matches!(self, Buyer::Guest(_))
    }
}

/// One line of an order: a snapshot of what was bought, at what price.
///
/// Items are immutable once the order is created. The part reference is
/// weak (the part may be deleted from the catalog afterwards) and the
/// snapshot keeps historical orders stable either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Back-reference to the catalog part, if it still exists.
    pub part_id: Option<PartId>,

    /// Part title at the time of purchase.
    pub title: String,

    /// Unit price at the time of purchase. `None` means inquiry-only.
    pub unit_price: Option<Money>,

    /// Quantity ordered.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order item, normalizing a zero price to "no fixed price".
    pub fn new(
        part_id: Option<PartId>,
        title: impl Into<String>,
        unit_price: Option<Money>,
        quantity: u32,
    ) -> Self {
        Self {
            part_id,
            title: title.into(),
            unit_price: unit_price.filter(Money::is_positive),
            quantity,
        }
    }

    /// Snapshots a live part into an order item.
    pub fn snapshot(part: &Part, quantity: u32) -> Self {
        Self::new(
            Some(part.id.clone()),
            part.title.clone(),
            part.fixed_price(),
            quantity,
        )
    }

    /// Returns the line subtotal; zero when the item has no fixed price.
    pub fn subtotal(&self) -> Money {
        self.unit_price
            .map_or(Money::zero(), |p| p.multiply(self.quantity))
    }
}

/// A durable purchase record.
///
/// Created once at checkout; afterwards only the status and the
/// `stock_applied` guard flag change. `stock_applied` is true exactly when
/// the inventory ledger currently reflects this order's deduction, which is
/// what makes apply/unapply idempotent in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    buyer: Buyer,
    status: OrderStatus,
    stock_applied: bool,
    memo: String,
    created_at: DateTime<Utc>,
    items: Vec<OrderItem>,
}

impl Order {
    /// Creates a new order in the `Requested` status with stock untouched.
    pub fn new(buyer: Buyer, memo: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            id: OrderId::new(),
            buyer,
            status: OrderStatus::default(),
            stock_applied: false,
            memo: memo.into(),
            created_at: Utc::now(),
            items,
        }
    }

    /// Rebuilds an order from stored fields.
    pub(crate) fn restore(
        id: OrderId,
        buyer: Buyer,
        status: OrderStatus,
        stock_applied: bool,
        memo: String,
        created_at: DateTime<Utc>,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            id,
            buyer,
            status,
            stock_applied,
            memo,
            created_at,
            items,
        }
    }

    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the buyer.
    pub fn buyer(&self) -> &Buyer {
        &self.buyer
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns true if the inventory ledger reflects this order.
    pub fn stock_applied(&self) -> bool {
        self.stock_applied
    }

    /// Returns the customer memo.
    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Returns the creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the line items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the sum of all line subtotals.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    /// Returns true if any line lacks a fixed price.
    pub fn has_inquiry_only(&self) -> bool {
        self.items.iter().any(|i| i.unit_price.is_none())
    }

    /// Returns the guest name, for guest orders.
    pub fn guest_name(&self) -> Option<&str> {
        match &self.buyer {
            Buyer::Guest(contact) => Some(&contact.name),
            Buyer::Member(_) => None,
        }
    }

    /// Verifies a raw password against the stored guest hash.
    ///
    /// Always false for member orders.
    pub fn verify_guest_password(&self, raw: &str, hasher: &dyn PasswordHasher) -> bool {
        match &self.buyer {
            Buyer::Guest(contact) => hasher.verify(raw, &contact.password_hash),
            Buyer::Member(_) => false,
        }
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    pub(crate) fn set_stock_applied(&mut self, applied: bool) {
        self.stock_applied = applied;
    }
}
