//! High-level facade over the cart, checkout, and order lifecycle.

use std::sync::Arc;

use catalog::PartStore;
use common::{OrderId, PartId, SessionId};

use crate::cart::Cart;
use crate::checkout;
use crate::error::{Result, ShopError, ValidationError};
use crate::identity::{Identity, PasswordHasher};
use crate::order::{Order, OrderItem, OrderStatus, OrderStore};
use crate::session::SessionStore;
use crate::stock;

/// How many recent guest orders a lookup scans before giving up.
const GUEST_LOOKUP_LIMIT: usize = 20;

/// Service wiring the order core to its collaborators.
///
/// The surrounding web layer resolves the session and authentication and
/// calls into this; everything with an invariant happens here.
pub struct ShopService<P, O, S>
where
    P: PartStore,
    O: OrderStore,
    S: SessionStore,
{
    parts: P,
    orders: O,
    sessions: S,
    hasher: Arc<dyn PasswordHasher>,
}

impl<P, O, S> ShopService<P, O, S>
where
    P: PartStore,
    O: OrderStore,
    S: SessionStore,
{
    /// Creates a new shop service.
    pub fn new(parts: P, orders: O, sessions: S, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            parts,
            orders,
            sessions,
            hasher,
        }
    }

    /// Returns a reference to the part store.
    pub fn parts(&self) -> &P {
        &self.parts
    }

    /// Returns a reference to the order store.
    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Loads the cart for a session.
    pub async fn load_cart(&self, session_id: SessionId) -> Result<Cart> {
        Ok(Cart::load(&self.sessions, session_id).await?)
    }

    /// Persists a cart back to its session.
    pub async fn save_cart(&self, cart: &mut Cart) -> Result<()> {
        Ok(cart.save(&self.sessions).await?)
    }

    /// Converts the cart into a durable order.
    ///
    /// Lines are re-resolved and re-validated against the live catalog
    /// right before the insert; any validation failure aborts with nothing
    /// written. The cart is cleared and saved only after the order and all
    /// its items are persisted. Creating the order does not touch stock;
    /// that happens when staff confirm payment.
    #[tracing::instrument(skip(self, cart, identity), fields(session = %cart.session_id()))]
    pub async fn checkout_cart(
        &self,
        cart: &mut Cart,
        identity: Identity,
        memo: &str,
    ) -> Result<Order> {
        let lines = cart.resolve(&self.parts).await?;
        checkout::validate_lines(&lines)?;
        let buyer = checkout::resolve_buyer(identity, self.hasher.as_ref())?;

        let items = lines
            .iter()
            .map(|line| OrderItem::snapshot(&line.part, line.quantity))
            .collect();
        let order = Order::new(buyer, memo, items);
        self.orders.insert(&order).await?;

        cart.clear();
        cart.save(&self.sessions).await?;

        metrics::counter!("shop_orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), items = order.items().len(), "order created");
        Ok(order)
    }

    /// Creates a single-item order directly from a part, bypassing the cart.
    #[tracing::instrument(skip(self, identity))]
    pub async fn buy_now(
        &self,
        part_id: &PartId,
        quantity: u32,
        identity: Identity,
        memo: &str,
    ) -> Result<Order> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity { quantity }.into());
        }
        let part = self
            .parts
            .get(part_id)
            .await?
            .ok_or_else(|| ShopError::PartNotFound(part_id.clone()))?;
        if part.is_inquiry_only() {
            return Err(ValidationError::InquiryOnlyItem {
                part_id: part.id.clone(),
            }
            .into());
        }
        if quantity > part.stock {
            return Err(ValidationError::InsufficientStock {
                part_id: part.id.clone(),
                requested: quantity,
                available: part.stock,
            }
            .into());
        }

        let buyer = checkout::resolve_buyer(identity, self.hasher.as_ref())?;
        let order = Order::new(buyer, memo, vec![OrderItem::snapshot(&part, quantity)]);
        self.orders.insert(&order).await?;

        metrics::counter!("shop_orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), %part_id, quantity, "buy-now order created");
        Ok(order)
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.get(order_id).await?)
    }

    async fn load_existing(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(ShopError::OrderNotFound(order_id))
    }

    /// Changes an order's status and fires the stock side effect for the
    /// transition, exactly once.
    ///
    /// The previous status is captured before the change is persisted, then
    /// compared against the new one:
    /// - into `Confirmed` from anything else deducts stock;
    /// - out of `Confirmed` into `Requested` or `Cancelled` restores it;
    /// - every other pair (including `Requested` straight to `Cancelled`)
    ///   leaves stock alone.
    ///
    /// Re-confirming a cancelled order deducts again, because the earlier
    /// cancellation reset the guard flag.
    #[tracing::instrument(skip(self))]
    pub async fn transition_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order> {
        let mut order = self.load_existing(order_id).await?;
        let prev = order.status();

        order.set_status(new_status);
        self.orders.set_status(order_id, new_status).await?;

        if prev != OrderStatus::Confirmed && new_status == OrderStatus::Confirmed {
            stock::apply_stock(&mut order, &self.parts, &self.orders).await?;
        } else if prev == OrderStatus::Confirmed
            && matches!(new_status, OrderStatus::Requested | OrderStatus::Cancelled)
        {
            stock::unapply_stock(&mut order, &self.parts, &self.orders).await?;
        }

        tracing::info!(%order_id, from = %prev, to = %new_status, "order status changed");
        Ok(order)
    }

    /// Deducts an order's stock directly.
    ///
    /// Safety net for bulk administrative paths that change status without
    /// going through [`Self::transition_status`]; the guard flag makes a
    /// duplicate call harmless.
    #[tracing::instrument(skip(self))]
    pub async fn apply_stock(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self.load_existing(order_id).await?;
        stock::apply_stock(&mut order, &self.parts, &self.orders).await?;
        Ok(order)
    }

    /// Restores an order's stock directly. Counterpart of [`Self::apply_stock`].
    #[tracing::instrument(skip(self))]
    pub async fn unapply_stock(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self.load_existing(order_id).await?;
        stock::unapply_stock(&mut order, &self.parts, &self.orders).await?;
        Ok(order)
    }

    /// Finds a guest order by name and password.
    ///
    /// Several guests may share a name, so the most recent orders are
    /// checked newest-first until one verifies.
    #[tracing::instrument(skip(self, raw_password))]
    pub async fn guest_lookup(&self, name: &str, raw_password: &str) -> Result<Option<Order>> {
        let name = name.trim();
        let raw_password = raw_password.trim();
        if name.is_empty() || raw_password.is_empty() {
            return Ok(None);
        }

        let candidates = self
            .orders
            .recent_guest_orders(name, GUEST_LOOKUP_LIMIT)
            .await?;
        Ok(candidates
            .into_iter()
            .find(|order| order.verify_guest_password(raw_password, self.hasher.as_ref())))
    }
}
