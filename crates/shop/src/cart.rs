//! Session-scoped shopping cart.

use std::collections::BTreeMap;

use catalog::{Part, PartStore};
use common::{Money, PartId, SessionId};

use crate::session::{SessionError, SessionStore};

/// Session key the cart payload is stored under.
pub const CART_SESSION_KEY: &str = "cart";

/// One cart line resolved against the live catalog.
///
/// Prices and stock here reflect the catalog at resolve time, not at the
/// time the line was added; checkout re-resolves immediately before
/// creating the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// The live part record.
    pub part: Part,

    /// Quantity in the cart.
    pub quantity: u32,

    /// Normalized unit price; `None` means inquiry-only.
    pub unit_price: Option<Money>,

    /// `unit_price * quantity`, zero for inquiry-only lines.
    pub subtotal: Money,

    /// True when the requested quantity fits the available stock.
    ///
    /// Advisory only: nothing stops a customer keeping an oversized line
    /// in the cart, but checkout refuses it.
    pub stock_ok: bool,
}

impl CartLine {
    /// Returns true if the line has no fixed price.
    pub fn is_inquiry_only(&self) -> bool {
        self.unit_price.is_none()
    }
}

/// A customer's pre-checkout purchase intent.
///
/// Lives only as long as the browser session; loaded at the start of a
/// request and saved back when changed. A line's quantity is always
/// positive; any mutation that would drop it to zero or below removes
/// the line instead.
#[derive(Debug, Clone)]
pub struct Cart {
    session_id: SessionId,
    lines: BTreeMap<PartId, u32>,
    dirty: bool,
}

impl Cart {
    /// Creates an empty cart for a session.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            lines: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Loads the cart stored in the given session, or an empty one.
    pub async fn load<S>(store: &S, session_id: SessionId) -> Result<Self, SessionError>
    where
        S: SessionStore + ?Sized,
    {
        let lines = match store.get(&session_id, CART_SESSION_KEY).await? {
            Some(value) => serde_json::from_value(value)?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            session_id,
            lines,
            dirty: false,
        })
    }

    /// Writes the cart back to its session, if it changed.
    pub async fn save<S>(&mut self, store: &S) -> Result<(), SessionError>
    where
        S: SessionStore + ?Sized,
    {
        if !self.dirty {
            return Ok(());
        }
        let value = serde_json::to_value(&self.lines)?;
        store.put(&self.session_id, CART_SESSION_KEY, value).await?;
        self.dirty = false;
        Ok(())
    }

    /// Returns the owning session ID.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Adds `qty` to a line, or sets the quantity outright when `replace`
    /// is true. A resulting quantity of zero or less removes the line.
    ///
    /// No stock ceiling is enforced here; sufficiency is advisory until
    /// checkout.
    pub fn add(&mut self, part_id: &PartId, qty: i64, replace: bool) {
        let current = i64::from(self.lines.get(part_id).copied().unwrap_or(0));
        let next = if replace { qty } else { current + qty };
        if next <= 0 {
            self.lines.remove(part_id);
        } else {
            let quantity = u32::try_from(next).unwrap_or(u32::MAX);
            self.lines.insert(part_id.clone(), quantity);
        }
        self.dirty = true;
    }

    /// Removes a line; no-op when absent.
    pub fn remove(&mut self, part_id: &PartId) {
        if self.lines.remove(part_id).is_some() {
            self.dirty = true;
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.dirty = true;
    }

    /// Returns true when the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns the quantity for a part, if present.
    pub fn quantity(&self, part_id: &PartId) -> Option<u32> {
        self.lines.get(part_id).copied()
    }

    /// Resolves every line against the live catalog.
    ///
    /// Not a pure read: a line whose part no longer exists is dropped from
    /// the cart as a side effect (stale sessions heal themselves) and
    /// skipped in the output. Each call re-reads the catalog, so repeated
    /// calls see current prices and stock.
    pub async fn resolve<P>(&mut self, parts: &P) -> Result<Vec<CartLine>, catalog::CatalogError>
    where
        P: PartStore + ?Sized,
    {
        let ids: Vec<PartId> = self.lines.keys().cloned().collect();
        let found = parts.get_many(&ids).await?;

        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(part) = found.get(&id) else {
                self.lines.remove(&id);
                self.dirty = true;
                continue;
            };
            let Some(&quantity) = self.lines.get(&id) else {
                continue;
            };

            let unit_price = part.fixed_price();
            let subtotal = unit_price.map_or(Money::zero(), |p| p.multiply(quantity));
            resolved.push(CartLine {
                part: part.clone(),
                quantity,
                unit_price,
                subtotal,
                stock_ok: quantity <= part.stock,
            });
        }
        Ok(resolved)
    }

    /// Sum of all line subtotals.
    pub async fn total<P>(&mut self, parts: &P) -> Result<Money, catalog::CatalogError>
    where
        P: PartStore + ?Sized,
    {
        Ok(self.resolve(parts).await?.iter().map(|l| l.subtotal).sum())
    }

    /// Returns true if any line lacks a fixed price.
    pub async fn has_inquiry_only<P>(&mut self, parts: &P) -> Result<bool, catalog::CatalogError>
    where
        P: PartStore + ?Sized,
    {
        Ok(self
            .resolve(parts)
            .await?
            .iter()
            .any(CartLine::is_inquiry_only))
    }

    /// Returns true if any line's quantity exceeds available stock.
    pub async fn has_stock_issue<P>(&mut self, parts: &P) -> Result<bool, catalog::CatalogError>
    where
        P: PartStore + ?Sized,
    {
        Ok(self.resolve(parts).await?.iter().any(|l| !l.stock_ok))
    }
}
