use std::collections::HashMap;

use async_trait::async_trait;
use common::PartId;

use crate::{Part, Result};

/// Storage interface for parts and their stock counters.
///
/// Part stock is the only state shared across concurrent order operations,
/// so the two stock mutations are specified as single atomic updates: an
/// implementation must never realize them as a read followed by a write.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PartStore: Send + Sync {
    /// Looks up a part by ID.
    async fn get(&self, id: &PartId) -> Result<Option<Part>>;

    /// Looks up several parts in one round trip.
    ///
    /// IDs with no matching part are simply absent from the result.
    async fn get_many(&self, ids: &[PartId]) -> Result<HashMap<PartId, Part>>;

    /// Inserts or replaces a part record.
    async fn put(&self, part: Part) -> Result<()>;

    /// Atomically subtracts `quantity` from the part's stock, clamping the
    /// result at zero.
    ///
    /// When current stock is below `quantity` the stock becomes 0 rather
    /// than failing: confirmation happens after a manual admin review, and
    /// the admin may knowingly override a stock mismatch. Stock never goes
    /// negative. A missing part is a no-op.
    async fn deduct_stock_clamped(&self, id: &PartId, quantity: u32) -> Result<()>;

    /// Atomically adds `quantity` back to the part's stock.
    ///
    /// Unconditional; mirrors the only direction stock previously moved.
    /// A missing part is a no-op.
    async fn restock(&self, id: &PartId, quantity: u32) -> Result<()>;
}
