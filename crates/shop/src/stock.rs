//! Stock application engine.
//!
//! Moves an order's quantities into and out of the inventory ledger exactly
//! once per direction. The order's `stock_applied` flag is the sole guard:
//! whether the status transition or an administrative bulk action calls
//! these functions, a repeated call in the same direction is a harmless
//! no-op.

use catalog::PartStore;

use crate::error::Result;
use crate::order::{Order, OrderStore};

/// Deducts the order's quantities from part stock, once.
///
/// Returns `false` without touching anything when the deduction is already
/// reflected in the ledger. Each deduction is a single atomic
/// compare-and-clamp at the store, so stock never goes negative even when
/// an admin confirms more than is available, and concurrent confirmations
/// of the same part cannot lose updates. Items whose part was deleted are
/// skipped; that slice of inventory effect is intentionally lost.
pub async fn apply_stock<P, O>(order: &mut Order, parts: &P, orders: &O) -> Result<bool>
where
    P: PartStore + ?Sized,
    O: OrderStore + ?Sized,
{
    if order.stock_applied() {
        tracing::debug!(order_id = %order.id(), "stock already applied, skipping");
        return Ok(false);
    }

    for item in order.items() {
        let Some(part_id) = &item.part_id else {
            continue;
        };
        parts.deduct_stock_clamped(part_id, item.quantity).await?;
    }

    order.set_stock_applied(true);
    orders.set_stock_applied(order.id(), true).await?;

    metrics::counter!("shop_stock_applied_total").increment(1);
    tracing::info!(order_id = %order.id(), items = order.items().len(), "stock applied");
    Ok(true)
}

/// Restores the order's quantities to part stock, once.
///
/// Mirror of [`apply_stock`]: the add-back is unconditional (stock only
/// ever moved out through the clamped deduction) and deleted parts are
/// skipped. Returns `false` when the deduction is not currently applied.
pub async fn unapply_stock<P, O>(order: &mut Order, parts: &P, orders: &O) -> Result<bool>
where
    P: PartStore + ?Sized,
    O: OrderStore + ?Sized,
{
    if !order.stock_applied() {
        tracing::debug!(order_id = %order.id(), "stock not applied, skipping");
        return Ok(false);
    }

    for item in order.items() {
        let Some(part_id) = &item.part_id else {
            continue;
        };
        parts.restock(part_id, item.quantity).await?;
    }

    order.set_stock_applied(false);
    orders.set_stock_applied(order.id(), false).await?;

    metrics::counter!("shop_stock_unapplied_total").increment(1);
    tracing::info!(order_id = %order.id(), items = order.items().len(), "stock restored");
    Ok(true)
}
