//! PostgreSQL-backed order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, PartId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::identity::GuestContact;

use super::{Buyer, Order, OrderItem, OrderStatus, OrderStore, OrderStoreError};

/// PostgreSQL-backed order store implementation.
///
/// The order row and its item rows are written inside one transaction, so
/// a partially-populated order is never visible to readers.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the order tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), OrderStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id             UUID PRIMARY KEY,
                user_id        UUID,
                guest_name     TEXT NOT NULL DEFAULT '',
                guest_phone    TEXT NOT NULL DEFAULT '',
                guest_email    TEXT NOT NULL DEFAULT '',
                guest_password TEXT NOT NULL DEFAULT '',
                status         TEXT NOT NULL,
                stock_applied  BOOLEAN NOT NULL DEFAULT FALSE,
                memo           TEXT NOT NULL DEFAULT '',
                created_at     TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS order_items (
                id         BIGSERIAL PRIMARY KEY,
                order_id   UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                part_id    TEXT,
                title      TEXT NOT NULL,
                unit_price BIGINT,
                quantity   BIGINT NOT NULL CHECK (quantity > 0)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order, sqlx::Error> {
        let status_name: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_name)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown status: {status_name}").into()))?;

        let buyer = match row.try_get::<Option<Uuid>, _>("user_id")? {
            Some(user_id) => Buyer::Member(UserId::from_uuid(user_id)),
            None => Buyer::Guest(GuestContact {
                name: row.try_get("guest_name")?,
                phone: row.try_get("guest_phone")?,
                email: row.try_get("guest_email")?,
                password_hash: row.try_get("guest_password")?,
            }),
        };

        Ok(Order::restore(
            OrderId::from_uuid(row.try_get("id")?),
            buyer,
            status,
            row.try_get("stock_applied")?,
            row.try_get("memo")?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
            items,
        ))
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem, sqlx::Error> {
        let quantity: i64 = row.try_get("quantity")?;
        Ok(OrderItem {
            part_id: row
                .try_get::<Option<String>, _>("part_id")?
                .map(PartId::new),
            title: row.try_get("title")?,
            unit_price: row.try_get::<Option<i64>, _>("unit_price")?.map(Money::new),
            quantity: u32::try_from(quantity).map_err(|_| {
                sqlx::Error::Decode(format!("quantity out of range: {quantity}").into())
            })?,
        })
    }

    async fn load_items(&self, id: OrderId) -> Result<Vec<OrderItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT part_id, title, unit_price, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut tx = self.pool.begin().await?;

        let (user_id, name, phone, email, password_hash) = match order.buyer() {
            Buyer::Member(user_id) => (Some(user_id.as_uuid()), "", "", "", ""),
            Buyer::Guest(contact) => (
                None,
                contact.name.as_str(),
                contact.phone.as_str(),
                contact.email.as_str(),
                contact.password_hash.as_str(),
            ),
        };

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, user_id, guest_name, guest_phone, guest_email, guest_password,
                 status, stock_applied, memo, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(user_id)
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(password_hash)
        .bind(order.status().as_str())
        .bind(order.stock_applied())
        .bind(order.memo())
        .bind(order.created_at())
        .execute(&mut *tx)
        .await?;

        for item in order.items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, part_id, title, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id().as_uuid())
            .bind(item.part_id.as_ref().map(|p| p.as_str()))
            .bind(&item.title)
            .bind(item.unit_price.map(|p| p.amount()))
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.load_items(id).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), OrderStoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrderStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn set_stock_applied(&self, id: OrderId, applied: bool) -> Result<(), OrderStoreError> {
        let result = sqlx::query("UPDATE orders SET stock_applied = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(applied)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrderStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn recent_guest_orders(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM orders
            WHERE user_id IS NULL AND guest_name = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(name)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = OrderId::from_uuid(row.try_get("id").map_err(OrderStoreError::Database)?);
            let items = self.load_items(id).await?;
            orders.push(Self::row_to_order(row, items)?);
        }
        Ok(orders)
    }
}
