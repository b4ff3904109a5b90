use std::collections::HashMap;

use async_trait::async_trait;
use common::{Money, PartId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{Part, PartStore, Result};

/// PostgreSQL-backed part store implementation.
#[derive(Clone)]
pub struct PostgresPartStore {
    pool: PgPool,
}

impl PostgresPartStore {
    /// Creates a new PostgreSQL part store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the parts table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS parts (
                id    TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                price BIGINT,
                stock BIGINT NOT NULL DEFAULT 0 CHECK (stock >= 0)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_part(row: &PgRow) -> std::result::Result<Part, sqlx::Error> {
        let stock: i64 = row.try_get("stock")?;
        Ok(Part {
            id: PartId::new(row.try_get::<String, _>("id")?),
            title: row.try_get("title")?,
            price: row.try_get::<Option<i64>, _>("price")?.map(Money::new),
            stock: u32::try_from(stock)
                .map_err(|_| sqlx::Error::Decode(format!("stock out of range: {stock}").into()))?,
        })
    }
}

#[async_trait]
impl PartStore for PostgresPartStore {
    async fn get(&self, id: &PartId) -> Result<Option<Part>> {
        let row = sqlx::query("SELECT id, title, price, stock FROM parts WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_part).transpose().map_err(Into::into)
    }

    async fn get_many(&self, ids: &[PartId]) -> Result<HashMap<PartId, Part>> {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();
        let rows = sqlx::query("SELECT id, title, price, stock FROM parts WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut parts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let part = Self::row_to_part(row)?;
            parts.insert(part.id.clone(), part);
        }
        Ok(parts)
    }

    async fn put(&self, part: Part) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO parts (id, title, price, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title, price = EXCLUDED.price, stock = EXCLUDED.stock
            "#,
        )
        .bind(part.id.as_str())
        .bind(&part.title)
        .bind(part.price.map(|p| p.amount()))
        .bind(i64::from(part.stock))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn deduct_stock_clamped(&self, id: &PartId, quantity: u32) -> Result<()> {
        // Single conditional statement: concurrent confirmations serialize
        // at the row lock instead of racing in application memory.
        let result = sqlx::query(
            r#"
            UPDATE parts
            SET stock = CASE WHEN stock >= $2 THEN stock - $2 ELSE 0 END
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Part deleted after the order was placed; intentionally lost.
            tracing::debug!(part_id = %id, "deduct matched no part");
        }
        Ok(())
    }

    async fn restock(&self, id: &PartId, quantity: u32) -> Result<()> {
        let result = sqlx::query("UPDATE parts SET stock = stock + $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(part_id = %id, "restock matched no part");
        }
        Ok(())
    }
}
