// src/db/stock_entry_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::stock_entry::StockEntry};

#[derive(Clone)]
pub struct StockEntryRepository {
    pool: PgPool,
}

impl StockEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<StockEntry>, AppError> {
        let entries = sqlx::query_as::<_, StockEntry>(
            "SELECT * FROM stock_entries ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // Registra o recebimento (livro-razão de entradas). O incremento do
    // saldo acontece na mesma transação, em MaterialRepository.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        material_id: Uuid,
        supplier_id: Option<Uuid>,
        quantity: Decimal,
        unit_price: Option<Decimal>,
        batch: Option<&str>,
        expiry_date: Option<NaiveDate>,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<StockEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, StockEntry>(
            r#"
            INSERT INTO stock_entries
                (material_id, supplier_id, quantity, unit_price, batch, expiry_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(material_id)
        .bind(supplier_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(batch)
        .bind(expiry_date)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }
}
