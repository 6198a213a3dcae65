// src/models/stock_entry.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Entrada de estoque (recebimento). Único caminho de incremento do
// `current_stock` de um material.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub id: Uuid,
    pub material_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub batch: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("A quantidade deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockEntryPayload {
    pub material_id: Uuid,
    pub supplier_id: Option<Uuid>,

    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,

    pub unit_price: Option<Decimal>,
    pub batch: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
