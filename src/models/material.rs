// src/models/material.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Catálogo de materiais. O `current_stock` é a fonte única da verdade
// do saldo em mãos: só muda por entrada de estoque (+) ou despacho (-),
// nunca por escrita direta do cadastro.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    // Condição consultiva de alerta, não bloqueia despacho.
    pub fn is_low(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn material(current: i64, min: i64) -> Material {
        Material {
            id: Uuid::new_v4(),
            name: "Papel A4".to_string(),
            category: "Papelaria".to_string(),
            unit: "resma".to_string(),
            current_stock: Decimal::from(current),
            min_stock: Decimal::from(min),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn estoque_igual_ao_minimo_conta_como_baixo() {
        assert!(material(10, 10).is_low());
        assert!(material(3, 10).is_low());
        assert!(!material(11, 10).is_low());
    }
}
