// src/db/material_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::material::Material};

#[derive(Clone)]
pub struct MaterialRepository {
    pool: PgPool,
}

impl MaterialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    pub async fn get_all(&self) -> Result<Vec<Material>, AppError> {
        let materials = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(materials)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(material)
    }

    // Materiais no limite ou abaixo do estoque mínimo (alerta consultivo).
    pub async fn get_low_stock(&self) -> Result<Vec<Material>, AppError> {
        let materials = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE current_stock <= min_stock ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(materials)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        category: &str,
        unit: &str,
        min_stock: Decimal,
        description: Option<&str>,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (name, category, unit, min_stock, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(category)
        .bind(unit)
        .bind(min_stock)
        .bind(description)
        .fetch_one(executor)
        .await?;
        Ok(material)
    }

    // Atualiza o cadastro. `current_stock` fica de fora de propósito:
    // saldo só muda por entrada de estoque ou despacho.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        category: &str,
        unit: &str,
        min_stock: Decimal,
        description: Option<&str>,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(
            r#"
            UPDATE materials
            SET name = $2, category = $3, unit = $4, min_stock = $5,
                description = $6, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(category)
        .bind(unit)
        .bind(min_stock)
        .bind(description)
        .fetch_optional(executor)
        .await?;

        material.ok_or(AppError::MaterialNotFound)
    }

    // Incremento atômico do saldo (entrada de estoque).
    pub async fn increase_stock<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity: Decimal,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(
            r#"
            UPDATE materials
            SET current_stock = current_stock + $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;

        material.ok_or(AppError::MaterialNotFound)
    }

    // Decremento atômico condicional: só aplica se o saldo comporta a
    // baixa. Retorna None quando o saldo é insuficiente, sem alterar nada.
    pub async fn decrease_stock_checked<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity: Decimal,
    ) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, Material>(
            r#"
            UPDATE materials
            SET current_stock = current_stock - $2, updated_at = now()
            WHERE id = $1 AND current_stock >= $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;

        Ok(material)
    }
}
