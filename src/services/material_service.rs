// src/services/material_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{MaterialRepository, StockEntryRepository},
    models::{
        auth::User,
        material::Material,
        stock_entry::{CreateStockEntryPayload, StockEntry},
    },
};

// Livro-razão de materiais: cadastro + saldo. O saldo só muda aqui
// (entrada) e no despacho de solicitações (baixa).
#[derive(Clone)]
pub struct MaterialService {
    material_repo: MaterialRepository,
    stock_entry_repo: StockEntryRepository,
    pool: PgPool,
}

impl MaterialService {
    pub fn new(
        material_repo: MaterialRepository,
        stock_entry_repo: StockEntryRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            material_repo,
            stock_entry_repo,
            pool,
        }
    }

    // Catálogo visível para qualquer usuário autenticado (o solicitante
    // precisa dele para montar a solicitação).
    pub async fn get_all(&self) -> Result<Vec<Material>, AppError> {
        self.material_repo.get_all().await
    }

    pub async fn get_low_stock(&self, actor: &User) -> Result<Vec<Material>, AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }
        self.material_repo.get_low_stock().await
    }

    pub async fn create_material(
        &self,
        actor: &User,
        name: &str,
        category: &str,
        unit: &str,
        min_stock: Decimal,
        description: Option<&str>,
    ) -> Result<Material, AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }
        self.material_repo
            .create(&self.pool, name, category, unit, min_stock, description)
            .await
    }

    pub async fn update_material(
        &self,
        actor: &User,
        id: Uuid,
        name: &str,
        category: &str,
        unit: &str,
        min_stock: Decimal,
        description: Option<&str>,
    ) -> Result<Material, AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }
        self.material_repo
            .update(&self.pool, id, name, category, unit, min_stock, description)
            .await
    }

    // --- ENTRADA DE ESTOQUE ---
    // Registra o recebimento e incrementa o saldo na mesma transação.
    pub async fn add_stock(
        &self,
        actor: &User,
        payload: CreateStockEntryPayload,
    ) -> Result<(StockEntry, Material), AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }

        let mut tx = self.pool.begin().await?;

        self.material_repo
            .find_by_id(&mut *tx, payload.material_id)
            .await?
            .ok_or(AppError::MaterialNotFound)?;

        let entry = self
            .stock_entry_repo
            .insert(
                &mut *tx,
                payload.material_id,
                payload.supplier_id,
                payload.quantity,
                payload.unit_price,
                payload.batch.as_deref(),
                payload.expiry_date,
                payload.notes.as_deref(),
                actor.id,
            )
            .await?;

        let material = self
            .material_repo
            .increase_stock(&mut *tx, payload.material_id, payload.quantity)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📥 Entrada de {} registrada para o material {}",
            payload.quantity,
            material.name
        );
        Ok((entry, material))
    }

    pub async fn list_stock_entries(&self, actor: &User) -> Result<Vec<StockEntry>, AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }
        self.stock_entry_repo.get_all().await
    }
}
