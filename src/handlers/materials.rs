// src/handlers/materials.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser,
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: criação/edição do cadastro de material.
// Note que não existe campo de saldo: `currentStock` só muda por
// entrada de estoque ou despacho.
// ---
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,

    #[validate(length(min = 1, message = "A unidade de medida é obrigatória."))]
    pub unit: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub min_stock: Decimal,

    pub description: Option<String>,
}

pub async fn create_material(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<MaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let material = app_state
        .material_service
        .create_material(
            &user,
            &payload.name,
            &payload.category,
            &payload.unit,
            payload.min_stock,
            payload.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn update_material(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let material = app_state
        .material_service
        .update_material(
            &user,
            id,
            &payload.name,
            &payload.category,
            &payload.unit,
            payload.min_stock,
            payload.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(material)))
}

pub async fn get_all_materials(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let materials = app_state.material_service.get_all().await?;
    Ok((StatusCode::OK, Json(materials)))
}

// Alerta consultivo: current_stock <= min_stock.
pub async fn get_low_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let materials = app_state.material_service.get_low_stock(&user).await?;
    Ok((StatusCode::OK, Json(materials)))
}
