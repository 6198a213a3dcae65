// src/handlers/stock_entries.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::stock_entry::CreateStockEntryPayload,
};

// Entrada de estoque: o único caminho de incremento do saldo.
pub async fn add_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateStockEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (entry, material) = app_state.material_service.add_stock(&user, payload).await?;

    // Retorna o novo saldo para o frontend atualizar a tela
    Ok((
        StatusCode::CREATED,
        Json(json!({ "entry": entry, "material": material })),
    ))
}

pub async fn get_all_stock_entries(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.material_service.list_stock_entries(&user).await?;
    Ok((StatusCode::OK, Json(entries)))
}
