// src/handlers/requests.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::request::{
        ApproveRequestPayload, CreateRequestPayload, DispatchRequestPayload,
        RejectRequestPayload, UpdateRequestPayload,
    },
};

// Criação: qualquer usuário autenticado; nasce pendente.
pub async fn create_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let created = app_state.request_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// Listagem: solicitante vê só as próprias; despachante/administrador, todas.
pub async fn list_requests(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let summaries = app_state.request_service.list(&user).await?;
    Ok((StatusCode::OK, Json(summaries)))
}

pub async fn get_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state.request_service.get(&user, id).await?;
    Ok((StatusCode::OK, Json(request)))
}

// Edição: só o próprio solicitante, só enquanto pendente.
pub async fn update_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state.request_service.update(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

pub async fn approve_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    let approved = app_state.request_service.approve(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(approved)))
}

pub async fn reject_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    let rejected = app_state
        .request_service
        .reject(&user, id, &payload.reason)
        .await?;
    Ok((StatusCode::OK, Json(rejected)))
}

// Despacho: baixa o estoque de cada item e encerra a solicitação.
pub async fn dispatch_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DispatchRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    let dispatched = app_state
        .request_service
        .dispatch(&user, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(dispatched)))
}
