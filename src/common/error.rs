use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante de regra de negócio é distinguível para o frontend
// renderizar o feedback correto.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Validação da solicitação (itens) ---
    #[error("Adicione pelo menos um item à solicitação")]
    EmptyRequest,

    #[error("Selecione um material para o item {0}")]
    MissingMaterial(usize),

    #[error("Informe uma quantidade válida para o item {0}")]
    InvalidQuantity(usize),

    #[error("Não é possível adicionar o mesmo material mais de uma vez")]
    DuplicateMaterial,

    #[error("Informe o motivo da rejeição")]
    MissingReason,

    // --- Autorização ---
    #[error("Você não tem permissão para executar esta ação")]
    Forbidden,

    // --- Máquina de estados ---
    #[error("Transição de status inválida: {0}")]
    InvalidState(String),

    #[error("Estoque insuficiente para o material '{0}'")]
    InsufficientStock(String),

    // --- Não encontrado ---
    #[error("Solicitação não encontrada")]
    RequestNotFound,

    #[error("Material não encontrado")]
    MaterialNotFound,

    #[error("Item não pertence à solicitação")]
    ItemNotFound,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // --- Autenticação (colaborador de identidade) ---
    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Retorna todos os detalhes da validação de payload.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::EmptyRequest
            | AppError::MissingMaterial(_)
            | AppError::InvalidQuantity(_)
            | AppError::DuplicateMaterial
            | AppError::MissingReason => (StatusCode::BAD_REQUEST, self.to_string()),

            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),

            // 409: a visão do cliente está desatualizada (status mudou) ou
            // o despacho estouraria o estoque.
            AppError::InvalidState(_) | AppError::InsufficientStock(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }

            AppError::RequestNotFound
            | AppError::MaterialNotFound
            | AppError::ItemNotFound
            | AppError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),

            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe algo genérico.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
