// src/models/request.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// --- 1. Status da solicitação ---
// Os valores em português são contrato externo (banco e frontend);
// não renomear.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pendente,
    Aprovado,
    Rejeitado,
    Despachado,
    Cancelado,
}

impl RequestStatus {
    // Estados finais: nenhuma transição sai deles.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Rejeitado | RequestStatus::Despachado | RequestStatus::Cancelado
        )
    }

    // Aprovação, rejeição e edição só valem enquanto pendente.
    pub fn can_review(&self) -> bool {
        matches!(self, RequestStatus::Pendente)
    }

    // Despacho só vale depois de aprovado.
    pub fn can_dispatch(&self) -> bool {
        matches!(self, RequestStatus::Aprovado)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pendente => "pendente",
            RequestStatus::Aprovado => "aprovado",
            RequestStatus::Rejeitado => "rejeitado",
            RequestStatus::Despachado => "despachado",
            RequestStatus::Cancelado => "cancelado",
        }
    }
}

// --- 2. Prioridade ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "request_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    Baixa,
    Media,
    Alta,
}

// --- 3. Cabeçalho da solicitação ---
// Na rejeição, approved_by/approved_at registram quem rejeitou e quando
// (reuso de campo herdado do esquema existente; ver DESIGN.md).
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub status: RequestStatus,
    pub priority: RequestPriority,
    pub notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub dispatched_by: Option<Uuid>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 4. Item da solicitação ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    pub id: Uuid,
    pub request_id: Uuid,
    pub material_id: Uuid,
    pub requested_quantity: Decimal,
    pub approved_quantity: Option<Decimal>,
    pub dispatched_quantity: Option<Decimal>,
    pub notes: Option<String>,
}

// Solicitação completa para a tela de detalhes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWithItems {
    #[serde(flatten)]
    pub request: Request,
    pub items: Vec<RequestItem>,
}

// Linha da listagem, com totais agregados dos itens.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub school: Option<String>,
    pub status: RequestStatus,
    pub priority: RequestPriority,
    pub created_at: DateTime<Utc>,
    pub items_count: i64,
    pub total_requested: Decimal,
    pub total_dispatched: Decimal,
}

// --- 5. Payloads ---

// Item como chega do frontend. Os campos são opcionais de propósito:
// a ausência vira erro tipado (MissingMaterial/InvalidQuantity) em vez
// de 422 do serde.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequestItem {
    pub material_id: Option<Uuid>,
    pub requested_quantity: Option<Decimal>,
    pub notes: Option<String>,
}

// Item já validado, pronto para persistir.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedItem {
    pub material_id: Uuid,
    pub requested_quantity: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    pub priority: RequestPriority,
    pub notes: Option<String>,
    pub items: Vec<NewRequestItem>,
}

// Edição substitui prioridade, observações e a coleção inteira de itens.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestPayload {
    pub priority: RequestPriority,
    pub notes: Option<String>,
    pub items: Vec<NewRequestItem>,
}

// Quantidade aprovada por item. Sem quantidade = aprova o solicitado.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveItemPayload {
    pub item_id: Uuid,
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequestPayload {
    #[serde(default)]
    pub items: Vec<ApproveItemPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequestPayload {
    pub reason: String,
}

// Quantidade despachada por item. Sem quantidade = despacha a aprovada.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchItemPayload {
    pub item_id: Uuid,
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequestPayload {
    #[serde(default)]
    pub items: Vec<DispatchItemPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transicoes_partem_de_pendente_ou_aprovado() {
        assert!(RequestStatus::Pendente.can_review());
        assert!(!RequestStatus::Pendente.can_dispatch());

        assert!(!RequestStatus::Aprovado.can_review());
        assert!(RequestStatus::Aprovado.can_dispatch());

        for status in [
            RequestStatus::Rejeitado,
            RequestStatus::Despachado,
            RequestStatus::Cancelado,
        ] {
            assert!(status.is_terminal());
            assert!(!status.can_review());
            assert!(!status.can_dispatch());
        }
    }

    #[test]
    fn status_serializa_em_portugues() {
        let json = serde_json::to_string(&RequestStatus::Despachado).unwrap();
        assert_eq!(json, "\"despachado\"");
        assert_eq!(RequestStatus::Pendente.as_str(), "pendente");
    }
}
