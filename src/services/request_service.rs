// src/services/request_service.rs
//
// Motor do ciclo de vida das solicitações:
// pendente -> {aprovado | rejeitado}, aprovado -> despachado.
//
// Cada transição roda dentro de uma única transação (cabeçalho + itens +
// baixa de estoque), e a mudança de status é um UPDATE condicional no
// status esperado. Dois atores concorrentes nunca ganham os dois.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{MaterialRepository, RequestRepository},
    models::{
        auth::User,
        request::{
            ApproveRequestPayload, CreateRequestPayload, DispatchRequestPayload,
            NewRequestItem, Request, RequestItem, RequestStatus, RequestSummary,
            RequestWithItems, UpdateRequestPayload, ValidatedItem,
        },
    },
};

#[derive(Clone)]
pub struct RequestService {
    request_repo: RequestRepository,
    material_repo: MaterialRepository,
    pool: PgPool,
}

impl RequestService {
    pub fn new(
        request_repo: RequestRepository,
        material_repo: MaterialRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            request_repo,
            material_repo,
            pool,
        }
    }

    // ---
    // Validação (pura, compartilhada entre criação e edição)
    // ---

    pub fn validate_items(items: &[NewRequestItem]) -> Result<Vec<ValidatedItem>, AppError> {
        if items.is_empty() {
            return Err(AppError::EmptyRequest);
        }

        let mut validated = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let material_id = item.material_id.ok_or(AppError::MissingMaterial(i + 1))?;

            let quantity = item
                .requested_quantity
                .filter(|q| *q > Decimal::ZERO)
                .ok_or(AppError::InvalidQuantity(i + 1))?;

            validated.push(ValidatedItem {
                material_id,
                requested_quantity: quantity,
                notes: item.notes.clone(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for item in &validated {
            if !seen.insert(item.material_id) {
                return Err(AppError::DuplicateMaterial);
            }
        }

        Ok(validated)
    }

    // Quantidade aprovada: sem valor explícito, aprova o solicitado.
    // Política: 0 <= aprovada <= solicitada (aprovar 0 = não conceder o item).
    fn resolve_approved_quantity(
        item: &RequestItem,
        requested_override: Option<Decimal>,
        position: usize,
    ) -> Result<Decimal, AppError> {
        match requested_override {
            None => Ok(item.requested_quantity),
            Some(q) if q >= Decimal::ZERO && q <= item.requested_quantity => Ok(q),
            Some(_) => Err(AppError::InvalidQuantity(position)),
        }
    }

    // Quantidade despachada: sem valor explícito, despacha a aprovada.
    // Política: 0 <= despachada <= aprovada.
    fn resolve_dispatched_quantity(
        item: &RequestItem,
        requested_override: Option<Decimal>,
        position: usize,
    ) -> Result<Decimal, AppError> {
        let approved = item.approved_quantity.unwrap_or(item.requested_quantity);
        match requested_override {
            None => Ok(approved),
            Some(q) if q >= Decimal::ZERO && q <= approved => Ok(q),
            Some(_) => Err(AppError::InvalidQuantity(position)),
        }
    }

    // Trilha de auditoria da rejeição: o motivo vai para as observações.
    fn rejection_notes(existing: Option<&str>, reason: &str) -> String {
        format!(
            "{}\nMotivo da rejeição: {}",
            existing.unwrap_or_default(),
            reason
        )
    }

    fn invalid_state(expected: &str, actual: RequestStatus) -> AppError {
        AppError::InvalidState(format!(
            "esperado '{}', status atual '{}'",
            expected,
            actual.as_str()
        ))
    }

    // Associa cada item do payload a um item da solicitação. Id que não
    // pertence à solicitação falha com ItemNotFound antes de qualquer escrita.
    fn match_overrides(
        items: &[RequestItem],
        overrides: &[(Uuid, Option<Decimal>)],
    ) -> Result<HashMap<Uuid, Option<Decimal>>, AppError> {
        let known: std::collections::HashSet<Uuid> = items.iter().map(|i| i.id).collect();
        let mut map = HashMap::new();
        for (item_id, quantity) in overrides {
            if !known.contains(item_id) {
                return Err(AppError::ItemNotFound);
            }
            map.insert(*item_id, *quantity);
        }
        Ok(map)
    }

    // ---
    // Transições
    // ---

    // CREATE: qualquer usuário autenticado. Nasce 'pendente', quantidades
    // aprovada/despachada nulas. Não toca no estoque.
    pub async fn create(
        &self,
        actor: &User,
        payload: CreateRequestPayload,
    ) -> Result<RequestWithItems, AppError> {
        let validated = Self::validate_items(&payload.items)?;

        let mut tx = self.pool.begin().await?;

        let request = self
            .request_repo
            .insert_header(&mut *tx, actor.id, payload.priority, payload.notes.as_deref())
            .await?;

        let mut items = Vec::with_capacity(validated.len());
        for item in &validated {
            items.push(
                self.request_repo
                    .insert_item(&mut *tx, request.id, item)
                    .await?,
            );
        }

        tx.commit().await?;

        tracing::info!("📝 Solicitação {} criada por {}", request.id, actor.id);
        Ok(RequestWithItems { request, items })
    }

    // UPDATE: só o próprio solicitante, só enquanto pendente. Substitui a
    // coleção de itens inteira; uma nova edição implica nova revisão.
    pub async fn update(
        &self,
        actor: &User,
        request_id: Uuid,
        payload: UpdateRequestPayload,
    ) -> Result<RequestWithItems, AppError> {
        let validated = Self::validate_items(&payload.items)?;

        let mut tx = self.pool.begin().await?;

        let existing = self
            .request_repo
            .find_by_id(&mut *tx, request_id)
            .await?
            .ok_or(AppError::RequestNotFound)?;

        if existing.requester_id != actor.id {
            return Err(AppError::Forbidden);
        }

        // Somente solicitações pendentes são editáveis.
        if !existing.status.can_review() {
            return Err(Self::invalid_state("pendente", existing.status));
        }

        let request = self
            .request_repo
            .update_header_if_pending(
                &mut *tx,
                request_id,
                payload.priority,
                payload.notes.as_deref(),
            )
            .await?
            .ok_or_else(|| Self::invalid_state("pendente", existing.status))?;

        self.request_repo.delete_items(&mut *tx, request_id).await?;

        let mut items = Vec::with_capacity(validated.len());
        for item in &validated {
            items.push(
                self.request_repo
                    .insert_item(&mut *tx, request_id, item)
                    .await?,
            );
        }

        tx.commit().await?;
        Ok(RequestWithItems { request, items })
    }

    // APPROVE: despachante/administrador, pendente -> aprovado.
    // Grava a quantidade aprovada em cada item. Não toca no estoque.
    pub async fn approve(
        &self,
        actor: &User,
        request_id: Uuid,
        payload: ApproveRequestPayload,
    ) -> Result<RequestWithItems, AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }

        let mut tx = self.pool.begin().await?;

        let request = match self
            .request_repo
            .mark_approved(&mut *tx, request_id, actor.id)
            .await?
        {
            Some(request) => request,
            None => {
                let existing = self
                    .request_repo
                    .find_by_id(&mut *tx, request_id)
                    .await?
                    .ok_or(AppError::RequestNotFound)?;
                return Err(Self::invalid_state("pendente", existing.status));
            }
        };

        let items = self.request_repo.list_items(&mut *tx, request_id).await?;
        let overrides: Vec<(Uuid, Option<Decimal>)> = payload
            .items
            .iter()
            .map(|i| (i.item_id, i.quantity))
            .collect();
        let overrides = Self::match_overrides(&items, &overrides)?;

        for (position, item) in items.iter().enumerate() {
            let quantity = Self::resolve_approved_quantity(
                item,
                overrides.get(&item.id).copied().flatten(),
                position + 1,
            )?;

            let rows = self
                .request_repo
                .set_approved_quantity(&mut *tx, request_id, item.id, quantity)
                .await?;
            if rows == 0 {
                return Err(AppError::ItemNotFound);
            }
        }

        let items = self.request_repo.list_items(&mut *tx, request_id).await?;
        tx.commit().await?;

        tracing::info!("✅ Solicitação {} aprovada por {}", request_id, actor.id);
        Ok(RequestWithItems { request, items })
    }

    // REJECT: despachante/administrador, pendente -> rejeitado.
    // O motivo é obrigatório e vira linha de auditoria nas observações.
    pub async fn reject(
        &self,
        actor: &User,
        request_id: Uuid,
        reason: &str,
    ) -> Result<Request, AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::MissingReason);
        }

        let mut tx = self.pool.begin().await?;

        let existing = self
            .request_repo
            .find_by_id(&mut *tx, request_id)
            .await?
            .ok_or(AppError::RequestNotFound)?;

        if !existing.status.can_review() {
            return Err(Self::invalid_state("pendente", existing.status));
        }

        let notes = Self::rejection_notes(existing.notes.as_deref(), reason);

        let request = self
            .request_repo
            .mark_rejected(&mut *tx, request_id, actor.id, &notes)
            .await?
            .ok_or_else(|| Self::invalid_state("pendente", existing.status))?;

        tx.commit().await?;

        tracing::info!("🚫 Solicitação {} rejeitada por {}", request_id, actor.id);
        Ok(request)
    }

    // DISPATCH: despachante/administrador, aprovado -> despachado.
    // Única transição que mexe no estoque pelo caminho da solicitação:
    // baixa atômica por item, tudo-ou-nada. Um despacho que estouraria o
    // saldo falha inteiro com InsufficientStock.
    pub async fn dispatch(
        &self,
        actor: &User,
        request_id: Uuid,
        payload: DispatchRequestPayload,
    ) -> Result<RequestWithItems, AppError> {
        if !actor.role.can_review_requests() {
            return Err(AppError::Forbidden);
        }

        let mut tx = self.pool.begin().await?;

        let request = match self
            .request_repo
            .mark_dispatched(&mut *tx, request_id, actor.id)
            .await?
        {
            Some(request) => request,
            None => {
                let existing = self
                    .request_repo
                    .find_by_id(&mut *tx, request_id)
                    .await?
                    .ok_or(AppError::RequestNotFound)?;
                return Err(Self::invalid_state("aprovado", existing.status));
            }
        };

        let items = self.request_repo.list_items(&mut *tx, request_id).await?;
        let overrides: Vec<(Uuid, Option<Decimal>)> = payload
            .items
            .iter()
            .map(|i| (i.item_id, i.quantity))
            .collect();
        let overrides = Self::match_overrides(&items, &overrides)?;

        for (position, item) in items.iter().enumerate() {
            let quantity = Self::resolve_dispatched_quantity(
                item,
                overrides.get(&item.id).copied().flatten(),
                position + 1,
            )?;

            let rows = self
                .request_repo
                .set_dispatched_quantity(&mut *tx, request_id, item.id, quantity)
                .await?;
            if rows == 0 {
                return Err(AppError::ItemNotFound);
            }

            if quantity > Decimal::ZERO {
                let material = self
                    .material_repo
                    .find_by_id(&mut *tx, item.material_id)
                    .await?
                    .ok_or(AppError::MaterialNotFound)?;

                self.material_repo
                    .decrease_stock_checked(&mut *tx, item.material_id, quantity)
                    .await?
                    .ok_or(AppError::InsufficientStock(material.name))?;
            }
        }

        let items = self.request_repo.list_items(&mut *tx, request_id).await?;
        tx.commit().await?;

        tracing::info!("📦 Solicitação {} despachada por {}", request_id, actor.id);
        Ok(RequestWithItems { request, items })
    }

    // ---
    // Leituras
    // ---

    pub async fn get(&self, actor: &User, request_id: Uuid) -> Result<RequestWithItems, AppError> {
        let request = self
            .request_repo
            .find_by_id(&self.pool, request_id)
            .await?
            .ok_or(AppError::RequestNotFound)?;

        // Solicitante só enxerga as próprias solicitações.
        if !actor.role.can_review_requests() && request.requester_id != actor.id {
            return Err(AppError::Forbidden);
        }

        let items = self.request_repo.list_items(&self.pool, request_id).await?;
        Ok(RequestWithItems { request, items })
    }

    pub async fn list(&self, actor: &User) -> Result<Vec<RequestSummary>, AppError> {
        let filter = if actor.role.can_review_requests() {
            None
        } else {
            Some(actor.id)
        };
        self.request_repo.list_summaries(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::NewRequestItem;

    fn item(material_id: Option<Uuid>, quantity: Option<i64>) -> NewRequestItem {
        NewRequestItem {
            material_id,
            requested_quantity: quantity.map(Decimal::from),
            notes: None,
        }
    }

    fn request_item(requested: i64, approved: Option<i64>) -> RequestItem {
        RequestItem {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            material_id: Uuid::new_v4(),
            requested_quantity: Decimal::from(requested),
            approved_quantity: approved.map(Decimal::from),
            dispatched_quantity: None,
            notes: None,
        }
    }

    #[test]
    fn aceita_conjunto_valido_sem_alterar_itens() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = vec![item(Some(a), Some(50)), item(Some(b), Some(3))];

        let validated = RequestService::validate_items(&items).unwrap();
        assert_eq!(validated.len(), 2);
        assert_eq!(validated[0].material_id, a);
        assert_eq!(validated[0].requested_quantity, Decimal::from(50));
        assert_eq!(validated[1].material_id, b);
    }

    #[test]
    fn rejeita_solicitacao_vazia() {
        let err = RequestService::validate_items(&[]).unwrap_err();
        assert!(matches!(err, AppError::EmptyRequest));
    }

    #[test]
    fn rejeita_item_sem_material() {
        let items = vec![item(Some(Uuid::new_v4()), Some(2)), item(None, Some(5))];
        let err = RequestService::validate_items(&items).unwrap_err();
        assert!(matches!(err, AppError::MissingMaterial(2)));
    }

    #[test]
    fn rejeita_quantidade_ausente_zero_ou_negativa() {
        let id = Uuid::new_v4();
        for quantity in [None, Some(0), Some(-3)] {
            let err = RequestService::validate_items(&[item(Some(id), quantity)]).unwrap_err();
            assert!(matches!(err, AppError::InvalidQuantity(1)));
        }
    }

    #[test]
    fn rejeita_material_duplicado() {
        let id = Uuid::new_v4();
        let items = vec![item(Some(id), Some(1)), item(Some(id), Some(2))];
        let err = RequestService::validate_items(&items).unwrap_err();
        assert!(matches!(err, AppError::DuplicateMaterial));
    }

    #[test]
    fn aprovacao_sem_quantidade_usa_a_solicitada() {
        let item = request_item(50, None);
        let qty = RequestService::resolve_approved_quantity(&item, None, 1).unwrap();
        assert_eq!(qty, Decimal::from(50));
    }

    #[test]
    fn aprovacao_aceita_quantidade_menor_e_zero() {
        let item = request_item(50, None);
        let qty =
            RequestService::resolve_approved_quantity(&item, Some(Decimal::from(45)), 1).unwrap();
        assert_eq!(qty, Decimal::from(45));

        let qty =
            RequestService::resolve_approved_quantity(&item, Some(Decimal::ZERO), 1).unwrap();
        assert_eq!(qty, Decimal::ZERO);
    }

    #[test]
    fn aprovacao_nao_excede_a_quantidade_solicitada() {
        let item = request_item(50, None);
        let err = RequestService::resolve_approved_quantity(&item, Some(Decimal::from(51)), 3)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(3)));

        let err = RequestService::resolve_approved_quantity(&item, Some(Decimal::from(-1)), 3)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(3)));
    }

    #[test]
    fn despacho_sem_quantidade_usa_a_aprovada() {
        let item = request_item(50, Some(45));
        let qty = RequestService::resolve_dispatched_quantity(&item, None, 1).unwrap();
        assert_eq!(qty, Decimal::from(45));
    }

    #[test]
    fn despacho_nao_excede_a_quantidade_aprovada() {
        let item = request_item(50, Some(45));
        let err = RequestService::resolve_dispatched_quantity(&item, Some(Decimal::from(46)), 2)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(2)));
    }

    #[test]
    fn payload_com_item_de_outra_solicitacao_falha() {
        let items = vec![request_item(10, None), request_item(5, None)];
        let overrides = vec![(Uuid::new_v4(), Some(Decimal::from(1)))];
        let err = RequestService::match_overrides(&items, &overrides).unwrap_err();
        assert!(matches!(err, AppError::ItemNotFound));
    }

    #[test]
    fn motivo_da_rejeicao_vira_linha_de_auditoria() {
        let notes = RequestService::rejection_notes(Some("urgente"), "sem orçamento");
        assert_eq!(notes, "urgente\nMotivo da rejeição: sem orçamento");

        let notes = RequestService::rejection_notes(None, "fora de época");
        assert_eq!(notes, "\nMotivo da rejeição: fora de época");
    }
}
