// src/db/request_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::request::{Request, RequestItem, RequestPriority, RequestSummary, ValidatedItem},
};

#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Request>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<RequestItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, RequestItem>(
            "SELECT * FROM request_items WHERE request_id = $1 ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    // Listagem com totais agregados. `requester_id = None` lista tudo
    // (despachante/administrador); solicitante enxerga só o que é dele.
    pub async fn list_summaries(
        &self,
        requester_id: Option<Uuid>,
    ) -> Result<Vec<RequestSummary>, AppError> {
        let summaries = sqlx::query_as::<_, RequestSummary>(
            r#"
            SELECT
                r.id, r.requester_id, u.name AS requester_name, u.school,
                r.status, r.priority, r.created_at,
                COUNT(i.id) AS items_count,
                COALESCE(SUM(i.requested_quantity), 0) AS total_requested,
                COALESCE(SUM(i.dispatched_quantity), 0) AS total_dispatched
            FROM requests r
            JOIN users u ON u.id = r.requester_id
            LEFT JOIN request_items i ON i.request_id = r.id
            WHERE ($1::uuid IS NULL OR r.requester_id = $1)
            GROUP BY r.id, u.name, u.school
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(summaries)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    pub async fn insert_header<'e, E>(
        &self,
        executor: E,
        requester_id: Uuid,
        priority: RequestPriority,
        notes: Option<&str>,
    ) -> Result<Request, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, Request>(
            r#"
            INSERT INTO requests (requester_id, priority, notes)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(priority)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    // Insere um item já validado. A constraint UNIQUE (request_id,
    // material_id) é a segunda linha de defesa contra duplicados.
    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        item: &ValidatedItem,
    ) -> Result<RequestItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inserted = sqlx::query_as::<_, RequestItem>(
            r#"
            INSERT INTO request_items (request_id, material_id, requested_quantity, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(item.material_id)
        .bind(item.requested_quantity)
        .bind(item.notes.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateMaterial;
                }
            }
            e.into()
        })?;
        Ok(inserted)
    }

    pub async fn delete_items<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM request_items WHERE request_id = $1")
            .bind(request_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Edição do cabeçalho condicionada ao status 'pendente'. O WHERE é o
    // compare-and-swap: dois atores concorrentes não ganham os dois.
    pub async fn update_header_if_pending<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        priority: RequestPriority,
        notes: Option<&str>,
    ) -> Result<Option<Request>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, Request>(
            r#"
            UPDATE requests
            SET priority = $2, notes = $3, updated_at = now()
            WHERE id = $1 AND status = 'pendente'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(priority)
        .bind(notes)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    // pendente -> aprovado (condicional)
    pub async fn mark_approved<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        actor_id: Uuid,
    ) -> Result<Option<Request>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, Request>(
            r#"
            UPDATE requests
            SET status = 'aprovado', approved_by = $2, approved_at = now(), updated_at = now()
            WHERE id = $1 AND status = 'pendente'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    // pendente -> rejeitado (condicional). O motivo já vem embutido nas
    // observações; approved_by/approved_at registram quem rejeitou.
    pub async fn mark_rejected<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        actor_id: Uuid,
        notes: &str,
    ) -> Result<Option<Request>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, Request>(
            r#"
            UPDATE requests
            SET status = 'rejeitado', approved_by = $2, approved_at = now(),
                notes = $3, updated_at = now()
            WHERE id = $1 AND status = 'pendente'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(notes)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    // aprovado -> despachado (condicional)
    pub async fn mark_dispatched<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        actor_id: Uuid,
    ) -> Result<Option<Request>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, Request>(
            r#"
            UPDATE requests
            SET status = 'despachado', dispatched_by = $2, dispatched_at = now(),
                updated_at = now()
            WHERE id = $1 AND status = 'aprovado'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    // Grava a quantidade aprovada de um item. Retorna o número de linhas
    // afetadas: 0 significa que o item não pertence à solicitação.
    pub async fn set_approved_quantity<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE request_items SET approved_quantity = $3 WHERE id = $2 AND request_id = $1",
        )
        .bind(request_id)
        .bind(item_id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_dispatched_quantity<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE request_items SET dispatched_quantity = $3 WHERE id = $2 AND request_id = $1",
        )
        .bind(request_id)
        .bind(item_id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
