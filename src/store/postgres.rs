use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::builder::{self, ORDER_BY};
use super::{ListingQuery, Page, RecordStore, StoreError};
use crate::models::agenda_item::{AgendaItem, ItemId, ItemStatus, NewAgendaItem};

const SELECT_AGENDA_ITEM: &str = "\
    SELECT id, title, slug, city, start_at, end_at, visibility_type, status, \
           updated_at, cover_url, alt_text, deleted_at \
    FROM agenda_items";

const RETURNING_AGENDA_ITEM: &str = "\
    RETURNING id, title, slug, city, start_at, end_at, visibility_type, status, \
              updated_at, cover_url, alt_text, deleted_at";

const SNAPSHOT_READ: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY";

fn count_sql(where_clause: &str) -> String {
    format!("SELECT COUNT(*) FROM agenda_items WHERE {where_clause}")
}

/// Page query; LIMIT and OFFSET bind after the `n_params` filter values.
fn page_sql(where_clause: &str, n_params: usize) -> String {
    format!(
        "{SELECT_AGENDA_ITEM} WHERE {where_clause} ORDER BY {ORDER_BY} LIMIT ${} OFFSET ${}",
        n_params + 1,
        n_params + 2
    )
}

/// Postgres-backed record store over the `agenda_items` table.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        PgRecordStore { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list(&self, query: &ListingQuery) -> Result<Page, StoreError> {
        let (where_clause, params) = builder::build_where_clause(query, 0);

        // Count and page read the same snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_READ).execute(&mut *tx).await?;

        let count_sql = count_sql(&where_clause);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for p in &params {
            count_q = count_q.bind(p.as_str());
        }
        let total_count = count_q.fetch_one(&mut *tx).await?;

        let data_sql = page_sql(&where_clause, params.len());
        let mut data_q = sqlx::query_as::<_, AgendaItem>(&data_sql);
        for p in &params {
            data_q = data_q.bind(p.as_str());
        }
        let rows = data_q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Page { rows, total_count })
    }

    async fn find(&self, id: ItemId) -> Result<Option<AgendaItem>, StoreError> {
        let sql = format!("{SELECT_AGENDA_ITEM} WHERE id = $1 AND deleted_at IS NULL");
        let item = sqlx::query_as::<_, AgendaItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn set_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE agenda_items SET status = $1, updated_at = NOW() \
             WHERE id = ANY($2) AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn soft_delete(&self, id: ItemId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE agenda_items SET deleted_at = $1, updated_at = NOW() \
             WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert(&self, item: &NewAgendaItem) -> Result<AgendaItem, StoreError> {
        let sql = format!(
            "INSERT INTO agenda_items \
                 (title, slug, city, start_at, end_at, visibility_type, status, cover_url, alt_text) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             {RETURNING_AGENDA_ITEM}"
        );
        let created = sqlx::query_as::<_, AgendaItem>(&sql)
            .bind(&item.title)
            .bind(&item.slug)
            .bind(item.city.as_deref())
            .bind(item.start_at)
            .bind(item.end_at)
            .bind(&item.visibility_type)
            .bind(item.status.as_str())
            .bind(item.cover_url.as_deref())
            .bind(item.alt_text.as_deref())
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }
}
