//! Wallet top-ups.

use crate::error::{corrupt, storage};
use brewspace_core::{Money, Result, Topup, TopupId, TopupStatus, TopupStore, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

type TopupRow = (Uuid, Uuid, Decimal, String, String, DateTime<Utc>);

/// `PostgreSQL` top-up store.
#[derive(Clone, Debug)]
pub struct PgTopupStore {
    pool: PgPool,
}

impl PgTopupStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: TopupRow) -> Result<Topup> {
        let (id, user_id, amount, method, status, created_at) = row;
        Ok(Topup {
            id: TopupId::from_uuid(id),
            user_id: UserId::from_uuid(user_id),
            amount: Money::new(amount),
            method,
            status: status.parse::<TopupStatus>().map_err(corrupt)?,
            created_at,
        })
    }
}

impl TopupStore for PgTopupStore {
    async fn insert(&self, topup: &Topup) -> Result<()> {
        sqlx::query(
            "INSERT INTO topups (id, user_id, amount, method, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(topup.id.as_uuid())
        .bind(topup.user_id.as_uuid())
        .bind(topup.amount.amount())
        .bind(&topup.method)
        .bind(topup.status.as_str())
        .bind(topup.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to insert top-up"))?;

        Ok(())
    }

    async fn get(&self, topup_id: TopupId) -> Result<Option<Topup>> {
        let row: Option<TopupRow> = sqlx::query_as(
            "SELECT id, user_id, amount, method, status, created_at FROM topups WHERE id = $1",
        )
        .bind(topup_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("Failed to query top-up"))?;

        row.map(Self::from_row).transpose()
    }

    async fn mark_completed(&self, topup_id: TopupId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE topups SET status = 'completed', completed_at = now()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(topup_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to complete top-up"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Topup>> {
        let rows: Vec<TopupRow> = sqlx::query_as(
            "SELECT id, user_id, amount, method, status, created_at
             FROM topups
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage("Failed to list top-ups"))?;

        rows.into_iter().map(Self::from_row).collect()
    }
}
