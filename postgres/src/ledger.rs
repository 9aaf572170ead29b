//! Append-only transaction ledger.

use crate::error::{corrupt, storage};
use brewspace_core::{
    Money, Result, ServiceKind, Transaction, TransactionId, TransactionLedger, TransactionStatus,
    UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

type TransactionRow = (Uuid, Uuid, i16, Uuid, Decimal, DateTime<Utc>, String);

const SELECT_TRANSACTION: &str =
    "SELECT id, user_id, service, service_ref_id, amount, paid_at, status FROM transactions";

/// `PostgreSQL` transaction ledger.
#[derive(Clone, Debug)]
pub struct PgTransactionLedger {
    pool: PgPool,
}

impl PgTransactionLedger {
    /// Create a ledger over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: TransactionRow) -> Result<Transaction> {
        let (id, user_id, service, service_ref_id, amount, paid_at, status) = row;
        Ok(Transaction {
            id: TransactionId::from_uuid(id),
            user_id: UserId::from_uuid(user_id),
            service: ServiceKind::from_code(service)
                .ok_or_else(|| corrupt(format!("service code {service}")))?,
            service_ref_id,
            amount: Money::new(amount),
            paid_at,
            status: status.parse::<TransactionStatus>().map_err(corrupt)?,
        })
    }
}

impl TransactionLedger for PgTransactionLedger {
    async fn append(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            "INSERT INTO transactions (id, user_id, service, service_ref_id, amount, paid_at, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.user_id.as_uuid())
        .bind(transaction.service.code())
        .bind(transaction.service_ref_id)
        .bind(transaction.amount.amount())
        .bind(transaction.paid_at)
        .bind(transaction.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to append transaction"))?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{SELECT_TRANSACTION} WHERE user_id = $1 ORDER BY paid_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage("Failed to list transactions"))?;

        rows.into_iter().map(Self::from_row).collect()
    }

    async fn list_by_reference(&self, service_ref_id: Uuid) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{SELECT_TRANSACTION} WHERE service_ref_id = $1 ORDER BY paid_at ASC"
        ))
        .bind(service_ref_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("Failed to list transactions by reference"))?;

        rows.into_iter().map(Self::from_row).collect()
    }
}
