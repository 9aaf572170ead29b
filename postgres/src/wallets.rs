//! Wallet balances.
//!
//! Balances are only changed by single `UPDATE` statements: `credit` adds
//! unconditionally, `debit` subtracts only `WHERE balance >= amount`. There
//! is no read-modify-write, so concurrent debits cannot overdraw.

use crate::error::storage;
use brewspace_core::{DebitOutcome, Money, Result, SettlementError, UserId, Wallet, WalletStore};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// `PostgreSQL` wallet store.
#[derive(Clone, Debug)]
pub struct PgWalletStore {
    pool: PgPool,
}

impl PgWalletStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, user_id: UserId) -> Result<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM wallets WHERE user_id = $1)")
                .bind(user_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(storage("Failed to check wallet"))?;

        Ok(exists)
    }
}

impl WalletStore for PgWalletStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>> {
        let row: Option<(Uuid, Decimal)> =
            sqlx::query_as("SELECT user_id, balance FROM wallets WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage("Failed to query wallet"))?;

        Ok(row.map(|(user_id, balance)| Wallet {
            user_id: UserId::from_uuid(user_id),
            balance: Money::new(balance),
        }))
    }

    async fn open(&self, user_id: UserId) -> Result<Wallet> {
        sqlx::query(
            "INSERT INTO wallets (user_id, balance) VALUES ($1, 0)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to open wallet"))?;

        self.get(user_id)
            .await?
            .ok_or_else(|| SettlementError::Storage("Wallet vanished after open".to_string()))
    }

    async fn credit(&self, user_id: UserId, amount: Money) -> Result<Money> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE wallets SET balance = balance + $2, updated_at = now()
             WHERE user_id = $1
             RETURNING balance",
        )
        .bind(user_id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("Failed to credit wallet"))?;

        row.map(|(balance,)| Money::new(balance))
            .ok_or(SettlementError::WalletNotFound)
    }

    async fn debit(&self, user_id: UserId, amount: Money) -> Result<DebitOutcome> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            "UPDATE wallets SET balance = balance - $2, updated_at = now()
             WHERE user_id = $1 AND balance >= $2
             RETURNING balance",
        )
        .bind(user_id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("Failed to debit wallet"))?;

        if let Some((balance,)) = row {
            return Ok(DebitOutcome::Applied {
                balance: Money::new(balance),
            });
        }

        if self.exists(user_id).await? {
            Ok(DebitOutcome::InsufficientFunds)
        } else {
            Ok(DebitOutcome::WalletNotFound)
        }
    }
}
