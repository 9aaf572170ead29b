//! Wallet operations: onboarding, top-ups and history.

use crate::engine::SettlementEngine;
use crate::environment::{SettlementEnvironment, TopupStore, TransactionLedger, WalletStore};
use crate::error::{Result, SettlementError};
use crate::metrics::{SettlementStep, record_partial_failure, record_topup};
use crate::types::{
    Money, ServiceKind, Topup, TopupId, TopupStatus, Transaction, TransactionStatus, UserId,
    Wallet,
};

impl<E: SettlementEnvironment> SettlementEngine<E> {
    /// Open a zero-balance wallet; returns the existing wallet if there is one.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on write failure.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn open_wallet(&self, user_id: UserId) -> Result<Wallet> {
        let wallet = self.env.wallets().open(user_id).await?;
        tracing::debug!(balance = %wallet.balance, "Wallet opened");
        Ok(wallet)
    }

    /// Fetch a wallet.
    ///
    /// # Errors
    ///
    /// - `WalletNotFound` if the user has no wallet
    /// - `Storage` if the lookup fails
    pub async fn get_wallet(&self, user_id: UserId) -> Result<Wallet> {
        self.env
            .wallets()
            .get(user_id)
            .await?
            .ok_or(SettlementError::WalletNotFound)
    }

    /// Request a top-up. The wallet is credited on confirmation.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` unless the amount is positive
    /// - `InvalidTopupMethod` if the method is blank
    /// - `WalletNotFound` if the user has no wallet
    #[tracing::instrument(skip_all, fields(user_id = %user_id, amount = %amount))]
    pub async fn create_topup(&self, user_id: UserId, amount: Money, method: &str) -> Result<Topup> {
        if !amount.is_positive() {
            return Err(SettlementError::InvalidAmount { amount });
        }
        let method = method.trim();
        if method.is_empty() {
            return Err(SettlementError::InvalidTopupMethod);
        }

        self.get_wallet(user_id).await?;

        let topup = Topup {
            id: TopupId::new(),
            user_id,
            amount,
            method: method.to_string(),
            status: TopupStatus::Pending,
            created_at: self.now(),
        };
        self.env.topups().insert(&topup).await?;

        record_topup("created");
        tracing::info!(topup_id = %topup.id, "Top-up requested");
        Ok(topup)
    }

    /// Confirm a pending top-up and credit the wallet.
    ///
    /// The Pending → Completed transition is a compare-and-set at the store,
    /// so concurrent confirmations credit at most once.
    ///
    /// # Errors
    ///
    /// - `TopupNotFound` if the top-up does not exist
    /// - `NotPending` if it was already completed (including a lost race)
    /// - `CreditFailed` if the top-up was completed but the credit failed
    #[tracing::instrument(skip_all, fields(topup_id = %topup_id))]
    pub async fn confirm_topup(&self, topup_id: TopupId) -> Result<Topup> {
        let topup = self
            .env
            .topups()
            .get(topup_id)
            .await?
            .ok_or(SettlementError::TopupNotFound)?;

        if topup.status != TopupStatus::Pending {
            return Err(SettlementError::NotPending);
        }
        if !self.env.topups().mark_completed(topup_id).await? {
            return Err(SettlementError::NotPending);
        }

        match self.env.wallets().credit(topup.user_id, topup.amount).await {
            Ok(balance) => {
                tracing::debug!(user_id = %topup.user_id, balance = %balance, "Wallet credited");
            }
            Err(error) => {
                tracing::error!(
                    user_id = %topup.user_id,
                    amount = %topup.amount,
                    error = %error,
                    "Top-up completed but credit failed"
                );
                record_partial_failure(SettlementStep::TopupCredit);
                return Err(SettlementError::CreditFailed {
                    topup_id,
                    reason: error.to_string(),
                });
            }
        }

        self.record_transaction(
            topup.user_id,
            ServiceKind::Topup,
            *topup_id.as_uuid(),
            topup.amount,
            TransactionStatus::Completed,
        )
        .await;

        record_topup("completed");
        tracing::info!(user_id = %topup.user_id, amount = %topup.amount, "Top-up confirmed");

        Ok(Topup {
            status: TopupStatus::Completed,
            ..topup
        })
    }

    /// Fetch a top-up.
    ///
    /// # Errors
    ///
    /// - `TopupNotFound` if the top-up does not exist
    /// - `Storage` if the lookup fails
    pub async fn get_topup(&self, topup_id: TopupId) -> Result<Topup> {
        self.env
            .topups()
            .get(topup_id)
            .await?
            .ok_or(SettlementError::TopupNotFound)
    }

    /// A user's top-ups, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    pub async fn list_topups(&self, user_id: UserId) -> Result<Vec<Topup>> {
        self.env.topups().list_by_user(user_id).await
    }

    /// A user's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    pub async fn list_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        self.env.ledger().list_by_user(user_id).await
    }

    /// Ledger entries for a booking or top-up, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    pub async fn list_transactions_for(&self, reference: uuid::Uuid) -> Result<Vec<Transaction>> {
        self.env.ledger().list_by_reference(reference).await
    }
}
