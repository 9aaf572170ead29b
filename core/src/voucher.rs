//! Voucher operations: quoting and administration.

use crate::engine::SettlementEngine;
use crate::environment::{SettlementEnvironment, VoucherStore};
use crate::error::{Result, SettlementError};
use crate::policy::{
    check_usage_limit, check_voucher, quote, validate_voucher_code, validate_voucher_definition,
};
use crate::types::{Money, NewVoucher, Voucher, VoucherId, VoucherPatch, VoucherQuote};

impl<E: SettlementEnvironment> SettlementEngine<E> {
    /// Quote a voucher against an amount without redeeming it.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is negative
    /// - `InvalidVoucher` if the code is malformed or unknown
    /// - `VoucherExpired`, `VoucherExhausted`
    pub async fn apply_voucher(&self, code: &str, amount: Money) -> Result<VoucherQuote> {
        if amount.is_negative() {
            return Err(SettlementError::InvalidAmount { amount });
        }
        let code = code.trim();
        validate_voucher_code(code)?;

        let voucher = self
            .env
            .vouchers()
            .get_by_code(code)
            .await?
            .ok_or(SettlementError::InvalidVoucher)?;
        check_voucher(&voucher, self.now())?;

        quote(amount, &voucher)
    }

    /// Create a voucher.
    ///
    /// # Errors
    ///
    /// - `InvalidVoucher`, `InvalidDiscount`, `InvalidVoucherWindow`
    /// - `DuplicateVoucherCode` if the code is taken
    #[tracing::instrument(skip_all, fields(code = %voucher.code))]
    pub async fn create_voucher(&self, mut voucher: NewVoucher) -> Result<Voucher> {
        voucher.code = voucher.code.trim().to_string();
        validate_voucher_definition(&voucher)?;

        if self.env.vouchers().get_by_code(&voucher.code).await?.is_some() {
            return Err(SettlementError::DuplicateVoucherCode { code: voucher.code });
        }

        let created = self.env.vouchers().insert(voucher).await?;
        tracing::info!(voucher_id = %created.id, "Voucher created");
        Ok(created)
    }

    /// Fetch a voucher.
    ///
    /// # Errors
    ///
    /// - `VoucherNotFound` if the voucher does not exist
    /// - `Storage` if the lookup fails
    pub async fn get_voucher(&self, voucher_id: VoucherId) -> Result<Voucher> {
        self.env
            .vouchers()
            .get_by_id(voucher_id)
            .await?
            .ok_or(SettlementError::VoucherNotFound)
    }

    /// All vouchers.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    pub async fn list_vouchers(&self) -> Result<Vec<Voucher>> {
        self.env.vouchers().list().await
    }

    /// Vouchers redeemable right now.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    pub async fn list_valid_vouchers(&self) -> Result<Vec<Voucher>> {
        let now = self.now();
        let vouchers = self.env.vouchers().list().await?;
        Ok(vouchers
            .into_iter()
            .filter(|voucher| check_voucher(voucher, now).is_ok())
            .collect())
    }

    /// Patch a voucher. The patched definition is validated as a whole.
    ///
    /// # Errors
    ///
    /// - `VoucherNotFound` if the voucher does not exist
    /// - `InvalidVoucher`, `InvalidDiscount`, `InvalidVoucherWindow`
    /// - `InvalidMaxUses` if the limit drops below the current usage
    /// - `DuplicateVoucherCode` if the new code belongs to another voucher
    #[tracing::instrument(skip_all, fields(voucher_id = %voucher_id))]
    pub async fn update_voucher(
        &self,
        voucher_id: VoucherId,
        mut patch: VoucherPatch,
    ) -> Result<Voucher> {
        let existing = self.get_voucher(voucher_id).await?;
        patch.code = patch.code.map(|code| code.trim().to_string());

        let merged = NewVoucher {
            code: patch.code.clone().unwrap_or_else(|| existing.code.clone()),
            discount_percent: patch.discount_percent.unwrap_or(existing.discount_percent),
            max_uses: patch.max_uses.unwrap_or(existing.max_uses),
            service: existing.service,
            valid_from: patch.valid_from.unwrap_or(existing.valid_from),
            valid_to: patch.valid_to.unwrap_or(existing.valid_to),
        };
        validate_voucher_definition(&merged)?;
        check_usage_limit(merged.max_uses, existing.used_count)?;

        if merged.code != existing.code
            && let Some(other) = self.env.vouchers().get_by_code(&merged.code).await?
            && other.id != voucher_id
        {
            return Err(SettlementError::DuplicateVoucherCode { code: merged.code });
        }

        let updated = self
            .env
            .vouchers()
            .update(voucher_id, patch)
            .await?
            .ok_or(SettlementError::VoucherNotFound)?;
        tracing::info!("Voucher updated");
        Ok(updated)
    }

    /// Delete a voucher.
    ///
    /// # Errors
    ///
    /// - `VoucherNotFound` if the voucher does not exist
    /// - `Storage` on write failure
    #[tracing::instrument(skip_all, fields(voucher_id = %voucher_id))]
    pub async fn delete_voucher(&self, voucher_id: VoucherId) -> Result<()> {
        if !self.env.vouchers().delete(voucher_id).await? {
            return Err(SettlementError::VoucherNotFound);
        }
        tracing::info!("Voucher deleted");
        Ok(())
    }
}
