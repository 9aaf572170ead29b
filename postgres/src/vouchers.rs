//! Voucher definitions and usage counters.

use crate::error::{
    from_db_count, from_db_percent, is_unique_violation, storage, to_db_count, violates_constraint,
};
use brewspace_core::{
    NewVoucher, Result, ServiceKind, SettlementError, Voucher, VoucherId, VoucherPatch,
    VoucherStore,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

type VoucherRow = (
    Uuid,
    String,
    i16,
    i32,
    i32,
    Option<i16>,
    DateTime<Utc>,
    DateTime<Utc>,
);

const VOUCHER_COLUMNS: &str =
    "id, code, discount_percent, max_uses, used_count, service, valid_from, valid_to";

const USAGE_WITHIN_LIMIT: &str = "vouchers_usage_within_limit";

/// `PostgreSQL` voucher store.
#[derive(Clone, Debug)]
pub struct PgVoucherStore {
    pool: PgPool,
}

impl PgVoucherStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: VoucherRow) -> Result<Voucher> {
        let (id, code, discount_percent, max_uses, used_count, service, valid_from, valid_to) = row;
        Ok(Voucher {
            id: VoucherId::from_uuid(id),
            code,
            discount_percent: from_db_percent(discount_percent)?,
            max_uses: from_db_count(max_uses)?,
            used_count: from_db_count(used_count)?,
            service: service.and_then(ServiceKind::from_code),
            valid_from,
            valid_to,
        })
    }

    fn map_write_error<'a>(
        code: Option<&'a str>,
        context: &'static str,
    ) -> impl FnOnce(sqlx::Error) -> SettlementError + 'a {
        move |e| match code {
            Some(code) if is_unique_violation(&e) => SettlementError::DuplicateVoucherCode {
                code: code.to_string(),
            },
            _ => storage(context)(e),
        }
    }
}

impl VoucherStore for PgVoucherStore {
    async fn get_by_id(&self, voucher_id: VoucherId) -> Result<Option<Voucher>> {
        let row: Option<VoucherRow> =
            sqlx::query_as(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = $1"))
                .bind(voucher_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage("Failed to query voucher"))?;

        row.map(Self::from_row).transpose()
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        let row: Option<VoucherRow> =
            sqlx::query_as(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE code = $1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage("Failed to query voucher by code"))?;

        row.map(Self::from_row).transpose()
    }

    async fn increment_usage(&self, voucher_id: VoucherId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE vouchers SET used_count = used_count + 1
             WHERE id = $1 AND (max_uses = 0 OR used_count < max_uses)",
        )
        .bind(voucher_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to increment voucher usage"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_usage(&self, voucher_id: VoucherId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE vouchers SET used_count = used_count - 1 WHERE id = $1 AND used_count > 0",
        )
        .bind(voucher_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to release voucher usage"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert(&self, voucher: NewVoucher) -> Result<Voucher> {
        let row: VoucherRow = sqlx::query_as(&format!(
            "INSERT INTO vouchers (id, code, discount_percent, max_uses, used_count, service, valid_from, valid_to)
             VALUES ($1, $2, $3, $4, 0, $5, $6, $7)
             RETURNING {VOUCHER_COLUMNS}"
        ))
        .bind(*VoucherId::new().as_uuid())
        .bind(&voucher.code)
        .bind(i16::from(voucher.discount_percent))
        .bind(to_db_count(voucher.max_uses)?)
        .bind(voucher.service.map(ServiceKind::code))
        .bind(voucher.valid_from)
        .bind(voucher.valid_to)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_write_error(Some(&voucher.code), "Failed to insert voucher"))?;

        Self::from_row(row)
    }

    async fn update(&self, voucher_id: VoucherId, patch: VoucherPatch) -> Result<Option<Voucher>> {
        let max_uses = patch.max_uses.map(to_db_count).transpose()?;

        let row: Option<VoucherRow> = sqlx::query_as(&format!(
            "UPDATE vouchers SET
                 code = COALESCE($2, code),
                 discount_percent = COALESCE($3, discount_percent),
                 max_uses = COALESCE($4, max_uses),
                 valid_from = COALESCE($5, valid_from),
                 valid_to = COALESCE($6, valid_to)
             WHERE id = $1
             RETURNING {VOUCHER_COLUMNS}"
        ))
        .bind(voucher_id.as_uuid())
        .bind(patch.code.as_deref())
        .bind(patch.discount_percent.map(i16::from))
        .bind(max_uses)
        .bind(patch.valid_from)
        .bind(patch.valid_to)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match patch.max_uses {
            Some(max_uses) if violates_constraint(&e, USAGE_WITHIN_LIMIT) => {
                SettlementError::InvalidMaxUses { max_uses }
            }
            _ => Self::map_write_error(patch.code.as_deref(), "Failed to update voucher")(e),
        })?;

        row.map(Self::from_row).transpose()
    }

    async fn delete(&self, voucher_id: VoucherId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vouchers WHERE id = $1")
            .bind(voucher_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage("Failed to delete voucher"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(&self) -> Result<Vec<Voucher>> {
        let rows: Vec<VoucherRow> = sqlx::query_as(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers ORDER BY valid_from DESC, code ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage("Failed to list vouchers"))?;

        rows.into_iter().map(Self::from_row).collect()
    }
}
