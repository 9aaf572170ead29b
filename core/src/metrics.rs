//! Business metrics for settlement.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `brewspace_bookings_total{status}` - Bookings by outcome (created, cancelled, rejected)
//! - `brewspace_topups_total{status}` - Top-ups by status (created, completed)
//! - `brewspace_wallet_debits_total{outcome}` - Guarded debits by outcome
//! - `brewspace_settlement_partial_failures_total{step}` - Secondary effects that failed

use metrics::{counter, describe_counter};

/// Bookings counter name
pub const BOOKINGS_TOTAL: &str = "brewspace_bookings_total";
/// Top-ups counter name
pub const TOPUPS_TOTAL: &str = "brewspace_topups_total";
/// Wallet debits counter name
pub const WALLET_DEBITS_TOTAL: &str = "brewspace_wallet_debits_total";
/// Partial failures counter name
pub const PARTIAL_FAILURES_TOTAL: &str = "brewspace_settlement_partial_failures_total";

/// A secondary settlement effect that may fail without failing the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementStep {
    /// Voucher usage increment
    VoucherIncrement,
    /// Ledger append
    LedgerAppend,
    /// Releasing a booking whose payment failed
    Compensation,
    /// Refund credit after cancellation
    RefundCredit,
    /// Wallet credit after top-up confirmation
    TopupCredit,
}

impl SettlementStep {
    /// Label value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VoucherIncrement => "voucher_increment",
            Self::LedgerAppend => "ledger_append",
            Self::Compensation => "compensation",
            Self::RefundCredit => "refund_credit",
            Self::TopupCredit => "topup_credit",
        }
    }
}

/// Register all business metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        BOOKINGS_TOTAL,
        "Total number of bookings by status (created, cancelled, rejected)"
    );
    describe_counter!(
        TOPUPS_TOTAL,
        "Total number of wallet top-ups by status (created, completed)"
    );
    describe_counter!(
        WALLET_DEBITS_TOTAL,
        "Total number of guarded wallet debits by outcome"
    );
    describe_counter!(
        PARTIAL_FAILURES_TOTAL,
        "Secondary settlement effects that failed after the primary write"
    );

    tracing::info!("Business metrics registered");
}

pub(crate) fn record_booking(status: &'static str) {
    counter!(BOOKINGS_TOTAL, "status" => status).increment(1);
}

pub(crate) fn record_topup(status: &'static str) {
    counter!(TOPUPS_TOTAL, "status" => status).increment(1);
}

pub(crate) fn record_debit(outcome: &'static str) {
    counter!(WALLET_DEBITS_TOTAL, "outcome" => outcome).increment(1);
}

pub(crate) fn record_partial_failure(step: SettlementStep) {
    counter!(PARTIAL_FAILURES_TOTAL, "step" => step.as_str()).increment(1);
}
