//! The settlement engine.
//!
//! `SettlementEngine` owns the environment, the business policy and the
//! per-room locks. Its operations are split by concern across
//! [`booking`](crate::booking), [`wallet`](crate::wallet) and
//! [`voucher`](crate::voucher); this module holds the shared plumbing.

use crate::environment::{Clock, RoomDirectory, SettlementEnvironment, TransactionLedger};
use crate::locks::RoomLocks;
use crate::metrics::{SettlementStep, record_partial_failure};
use crate::policy::SettlementPolicy;
use crate::types::{
    Booking, BookingView, Money, RoomId, ServiceKind, Transaction, TransactionId,
    TransactionStatus, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Booking and wallet settlement engine.
///
/// Cheap to clone; clones share the same room locks.
#[derive(Clone)]
pub struct SettlementEngine<E: SettlementEnvironment> {
    pub(crate) env: E,
    pub(crate) policy: SettlementPolicy,
    pub(crate) locks: RoomLocks,
}

impl<E: SettlementEnvironment> SettlementEngine<E> {
    /// Create an engine with the default policy.
    #[must_use]
    pub fn new(env: E) -> Self {
        Self {
            env,
            policy: SettlementPolicy::default(),
            locks: RoomLocks::new(),
        }
    }

    /// Replace the business policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The environment this engine runs against.
    #[must_use]
    pub const fn environment(&self) -> &E {
        &self.env
    }

    /// Active business policy.
    #[must_use]
    pub const fn policy(&self) -> &SettlementPolicy {
        &self.policy
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.env.clock().now()
    }

    /// Append a ledger entry; failures are logged and counted, never
    /// returned.
    pub(crate) async fn record_transaction(
        &self,
        user_id: UserId,
        service: ServiceKind,
        reference: Uuid,
        amount: Money,
        status: TransactionStatus,
    ) {
        let transaction = Transaction {
            id: TransactionId::new(),
            user_id,
            service,
            service_ref_id: reference,
            amount,
            paid_at: self.now(),
            status,
        };

        if let Err(error) = self.env.ledger().append(&transaction).await {
            tracing::warn!(
                user_id = %user_id,
                reference = %reference,
                amount = %amount,
                error = %error,
                "Failed to append ledger entry"
            );
            record_partial_failure(SettlementStep::LedgerAppend);
        }
    }

    async fn room_name(&self, room_id: RoomId) -> String {
        match self.env.rooms().get_room(room_id).await {
            Ok(Some(room)) => room.name,
            Ok(None) => String::new(),
            Err(error) => {
                tracing::debug!(room_id = %room_id, error = %error, "Room name lookup failed");
                String::new()
            }
        }
    }

    /// Resolve the room name for a booking, best-effort.
    pub(crate) async fn view(&self, booking: Booking) -> BookingView {
        let name = self.room_name(booking.room_id).await;
        BookingView::new(booking, name)
    }

    pub(crate) async fn views(&self, bookings: Vec<Booking>) -> Vec<BookingView> {
        let mut names: HashMap<RoomId, String> = HashMap::new();
        let mut views = Vec::with_capacity(bookings.len());

        for booking in bookings {
            let name = match names.get(&booking.room_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.room_name(booking.room_id).await;
                    names.insert(booking.room_id, name.clone());
                    name
                }
            };
            views.push(BookingView::new(booking, name));
        }

        views
    }
}
