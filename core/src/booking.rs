//! Booking operations: create, cancel, and read.

use crate::engine::SettlementEngine;
use crate::environment::{
    BookingStore, RoomDirectory, SettlementEnvironment, VoucherStore, WalletStore,
};
use crate::error::{Result, SettlementError};
use crate::metrics::{SettlementStep, record_booking, record_debit, record_partial_failure};
use crate::policy::{
    booking_price, check_voucher, normalize_voucher_code, quote, validate_slot,
    validate_voucher_code,
};
use crate::types::{
    Booking, BookingId, BookingReceipt, BookingRequest, BookingStatus, BookingView, DebitOutcome,
    Money, RoomId, ServiceKind, TimeSlot, TransactionStatus, UserId, Voucher, VoucherId,
};

impl<E: SettlementEnvironment> SettlementEngine<E> {
    /// Book a room and charge the customer's wallet.
    ///
    /// Checks run in a fixed order and the first failure wins: time range,
    /// past start, voucher code format, room, slot availability, voucher
    /// eligibility, wallet balance. The availability check and the insert
    /// run under the room's lock.
    ///
    /// After the booking is written, a debit that does not apply releases
    /// the booking again and fails with `PaymentFailed`. A redeemed voucher
    /// use is handed back whenever the booking does not go through. Voucher
    /// usage and ledger failures are logged and do not fail the booking.
    ///
    /// # Errors
    ///
    /// - `InvalidTimeRange`, `PastBooking`, `InvalidVoucher`
    /// - `RoomNotFound`, `RoomUnavailable`, `SlotConflict`
    /// - `VoucherExpired`, `VoucherExhausted`
    /// - `WalletNotFound`, `InsufficientBalance`, `PaymentFailed`
    /// - `Storage` on store failure before the booking is written
    #[tracing::instrument(
        skip_all,
        fields(customer_id = %customer_id, room_id = %request.room_id)
    )]
    pub async fn create_booking(
        &self,
        customer_id: UserId,
        request: BookingRequest,
    ) -> Result<BookingReceipt> {
        let result = self.try_create_booking(customer_id, request).await;

        match &result {
            Ok(receipt) => {
                record_booking("created");
                tracing::info!(
                    booking_id = %receipt.booking.id,
                    total_price = %receipt.booking.total_price,
                    "Booking created"
                );
            }
            Err(error) => {
                record_booking("rejected");
                tracing::info!(error = %error, "Booking rejected");
            }
        }

        result
    }

    async fn try_create_booking(
        &self,
        customer_id: UserId,
        request: BookingRequest,
    ) -> Result<BookingReceipt> {
        let slot = TimeSlot::new(request.start_time, request.end_time);
        let now = self.now();
        validate_slot(slot, now)?;

        let voucher_code = normalize_voucher_code(request.voucher_code);
        if let Some(code) = &voucher_code {
            validate_voucher_code(code)?;
        }

        let room = self
            .env
            .rooms()
            .get_room(request.room_id)
            .await?
            .ok_or(SettlementError::RoomNotFound)?;
        if !room.available {
            return Err(SettlementError::RoomUnavailable);
        }

        let section = self.locks.acquire(room.id).await;

        if self.env.bookings().has_overlap(room.id, slot).await? {
            return Err(SettlementError::SlotConflict);
        }

        let base_price = booking_price(room.price_per_hour, slot)?;

        let voucher = match &voucher_code {
            Some(code) => {
                let voucher = self
                    .env
                    .vouchers()
                    .get_by_code(code)
                    .await?
                    .ok_or(SettlementError::InvalidVoucher)?;
                check_voucher(&voucher, now)?;
                Some(voucher)
            }
            None => None,
        };

        let (discount, final_price) = match &voucher {
            Some(voucher) => {
                let quote = quote(base_price, voucher)?;
                (quote.discount_amount, quote.final_amount)
            }
            None => (Money::ZERO, base_price),
        };

        let wallet = self
            .env
            .wallets()
            .get(customer_id)
            .await?
            .ok_or(SettlementError::WalletNotFound)?;
        if wallet.balance < final_price {
            return Err(SettlementError::InsufficientBalance {
                required: final_price,
                available: wallet.balance,
            });
        }

        let redeemed = match &voucher {
            Some(voucher) => self.redeem_voucher(voucher).await?.then_some(voucher.id),
            None => None,
        };

        let booking = Booking {
            id: BookingId::new(),
            customer_id,
            room_id: room.id,
            start_time: slot.start,
            end_time: slot.end,
            total_price: final_price,
            voucher_id: voucher.as_ref().map(|v| v.id),
            status: BookingStatus::Booked,
            created_at: now,
        };
        if let Err(error) = self.env.bookings().insert(&booking).await {
            if let Some(voucher_id) = redeemed {
                self.release_voucher(voucher_id).await;
            }
            return Err(error);
        }
        drop(section);

        if let Err(error) = self.charge(&booking).await {
            if let Some(voucher_id) = redeemed {
                self.release_voucher(voucher_id).await;
            }
            return Err(error);
        }

        self.record_transaction(
            customer_id,
            ServiceKind::Booking,
            *booking.id.as_uuid(),
            final_price,
            TransactionStatus::Completed,
        )
        .await;

        Ok(BookingReceipt {
            booking: BookingView::new(booking, room.name),
            base_price,
            discount,
            voucher_code: voucher.map(|v| v.code),
        })
    }

    /// Guarded usage increment. A lost race on the last use fails the
    /// booking; a store failure does not. Returns whether a use was taken.
    async fn redeem_voucher(&self, voucher: &Voucher) -> Result<bool> {
        match self.env.vouchers().increment_usage(voucher.id).await {
            Ok(true) => Ok(true),
            Ok(false) => {
                tracing::info!(voucher_id = %voucher.id, "Voucher exhausted by a concurrent booking");
                Err(SettlementError::VoucherExhausted)
            }
            Err(error) => {
                tracing::warn!(
                    voucher_id = %voucher.id,
                    error = %error,
                    "Failed to increment voucher usage"
                );
                record_partial_failure(SettlementStep::VoucherIncrement);
                Ok(false)
            }
        }
    }

    /// Hand back a voucher use taken for a booking that did not go through.
    async fn release_voucher(&self, voucher_id: VoucherId) {
        match self.env.vouchers().release_usage(voucher_id).await {
            Ok(true) => {
                tracing::info!(voucher_id = %voucher_id, "Voucher use released");
            }
            Ok(false) => {
                tracing::warn!(voucher_id = %voucher_id, "Voucher had no use to release");
            }
            Err(error) => {
                tracing::error!(
                    voucher_id = %voucher_id,
                    error = %error,
                    "Failed to release voucher use; manual reconciliation required"
                );
                record_partial_failure(SettlementStep::Compensation);
            }
        }
    }

    /// Debit the booking price, releasing the booking if the debit does not
    /// apply.
    async fn charge(&self, booking: &Booking) -> Result<()> {
        let outcome = self
            .env
            .wallets()
            .debit(booking.customer_id, booking.total_price)
            .await;

        let reason = match outcome {
            Ok(DebitOutcome::Applied { balance }) => {
                record_debit("applied");
                tracing::debug!(
                    booking_id = %booking.id,
                    balance = %balance,
                    "Wallet debited"
                );
                return Ok(());
            }
            Ok(DebitOutcome::InsufficientFunds) => {
                record_debit("insufficient_funds");
                "insufficient funds at debit time".to_string()
            }
            Ok(DebitOutcome::WalletNotFound) => {
                record_debit("wallet_not_found");
                "wallet not found at debit time".to_string()
            }
            Err(error) => {
                record_debit("error");
                error.to_string()
            }
        };

        tracing::warn!(
            booking_id = %booking.id,
            user_id = %booking.customer_id,
            amount = %booking.total_price,
            reason = %reason,
            "Debit did not apply, releasing booking"
        );
        self.release_unpaid(booking.id).await;

        Err(SettlementError::PaymentFailed)
    }

    async fn release_unpaid(&self, booking_id: BookingId) {
        match self.env.bookings().mark_cancelled(booking_id).await {
            Ok(true) => {
                tracing::info!(booking_id = %booking_id, "Unpaid booking released");
            }
            Ok(false) => {
                tracing::warn!(booking_id = %booking_id, "Unpaid booking was no longer active");
            }
            Err(error) => {
                tracing::error!(
                    booking_id = %booking_id,
                    error = %error,
                    "Failed to release unpaid booking; manual reconciliation required"
                );
                record_partial_failure(SettlementStep::Compensation);
            }
        }
    }

    /// Cancel a booking and refund its price to the customer's wallet.
    ///
    /// # Errors
    ///
    /// - `BookingNotFound` if the booking does not exist
    /// - `Unauthorized` if the caller does not own the booking
    /// - `AlreadyCancelled` if it was already cancelled (including a lost race)
    /// - `TooLateToCancel` inside the cancellation notice period
    /// - `RefundFailed` if the booking was cancelled but the credit failed
    #[tracing::instrument(skip_all, fields(customer_id = %customer_id, booking_id = %booking_id))]
    pub async fn cancel_booking(
        &self,
        customer_id: UserId,
        booking_id: BookingId,
    ) -> Result<BookingView> {
        let booking = self
            .env
            .bookings()
            .get(booking_id)
            .await?
            .ok_or(SettlementError::BookingNotFound)?;

        if booking.customer_id != customer_id {
            return Err(SettlementError::Unauthorized);
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(SettlementError::AlreadyCancelled);
        }
        self.policy.ensure_cancellable(booking.start_time, self.now())?;

        if !self.env.bookings().mark_cancelled(booking_id).await? {
            return Err(SettlementError::AlreadyCancelled);
        }

        if let Err(error) = self
            .env
            .wallets()
            .credit(customer_id, booking.total_price)
            .await
        {
            tracing::error!(
                booking_id = %booking_id,
                user_id = %customer_id,
                amount = %booking.total_price,
                error = %error,
                "Booking cancelled but refund failed"
            );
            record_partial_failure(SettlementStep::RefundCredit);
            return Err(SettlementError::RefundFailed {
                booking_id,
                user_id: customer_id,
                reason: error.to_string(),
            });
        }

        self.record_transaction(
            customer_id,
            ServiceKind::Booking,
            *booking_id.as_uuid(),
            -booking.total_price,
            TransactionStatus::Refunded,
        )
        .await;

        record_booking("cancelled");
        tracing::info!(refund = %booking.total_price, "Booking cancelled");

        let cancelled = Booking {
            status: BookingStatus::Cancelled,
            ..booking
        };
        Ok(self.view(cancelled).await)
    }

    /// Fetch a booking with its room name.
    ///
    /// # Errors
    ///
    /// - `BookingNotFound` if the booking does not exist
    /// - `Storage` if the lookup fails
    pub async fn get_booking(&self, booking_id: BookingId) -> Result<BookingView> {
        let booking = self
            .env
            .bookings()
            .get(booking_id)
            .await?
            .ok_or(SettlementError::BookingNotFound)?;
        Ok(self.view(booking).await)
    }

    /// A customer's bookings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    pub async fn list_customer_bookings(&self, customer_id: UserId) -> Result<Vec<BookingView>> {
        let bookings = self.env.bookings().list_by_customer(customer_id).await?;
        Ok(self.views(bookings).await)
    }

    /// All bookings on a room, by start time.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound` if the room does not exist
    /// - `Storage` if the lookup fails
    pub async fn list_room_bookings(&self, room_id: RoomId) -> Result<Vec<BookingView>> {
        let room = self
            .env
            .rooms()
            .get_room(room_id)
            .await?
            .ok_or(SettlementError::RoomNotFound)?;
        let bookings = self.env.bookings().list_by_room(room_id).await?;
        Ok(bookings
            .into_iter()
            .map(|booking| BookingView::new(booking, room.name.clone()))
            .collect())
    }
}
