//! Bookings and the availability index.

use crate::error::{corrupt, is_exclusion_violation, storage};
use brewspace_core::{
    Booking, BookingId, BookingStatus, BookingStore, Money, Result, RoomId, SettlementError,
    TimeSlot, UserId, VoucherId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

type BookingRow = (
    Uuid,
    Uuid,
    Uuid,
    DateTime<Utc>,
    DateTime<Utc>,
    Decimal,
    Option<Uuid>,
    String,
    DateTime<Utc>,
);

const SELECT_BOOKING: &str = "SELECT id, customer_id, room_id, start_time, end_time, total_price,
        voucher_id, status, created_at
 FROM bookings";

/// `PostgreSQL` booking store.
#[derive(Clone, Debug)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: BookingRow) -> Result<Booking> {
        let (id, customer_id, room_id, start_time, end_time, total_price, voucher_id, status, created_at) =
            row;
        Ok(Booking {
            id: BookingId::from_uuid(id),
            customer_id: UserId::from_uuid(customer_id),
            room_id: RoomId::from_uuid(room_id),
            start_time,
            end_time,
            total_price: Money::new(total_price),
            voucher_id: voucher_id.map(VoucherId::from_uuid),
            status: status.parse::<BookingStatus>().map_err(corrupt)?,
            created_at,
        })
    }

    async fn fetch_many(&self, filter: &str, id: &Uuid, context: &'static str) -> Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!("{SELECT_BOOKING} {filter}"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage(context))?;

        rows.into_iter().map(Self::from_row).collect()
    }
}

impl BookingStore for PgBookingStore {
    async fn has_overlap(&self, room_id: RoomId, slot: TimeSlot) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM bookings
                 WHERE room_id = $1
                   AND status <> 'cancelled'
                   AND start_time < $3
                   AND $2 < end_time
             )",
        )
        .bind(room_id.as_uuid())
        .bind(slot.start)
        .bind(slot.end)
        .fetch_one(&self.pool)
        .await
        .map_err(storage("Failed to check availability"))?;

        Ok(exists)
    }

    async fn insert(&self, booking: &Booking) -> Result<()> {
        sqlx::query(
            "INSERT INTO bookings
                 (id, customer_id, room_id, start_time, end_time, total_price, voucher_id, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.customer_id.as_uuid())
        .bind(booking.room_id.as_uuid())
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.total_price.amount())
        .bind(booking.voucher_id.map(|id| *id.as_uuid()))
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_exclusion_violation(&e) {
                SettlementError::SlotConflict
            } else {
                storage("Failed to insert booking")(e)
            }
        })?;

        Ok(())
    }

    async fn get(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!("{SELECT_BOOKING} WHERE id = $1"))
            .bind(booking_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("Failed to query booking"))?;

        row.map(Self::from_row).transpose()
    }

    async fn mark_cancelled(&self, booking_id: BookingId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled' WHERE id = $1 AND status = 'booked'",
        )
        .bind(booking_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to cancel booking"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_customer(&self, customer_id: UserId) -> Result<Vec<Booking>> {
        self.fetch_many(
            "WHERE customer_id = $1 ORDER BY created_at DESC",
            customer_id.as_uuid(),
            "Failed to list customer bookings",
        )
        .await
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Booking>> {
        self.fetch_many(
            "WHERE room_id = $1 ORDER BY start_time ASC",
            room_id.as_uuid(),
            "Failed to list room bookings",
        )
        .await
    }
}
