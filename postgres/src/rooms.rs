//! Meeting room lookup.

use crate::error::{corrupt, storage, to_db_count};
use brewspace_core::{CoffeeShopId, MeetingRoom, Money, Result, RoomDirectory, RoomId};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

type RoomRow = (Uuid, Uuid, String, i32, Decimal, bool);

/// `PostgreSQL` room directory.
#[derive(Clone, Debug)]
pub struct PgRoomDirectory {
    pool: PgPool,
}

impl PgRoomDirectory {
    /// Create a directory over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a room.
    ///
    /// Rooms are managed outside the settlement engine; this exists for
    /// seeding and tests.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    pub async fn upsert_room(&self, room: &MeetingRoom) -> Result<()> {
        sqlx::query(
            "INSERT INTO meeting_rooms (id, coffee_shop_id, name, capacity, price_per_hour, available)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                 coffee_shop_id = EXCLUDED.coffee_shop_id,
                 name = EXCLUDED.name,
                 capacity = EXCLUDED.capacity,
                 price_per_hour = EXCLUDED.price_per_hour,
                 available = EXCLUDED.available",
        )
        .bind(room.id.as_uuid())
        .bind(room.coffee_shop_id.as_uuid())
        .bind(&room.name)
        .bind(to_db_count(room.capacity)?)
        .bind(room.price_per_hour.amount())
        .bind(room.available)
        .execute(&self.pool)
        .await
        .map_err(storage("Failed to upsert room"))?;

        Ok(())
    }

    fn from_row(row: RoomRow) -> Result<MeetingRoom> {
        let (id, coffee_shop_id, name, capacity, price_per_hour, available) = row;
        Ok(MeetingRoom {
            id: RoomId::from_uuid(id),
            coffee_shop_id: CoffeeShopId::from_uuid(coffee_shop_id),
            name,
            capacity: u32::try_from(capacity).map_err(|_| corrupt(format!("capacity {capacity}")))?,
            price_per_hour: Money::new(price_per_hour),
            available,
        })
    }
}

impl RoomDirectory for PgRoomDirectory {
    async fn get_room(&self, room_id: RoomId) -> Result<Option<MeetingRoom>> {
        let row: Option<RoomRow> = sqlx::query_as(
            "SELECT id, coffee_shop_id, name, capacity, price_per_hour, available
             FROM meeting_rooms
             WHERE id = $1",
        )
        .bind(room_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("Failed to query room"))?;

        row.map(Self::from_row).transpose()
    }
}
