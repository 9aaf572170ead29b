//! `PostgreSQL` stores for the Brewspace settlement engine.
//!
//! One store type per collaborator trait, all sharing a `PgPool`:
//!
//! - [`PgRoomDirectory`]: meeting room lookup
//! - [`PgBookingStore`]: bookings and the availability index
//! - [`PgVoucherStore`]: voucher definitions and guarded usage counters
//! - [`PgWalletStore`]: balances with single-statement guarded debit
//! - [`PgTransactionLedger`]: append-only ledger
//! - [`PgTopupStore`]: top-ups with compare-and-set confirmation
//!
//! The schema lives in `migrations/`. Its `bookings_no_overlap` exclusion
//! constraint rejects overlapping active bookings on a room even if two
//! processes pass the availability check at the same time.
//!
//! # Example
//!
//! ```ignore
//! use brewspace_postgres::{connect, environment, migrate, PoolSettings};
//!
//! let pool = connect("postgres://localhost/brewspace", &PoolSettings::default()).await?;
//! migrate(&pool).await?;
//! let engine = SettlementEngine::new(environment(&pool, Arc::new(SystemClock)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bookings;
mod error;
mod ledger;
mod rooms;
mod topups;
mod vouchers;
mod wallets;

pub use bookings::PgBookingStore;
pub use ledger::PgTransactionLedger;
pub use rooms::PgRoomDirectory;
pub use topups::PgTopupStore;
pub use vouchers::PgVoucherStore;
pub use wallets::PgWalletStore;

use brewspace_core::{Clock, Result, SettlementError, StoreEnvironment};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

/// Environment backed entirely by `PostgreSQL`.
pub type PostgresEnvironment = StoreEnvironment<
    PgRoomDirectory,
    PgBookingStore,
    PgVoucherStore,
    PgWalletStore,
    PgTransactionLedger,
    PgTopupStore,
>;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum pool size
    pub max_connections: u32,
    /// Minimum idle connections
    pub min_connections: u32,
    /// Connection acquire timeout
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns `SettlementError::Storage` if the database is unreachable.
pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect(database_url)
        .await
        .map_err(|e| SettlementError::Storage(format!("Failed to connect: {e}")))
}

/// Apply the embedded migrations.
///
/// # Errors
///
/// Returns `SettlementError::Storage` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| SettlementError::Storage(format!("Failed to run migrations: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Wire every collaborator to `pool`.
#[must_use]
pub fn environment(pool: &PgPool, clock: Arc<dyn Clock>) -> PostgresEnvironment {
    StoreEnvironment::new(
        PgRoomDirectory::new(pool.clone()),
        PgBookingStore::new(pool.clone()),
        PgVoucherStore::new(pool.clone()),
        PgWalletStore::new(pool.clone()),
        PgTransactionLedger::new(pool.clone()),
        PgTopupStore::new(pool.clone()),
        clock,
    )
}
