//! Application state shared by all handlers.

use brewspace_core::{SettlementEngine, SettlementEnvironment};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared handler state: the settlement engine and, when running against
/// `PostgreSQL`, the pool used by the readiness check.
#[derive(Clone)]
pub struct AppState<E: SettlementEnvironment> {
    /// Settlement engine
    pub engine: Arc<SettlementEngine<E>>,
    /// Database pool checked by `/ready`
    pub database: Option<PgPool>,
}

impl<E: SettlementEnvironment> AppState<E> {
    /// State without a database; `/ready` always reports ready.
    #[must_use]
    pub fn new(engine: SettlementEngine<E>) -> Self {
        Self {
            engine: Arc::new(engine),
            database: None,
        }
    }

    /// Probe `pool` on `/ready`.
    #[must_use]
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }
}
