//! HTTP adapter for the Brewspace settlement engine.
//!
//! A thin Axum shell over [`brewspace_core::SettlementEngine`]. Handlers
//! extract the caller and the request body, call one engine operation and
//! map the result to a response; all business rules live in the engine.
//!
//! # Request Flow
//!
//! 1. **Correlation id** attached by [`middleware::correlation_id`]
//! 2. **Caller** read from the gateway headers ([`extractors::Caller`])
//! 3. **Engine operation** invoked with typed arguments
//! 4. **Errors** mapped to status codes by [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use brewspace_web::{AppState, build_router};
//!
//! let state = AppState::new(SettlementEngine::new(environment));
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use error::AppError;
pub use extractors::{Caller, CorrelationId, RequireAdmin};
pub use middleware::CORRELATION_ID_HEADER;
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
