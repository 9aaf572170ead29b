//! Custom Axum extractors.
//!
//! Authentication happens upstream: the gateway forwards the caller's
//! identity in two headers, which these extractors turn into typed values.
//!
//! - [`CorrelationId`]: request correlation id (set by the middleware)
//! - [`Caller`]: `X-User-Id` and `X-User-Role`, 401 when missing or malformed
//! - [`RequireAdmin`]: a [`Caller`] with the admin role, 403 otherwise

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use brewspace_core::{Role, UserId};
use uuid::Uuid;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Correlation ID for request tracing.
///
/// Taken from request extensions when the middleware is installed, then from
/// the `X-Correlation-ID` header, otherwise freshly generated.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    /// Caller's user id
    pub user_id: UserId,
    /// Caller's role
    pub role: Role,
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::unauthorized(format!("Missing {name} header")))?
        .to_str()
        .map_err(|_| AppError::unauthorized(format!("Invalid {name} header")))
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = Uuid::parse_str(header(parts, USER_ID_HEADER)?.trim())
            .map_err(|_| AppError::unauthorized(format!("Invalid {USER_ID_HEADER} header")))?;

        let role = header(parts, USER_ROLE_HEADER)?
            .parse::<Role>()
            .map_err(|_| AppError::unauthorized(format!("Invalid {USER_ROLE_HEADER} header")))?;

        Ok(Self {
            user_id: UserId::from_uuid(user_id),
            role,
        })
    }
}

/// Caller holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;

        match caller.role {
            Role::Admin => Ok(Self(caller)),
            Role::Owner | Role::Customer => {
                tracing::warn!(user_id = %caller.user_id, role = %caller.role, "Admin route denied");
                Err(AppError::forbidden("Admin role required"))
            }
        }
    }
}
