//! OpenAPI stand-ins for domain types that must not depend on `utoipa`.
//!
//! Each wrapper registers under the domain type's name via `#[schema(as)]`
//! and mirrors its serialised shape.

use utoipa::ToSchema;

/// Wire form of [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// Validation or parsing failure.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// No session, or bad credentials.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    /// Missing, or owned by another user.
    #[schema(rename = "not_found")]
    NotFound,
    /// E-mail already registered.
    #[schema(rename = "conflict")]
    Conflict,
    /// Database unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// Error envelope returned by every endpoint.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(dead_code, reason = "fields are read by utoipa only")]
pub struct ErrorSchema {
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    #[schema(example = "kg must be greater than zero")]
    message: String,
    /// Matches the `trace-id` response header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Machine-readable context, e.g. `{"field": "kg", "code": "must_be_positive"}`.
    details: Option<serde_json::Value>,
}
