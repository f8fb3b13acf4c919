//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` error whose `details` carry the
//! wire field name, a machine-readable code and, where useful, the rejected
//! value.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{
    Error, PageRequestError, PurchaseId, PurchaseValidationError, RegistrationValidationError,
    UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidTimestamp,
    InvalidId,
    MustBePositive,
    MustBeFinite,
    EmptyValue,
    TooLong,
    TooShort,
    InvalidFormat,
    OutOfRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::MustBePositive => "must_be_positive",
            ErrorCode::MustBeFinite => "must_be_finite",
            ErrorCode::EmptyValue => "empty_value",
            ErrorCode::TooLong => "too_long",
            ErrorCode::TooShort => "too_short",
            ErrorCode::InvalidFormat => "invalid_format",
            ErrorCode::OutOfRange => "out_of_range",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: String,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, &value))
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

/// Parse a purchase id taken from the request path.
pub(crate) fn parse_purchase_id(value: &str) -> Result<PurchaseId, Error> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|raw| PurchaseId::new(raw).ok())
        .ok_or_else(|| {
            ValidationError::new("id", "purchase id must be a positive integer")
                .with_value(ErrorCode::InvalidId, value)
        })
}

pub(crate) fn map_purchase_validation_error(err: &PurchaseValidationError) -> Error {
    let code = match err {
        PurchaseValidationError::InvalidId => ErrorCode::InvalidId,
        PurchaseValidationError::Missing { .. } => ErrorCode::MissingField,
        PurchaseValidationError::NonPositive { .. } => ErrorCode::MustBePositive,
        PurchaseValidationError::NonFinite { .. } => ErrorCode::MustBeFinite,
        PurchaseValidationError::EmptyProofRef => ErrorCode::EmptyValue,
        PurchaseValidationError::ProofRefTooLong { .. } => ErrorCode::TooLong,
    };
    ValidationError::new(err.field(), err.to_string()).with_code(code)
}

pub(crate) fn map_page_request_error(err: &PageRequestError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(ErrorCode::OutOfRange)
}

pub(crate) fn map_user_validation_error(err: &UserValidationError) -> Error {
    let (field, code) = match err {
        UserValidationError::InvalidId => ("id", ErrorCode::InvalidId),
        UserValidationError::EmptyEmail => ("email", ErrorCode::EmptyValue),
        UserValidationError::EmailTooLong { .. } => ("email", ErrorCode::TooLong),
        UserValidationError::InvalidEmail => ("email", ErrorCode::InvalidFormat),
        UserValidationError::EmptyDisplayName => ("name", ErrorCode::EmptyValue),
        UserValidationError::DisplayNameTooLong { .. } => ("name", ErrorCode::TooLong),
        UserValidationError::DisplayNameControlCharacters => ("name", ErrorCode::InvalidFormat),
    };
    ValidationError::new(field, err.to_string()).with_code(code)
}

pub(crate) fn map_registration_validation_error(err: &RegistrationValidationError) -> Error {
    match err {
        RegistrationValidationError::User(inner) => map_user_validation_error(inner),
        RegistrationValidationError::PasswordTooShort { .. } => {
            ValidationError::new("password", err.to_string()).with_code(ErrorCode::TooShort)
        }
        RegistrationValidationError::PasswordTooLong { .. } => {
            ValidationError::new("password", err.to_string()).with_code(ErrorCode::TooLong)
        }
    }
}
