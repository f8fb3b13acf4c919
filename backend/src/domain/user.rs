//! User directory entities.
//!
//! A [`User`] carries the denormalised `last_buy_date` that mirrors the newest
//! purchase in the ledger. Only the persistence adapter's ledger transactions
//! write that field; everything else treats it as read-only.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::auth::PasswordDigest;

/// Validation errors returned by user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidId,
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    EmptyDisplayName,
    DisplayNameTooLong { max: usize },
    DisplayNameControlCharacters,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a positive integer"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must look like name@domain"),
            Self::EmptyDisplayName => write!(f, "name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "name must be at most {max} characters")
            }
            Self::DisplayNameControlCharacters => {
                write!(f, "name must not contain control characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier assigned by the directory.
///
/// # Examples
/// ```
/// use purchase_queue::domain::UserId;
///
/// let id = UserId::new(42).expect("positive id");
/// assert_eq!(id.as_i64(), 42);
/// assert!(UserId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(raw: i64) -> Result<Self, UserValidationError> {
        if raw <= 0 {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(raw))
    }

    /// Access the raw database identifier.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum accepted e-mail length.
pub const EMAIL_MAX: usize = 254;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Normalised (trimmed, lower-cased) e-mail address used as the login handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an e-mail address.
    ///
    /// # Examples
    /// ```
    /// use purchase_queue::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("  Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Maximum accepted display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Human readable name shown in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`]; surrounding whitespace is dropped.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(UserValidationError::DisplayNameControlCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Input used to build a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: DisplayName,
    pub last_buy_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Application user as recorded in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: EmailAddress,
    name: DisplayName,
    last_buy_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from already-validated parts.
    #[must_use]
    pub fn new(draft: UserDraft) -> Self {
        let UserDraft {
            id,
            email,
            name,
            last_buy_date,
            created_at,
        } = draft;
        Self {
            id,
            email,
            name,
            last_buy_date,
            created_at,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Login e-mail.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Date of the newest purchase in the ledger, if any.
    #[must_use]
    pub fn last_buy_date(&self) -> Option<DateTime<Utc>> {
        self.last_buy_date
    }

    /// Registration timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A user about to be registered in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: EmailAddress,
    pub name: DisplayName,
    pub password_digest: PasswordDigest,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for user primitives.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(-7)]
    fn user_id_rejects_non_positive_values(#[case] raw: i64) {
        assert_eq!(UserId::new(raw), Err(UserValidationError::InvalidId));
    }

    #[rstest]
    fn user_id_serialises_as_plain_integer() {
        let id = UserId::new(9).expect("valid id");
        assert_eq!(serde_json::to_value(id).expect("serialise"), serde_json::json!(9));
        assert!(serde_json::from_value::<UserId>(serde_json::json!(-1)).is_err());
    }

    #[rstest]
    #[case("", UserValidationError::EmptyEmail)]
    #[case("   ", UserValidationError::EmptyEmail)]
    #[case("no-at-sign", UserValidationError::InvalidEmail)]
    #[case("two@@example.com", UserValidationError::InvalidEmail)]
    #[case("spaced name@example.com", UserValidationError::InvalidEmail)]
    #[case("@example.com", UserValidationError::InvalidEmail)]
    fn email_rejects_malformed_input(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(EmailAddress::new(raw), Err(expected));
    }

    #[rstest]
    fn email_rejects_overlong_input() {
        let raw = format!("{}@example.com", "a".repeat(EMAIL_MAX));
        assert_eq!(
            EmailAddress::new(raw),
            Err(UserValidationError::EmailTooLong { max: EMAIL_MAX })
        );
    }

    #[rstest]
    #[case("", UserValidationError::EmptyDisplayName)]
    #[case("  \t ", UserValidationError::EmptyDisplayName)]
    #[case("bad\u{7}name", UserValidationError::DisplayNameControlCharacters)]
    fn display_name_rejects_invalid_input(
        #[case] raw: &str,
        #[case] expected: UserValidationError,
    ) {
        assert_eq!(DisplayName::new(raw), Err(expected));
    }

    #[rstest]
    fn display_name_trims_and_limits_length() {
        let name = DisplayName::new("  Grace Hopper  ").expect("valid name");
        assert_eq!(name.as_ref(), "Grace Hopper");

        let too_long = "x".repeat(DISPLAY_NAME_MAX + 1);
        assert_eq!(
            DisplayName::new(too_long),
            Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            })
        );
    }
}
