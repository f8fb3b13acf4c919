//! Authentication primitives: login credentials, registration input and the
//! stored credential digest.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::{DisplayName, EmailAddress, UserId, UserValidationError};

/// Minimum accepted password length for new accounts.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length for new accounts.
pub const PASSWORD_MAX: usize = 128;

const SALT_LEN: usize = 16;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// E-mail was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is trimmed, lower-cased and non-empty. It is not checked for
///   shape so that malformed addresses fail like unknown ones.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use purchase_queue::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Ada@Example.com ", "password").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw e-mail/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised e-mail suitable for directory lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validation errors for account registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    /// E-mail or display name failed user validation.
    User(UserValidationError),
    /// Password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
    /// Password is longer than [`PASSWORD_MAX`].
    PasswordTooLong { max: usize },
}

impl fmt::Display for RegistrationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(err) => err.fmt(f),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordTooLong { max } => {
                write!(f, "password must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for RegistrationValidationError {}

impl From<UserValidationError> for RegistrationValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::User(value)
    }
}

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: EmailAddress,
    name: DisplayName,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate raw registration fields.
    ///
    /// # Examples
    /// ```
    /// use purchase_queue::domain::Registration;
    ///
    /// let registration =
    ///     Registration::try_from_parts("ada@example.com", "Ada", "correct horse").unwrap();
    /// assert_eq!(registration.name().as_ref(), "Ada");
    /// assert!(Registration::try_from_parts("ada@example.com", "Ada", "short").is_err());
    /// ```
    pub fn try_from_parts(
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<Self, RegistrationValidationError> {
        let email = EmailAddress::new(email)?;
        let name = DisplayName::new(name)?;
        let length = password.chars().count();
        if length < PASSWORD_MIN {
            return Err(RegistrationValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(RegistrationValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self {
            email,
            name,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Validated e-mail.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Validated display name.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Plain password; only used to derive a [`PasswordDigest`].
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

// TODO: move to a memory-hard KDF (argon2) once a migration path for existing
// digests is agreed.
/// Salted SHA-256 credential digest stored as `"<salt hex>$<digest hex>"`.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Derive a digest for `password` with a fresh random salt.
    #[must_use]
    pub fn derive(password: &str) -> Self {
        let mut salt = [0_u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::derive_with_salt(&salt, password)
    }

    fn derive_with_salt(salt: &[u8], password: &str) -> Self {
        let digest = digest_hex(salt, password);
        Self(format!("{}${digest}", hex::encode(salt)))
    }

    /// Wrap a digest read back from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Check `password` against this digest.
    ///
    /// Malformed stored values never verify.
    ///
    /// # Examples
    /// ```
    /// use purchase_queue::domain::PasswordDigest;
    ///
    /// let digest = PasswordDigest::derive("hunter22");
    /// assert!(digest.verify("hunter22"));
    /// assert!(!digest.verify("hunter23"));
    /// ```
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let Some((salt_hex, expected)) = self.0.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let actual = digest_hex(&salt, password);
        constant_time_eq(actual.as_bytes(), expected.as_bytes())
    }

    /// Storage representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

fn digest_hex(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0_u8, |acc, (l, r)| acc | (l ^ r))
        == 0
}

/// Credentials loaded from the directory for a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user_id: UserId,
    pub digest: PasswordDigest,
}
