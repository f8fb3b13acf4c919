//! Driving port for account registration and profile reads.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{DisplayName, EmailAddress, Error, Registration, User, UserDraft, UserId};

/// Driving port for account use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// Register a new account; a taken e-mail yields `conflict`.
    async fn register(&self, registration: &Registration) -> Result<User, Error>;

    /// Load the profile behind a session. A session that points at a user who
    /// no longer exists yields `unauthorized`.
    async fn current_user(&self, user_id: &UserId) -> Result<User, Error>;
}

/// Fixture accounts for tests and database-less runs.
///
/// Registration always yields user `1`; only user `1` has a profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserAccounts;

impl FixtureUserAccounts {
    fn fixture_id() -> Result<UserId, Error> {
        UserId::new(1).map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))
    }
}

#[async_trait]
impl UserAccounts for FixtureUserAccounts {
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        Ok(User::new(UserDraft {
            id: Self::fixture_id()?,
            email: registration.email().clone(),
            name: registration.name().clone(),
            last_buy_date: None,
            created_at: Utc::now(),
        }))
    }

    async fn current_user(&self, user_id: &UserId) -> Result<User, Error> {
        let id = Self::fixture_id()?;
        if *user_id != id {
            return Err(Error::unauthorized("login required"));
        }
        let email = EmailAddress::new("ada@example.com")
            .map_err(|err| Error::internal(format!("invalid fixture email: {err}")))?;
        let name = DisplayName::new("Ada Lovelace")
            .map_err(|err| Error::internal(format!("invalid fixture name: {err}")))?;
        Ok(User::new(UserDraft {
            id,
            email,
            name,
            last_buy_date: None,
            created_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_register_echoes_registration() {
        let registration = Registration::try_from_parts("bob@example.com", "Bob", "long enough")
            .expect("valid registration");
        let user = FixtureUserAccounts
            .register(&registration)
            .await
            .expect("fixture register succeeds");
        assert_eq!(user.email().as_ref(), "bob@example.com");
        assert_eq!(user.name().as_ref(), "Bob");
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_profile_exists_only_for_sample_user() {
        let known = UserId::new(1).expect("valid id");
        let unknown = UserId::new(2).expect("valid id");

        let user = FixtureUserAccounts
            .current_user(&known)
            .await
            .expect("sample profile");
        assert_eq!(user.name().as_ref(), "Ada Lovelace");

        let err = FixtureUserAccounts
            .current_user(&unknown)
            .await
            .expect_err("no profile");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
