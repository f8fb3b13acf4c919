//! Account domain service: registration, login and profile reads.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    LoginService, UserAccounts, UserDirectoryError, UserDirectoryRepository,
};
use crate::domain::{
    Error, LoginCredentials, NewUser, PasswordDigest, Registration, User, UserId,
};

fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
        UserDirectoryError::DuplicateEmail { .. } => {
            Error::conflict("email is already registered").with_details(serde_json::json!({
                "field": "email",
                "code": "duplicate_email",
            }))
        }
    }
}

/// Account service implementing the login and account driving ports.
#[derive(Clone)]
pub struct AccountService<D> {
    directory: Arc<D>,
}

impl<D> AccountService<D> {
    /// Create an account service over the user directory.
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D> UserAccounts for AccountService<D>
where
    D: UserDirectoryRepository,
{
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let new_user = NewUser {
            email: registration.email().clone(),
            name: registration.name().clone(),
            password_digest: PasswordDigest::derive(registration.password()),
        };
        let user = self
            .directory
            .create(&new_user)
            .await
            .map_err(map_directory_error)?;
        info!(user_id = %user.id(), "user registered");
        Ok(user)
    }

    async fn current_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.directory
            .find_by_id(user_id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

#[async_trait]
impl<D> LoginService for AccountService<D>
where
    D: UserDirectoryRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let stored = self
            .directory
            .find_credentials(credentials.email())
            .await
            .map_err(map_directory_error)?;
        match stored {
            Some(stored) if stored.digest.verify(credentials.password()) => Ok(stored.user_id),
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
