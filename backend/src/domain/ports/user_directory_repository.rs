//! Port for the user directory.

use async_trait::async_trait;

use crate::domain::{NewUser, QueueCandidate, StoredCredentials, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
        /// Another account already uses this e-mail.
        DuplicateEmail { email: String } =>
            "email {email} is already registered",
    }
}

/// Port for reading and registering users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectoryRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserDirectoryError>;

    /// Every user with their purchase count, read in one statement and
    /// returned in id order.
    async fn queue_snapshot(&self) -> Result<Vec<QueueCandidate>, UserDirectoryError>;

    /// Register a new user.
    async fn create(&self, user: &NewUser) -> Result<User, UserDirectoryError>;

    /// Load login credentials for a normalised e-mail.
    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserDirectoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn duplicate_email_formats_message() {
        let err = UserDirectoryError::duplicate_email("ada@example.com");
        assert_eq!(err.to_string(), "email ada@example.com is already registered");
    }
}
