//! PostgreSQL-backed `UserDirectoryRepository` implementation using Diesel.

use async_trait::async_trait;
use diesel::dsl::count;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserDirectoryError, UserDirectoryRepository};
use crate::domain::{
    DisplayName, EmailAddress, NewUser, PasswordDigest, QueueCandidate, StoredCredentials, User,
    UserDraft, UserId,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{CredentialsRow, NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{purchases, users};

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the user directory port.
#[derive(Clone)]
pub struct DieselUserDirectoryRepository {
    pool: DbPool,
}

impl DieselUserDirectoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserDirectoryError {
    map_basic_pool_error(error, |message| UserDirectoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> UserDirectoryError {
    map_basic_diesel_error(
        error,
        UserDirectoryError::query,
        UserDirectoryError::connection,
    )
}

fn row_to_user(row: UserRow) -> Result<User, UserDirectoryError> {
    let UserRow {
        id,
        email,
        name,
        last_buy_date,
        created_at,
    } = row;
    let invalid = |err: &dyn std::fmt::Display| {
        UserDirectoryError::query(format!("invalid user row {id}: {err}"))
    };

    Ok(User::new(UserDraft {
        id: UserId::new(id).map_err(|err| invalid(&err))?,
        email: EmailAddress::new(email).map_err(|err| invalid(&err))?,
        name: DisplayName::new(name).map_err(|err| invalid(&err))?,
        last_buy_date,
        created_at,
    }))
}

#[async_trait]
impl UserDirectoryRepository for DieselUserDirectoryRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .filter(users::id.eq(id.as_i64()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn queue_snapshot(&self) -> Result<Vec<QueueCandidate>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(UserRow, i64)> = users::table
            .left_join(purchases::table)
            .group_by(users::id)
            .select((UserRow::as_select(), count(purchases::id.nullable())))
            .order(users::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(row, total)| -> Result<QueueCandidate, UserDirectoryError> {
                Ok(QueueCandidate {
                    user: row_to_user(row)?,
                    total_purchases: u64::try_from(total).unwrap_or(0),
                })
            })
            .collect()
    }

    async fn create(&self, user: &NewUser) -> Result<User, UserDirectoryError> {
        let new_row = NewUserRow {
            email: user.email.as_ref(),
            name: user.name.as_ref(),
            password_digest: user.password_digest.as_str(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(&mut conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error, EMAIL_UNIQUE_CONSTRAINT) {
                    UserDirectoryError::duplicate_email(user.email.as_ref())
                } else {
                    map_diesel_error(error)
                }
            })?;

        row_to_user(row)
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .filter(users::email.eq(email))
            .select(CredentialsRow::as_select())
            .first::<CredentialsRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| -> Result<StoredCredentials, UserDirectoryError> {
            Ok(StoredCredentials {
                user_id: UserId::new(row.id).map_err(|err| {
                    UserDirectoryError::query(format!("invalid user row {}: {err}", row.id))
                })?,
                digest: PasswordDigest::from_stored(row.password_digest),
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row mapping and error translation.
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    fn row_maps_to_domain_user() {
        let user = row_to_user(UserRow {
            id: 3,
            email: "ada@example.com".to_owned(),
            name: "Ada".to_owned(),
            last_buy_date: None,
            created_at: Utc::now(),
        })
        .expect("valid row");
        assert_eq!(user.id().as_i64(), 3);
        assert_eq!(user.email().as_ref(), "ada@example.com");
    }

    #[rstest]
    fn corrupt_row_is_a_query_error() {
        let err = row_to_user(UserRow {
            id: 3,
            email: "not-an-email".to_owned(),
            name: "Ada".to_owned(),
            last_buy_date: None,
            created_at: Utc::now(),
        })
        .expect_err("bad email");
        assert!(matches!(err, UserDirectoryError::Query { .. }));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, UserDirectoryError::Connection { .. }));
    }
}
