//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{purchases, users};

/// Public profile columns of the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub last_buy_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for registering users.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_digest: &'a str,
}

/// Login columns of the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CredentialsRow {
    pub id: i64,
    pub password_digest: String,
}

/// Row struct for reading from the purchases table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PurchaseRow {
    pub id: i64,
    pub user_id: i64,
    pub purchased_at: DateTime<Utc>,
    pub kg: f64,
    pub price: f64,
    pub proof_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for recording purchases.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub(crate) struct NewPurchaseRow<'a> {
    pub user_id: i64,
    pub purchased_at: DateTime<Utc>,
    pub kg: f64,
    pub price: f64,
    pub proof_ref: Option<&'a str>,
}
