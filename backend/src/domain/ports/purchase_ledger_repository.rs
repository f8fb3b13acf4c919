//! Port for the purchase ledger and the last-buy-date cache it maintains.
//!
//! Adapters must apply every mutation and the owner's `last_buy_date` refresh
//! in one unit of work: after `record` or `remove` returns, the owner's cached
//! date equals the newest remaining purchase date, or is null.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    NewPurchase, PageRequest, Purchase, PurchaseId, PurchasePage, PurchaseStats, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by purchase ledger adapters.
    pub enum PurchaseLedgerError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "purchase ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "purchase ledger query failed: {message}",
        /// The purchase owner does not exist in the directory.
        UnknownOwner { user_id: i64 } =>
            "purchase owner {user_id} does not exist",
    }
}

/// A purchase that has just been committed together with the owner's
/// refreshed last-buy date.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPurchase {
    pub purchase: Purchase,
    pub last_buy_date: DateTime<Utc>,
}

/// Port for user-scoped purchase reads and writes.
///
/// Every read and delete takes the owner so that ownership is part of the
/// lookup itself; a purchase owned by someone else is indistinguishable from
/// a missing one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseLedgerRepository: Send + Sync {
    /// Insert a purchase and refresh the owner's last-buy date atomically.
    async fn record(
        &self,
        purchase: &NewPurchase,
    ) -> Result<RecordedPurchase, PurchaseLedgerError>;

    /// Page through a user's purchases, newest first.
    async fn list(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<PurchasePage, PurchaseLedgerError>;

    /// Fetch one purchase owned by `user_id`.
    async fn find(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<Option<Purchase>, PurchaseLedgerError>;

    /// Delete one purchase owned by `user_id` and refresh the owner's
    /// last-buy date. Returns `false` when nothing matched.
    async fn remove(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<bool, PurchaseLedgerError>;

    /// Aggregate a user's purchases.
    async fn stats(&self, user_id: &UserId) -> Result<PurchaseStats, PurchaseLedgerError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn query_error_formats_message() {
        let err = PurchaseLedgerError::query("broken sql");
        assert!(err.to_string().contains("broken sql"));
    }
}
