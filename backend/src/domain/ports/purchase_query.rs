//! Driving port for purchase reads and per-user statistics.

use async_trait::async_trait;

use crate::domain::{
    Error, PageRequest, Purchase, PurchaseId, PurchasePage, PurchaseStats, UserId,
};

/// Driving port for user-scoped purchase reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseQuery: Send + Sync {
    /// Page through the user's purchases, newest first.
    async fn list_purchases(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<PurchasePage, Error>;

    /// Fetch one of the user's purchases; `not_found` otherwise.
    async fn get_purchase(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<Purchase, Error>;

    /// Aggregate the user's purchases.
    async fn purchase_stats(&self, user_id: &UserId) -> Result<PurchaseStats, Error>;
}

/// Fixture query for tests and database-less runs: the ledger is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePurchaseQuery;

#[async_trait]
impl PurchaseQuery for FixturePurchaseQuery {
    async fn list_purchases(
        &self,
        _user_id: &UserId,
        _page: PageRequest,
    ) -> Result<PurchasePage, Error> {
        Ok(PurchasePage::default())
    }

    async fn get_purchase(
        &self,
        _user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<Purchase, Error> {
        Err(Error::not_found(format!("purchase {purchase_id} not found")))
    }

    async fn purchase_stats(&self, _user_id: &UserId) -> Result<PurchaseStats, Error> {
        Ok(PurchaseStats::empty())
    }
}
