//! Purchase domain services.
//!
//! These services implement the purchase driving ports on top of the ledger
//! repository. Amounts arrive already validated; the command service only
//! fills in the purchase date from its clock when the caller omitted one.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    DeletePurchaseRequest, PurchaseCommand, PurchaseLedgerError, PurchaseLedgerRepository,
    PurchaseQuery, RecordPurchaseRequest, RecordPurchaseResponse,
};
use crate::domain::{
    Error, NewPurchase, PageRequest, Purchase, PurchaseId, PurchasePage, PurchaseStats, UserId,
};

fn map_ledger_error(error: PurchaseLedgerError) -> Error {
    match error {
        PurchaseLedgerError::Connection { message } => {
            Error::service_unavailable(format!("purchase ledger unavailable: {message}"))
        }
        PurchaseLedgerError::Query { message } => {
            Error::internal(format!("purchase ledger error: {message}"))
        }
        // The session outlived its user.
        PurchaseLedgerError::UnknownOwner { .. } => Error::unauthorized("login required"),
    }
}

/// Purchase service implementing the command driving port.
#[derive(Clone)]
pub struct PurchaseCommandService<R> {
    ledger: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> PurchaseCommandService<R> {
    /// Create a new command service over the ledger repository.
    pub fn new(ledger: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }
}

#[async_trait]
impl<R> PurchaseCommand for PurchaseCommandService<R>
where
    R: PurchaseLedgerRepository,
{
    async fn record_purchase(
        &self,
        request: RecordPurchaseRequest,
    ) -> Result<RecordPurchaseResponse, Error> {
        let RecordPurchaseRequest {
            user_id,
            purchased_at,
            kg,
            price,
            proof_ref,
        } = request;
        let purchase = NewPurchase {
            user_id,
            purchased_at: purchased_at.unwrap_or_else(|| self.clock.utc()),
            kg,
            price,
            proof_ref,
        };

        let recorded = self
            .ledger
            .record(&purchase)
            .await
            .map_err(map_ledger_error)?;

        info!(
            user_id = %user_id,
            purchase_id = %recorded.purchase.id(),
            "purchase recorded"
        );
        Ok(RecordPurchaseResponse {
            purchase: recorded.purchase,
            last_buy_date: recorded.last_buy_date,
        })
    }

    async fn delete_purchase(&self, request: DeletePurchaseRequest) -> Result<(), Error> {
        let removed = self
            .ledger
            .remove(&request.user_id, &request.purchase_id)
            .await
            .map_err(map_ledger_error)?;
        if !removed {
            return Err(Error::not_found(format!(
                "purchase {} not found",
                request.purchase_id
            )));
        }

        info!(
            user_id = %request.user_id,
            purchase_id = %request.purchase_id,
            "purchase deleted"
        );
        Ok(())
    }
}

/// Purchase service implementing the query driving port.
#[derive(Clone)]
pub struct PurchaseQueryService<R> {
    ledger: Arc<R>,
}

impl<R> PurchaseQueryService<R> {
    /// Create a new query service over the ledger repository.
    pub fn new(ledger: Arc<R>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl<R> PurchaseQuery for PurchaseQueryService<R>
where
    R: PurchaseLedgerRepository,
{
    async fn list_purchases(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<PurchasePage, Error> {
        self.ledger
            .list(user_id, page)
            .await
            .map_err(map_ledger_error)
    }

    async fn get_purchase(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<Purchase, Error> {
        self.ledger
            .find(user_id, purchase_id)
            .await
            .map_err(map_ledger_error)?
            .ok_or_else(|| Error::not_found(format!("purchase {purchase_id} not found")))
    }

    async fn purchase_stats(&self, user_id: &UserId) -> Result<PurchaseStats, Error> {
        self.ledger.stats(user_id).await.map_err(map_ledger_error)
    }
}

#[cfg(test)]
#[path = "purchase_service_tests.rs"]
mod tests;
