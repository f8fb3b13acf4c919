//! Driving port for purchase mutations.
//!
//! Inbound adapters validate amounts into domain types before building a
//! request, so nothing behind this port sees a malformed weight or price.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Error, Kilograms, Price, ProofRef, Purchase, PurchaseDraft, PurchaseId, UserId,
};

/// Request to record a purchase for the authenticated user.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPurchaseRequest {
    pub user_id: UserId,
    /// Defaults to the service clock's current time when absent.
    pub purchased_at: Option<DateTime<Utc>>,
    pub kg: Kilograms,
    pub price: Price,
    pub proof_ref: Option<ProofRef>,
}

/// Response from recording a purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPurchaseResponse {
    pub purchase: Purchase,
    /// The owner's last-buy date after the purchase was committed.
    pub last_buy_date: DateTime<Utc>,
}

/// Request to delete one of the authenticated user's purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePurchaseRequest {
    pub user_id: UserId,
    pub purchase_id: PurchaseId,
}

/// Driving port for purchase write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseCommand: Send + Sync {
    /// Record a purchase and return it with the owner's refreshed last-buy
    /// date.
    async fn record_purchase(
        &self,
        request: RecordPurchaseRequest,
    ) -> Result<RecordPurchaseResponse, Error>;

    /// Delete a purchase. A purchase that does not exist or belongs to
    /// someone else yields `not_found`.
    async fn delete_purchase(&self, request: DeletePurchaseRequest) -> Result<(), Error>;
}

/// Fixture command implementation for tests that do not need persistence.
///
/// Recording echoes the request back as purchase `1`; nothing is ever stored,
/// so deletes always miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePurchaseCommand;

#[async_trait]
impl PurchaseCommand for FixturePurchaseCommand {
    async fn record_purchase(
        &self,
        request: RecordPurchaseRequest,
    ) -> Result<RecordPurchaseResponse, Error> {
        let now = Utc::now();
        let purchased_at = request.purchased_at.unwrap_or(now);
        let id = PurchaseId::new(1)
            .map_err(|err| Error::internal(format!("invalid fixture purchase id: {err}")))?;
        let purchase = Purchase::new(PurchaseDraft {
            id,
            user_id: request.user_id,
            purchased_at,
            kg: request.kg,
            price: request.price,
            proof_ref: request.proof_ref,
            created_at: now,
        });
        Ok(RecordPurchaseResponse {
            purchase,
            last_buy_date: purchased_at,
        })
    }

    async fn delete_purchase(&self, request: DeletePurchaseRequest) -> Result<(), Error> {
        Err(Error::not_found(format!(
            "purchase {} not found",
            request.purchase_id
        )))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    fn request(purchased_at: Option<DateTime<Utc>>) -> RecordPurchaseRequest {
        RecordPurchaseRequest {
            user_id: UserId::new(4).expect("valid id"),
            purchased_at,
            kg: Kilograms::new(Some(1.5)).expect("valid kg"),
            price: Price::new(Some(9.0)).expect("valid price"),
            proof_ref: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_echoes_request_fields() {
        let at = DateTime::parse_from_rfc3339("2024-02-03T04:05:06Z")
            .expect("RFC3339 fixture timestamp")
            .with_timezone(&Utc);
        let response = FixturePurchaseCommand
            .record_purchase(request(Some(at)))
            .await
            .expect("fixture record succeeds");

        assert_eq!(response.purchase.purchased_at(), at);
        assert_eq!(response.last_buy_date, at);
        assert_eq!(response.purchase.user_id().as_i64(), 4);
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_delete_reports_not_found() {
        let err = FixturePurchaseCommand
            .delete_purchase(DeletePurchaseRequest {
                user_id: UserId::new(4).expect("valid id"),
                purchase_id: PurchaseId::new(8).expect("valid id"),
            })
            .await
            .expect_err("nothing to delete");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
