//! Tests for the purchase services.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockPurchaseLedgerRepository, RecordedPurchase};
use crate::domain::{ErrorCode, Kilograms, Price, ProofRef, PurchaseDraft};

struct FixtureClock(DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn user_id() -> UserId {
    UserId::new(11).expect("valid id")
}

fn purchase_id() -> PurchaseId {
    PurchaseId::new(99).expect("valid id")
}

fn request(purchased_at: Option<DateTime<Utc>>) -> RecordPurchaseRequest {
    RecordPurchaseRequest {
        user_id: user_id(),
        purchased_at,
        kg: Kilograms::new(Some(2.0)).expect("valid kg"),
        price: Price::new(Some(30.0)).expect("valid price"),
        proof_ref: Some(ProofRef::new("receipts/1.png").expect("valid proof")),
    }
}

fn stored(purchase: &NewPurchase) -> Purchase {
    Purchase::new(PurchaseDraft {
        id: purchase_id(),
        user_id: purchase.user_id,
        purchased_at: purchase.purchased_at,
        kg: purchase.kg,
        price: purchase.price,
        proof_ref: purchase.proof_ref.clone(),
        created_at: purchase.purchased_at,
    })
}

fn command(
    repo: MockPurchaseLedgerRepository,
    now: DateTime<Utc>,
) -> PurchaseCommandService<MockPurchaseLedgerRepository> {
    PurchaseCommandService::new(Arc::new(repo), Arc::new(FixtureClock(now)))
}

#[rstest]
#[tokio::test]
async fn record_defaults_date_to_clock(now: DateTime<Utc>) {
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_record()
        .times(1)
        .withf(move |purchase| purchase.purchased_at == now && purchase.user_id.as_i64() == 11)
        .returning(|purchase| {
            Ok(RecordedPurchase {
                purchase: stored(purchase),
                last_buy_date: purchase.purchased_at,
            })
        });

    let response = command(repo, now)
        .record_purchase(request(None))
        .await
        .expect("record succeeds");

    assert_eq!(response.purchase.id(), purchase_id());
    assert_eq!(response.last_buy_date, now);
}

#[rstest]
#[tokio::test]
async fn record_keeps_back_dated_purchase_and_reports_cached_date(now: DateTime<Utc>) {
    let back_dated = now - chrono::Duration::days(60);
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_record()
        .times(1)
        .withf(move |purchase| purchase.purchased_at == back_dated)
        .returning(move |purchase| {
            Ok(RecordedPurchase {
                purchase: stored(purchase),
                last_buy_date: now,
            })
        });

    let response = command(repo, now)
        .record_purchase(request(Some(back_dated)))
        .await
        .expect("record succeeds");

    assert_eq!(response.purchase.purchased_at(), back_dated);
    assert_eq!(response.last_buy_date, now);
}

#[rstest]
#[case(PurchaseLedgerError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(PurchaseLedgerError::query("check violation"), ErrorCode::InternalError)]
#[case(PurchaseLedgerError::unknown_owner(11_i64), ErrorCode::Unauthorized)]
#[tokio::test]
async fn record_maps_ledger_errors(
    now: DateTime<Utc>,
    #[case] failure: PurchaseLedgerError,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_record()
        .times(1)
        .return_once(move |_| Err(failure));

    let err = command(repo, now)
        .record_purchase(request(None))
        .await
        .expect_err("ledger failure surfaces");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn delete_miss_is_not_found(now: DateTime<Utc>) {
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_remove().times(1).return_once(|_, _| Ok(false));

    let err = command(repo, now)
        .delete_purchase(DeletePurchaseRequest {
            user_id: user_id(),
            purchase_id: purchase_id(),
        })
        .await
        .expect_err("nothing removed");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_passes_owner_to_ledger(now: DateTime<Utc>) {
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_remove()
        .times(1)
        .withf(|owner, id| *owner == user_id() && *id == purchase_id())
        .return_once(|_, _| Ok(true));

    command(repo, now)
        .delete_purchase(DeletePurchaseRequest {
            user_id: user_id(),
            purchase_id: purchase_id(),
        })
        .await
        .expect("delete succeeds");
}

#[rstest]
#[tokio::test]
async fn get_missing_purchase_is_not_found() {
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_find().times(1).return_once(|_, _| Ok(None));

    let err = PurchaseQueryService::new(Arc::new(repo))
        .get_purchase(&user_id(), &purchase_id())
        .await
        .expect_err("missing purchase");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn list_forwards_page_request() {
    let page = PageRequest::new(Some(5), Some(10)).expect("valid page");
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_list()
        .times(1)
        .withf(move |owner, requested| *owner == user_id() && *requested == page)
        .return_once(|_, _| {
            Ok(PurchasePage {
                purchases: Vec::new(),
                total: 12,
            })
        });

    let listed = PurchaseQueryService::new(Arc::new(repo))
        .list_purchases(&user_id(), page)
        .await
        .expect("list succeeds");

    assert_eq!(listed.total, 12);
}

#[rstest]
#[tokio::test]
async fn stats_connection_failure_is_service_unavailable() {
    let mut repo = MockPurchaseLedgerRepository::new();
    repo.expect_stats()
        .times(1)
        .return_once(|_| Err(PurchaseLedgerError::connection("pool exhausted")));

    let err = PurchaseQueryService::new(Arc::new(repo))
        .purchase_stats(&user_id())
        .await
        .expect_err("stats failure");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
