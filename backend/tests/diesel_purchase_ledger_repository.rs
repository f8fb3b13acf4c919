//! Integration tests for `DieselPurchaseLedgerRepository` against embedded
//! PostgreSQL.
//!
//! The focus is the cached `users.last_buy_date`: after every record or
//! remove it must equal the newest remaining purchase date for that user, and
//! a failed mutation must leave both tables untouched.

use chrono::{DateTime, TimeZone, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use purchase_queue::domain::ports::{
    PurchaseLedgerError, PurchaseLedgerRepository, UserDirectoryRepository,
};
use purchase_queue::domain::{
    DisplayName, EmailAddress, Kilograms, NewPurchase, NewUser, PageRequest, PasswordDigest,
    Price, ProofRef, PurchaseId, User, UserId,
};
use purchase_queue::outbound::persistence::{
    DbPool, DieselPurchaseLedgerRepository, DieselUserDirectoryRepository, PoolConfig,
};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod support;

use support::{execute_sql, handle_cluster_setup_failure, provision_template_database, shared_cluster};

struct LedgerHarness {
    runtime: Runtime,
    ledger: DieselPurchaseLedgerRepository,
    directory: DieselUserDirectoryRepository,
    database_url: String,
    _database: TemporaryDatabase,
}

impl LedgerHarness {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn create_user(&self, email: &str) -> User {
        let new_user = NewUser {
            email: EmailAddress::new(email).expect("valid email"),
            name: DisplayName::new("Ledger Tester").expect("valid name"),
            password_digest: PasswordDigest::derive("correct horse"),
        };
        self.block_on(self.directory.create(&new_user))
            .expect("user is created")
    }

    fn last_buy_date(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.block_on(self.directory.find_by_id(&user_id))
            .expect("directory read")
            .expect("user exists")
            .last_buy_date()
    }
}

fn setup_harness() -> Result<LedgerHarness, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster).map_err(|err| err.to_string())?;
    let database_url = database.url().to_string();

    let config = PoolConfig::new(&database_url)
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(LedgerHarness {
        runtime,
        ledger: DieselPurchaseLedgerRepository::new(pool.clone()),
        directory: DieselUserDirectoryRepository::new(pool),
        database_url,
        _database: database,
    })
}

#[fixture]
fn harness() -> Option<LedgerHarness> {
    match setup_harness() {
        Ok(harness) => Some(harness),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn purchase(user_id: UserId, purchased_at: DateTime<Utc>, kg: f64, price: f64) -> NewPurchase {
    NewPurchase {
        user_id,
        purchased_at,
        kg: Kilograms::new(Some(kg)).expect("positive kg"),
        price: Price::new(Some(price)).expect("positive price"),
        proof_ref: None,
    }
}

#[rstest]
fn record_sets_last_buy_date(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: record_sets_last_buy_date skipped");
        return;
    };
    let user = h.create_user("first@example.com");
    assert_eq!(h.last_buy_date(user.id()), None);

    let mut new_purchase = purchase(user.id(), at(5), 2.5, 18.9);
    new_purchase.proof_ref = Some(ProofRef::new("proofs/receipt-1.jpg").expect("valid proof"));
    let recorded = h
        .block_on(h.ledger.record(&new_purchase))
        .expect("purchase recorded");

    assert_eq!(recorded.last_buy_date, at(5));
    assert_eq!(recorded.purchase.user_id(), user.id());
    assert_eq!(recorded.purchase.kg().value(), 2.5);
    assert_eq!(
        recorded.purchase.proof_ref().map(AsRef::as_ref),
        Some("proofs/receipt-1.jpg")
    );
    assert_eq!(h.last_buy_date(user.id()), Some(at(5)));
}

#[rstest]
fn backdated_record_keeps_the_newest_date(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: backdated_record_keeps_the_newest_date skipped");
        return;
    };
    let user = h.create_user("backdate@example.com");

    h.block_on(h.ledger.record(&purchase(user.id(), at(20), 1.0, 5.0)))
        .expect("recent purchase");
    let recorded = h
        .block_on(h.ledger.record(&purchase(user.id(), at(2), 1.0, 5.0)))
        .expect("back-dated purchase");

    assert_eq!(recorded.last_buy_date, at(20));
    assert_eq!(h.last_buy_date(user.id()), Some(at(20)));
}

#[rstest]
fn remove_recomputes_last_buy_date(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: remove_recomputes_last_buy_date skipped");
        return;
    };
    let user = h.create_user("remove@example.com");
    let older = h
        .block_on(h.ledger.record(&purchase(user.id(), at(3), 1.0, 5.0)))
        .expect("older purchase");
    let newer = h
        .block_on(h.ledger.record(&purchase(user.id(), at(9), 1.0, 5.0)))
        .expect("newer purchase");

    let removed = h
        .block_on(h.ledger.remove(&user.id(), &newer.purchase.id()))
        .expect("remove newer");
    assert!(removed);
    assert_eq!(h.last_buy_date(user.id()), Some(at(3)));

    let removed = h
        .block_on(h.ledger.remove(&user.id(), &older.purchase.id()))
        .expect("remove older");
    assert!(removed);
    assert_eq!(h.last_buy_date(user.id()), None);
}

#[rstest]
fn purchases_are_scoped_to_their_owner(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: purchases_are_scoped_to_their_owner skipped");
        return;
    };
    let owner = h.create_user("owner@example.com");
    let other = h.create_user("other@example.com");
    let recorded = h
        .block_on(h.ledger.record(&purchase(owner.id(), at(4), 1.0, 5.0)))
        .expect("owner purchase");
    let purchase_id = recorded.purchase.id();

    let seen_by_other = h
        .block_on(h.ledger.find(&other.id(), &purchase_id))
        .expect("find succeeds");
    assert!(seen_by_other.is_none());

    let removed_by_other = h
        .block_on(h.ledger.remove(&other.id(), &purchase_id))
        .expect("remove succeeds");
    assert!(!removed_by_other);

    let still_there = h
        .block_on(h.ledger.find(&owner.id(), &purchase_id))
        .expect("find succeeds");
    assert_eq!(still_there, Some(recorded.purchase));
    assert_eq!(h.last_buy_date(owner.id()), Some(at(4)));
}

#[rstest]
fn removing_a_missing_purchase_reports_false(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: removing_a_missing_purchase_reports_false skipped");
        return;
    };
    let user = h.create_user("missing@example.com");
    let missing = PurchaseId::new(987_654).expect("valid id");

    let removed = h
        .block_on(h.ledger.remove(&user.id(), &missing))
        .expect("remove succeeds");

    assert!(!removed);
}

#[rstest]
fn removing_an_already_removed_purchase_changes_nothing(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: removing_an_already_removed_purchase_changes_nothing skipped");
        return;
    };
    let user = h.create_user("twice@example.com");
    h.block_on(h.ledger.record(&purchase(user.id(), at(4), 1.0, 5.0)))
        .expect("older purchase");
    let newer = h
        .block_on(h.ledger.record(&purchase(user.id(), at(11), 1.0, 5.0)))
        .expect("newer purchase");

    let first = h
        .block_on(h.ledger.remove(&user.id(), &newer.purchase.id()))
        .expect("first remove");
    assert!(first);
    assert_eq!(h.last_buy_date(user.id()), Some(at(4)));

    let second = h
        .block_on(h.ledger.remove(&user.id(), &newer.purchase.id()))
        .expect("second remove");
    assert!(!second);
    assert_eq!(h.last_buy_date(user.id()), Some(at(4)));
    let page = h
        .block_on(h.ledger.list(&user.id(), PageRequest::default()))
        .expect("list succeeds");
    assert_eq!(page.total, 1);
}

#[rstest]
fn recording_for_an_unknown_owner_is_rejected(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: recording_for_an_unknown_owner_is_rejected skipped");
        return;
    };
    let ghost = UserId::new(424_242).expect("valid id");

    let err = h
        .block_on(h.ledger.record(&purchase(ghost, at(1), 1.0, 5.0)))
        .expect_err("unknown owner must fail");

    assert_eq!(err, PurchaseLedgerError::unknown_owner(424_242));
}

#[rstest]
fn failed_refresh_rolls_back_the_insert(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: failed_refresh_rolls_back_the_insert skipped");
        return;
    };
    let user = h.create_user("atomic@example.com");
    execute_sql(
        &h.database_url,
        "ALTER TABLE users ADD CONSTRAINT users_never_buy CHECK (last_buy_date IS NULL);",
    )
    .expect("constraint added");

    let err = h
        .block_on(h.ledger.record(&purchase(user.id(), at(6), 1.0, 5.0)))
        .expect_err("refresh must violate the constraint");
    assert!(matches!(err, PurchaseLedgerError::Query { .. }), "got {err:?}");

    let page = h
        .block_on(h.ledger.list(&user.id(), PageRequest::default()))
        .expect("list succeeds");
    assert_eq!(page.total, 0);
    assert!(page.purchases.is_empty());
    assert_eq!(h.last_buy_date(user.id()), None);
}

#[rstest]
fn list_pages_newest_first(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: list_pages_newest_first skipped");
        return;
    };
    let user = h.create_user("pages@example.com");
    for day in [7, 1, 15] {
        h.block_on(h.ledger.record(&purchase(user.id(), at(day), 1.0, 5.0)))
            .expect("purchase recorded");
    }

    let first = h
        .block_on(
            h.ledger
                .list(&user.id(), PageRequest::new(Some(2), None).expect("page")),
        )
        .expect("first page");
    let dates: Vec<_> = first.purchases.iter().map(|p| p.purchased_at()).collect();
    assert_eq!(dates, vec![at(15), at(7)]);
    assert_eq!(first.total, 3);

    let second = h
        .block_on(
            h.ledger
                .list(&user.id(), PageRequest::new(Some(2), Some(2)).expect("page")),
        )
        .expect("second page");
    let dates: Vec<_> = second.purchases.iter().map(|p| p.purchased_at()).collect();
    assert_eq!(dates, vec![at(1)]);
    assert_eq!(second.total, 3);
}

#[rstest]
fn list_total_matches_the_page_under_concurrent_writes(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: list_total_matches_the_page_under_concurrent_writes skipped");
        return;
    };
    let user_id = h.create_user("busy@example.com").id();
    let writer = h.ledger.clone();
    let reader = h.ledger.clone();

    h.block_on(async move {
        let writes = tokio::spawn(async move {
            for day in 1..=28 {
                writer
                    .record(&purchase(user_id, at(day), 1.0, 5.0))
                    .await
                    .expect("concurrent purchase recorded");
            }
        });

        let page_request = PageRequest::new(Some(100), None).expect("page");
        while !writes.is_finished() {
            let page = reader
                .list(&user_id, page_request)
                .await
                .expect("list succeeds");
            assert_eq!(
                usize::try_from(page.total).expect("small total"),
                page.purchases.len()
            );
            tokio::task::yield_now().await;
        }
        writes.await.expect("writer task completes");

        let page = reader
            .list(&user_id, page_request)
            .await
            .expect("final list");
        assert_eq!(page.total, 28);
        assert_eq!(page.purchases.len(), 28);
    });
}

#[rstest]
fn stats_aggregate_one_users_purchases(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: stats_aggregate_one_users_purchases skipped");
        return;
    };
    let user = h.create_user("stats@example.com");
    let other = h.create_user("noise@example.com");
    h.block_on(h.ledger.record(&purchase(user.id(), at(2), 2.0, 10.0)))
        .expect("first purchase");
    h.block_on(h.ledger.record(&purchase(user.id(), at(12), 3.0, 20.0)))
        .expect("second purchase");
    h.block_on(h.ledger.record(&purchase(other.id(), at(8), 9.0, 90.0)))
        .expect("other user's purchase");

    let stats = h
        .block_on(h.ledger.stats(&user.id()))
        .expect("stats succeed");

    assert_eq!(stats.total_purchases, 2);
    assert_eq!(stats.total_kg, 5.0);
    assert_eq!(stats.total_spent, 30.0);
    assert_eq!(stats.avg_price, Some(15.0));
    assert_eq!(stats.first_purchase, Some(at(2)));
    assert_eq!(stats.last_purchase, Some(at(12)));
}

#[rstest]
fn stats_for_a_user_without_purchases_are_empty(harness: Option<LedgerHarness>) {
    let Some(h) = harness else {
        eprintln!("SKIP-TEST-CLUSTER: stats_for_a_user_without_purchases_are_empty skipped");
        return;
    };
    let user = h.create_user("idle@example.com");

    let stats = h
        .block_on(h.ledger.stats(&user.id()))
        .expect("stats succeed");

    assert_eq!(stats, purchase_queue::domain::PurchaseStats::empty());
}
