//! PostgreSQL-backed `PurchaseLedgerRepository` implementation using Diesel.
//!
//! Every mutation runs in one transaction that first locks the owner's row
//! (`SELECT ... FOR UPDATE`), applies the insert or delete, then rewrites
//! `users.last_buy_date` as `max(purchased_at)` over the owner's remaining
//! purchases. Concurrent mutations for the same user therefore serialise, and
//! the cached date cannot drift from the ledger on either path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{avg, count_star, max, min, now, sum};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{PurchaseLedgerError, PurchaseLedgerRepository, RecordedPurchase};
use crate::domain::{
    Kilograms, NewPurchase, PageRequest, Price, ProofRef, Purchase, PurchaseDraft, PurchaseId,
    PurchasePage, PurchaseStats, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewPurchaseRow, PurchaseRow};
use super::pool::{DbPool, PoolError};
use super::schema::{purchases, users};

/// Diesel-backed implementation of the purchase ledger port.
#[derive(Clone)]
pub struct DieselPurchaseLedgerRepository {
    pool: DbPool,
}

impl DieselPurchaseLedgerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a ledger transaction.
#[derive(Debug)]
enum LedgerTxError {
    Diesel(diesel::result::Error),
    UnknownOwner,
}

impl From<diesel::result::Error> for LedgerTxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

fn map_pool_error(error: PoolError) -> PurchaseLedgerError {
    map_basic_pool_error(error, |message| PurchaseLedgerError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> PurchaseLedgerError {
    map_basic_diesel_error(
        error,
        PurchaseLedgerError::query,
        PurchaseLedgerError::connection,
    )
}

fn map_tx_error(owner: UserId) -> impl FnOnce(LedgerTxError) -> PurchaseLedgerError {
    move |error| match error {
        LedgerTxError::Diesel(error) => map_diesel_error(error),
        LedgerTxError::UnknownOwner => PurchaseLedgerError::unknown_owner(owner.as_i64()),
    }
}

/// Convert a database row into a validated domain purchase.
fn row_to_purchase(row: PurchaseRow) -> Result<Purchase, PurchaseLedgerError> {
    let PurchaseRow {
        id,
        user_id,
        purchased_at,
        kg,
        price,
        proof_ref,
        created_at,
    } = row;
    let invalid = |err: &dyn std::fmt::Display| {
        PurchaseLedgerError::query(format!("invalid purchase row {id}: {err}"))
    };

    Ok(Purchase::new(PurchaseDraft {
        id: PurchaseId::new(id).map_err(|err| invalid(&err))?,
        user_id: UserId::new(user_id).map_err(|err| invalid(&err))?,
        purchased_at,
        kg: Kilograms::new(Some(kg)).map_err(|err| invalid(&err))?,
        price: Price::new(Some(price)).map_err(|err| invalid(&err))?,
        proof_ref: proof_ref
            .map(ProofRef::new)
            .transpose()
            .map_err(|err| invalid(&err))?,
        created_at,
    }))
}

/// Lock the owner's directory row for the rest of the transaction.
///
/// Returns `false` when the owner does not exist.
async fn lock_owner(conn: &mut AsyncPgConnection, owner: i64) -> QueryResult<bool> {
    let locked = users::table
        .filter(users::id.eq(owner))
        .select(users::id)
        .for_update()
        .first::<i64>(conn)
        .await
        .optional()?;
    Ok(locked.is_some())
}

/// Rewrite the owner's cached last-buy date from the ledger.
async fn refresh_last_buy_date(
    conn: &mut AsyncPgConnection,
    owner: i64,
) -> QueryResult<Option<DateTime<Utc>>> {
    let latest: Option<DateTime<Utc>> = purchases::table
        .filter(purchases::user_id.eq(owner))
        .select(max(purchases::purchased_at))
        .first(conn)
        .await?;

    diesel::update(users::table.filter(users::id.eq(owner)))
        .set((users::last_buy_date.eq(latest), users::updated_at.eq(now)))
        .execute(conn)
        .await?;

    Ok(latest)
}

fn page_bounds(page: PageRequest) -> (i64, i64) {
    let limit = i64::from(page.limit());
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

type StatsRow = (
    i64,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
);

#[async_trait]
impl PurchaseLedgerRepository for DieselPurchaseLedgerRepository {
    async fn record(
        &self,
        purchase: &NewPurchase,
    ) -> Result<RecordedPurchase, PurchaseLedgerError> {
        let owner = purchase.user_id;
        let new_row = NewPurchaseRow {
            user_id: owner.as_i64(),
            purchased_at: purchase.purchased_at,
            kg: purchase.kg.value(),
            price: purchase.price.value(),
            proof_ref: purchase.proof_ref.as_ref().map(AsRef::as_ref),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (row, latest) = conn
            .transaction::<_, LedgerTxError, _>(|conn| {
                async move {
                    if !lock_owner(conn, new_row.user_id).await? {
                        return Err(LedgerTxError::UnknownOwner);
                    }

                    let row = diesel::insert_into(purchases::table)
                        .values(&new_row)
                        .returning(PurchaseRow::as_returning())
                        .get_result::<PurchaseRow>(conn)
                        .await?;

                    let latest = refresh_last_buy_date(conn, new_row.user_id).await?;
                    Ok((row, latest))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error(owner))?;

        let last_buy_date = latest.ok_or_else(|| {
            PurchaseLedgerError::query("last buy date missing after recording a purchase")
        })?;
        Ok(RecordedPurchase {
            purchase: row_to_purchase(row)?,
            last_buy_date,
        })
    }

    async fn list(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<PurchasePage, PurchaseLedgerError> {
        let owner = user_id.as_i64();
        let (limit, offset) = page_bounds(page);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // One snapshot for both reads, so `total` always describes the page.
        let (total, rows) = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| {
                async move {
                    let total: i64 = purchases::table
                        .filter(purchases::user_id.eq(owner))
                        .select(count_star())
                        .first(conn)
                        .await?;

                    let rows: Vec<PurchaseRow> = purchases::table
                        .filter(purchases::user_id.eq(owner))
                        .order((purchases::purchased_at.desc(), purchases::id.desc()))
                        .limit(limit)
                        .offset(offset)
                        .select(PurchaseRow::as_select())
                        .load(conn)
                        .await?;

                    Ok::<_, diesel::result::Error>((total, rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(PurchasePage {
            purchases: rows
                .into_iter()
                .map(row_to_purchase)
                .collect::<Result<Vec<_>, _>>()?,
            total: count_to_u64(total),
        })
    }

    async fn find(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<Option<Purchase>, PurchaseLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = purchases::table
            .filter(
                purchases::id
                    .eq(purchase_id.as_i64())
                    .and(purchases::user_id.eq(user_id.as_i64())),
            )
            .select(PurchaseRow::as_select())
            .first::<PurchaseRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_purchase).transpose()
    }

    async fn remove(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<bool, PurchaseLedgerError> {
        let owner = *user_id;
        let target = purchase_id.as_i64();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, LedgerTxError, _>(|conn| {
            async move {
                if !lock_owner(conn, owner.as_i64()).await? {
                    return Ok(false);
                }

                let deleted = diesel::delete(
                    purchases::table.filter(
                        purchases::id
                            .eq(target)
                            .and(purchases::user_id.eq(owner.as_i64())),
                    ),
                )
                .execute(conn)
                .await?;
                if deleted == 0 {
                    return Ok(false);
                }

                refresh_last_buy_date(conn, owner.as_i64()).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error(owner))
    }

    async fn stats(&self, user_id: &UserId) -> Result<PurchaseStats, PurchaseLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (count, total_kg, total_spent, avg_price, first, last): StatsRow = purchases::table
            .filter(purchases::user_id.eq(user_id.as_i64()))
            .select((
                count_star(),
                sum(purchases::kg),
                sum(purchases::price),
                avg(purchases::price),
                min(purchases::purchased_at),
                max(purchases::purchased_at),
            ))
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(PurchaseStats {
            total_purchases: count_to_u64(count),
            total_kg: total_kg.unwrap_or(0.0),
            total_spent: total_spent.unwrap_or(0.0),
            avg_price,
            first_purchase: first,
            last_purchase: last,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row mapping and error translation.
    use super::*;
    use rstest::rstest;

    fn row() -> PurchaseRow {
        PurchaseRow {
            id: 4,
            user_id: 2,
            purchased_at: Utc::now(),
            kg: 1.25,
            price: 18.0,
            proof_ref: Some("receipts/4.jpg".to_owned()),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn row_maps_to_domain_purchase() {
        let purchase = row_to_purchase(row()).expect("valid row");
        assert_eq!(purchase.id().as_i64(), 4);
        assert_eq!(purchase.user_id().as_i64(), 2);
        assert_eq!(
            purchase.proof_ref().map(AsRef::as_ref),
            Some("receipts/4.jpg")
        );
    }

    #[rstest]
    fn corrupt_row_is_a_query_error() {
        let corrupt = PurchaseRow {
            kg: -1.0,
            ..row()
        };
        let err = row_to_purchase(corrupt).expect_err("negative kg");
        assert!(matches!(err, PurchaseLedgerError::Query { .. }));
        assert!(err.to_string().contains("invalid purchase row 4"));
    }

    #[rstest]
    fn unknown_owner_keeps_the_user_id() {
        let owner = UserId::new(9).expect("valid id");
        let err = map_tx_error(owner)(LedgerTxError::UnknownOwner);
        assert_eq!(err, PurchaseLedgerError::UnknownOwner { user_id: 9 });
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, PurchaseLedgerError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[rstest]
    #[case(PageRequest::default(), (50, 0))]
    #[case(PageRequest::new(Some(3), Some(9)).expect("valid page"), (3, 9))]
    fn page_bounds_convert_to_sql_types(#[case] page: PageRequest, #[case] expected: (i64, i64)) {
        assert_eq!(page_bounds(page), expected);
    }
}
