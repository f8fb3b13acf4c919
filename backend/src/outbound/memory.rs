//! In-memory adapter for both driven ports, used when no database is
//! configured.
//!
//! The directory and the ledger live behind one lock, so every mutation and
//! the owner's `last_buy_date` refresh land together, exactly as the Diesel
//! adapters guarantee with a transaction.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::ports::{
    PurchaseLedgerError, PurchaseLedgerRepository, RecordedPurchase, UserDirectoryError,
    UserDirectoryRepository,
};
use crate::domain::{
    DisplayName, EmailAddress, Kilograms, NewPurchase, NewUser, PageRequest, PasswordDigest,
    Price, Purchase, PurchaseDraft, PurchaseId, PurchasePage, PurchaseStats, QueueCandidate,
    StoredCredentials, User, UserDraft, UserId,
};

/// Password shared by every sample account.
pub const SAMPLE_PASSWORD: &str = "password";

/// `(email, name, days ago of each purchase)`.
const SAMPLE_USERS: [(&str, &str, &[i64]); 3] = [
    ("ada@example.com", "Ada Lovelace", &[]),
    ("grace@example.com", "Grace Hopper", &[40, 47, 54]),
    ("alan@example.com", "Alan Turing", &[10, 17, 24, 31, 38, 45, 52]),
];

struct StoredUser {
    user: User,
    digest: PasswordDigest,
}

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, StoredUser>,
    purchases: BTreeMap<i64, Purchase>,
    next_user_id: i64,
    next_purchase_id: i64,
}

impl MemoryState {
    fn allocate_user_id(&mut self) -> i64 {
        self.next_user_id += 1;
        self.next_user_id
    }

    fn allocate_purchase_id(&mut self) -> i64 {
        self.next_purchase_id += 1;
        self.next_purchase_id
    }

    fn owned_by(&self, owner: UserId) -> impl Iterator<Item = &Purchase> {
        self.purchases
            .values()
            .filter(move |purchase| purchase.user_id() == owner)
    }

    /// Rewrite the owner's cached date as the newest remaining purchase.
    fn refresh_last_buy_date(&mut self, owner: UserId) -> Option<DateTime<Utc>> {
        let latest = self.owned_by(owner).map(Purchase::purchased_at).max();
        if let Some(stored) = self.users.get_mut(&owner.as_i64()) {
            let user = &stored.user;
            stored.user = User::new(UserDraft {
                id: user.id(),
                email: user.email().clone(),
                name: user.name().clone(),
                last_buy_date: latest,
                created_at: user.created_at(),
            });
        }
        latest
    }
}

/// Directory and ledger held in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding three sample accounts, all with the password
    /// [`SAMPLE_PASSWORD`]: Ada (id 1) has never bought, Grace and Alan have
    /// purchase histories ending 40 and 10 days before `now`.
    pub fn with_sample_users(now: DateTime<Utc>) -> Result<Self, UserDirectoryError> {
        let mut state = MemoryState::default();
        for (email, name, days_ago) in SAMPLE_USERS {
            let invalid = |err: &dyn std::fmt::Display| {
                UserDirectoryError::query(format!("invalid sample user {email}: {err}"))
            };
            let id = state.allocate_user_id();
            let user = User::new(UserDraft {
                id: UserId::new(id).map_err(|err| invalid(&err))?,
                email: EmailAddress::new(email).map_err(|err| invalid(&err))?,
                name: DisplayName::new(name).map_err(|err| invalid(&err))?,
                last_buy_date: None,
                created_at: now,
            });
            let owner = user.id();
            state.users.insert(
                id,
                StoredUser {
                    user,
                    digest: PasswordDigest::derive(SAMPLE_PASSWORD),
                },
            );

            for &days in days_ago {
                let purchase_id = state.allocate_purchase_id();
                let purchased_at = now - Duration::days(days);
                let purchase = Purchase::new(PurchaseDraft {
                    id: PurchaseId::new(purchase_id).map_err(|err| invalid(&err))?,
                    user_id: owner,
                    purchased_at,
                    kg: Kilograms::new(Some(2.0)).map_err(|err| invalid(&err))?,
                    price: Price::new(Some(15.0)).map_err(|err| invalid(&err))?,
                    proof_ref: None,
                    created_at: purchased_at,
                });
                state.purchases.insert(purchase_id, purchase);
            }
            state.refresh_last_buy_date(owner);
        }
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }
}

#[async_trait]
impl PurchaseLedgerRepository for InMemoryStore {
    async fn record(
        &self,
        purchase: &NewPurchase,
    ) -> Result<RecordedPurchase, PurchaseLedgerError> {
        let mut state = self.lock().map_err(PurchaseLedgerError::query)?;
        let owner = purchase.user_id;
        if !state.users.contains_key(&owner.as_i64()) {
            return Err(PurchaseLedgerError::unknown_owner(owner.as_i64()));
        }

        let raw_id = state.allocate_purchase_id();
        let id = PurchaseId::new(raw_id)
            .map_err(|err| PurchaseLedgerError::query(format!("invalid purchase id: {err}")))?;
        let stored = Purchase::new(PurchaseDraft {
            id,
            user_id: owner,
            purchased_at: purchase.purchased_at,
            kg: purchase.kg,
            price: purchase.price,
            proof_ref: purchase.proof_ref.clone(),
            created_at: Utc::now(),
        });
        state.purchases.insert(raw_id, stored.clone());

        let last_buy_date = state.refresh_last_buy_date(owner).ok_or_else(|| {
            PurchaseLedgerError::query("last buy date missing after recording a purchase")
        })?;
        Ok(RecordedPurchase {
            purchase: stored,
            last_buy_date,
        })
    }

    async fn list(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<PurchasePage, PurchaseLedgerError> {
        let state = self.lock().map_err(PurchaseLedgerError::query)?;
        let mut owned: Vec<Purchase> = state.owned_by(*user_id).cloned().collect();
        owned.sort_by(|a, b| {
            b.purchased_at()
                .cmp(&a.purchased_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        let total = owned.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(PurchasePage {
            purchases: owned.into_iter().skip(offset).take(limit).collect(),
            total,
        })
    }

    async fn find(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<Option<Purchase>, PurchaseLedgerError> {
        let state = self.lock().map_err(PurchaseLedgerError::query)?;
        Ok(state
            .purchases
            .get(&purchase_id.as_i64())
            .filter(|purchase| purchase.user_id() == *user_id)
            .cloned())
    }

    async fn remove(
        &self,
        user_id: &UserId,
        purchase_id: &PurchaseId,
    ) -> Result<bool, PurchaseLedgerError> {
        let mut state = self.lock().map_err(PurchaseLedgerError::query)?;
        let owned = state
            .purchases
            .get(&purchase_id.as_i64())
            .is_some_and(|purchase| purchase.user_id() == *user_id);
        if !owned {
            return Ok(false);
        }
        state.purchases.remove(&purchase_id.as_i64());
        state.refresh_last_buy_date(*user_id);
        Ok(true)
    }

    async fn stats(&self, user_id: &UserId) -> Result<PurchaseStats, PurchaseLedgerError> {
        let state = self.lock().map_err(PurchaseLedgerError::query)?;
        let mut stats = PurchaseStats::empty();
        for purchase in state.owned_by(*user_id) {
            let at = purchase.purchased_at();
            stats.total_purchases += 1;
            stats.total_kg += purchase.kg().value();
            stats.total_spent += purchase.price().value();
            stats.first_purchase = Some(stats.first_purchase.map_or(at, |first| first.min(at)));
            stats.last_purchase = Some(stats.last_purchase.map_or(at, |last| last.max(at)));
        }
        if stats.total_purchases > 0 {
            #[expect(
                clippy::cast_precision_loss,
                reason = "purchase counts stay far below 2^52"
            )]
            let count = stats.total_purchases as f64;
            stats.avg_price = Some(stats.total_spent / count);
        }
        Ok(stats)
    }
}

#[async_trait]
impl UserDirectoryRepository for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserDirectoryError> {
        let state = self.lock().map_err(UserDirectoryError::query)?;
        Ok(state.users.get(&id.as_i64()).map(|stored| stored.user.clone()))
    }

    async fn queue_snapshot(&self) -> Result<Vec<QueueCandidate>, UserDirectoryError> {
        let state = self.lock().map_err(UserDirectoryError::query)?;
        Ok(state
            .users
            .values()
            .map(|stored| QueueCandidate {
                user: stored.user.clone(),
                total_purchases: state.owned_by(stored.user.id()).count() as u64,
            })
            .collect())
    }

    async fn create(&self, user: &NewUser) -> Result<User, UserDirectoryError> {
        let mut state = self.lock().map_err(UserDirectoryError::query)?;
        if state
            .users
            .values()
            .any(|stored| stored.user.email() == &user.email)
        {
            return Err(UserDirectoryError::duplicate_email(user.email.as_ref()));
        }

        let raw_id = state.allocate_user_id();
        let created = User::new(UserDraft {
            id: UserId::new(raw_id)
                .map_err(|err| UserDirectoryError::query(format!("invalid user id: {err}")))?,
            email: user.email.clone(),
            name: user.name.clone(),
            last_buy_date: None,
            created_at: Utc::now(),
        });
        state.users.insert(
            raw_id,
            StoredUser {
                user: created.clone(),
                digest: user.password_digest.clone(),
            },
        );
        Ok(created)
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserDirectoryError> {
        let state = self.lock().map_err(UserDirectoryError::query)?;
        Ok(state
            .users
            .values()
            .find(|stored| stored.user.email().as_ref() == email)
            .map(|stored| StoredCredentials {
                user_id: stored.user.id(),
                digest: stored.digest.clone(),
            }))
    }
}
