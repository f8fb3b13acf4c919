//! Driving port for the ranked purchase queue.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::domain::{
    DisplayName, EmailAddress, Error, QueueCandidate, QueueEntry, User, UserDraft, UserId,
    rank_queue,
};

/// Driving port for reading the purchase queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueQuery: Send + Sync {
    /// Rank every user; `current_user` only sets the `is_current_user` flag.
    async fn purchase_queue(
        &self,
        current_user: Option<UserId>,
    ) -> Result<Vec<QueueEntry>, Error>;
}

/// Fixture queue built from three sample users: one who never bought, one
/// overdue and one recent.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureQueueQuery;

impl FixtureQueueQuery {
    fn candidates() -> Result<Vec<QueueCandidate>, Error> {
        const SAMPLES: [(i64, &str, &str, Option<i64>, u64); 3] = [
            (1, "ada@example.com", "Ada Lovelace", None, 0),
            (2, "grace@example.com", "Grace Hopper", Some(40), 3),
            (3, "alan@example.com", "Alan Turing", Some(10), 7),
        ];
        let now = Utc::now();
        SAMPLES
            .into_iter()
            .map(|(id, email, name, days_ago, total_purchases)| -> Result<_, Error> {
                let user = User::new(UserDraft {
                    id: UserId::new(id)
                        .map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))?,
                    email: EmailAddress::new(email)
                        .map_err(|err| Error::internal(format!("invalid fixture email: {err}")))?,
                    name: DisplayName::new(name)
                        .map_err(|err| Error::internal(format!("invalid fixture name: {err}")))?,
                    last_buy_date: days_ago.map(|days| now - Duration::days(days)),
                    created_at: now,
                });
                Ok(QueueCandidate {
                    user,
                    total_purchases,
                })
            })
            .collect()
    }
}

#[async_trait]
impl QueueQuery for FixtureQueueQuery {
    async fn purchase_queue(
        &self,
        current_user: Option<UserId>,
    ) -> Result<Vec<QueueEntry>, Error> {
        Ok(rank_queue(Self::candidates()?, Utc::now(), current_user))
    }
}
