//! Purchase queue ranking.
//!
//! The queue is derived on demand from a directory snapshot and is never
//! stored. Users who have never bought come first; everyone else is ordered by
//! how long ago they last bought, oldest first. Ranking is pure and cannot
//! fail; storage errors are surfaced by whoever loaded the snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{User, UserId};

/// Days after which a buyer is overdue.
pub const URGENT_AFTER_DAYS: u64 = 30;
/// Days after which a buyer should be warned.
pub const WARNING_AFTER_DAYS: u64 = 14;

/// Whole days since a user's newest purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysSinceLastBuy {
    /// The user has no purchases.
    Never,
    /// Whole days elapsed, truncated. Future-dated purchases count as zero.
    Days(u64),
}

impl DaysSinceLastBuy {
    /// Measure the gap between `last_buy_date` and `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use purchase_queue::domain::DaysSinceLastBuy;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    /// let last = now - Duration::hours(14 * 24 + 23);
    /// assert_eq!(DaysSinceLastBuy::between(Some(last), now), DaysSinceLastBuy::Days(14));
    /// assert_eq!(DaysSinceLastBuy::between(None, now), DaysSinceLastBuy::Never);
    /// ```
    #[must_use]
    pub fn between(last_buy_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match last_buy_date {
            None => Self::Never,
            Some(last) => {
                let elapsed = now.signed_duration_since(last).num_days();
                Self::Days(u64::try_from(elapsed).unwrap_or(0))
            }
        }
    }

    /// Day count, or `None` for users who never bought.
    #[must_use]
    pub const fn days(self) -> Option<u64> {
        match self {
            Self::Never => None,
            Self::Days(days) => Some(days),
        }
    }
}

/// Display urgency derived from [`DaysSinceLastBuy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyBand {
    NeverBought,
    Urgent,
    Warning,
    Recent,
}

impl UrgencyBand {
    /// Band for a measured gap.
    ///
    /// `> 30` days is urgent, `15..=30` is a warning and `<= 14` is recent.
    #[must_use]
    pub const fn classify(days: DaysSinceLastBuy) -> Self {
        match days {
            DaysSinceLastBuy::Never => Self::NeverBought,
            DaysSinceLastBuy::Days(days) if days > URGENT_AFTER_DAYS => Self::Urgent,
            DaysSinceLastBuy::Days(days) if days > WARNING_AFTER_DAYS => Self::Warning,
            DaysSinceLastBuy::Days(_) => Self::Recent,
        }
    }

    /// Stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NeverBought => "never_bought",
            Self::Urgent => "urgent",
            Self::Warning => "warning",
            Self::Recent => "recent",
        }
    }
}

/// One directory row considered for the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueCandidate {
    pub user: User,
    pub total_purchases: u64,
}

/// A ranked queue row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// 1-indexed rank.
    pub position: usize,
    pub user: User,
    pub days_since_last_buy: DaysSinceLastBuy,
    pub urgency: UrgencyBand,
    pub total_purchases: u64,
    pub is_current_user: bool,
}

/// Rank `candidates` into the purchase queue.
///
/// Never-bought users come first, then ascending `last_buy_date`. The sort is
/// stable so equal keys keep snapshot order.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use purchase_queue::domain::{
///     rank_queue, DisplayName, EmailAddress, QueueCandidate, UrgencyBand, User, UserDraft,
///     UserId,
/// };
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
/// let user = |id: i64, last: Option<i64>| QueueCandidate {
///     user: User::new(UserDraft {
///         id: UserId::new(id).unwrap(),
///         email: EmailAddress::new(format!("u{id}@example.com")).unwrap(),
///         name: DisplayName::new(format!("user {id}")).unwrap(),
///         last_buy_date: last.map(|days| now - Duration::days(days)),
///         created_at: now,
///     }),
///     total_purchases: 0,
/// };
///
/// let queue = rank_queue(vec![user(1, Some(10)), user(2, None)], now, None);
/// assert_eq!(queue[0].user.id().as_i64(), 2);
/// assert_eq!(queue[0].urgency, UrgencyBand::NeverBought);
/// assert_eq!(queue[1].position, 2);
/// ```
#[must_use]
pub fn rank_queue(
    mut candidates: Vec<QueueCandidate>,
    now: DateTime<Utc>,
    current_user: Option<UserId>,
) -> Vec<QueueEntry> {
    // `None` orders before any `Some`, which puts never-bought users first.
    candidates.sort_by_key(|candidate| candidate.user.last_buy_date());

    candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let days = DaysSinceLastBuy::between(candidate.user.last_buy_date(), now);
            let is_current_user = current_user == Some(candidate.user.id());
            QueueEntry {
                position: index + 1,
                days_since_last_buy: days,
                urgency: UrgencyBand::classify(days),
                total_purchases: candidate.total_purchases,
                is_current_user,
                user: candidate.user,
            }
        })
        .collect()
}
