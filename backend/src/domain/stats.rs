//! Per-user purchase aggregates.

use chrono::{DateTime, Utc};

/// Aggregate figures over one user's purchases.
///
/// Sums are zero and the average and date bounds are absent when the user has
/// no purchases.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PurchaseStats {
    pub total_purchases: u64,
    pub total_kg: f64,
    pub total_spent: f64,
    pub avg_price: Option<f64>,
    pub first_purchase: Option<DateTime<Utc>>,
    pub last_purchase: Option<DateTime<Utc>>,
}

impl PurchaseStats {
    /// Statistics for a user with no purchases.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Mean weight per purchase, when any purchase exists.
    ///
    /// # Examples
    /// ```
    /// use purchase_queue::domain::PurchaseStats;
    ///
    /// let stats = PurchaseStats { total_purchases: 4, total_kg: 10.0, ..PurchaseStats::empty() };
    /// assert_eq!(stats.avg_kg(), Some(2.5));
    /// assert_eq!(PurchaseStats::empty().avg_kg(), None);
    /// ```
    #[must_use]
    pub fn avg_kg(&self) -> Option<f64> {
        if self.total_purchases == 0 {
            return None;
        }
        #[expect(
            clippy::cast_precision_loss,
            reason = "purchase counts stay far below 2^52"
        )]
        let count = self.total_purchases as f64;
        Some(self.total_kg / count)
    }
}
