//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FixtureLoginService, FixturePurchaseCommand, FixturePurchaseQuery, FixtureQueueQuery,
    FixtureUserAccounts, LoginService, PurchaseCommand, PurchaseQuery, QueueQuery, UserAccounts,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn UserAccounts>,
    pub purchases: Arc<dyn PurchaseCommand>,
    pub purchases_query: Arc<dyn PurchaseQuery>,
    pub queue: Arc<dyn QueueQuery>,
}

impl HttpStatePorts {
    /// Canned ports for handler tests. Nothing is persisted: recorded
    /// purchases are echoed back and never reach the queue.
    pub fn fixtures() -> Self {
        Self {
            login: Arc::new(FixtureLoginService),
            accounts: Arc::new(FixtureUserAccounts),
            purchases: Arc::new(FixturePurchaseCommand),
            purchases_query: Arc::new(FixturePurchaseQuery),
            queue: Arc::new(FixtureQueueQuery),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn UserAccounts>,
    pub purchases: Arc<dyn PurchaseCommand>,
    pub purchases_query: Arc<dyn PurchaseQuery>,
    pub queue: Arc<dyn QueueQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use purchase_queue::domain::ports::FixtureQueueQuery;
    /// use purchase_queue::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let ports = HttpStatePorts {
    ///     queue: Arc::new(FixtureQueueQuery),
    ///     ..HttpStatePorts::fixtures()
    /// };
    /// let state = HttpState::new(ports);
    /// let _queue = state.queue.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            accounts,
            purchases,
            purchases_query,
            queue,
        } = ports;
        Self {
            login,
            accounts,
            purchases,
            purchases_query,
            queue,
        }
    }
}
