//! Builders for HTTP state ports.
//!
//! The domain services are always the real ones; only the repositories behind
//! them change. A configured pool selects the Diesel adapters, otherwise one
//! in-memory store serves as both directory and ledger.

use std::io;
use std::sync::Arc;

use actix_web::web;
use chrono::Utc;
use mockable::{Clock, DefaultClock};
use tracing::warn;

use purchase_queue::domain::ports::{PurchaseLedgerRepository, UserDirectoryRepository};
use purchase_queue::domain::{
    AccountService, PurchaseCommandService, PurchaseQueryService, QueueService,
};
use purchase_queue::inbound::http::state::{HttpState, HttpStatePorts};
use purchase_queue::outbound::memory::InMemoryStore;
use purchase_queue::outbound::persistence::{
    DieselPurchaseLedgerRepository, DieselUserDirectoryRepository,
};

use super::ServerConfig;

/// Wire every driving port over one directory and one ledger.
fn build_ports<D, L>(directory: Arc<D>, ledger: Arc<L>, clock: Arc<dyn Clock>) -> HttpStatePorts
where
    D: UserDirectoryRepository + 'static,
    L: PurchaseLedgerRepository + 'static,
{
    let accounts = Arc::new(AccountService::new(directory.clone()));
    HttpStatePorts {
        login: accounts.clone(),
        accounts,
        purchases: Arc::new(PurchaseCommandService::new(ledger.clone(), clock.clone())),
        purchases_query: Arc::new(PurchaseQueryService::new(ledger)),
        queue: Arc::new(QueueService::new(directory, clock)),
    }
}

fn build_in_memory_ports(clock: Arc<dyn Clock>) -> io::Result<HttpStatePorts> {
    let store = Arc::new(InMemoryStore::with_sample_users(Utc::now()).map_err(io::Error::other)?);
    Ok(build_ports(store.clone(), store, clock))
}

/// Build the shared HTTP state, falling back to in-memory storage without a
/// pool.
pub(super) fn build_http_state(config: &ServerConfig) -> io::Result<web::Data<HttpState>> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ports = match &config.db_pool {
        Some(pool) => build_ports(
            Arc::new(DieselUserDirectoryRepository::new(pool.clone())),
            Arc::new(DieselPurchaseLedgerRepository::new(pool.clone())),
            clock,
        ),
        None => {
            warn!("no database pool configured; data is kept in memory and lost on exit");
            build_in_memory_ports(clock)?
        }
    };
    Ok(web::Data::new(HttpState::new(ports)))
}
