//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) are implemented by outbound adapters; driving
//! ports are implemented by domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod login_service;
mod purchase_command;
mod purchase_ledger_repository;
mod purchase_query;
mod queue_query;
mod user_accounts;
mod user_directory_repository;

pub use login_service::{FixtureLoginService, LoginService};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use purchase_command::{
    DeletePurchaseRequest, FixturePurchaseCommand, PurchaseCommand, RecordPurchaseRequest,
    RecordPurchaseResponse,
};
#[cfg(test)]
pub use purchase_command::MockPurchaseCommand;
pub use purchase_ledger_repository::{
    PurchaseLedgerError, PurchaseLedgerRepository, RecordedPurchase,
};
#[cfg(test)]
pub use purchase_ledger_repository::MockPurchaseLedgerRepository;
pub use purchase_query::{FixturePurchaseQuery, PurchaseQuery};
#[cfg(test)]
pub use purchase_query::MockPurchaseQuery;
pub use queue_query::{FixtureQueueQuery, QueueQuery};
#[cfg(test)]
pub use queue_query::MockQueueQuery;
pub use user_accounts::{FixtureUserAccounts, UserAccounts};
#[cfg(test)]
pub use user_accounts::MockUserAccounts;
pub use user_directory_repository::{UserDirectoryError, UserDirectoryRepository};
#[cfg(test)]
pub use user_directory_repository::MockUserDirectoryRepository;
