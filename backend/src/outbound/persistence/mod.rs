//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the driven ports backed by PostgreSQL via
//! `diesel-async` over a `bb8` pool.
//!
//! - Repository implementations only translate between row structs and
//!   domain types; ranking and validation live in the domain.
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//!   private to this module.
//! - Database failures surface as the port's `Connection`/`Query` errors with
//!   fixed messages; details are logged at debug level.
//!
//! # Example
//!
//! ```no_run
//! use purchase_queue::outbound::persistence::{
//!     DbPool, DieselPurchaseLedgerRepository, PoolConfig,
//! };
//!
//! # async fn wire() -> Result<(), purchase_queue::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/purchases")).await?;
//! let ledger = DieselPurchaseLedgerRepository::new(pool);
//! # let _ = ledger;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_purchase_ledger_repository;
mod diesel_user_directory_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_purchase_ledger_repository::DieselPurchaseLedgerRepository;
pub use diesel_user_directory_repository::DieselUserDirectoryRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
