//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed ledger and directory repositories
//!   using Diesel ORM, plus embedded schema migrations.
//! - **memory**: both repositories held in process memory for running
//!   without a database.
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
