//! Shared helpers for the PostgreSQL-backed integration suites.
//!
//! Each file under `backend/tests/` compiles as its own crate, so suites pull
//! this module in with `mod support;` and use whichever helpers they need.
#![allow(dead_code, reason = "not every suite uses every helper")]

pub mod embedded_postgres;

pub use embedded_postgres::{
    TestDatabaseError, execute_sql, provision_template_database, shared_cluster,
};

/// Render a `postgres` error with its SQLSTATE, detail and hint.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`, which
/// is useless in CI logs.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}

/// Whether `SKIP_TEST_CLUSTER` is set to `1`, `true` or `yes`.
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip or fail a suite whose embedded cluster could not be prepared.
///
/// Returns `None` with a `SKIP-TEST-CLUSTER` marker when skipping is allowed;
/// otherwise panics so a broken CI cluster is never silently ignored.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
