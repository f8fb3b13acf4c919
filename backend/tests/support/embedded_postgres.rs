//! Embedded PostgreSQL provisioning for integration tests.
//!
//! One shared cluster serves every test in a binary. Each test gets its own
//! database cloned from a template that already carries the embedded
//! migrations, so suites never see each other's rows.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use purchase_queue::outbound::persistence::MIGRATIONS;
use thiserror::Error;
use uuid::Uuid;

use super::format_postgres_error;

const TEMPLATE_NAME_PREFIX: &str = "purchase_queue_template";
const PROVISION_RETRIES: usize = 5;
const PROVISION_RETRY_DELAY: Duration = Duration::from_millis(500);

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Failures while preparing a test database.
#[derive(Debug, Error)]
pub enum TestDatabaseError {
    #[error("test database connection failed: {0}")]
    Connection(String),
    #[error("test database setup failed: {0}")]
    Setup(String),
}

/// The process-wide embedded cluster.
///
/// `PG_PASSWORD` is pinned first: a reused data directory keeps the password
/// from its first `initdb`, and the library would otherwise pick a fresh
/// random one per process.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster bootstrap spawns any threads.
        unsafe {
            std::env::set_var("PG_PASSWORD", "purchase_queue_embedded_test");
        }
    }
    pg_embedded_setup_unpriv::test_support::shared_cluster_handle()
        .map_err(|err| format!("{err:?}"))
}

fn template_database_name() -> Result<String, TestDatabaseError> {
    let migrations_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations_dir)
        .map_err(|err| TestDatabaseError::Setup(format!("hash migrations: {err}")))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Create the migrated template once per cluster and return its name.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, TestDatabaseError> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| TestDatabaseError::Setup(format!("template check: {err:?}")))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| TestDatabaseError::Setup(format!("create template: {err:?}")))?;
        migrate_schema(&cluster.connection().database_url(&template_name))?;
    }
    Ok(template_name)
}

/// Clone a fresh, migrated database for one test.
///
/// Template creation races with other test binaries on a shared cluster, so
/// the whole pass is retried a few times before giving up.
pub fn provision_template_database(
    cluster: &ClusterHandle,
) -> Result<TemporaryDatabase, TestDatabaseError> {
    let mut last_error = None;
    for attempt in 1..=PROVISION_RETRIES {
        let result = ensure_template_database(cluster).and_then(|template_name| {
            let db_name = format!("test_{}", Uuid::new_v4());
            cluster
                .temporary_database_from_template(db_name.as_str(), template_name.as_str())
                .map_err(|err| {
                    TestDatabaseError::Setup(format!(
                        "clone template: attempt {attempt}/{PROVISION_RETRIES}: {err:?}"
                    ))
                })
        });
        match result {
            Ok(database) => return Ok(database),
            Err(error) => last_error = Some(error),
        }
        if attempt < PROVISION_RETRIES {
            std::thread::sleep(PROVISION_RETRY_DELAY);
        }
    }
    Err(last_error
        .unwrap_or_else(|| TestDatabaseError::Setup("clone template: exhausted retries".into())))
}

/// Apply the embedded migrations to `url`.
pub fn migrate_schema(url: &str) -> Result<(), TestDatabaseError> {
    let mut conn = PgConnection::establish(url)
        .map_err(|err| TestDatabaseError::Connection(format!("{err:?}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| TestDatabaseError::Setup(format!("migration: {err:?}")))?;
    Ok(())
}

/// Run raw SQL outside Diesel, e.g. to sabotage the schema mid-test.
pub fn execute_sql(url: &str, sql: &str) -> Result<(), TestDatabaseError> {
    let mut client = Client::connect(url, NoTls)
        .map_err(|err| TestDatabaseError::Connection(format_postgres_error(&err)))?;
    client
        .batch_execute(sql)
        .map_err(|err| TestDatabaseError::Setup(format_postgres_error(&err)))
}
