//! Service entry-point: loads settings, prepares persistence and serves the
//! purchase queue API.

mod server;

use std::path::{Path, PathBuf};

use actix_web::cookie::Key;
use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroize;

use purchase_queue::inbound::http::health::HealthState;
use purchase_queue::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use purchase_queue::settings::AppSettings;
use server::{ServerConfig, SessionSettings, create_server};

/// Shortest key file accepted for cookie signing and encryption.
const SESSION_KEY_MIN_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
enum SessionKeyError {
    #[error("session key at {path} is {length} bytes; need at least {min_len}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<SessionKeyError> for std::io::Error {
    fn from(value: SessionKeyError) -> Self {
        std::io::Error::other(value)
    }
}

fn load_session_key(path: &Path, allow_ephemeral: bool) -> Result<Key, SessionKeyError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionKeyError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(e) => {
            if cfg!(debug_assertions) || allow_ephemeral {
                warn!(path = %path.display(), error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(SessionKeyError::KeyRead {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }
}

async fn build_db_pool(settings: &AppSettings) -> std::io::Result<Option<DbPool>> {
    let Some(database_url) = settings.database_url.as_deref() else {
        return Ok(None);
    };

    if settings.run_migrations {
        run_pending_migrations(database_url)
            .await
            .map_err(std::io::Error::other)?;
    }

    let mut pool_config = PoolConfig::new(database_url);
    if let Some(max_size) = settings.pool_max_size().map_err(std::io::Error::other)? {
        pool_config = pool_config.with_max_size(max_size);
    }
    let pool = DbPool::new(pool_config)
        .await
        .map_err(std::io::Error::other)?;
    info!("database pool ready");
    Ok(Some(pool))
}

#[cfg(feature = "metrics")]
fn make_metrics() -> Option<PrometheusMetrics> {
    match PrometheusMetricsBuilder::new("purchase_queue")
        .endpoint("/metrics")
        .build()
    {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!(error = %e, "metrics disabled: failed to configure Prometheus");
            None
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let key = load_session_key(
        &settings.session_key_file(),
        settings.allow_ephemeral_session_key,
    )?;
    let same_site = settings.cookie_same_site().map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;

    let session = SessionSettings::new(key, settings.cookie_secure, same_site);
    let mut config = ServerConfig::new(session, bind_addr);
    if let Some(pool) = build_db_pool(&settings).await? {
        config = config.with_db_pool(pool);
    }

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(make_metrics());

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting purchase queue server");
    create_server(health_state, config)?.await
}
