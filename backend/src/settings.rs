//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `PURCHASE_QUEUE_*` environment variables and
//! configuration files, in OrthoConfig's usual precedence. Accessors apply
//! defaults and validate the raw strings so `main` only sees typed values.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::SameSite;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("bind address `{value}` is not a socket address")]
    InvalidBindAddr { value: String },
    #[error("same-site policy `{value}` must be one of lax, strict or none")]
    InvalidSameSite { value: String },
    #[error("SameSite=None cookies must also be Secure")]
    InsecureSameSiteNone,
    #[error("database pool size must be at least 1")]
    EmptyPool,
}

/// Process-wide settings for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PURCHASE_QUEUE")]
pub struct AppSettings {
    /// Socket address to listen on; defaults to `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL. Without it the server runs on fixtures.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Apply embedded migrations before serving.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
    /// File holding the session signing/encryption key material.
    pub session_key_file: Option<PathBuf>,
    /// Fall back to a random session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_session_key: bool,
    /// Set the `Secure` attribute on the session cookie.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    /// `SameSite` policy for the session cookie: lax, strict or none.
    pub cookie_same_site: Option<String>,
}

impl AppSettings {
    /// Resolved listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    /// Resolved session key path.
    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Resolved pool size, when one was configured.
    pub fn pool_max_size(&self) -> Result<Option<u32>, SettingsError> {
        match self.pool_max_size {
            Some(0) => Err(SettingsError::EmptyPool),
            other => Ok(other),
        }
    }

    /// Resolved `SameSite` policy; defaults to `Lax`.
    ///
    /// Browsers drop `SameSite=None` cookies that are not `Secure`, so that
    /// combination is rejected here rather than failing silently at runtime.
    pub fn cookie_same_site(&self) -> Result<SameSite, SettingsError> {
        let Some(raw) = self.cookie_same_site.as_deref() else {
            return Ok(SameSite::Lax);
        };
        let same_site = match raw.trim().to_ascii_lowercase().as_str() {
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => {
                return Err(SettingsError::InvalidSameSite {
                    value: raw.to_owned(),
                });
            }
        };
        if same_site == SameSite::None && !self.cookie_secure {
            return Err(SettingsError::InsecureSameSiteNone);
        }
        Ok(same_site)
    }
}
