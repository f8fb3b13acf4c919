//! Resolved server configuration: bind address, session cookie policy and the
//! optional adapters (database pool, Prometheus) handed to every worker.

use std::net::SocketAddr;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite, time::Duration};
use purchase_queue::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

const SESSION_COOKIE: &str = "session";
const SESSION_TTL: Duration = Duration::hours(2);

/// Cookie policy for the encrypted, cookie-only session store.
#[derive(Clone)]
pub struct SessionSettings {
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

impl SessionSettings {
    /// Session policy signed and encrypted with `key`.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
        }
    }

    /// Build the session middleware for one worker.
    ///
    /// The cookie is `HttpOnly`, scoped to `/`, encrypted rather than merely
    /// signed, and expires two hours after the last write.
    pub(crate) fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE.to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(self.cookie_secure)
            .cookie_http_only(true)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(self.same_site)
            .session_lifecycle(PersistentSession::default().session_ttl(SESSION_TTL))
            .build()
    }
}

/// Everything [`super::create_server`] needs to start listening.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Configuration with no database pool and metrics disabled.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            db_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Serve the ports from PostgreSQL instead of the in-memory fixtures.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware; `None` leaves metrics off.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
