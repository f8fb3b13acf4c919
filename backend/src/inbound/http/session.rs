//! Cookie session plumbing for the purchase API.
//!
//! [`SessionContext`] starts a session after registration or login.
//! [`AuthenticatedUser`] is the extractor protected handlers take instead of
//! reading the session themselves; it rejects anonymous callers with `401`
//! before the handler body runs.
//!
//! The user id is stored as a plain integer inside the private session
//! cookie. Anything else found under the key counts as no session.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Write access to the caller's session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap an Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind the session to `user_id`, issuing a fresh session cookie.
    pub fn begin(&self, user_id: UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.as_i64())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The signed-in user, if the cookie carries a valid id.
    pub fn user_id(&self) -> Option<UserId> {
        let raw = match self.0.get::<i64>(USER_ID_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(%error, "unreadable user id in session cookie");
                return None;
            }
        };
        UserId::new(raw)
            .inspect_err(|error| warn!(%error, "invalid user id in session cookie"))
            .ok()
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

/// The user bound to the current session.
///
/// Extraction fails with `401 Unauthorized` when no valid session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(UserId);

impl AuthenticatedUser {
    /// The authenticated user's id.
    pub fn id(&self) -> UserId {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = SessionContext::from_request(req, payload);
        Box::pin(async move {
            let session = fut.await.map_err(Error::from)?;
            session
                .user_id()
                .map(AuthenticatedUser)
                .ok_or_else(|| Error::unauthorized("login required"))
        })
    }
}
