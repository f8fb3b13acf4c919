//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test as actix_test;
use serde_json::json;

/// Cookie name shared by the production app and the test middleware.
pub const SESSION_COOKIE: &str = "session";

/// Cookie-backed session middleware with a throwaway key and no `Secure` flag.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .build()
}

/// The session cookie set by `res`.
pub fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Log in through `POST /api/v1/login` and return the session cookie.
pub async fn login_as(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    email: &str,
    password: &str,
) -> Cookie<'static> {
    let login_req = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let login_res = actix_test::call_service(app, login_req).await;
    assert!(
        login_res.status().is_success(),
        "login as {email} failed: {}",
        login_res.status()
    );
    session_cookie(&login_res)
}

/// Log in as the fixture account (`ada@example.com` / `password`).
pub async fn login_and_get_cookie(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
) -> Cookie<'static> {
    login_as(app, "ada@example.com", "password").await
}
