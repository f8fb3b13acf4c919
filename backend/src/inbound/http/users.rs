//! Users API handlers: registration, login, profile, the purchase queue and
//! per-user statistics.
//!
//! ```text
//! POST /api/v1/users {"email":"ada@example.com","name":"Ada","password":"correct horse"}
//! POST /api/v1/login {"email":"ada@example.com","password":"correct horse"}
//! GET /api/v1/users/me
//! GET /api/v1/users/queue
//! GET /api/v1/users/stats
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Error, LoginCredentials, LoginValidationError, PurchaseStats, QueueEntry, Registration,
    RegistrationValidationError, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::{AuthenticatedUser, SessionContext};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::map_registration_validation_error;

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// Registration request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = RegistrationValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.name, &value.password)
    }
}

/// Login request body for `POST /api/v1/login`.
///
/// Example JSON:
/// `{"email":"ada@example.com","password":"password"}`
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

/// Public view of a user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Date of the most recent purchase, absent if the user never bought.
    #[schema(example = "2024-03-01T12:00:00+00:00")]
    pub last_buy_date: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id().as_i64(),
            email: value.email().as_ref().to_owned(),
            name: value.name().as_ref().to_owned(),
            last_buy_date: value.last_buy_date().map(to_rfc3339),
            created_at: to_rfc3339(value.created_at()),
        }
    }
}

/// One row of the purchase queue.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryBody {
    /// 1-indexed rank; first in line buys next.
    pub position: usize,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub last_buy_date: Option<String>,
    pub created_at: String,
    /// Whole days since the last purchase; `null` when the user never bought.
    pub days_since_last_buy: Option<u64>,
    pub never_bought: bool,
    /// One of `never_bought`, `urgent`, `warning` or `recent`.
    #[schema(example = "urgent")]
    pub urgency: String,
    pub total_purchases: u64,
    pub is_current_user: bool,
}

impl From<QueueEntry> for QueueEntryBody {
    fn from(value: QueueEntry) -> Self {
        let days = value.days_since_last_buy.days();
        Self {
            position: value.position,
            user_id: value.user.id().as_i64(),
            email: value.user.email().as_ref().to_owned(),
            name: value.user.name().as_ref().to_owned(),
            last_buy_date: value.user.last_buy_date().map(to_rfc3339),
            created_at: to_rfc3339(value.user.created_at()),
            days_since_last_buy: days,
            never_bought: days.is_none(),
            urgency: value.urgency.as_str().to_owned(),
            total_purchases: value.total_purchases,
            is_current_user: value.is_current_user,
        }
    }
}

/// Response body for `GET /api/v1/users/queue`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    pub queue: Vec<QueueEntryBody>,
    pub total: usize,
}

/// Aggregate purchase figures for the caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsBody {
    pub total_purchases: u64,
    pub total_kg: f64,
    pub total_spent: f64,
    pub avg_price: Option<f64>,
    pub avg_kg: Option<f64>,
    pub first_purchase: Option<String>,
    pub last_purchase: Option<String>,
}

impl From<PurchaseStats> for StatsBody {
    fn from(value: PurchaseStats) -> Self {
        Self {
            total_purchases: value.total_purchases,
            total_kg: value.total_kg,
            total_spent: value.total_spent,
            avg_price: value.avg_price,
            avg_kg: value.avg_kg(),
            first_purchase: value.first_purchase.map(to_rfc3339),
            last_purchase: value.last_purchase.map(to_rfc3339),
        }
    }
}

/// Response body for `GET /api/v1/users/stats`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub stats: StatsBody,
}

/// Create an account and start a session for it.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "E-mail already registered", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())
        .map_err(|err| map_registration_validation_error(&err))?;
    let user = state.accounts.register(&registration).await?;
    session.begin(user.id())?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate user and establish a session.
///
/// Uses the centralised `Error` type so clients get a consistent
/// error schema across all endpoints.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.begin(user_id)?;
    Ok(HttpResponse::Ok().finish())
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => Error::invalid_request("email must not be empty")
            .with_details(json!({ "field": "email", "code": "empty_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Fetch the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser",
    security(("SessionCookie" = []))
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = user.id();
    let user = state.accounts.current_user(&user_id).await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Rank every user by how long it has been since they last bought.
///
/// Never-bought users come first, then the longest wait. The caller's own row
/// is flagged with `isCurrentUser`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use purchase_queue::inbound::http::users::user_queue;
///
/// let app = App::new().service(user_queue);
/// ```
#[utoipa::path(
    get,
    path = "/api/v1/users/queue",
    responses(
        (status = 200, description = "Ranked purchase queue", body = QueueResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "purchaseQueue",
    security(("SessionCookie" = []))
)]
#[get("/users/queue")]
pub async fn user_queue(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<QueueResponse>> {
    let user_id = user.id();
    let entries = state.queue.purchase_queue(Some(user_id)).await?;
    let queue: Vec<QueueEntryBody> = entries.into_iter().map(QueueEntryBody::from).collect();
    let total = queue.len();
    Ok(web::Json(QueueResponse { queue, total }))
}

/// Aggregate the caller's purchases.
#[utoipa::path(
    get,
    path = "/api/v1/users/stats",
    responses(
        (status = 200, description = "Purchase statistics", body = StatsResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "purchaseStats",
    security(("SessionCookie" = []))
)]
#[get("/users/stats")]
pub async fn purchase_stats(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<StatsResponse>> {
    let user_id = user.id();
    let stats = state.purchases_query.purchase_stats(&user_id).await?;
    Ok(web::Json(StatsResponse {
        stats: StatsBody::from(stats),
    }))
}
