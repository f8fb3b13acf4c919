//! Purchase ledger API handlers.
//!
//! ```text
//! POST /api/v1/purchases {"date":"2024-03-01T12:00:00Z","kg":2.5,"price":18.9}
//! GET /api/v1/purchases?limit=20&offset=40
//! GET /api/v1/purchases/{id}
//! DELETE /api/v1/purchases/{id}
//! ```
//!
//! Every route is scoped to the session user. A purchase owned by someone
//! else is reported exactly like a missing one.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{DeletePurchaseRequest, RecordPurchaseRequest, RecordPurchaseResponse};
use crate::domain::{Error, Kilograms, PageRequest, Price, ProofRef, Purchase, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_page_request_error, map_purchase_validation_error,
    parse_optional_rfc3339_timestamp, parse_purchase_id,
};

/// Request body for `POST /api/v1/purchases`.
///
/// `kg` and `price` are optional at the schema level so that a missing value
/// is reported with the same error shape as a non-positive one.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequestBody {
    /// RFC 3339 purchase time; defaults to now.
    #[schema(example = "2024-03-01T12:00:00Z")]
    pub date: Option<String>,
    #[schema(example = 2.5)]
    pub kg: Option<f64>,
    #[schema(example = 18.9)]
    pub price: Option<f64>,
    /// Opaque reference to a stored proof of purchase.
    #[schema(example = "proofs/2024/03/receipt-17.jpg")]
    pub proof_ref: Option<String>,
}

/// Wire representation of a purchase.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBody {
    #[schema(example = 17)]
    pub id: i64,
    #[schema(example = 1)]
    pub user_id: i64,
    #[schema(example = "2024-03-01T12:00:00+00:00")]
    pub date: String,
    pub kg: f64,
    pub price: f64,
    pub proof_ref: Option<String>,
    pub created_at: String,
}

impl From<Purchase> for PurchaseBody {
    fn from(value: Purchase) -> Self {
        Self {
            id: value.id().as_i64(),
            user_id: value.user_id().as_i64(),
            date: value.purchased_at().to_rfc3339(),
            kg: value.kg().value(),
            price: value.price().value(),
            proof_ref: value.proof_ref().map(|proof| proof.as_ref().to_owned()),
            created_at: value.created_at().to_rfc3339(),
        }
    }
}

/// Response body for `POST /api/v1/purchases`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseResponseBody {
    pub purchase: PurchaseBody,
    /// The caller's last-buy date once the purchase was committed.
    pub last_buy_date: String,
}

impl From<RecordPurchaseResponse> for CreatePurchaseResponseBody {
    fn from(value: RecordPurchaseResponse) -> Self {
        Self {
            purchase: PurchaseBody::from(value.purchase),
            last_buy_date: value.last_buy_date.to_rfc3339(),
        }
    }
}

/// Response body for `GET /api/v1/purchases/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponseBody {
    pub purchase: PurchaseBody,
}

/// Paging parameters for `GET /api/v1/purchases`.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurchaseListQuery {
    /// Page size, 1 to 100; defaults to 50.
    pub limit: Option<i64>,
    /// Rows to skip; defaults to 0.
    pub offset: Option<i64>,
}

/// Response body for `GET /api/v1/purchases`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseListResponseBody {
    pub purchases: Vec<PurchaseBody>,
    /// Count of all the caller's purchases, not just this page.
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

fn parse_create_purchase_payload(
    payload: CreatePurchaseRequestBody,
    user_id: UserId,
) -> Result<RecordPurchaseRequest, Error> {
    let purchased_at = parse_optional_rfc3339_timestamp(payload.date, FieldName::new("date"))?;
    let kg = Kilograms::new(payload.kg).map_err(|err| map_purchase_validation_error(&err))?;
    let price = Price::new(payload.price).map_err(|err| map_purchase_validation_error(&err))?;
    let proof_ref = payload
        .proof_ref
        .map(ProofRef::new)
        .transpose()
        .map_err(|err| map_purchase_validation_error(&err))?;
    Ok(RecordPurchaseRequest {
        user_id,
        purchased_at,
        kg,
        price,
        proof_ref,
    })
}

/// Record a purchase for the authenticated user.
///
/// The purchase and the caller's refreshed last-buy date are committed
/// together; the response carries both.
///
/// # Examples
/// ```no_run
/// use actix_web::web;
/// use purchase_queue::inbound::http::purchases::{
///     CreatePurchaseRequestBody, create_purchase,
/// };
/// use purchase_queue::inbound::http::session::AuthenticatedUser;
/// use purchase_queue::inbound::http::{ApiResult, state::HttpState};
///
/// async fn call_handler(
///     state: web::Data<HttpState>,
///     user: AuthenticatedUser,
/// ) -> ApiResult<actix_web::HttpResponse> {
///     let payload = web::Json(CreatePurchaseRequestBody {
///         date: Some("2024-03-01T12:00:00Z".to_owned()),
///         kg: Some(2.5),
///         price: Some(18.9),
///         proof_ref: None,
///     });
///     create_purchase(state, user, payload).await
/// }
/// ```
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = CreatePurchaseRequestBody,
    responses(
        (status = 201, description = "Purchase recorded", body = CreatePurchaseResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["purchases"],
    operation_id = "createPurchase",
    security(("SessionCookie" = []))
)]
#[post("/purchases")]
pub async fn create_purchase(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreatePurchaseRequestBody>,
) -> ApiResult<HttpResponse> {
    let user_id = user.id();
    let request = parse_create_purchase_payload(payload.into_inner(), user_id)?;
    let response = state.purchases.record_purchase(request).await?;
    Ok(HttpResponse::Created().json(CreatePurchaseResponseBody::from(response)))
}

/// Page through the authenticated user's purchases, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    params(PurchaseListQuery),
    responses(
        (status = 200, description = "Purchases", body = PurchaseListResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["purchases"],
    operation_id = "listPurchases",
    security(("SessionCookie" = []))
)]
#[get("/purchases")]
pub async fn list_purchases(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<PurchaseListQuery>,
) -> ApiResult<web::Json<PurchaseListResponseBody>> {
    let user_id = user.id();
    let PurchaseListQuery { limit, offset } = query.into_inner();
    let page = PageRequest::new(limit, offset).map_err(|err| map_page_request_error(&err))?;
    let result = state.purchases_query.list_purchases(&user_id, page).await?;
    Ok(web::Json(PurchaseListResponseBody {
        purchases: result.purchases.into_iter().map(PurchaseBody::from).collect(),
        total: result.total,
        limit: page.limit(),
        offset: page.offset(),
    }))
}

/// Fetch one of the authenticated user's purchases.
#[utoipa::path(
    get,
    path = "/api/v1/purchases/{id}",
    params(("id" = i64, Path, description = "Purchase identifier")),
    responses(
        (status = 200, description = "Purchase", body = PurchaseResponseBody),
        (status = 400, description = "Invalid purchase id", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["purchases"],
    operation_id = "getPurchase",
    security(("SessionCookie" = []))
)]
#[get("/purchases/{id}")]
pub async fn get_purchase(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<PurchaseResponseBody>> {
    let user_id = user.id();
    let purchase_id = parse_purchase_id(&path.into_inner())?;
    let purchase = state
        .purchases_query
        .get_purchase(&user_id, &purchase_id)
        .await?;
    Ok(web::Json(PurchaseResponseBody {
        purchase: PurchaseBody::from(purchase),
    }))
}

/// Delete one of the authenticated user's purchases.
///
/// The caller's last-buy date is recomputed from the remaining purchases in
/// the same transaction.
#[utoipa::path(
    delete,
    path = "/api/v1/purchases/{id}",
    params(("id" = i64, Path, description = "Purchase identifier")),
    responses(
        (status = 204, description = "Purchase deleted"),
        (status = 400, description = "Invalid purchase id", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["purchases"],
    operation_id = "deletePurchase",
    security(("SessionCookie" = []))
)]
#[delete("/purchases/{id}")]
pub async fn delete_purchase(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = user.id();
    let purchase_id = parse_purchase_id(&path.into_inner())?;
    state
        .purchases
        .delete_purchase(DeletePurchaseRequest {
            user_id,
            purchase_id,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "purchases_tests.rs"]
mod tests;
