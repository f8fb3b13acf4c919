//! Domain primitives, the queue ranking engine and the services behind the
//! driving ports.
//!
//! Purpose: define strongly typed entities used by the API and persistence
//! layers. Types validate on construction and stay immutable afterwards.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload and stable codes.
//! - User, Purchase and their newtypes: validated entities.
//! - rank_queue: pure purchase-queue ranking.
//! - *Service: implementations of the driving ports in [`ports`].

pub mod auth;
pub mod error;
pub mod ports;
pub mod purchase;
pub mod queue;
pub mod stats;
pub mod trace_id;
pub mod user;

mod account_service;
mod purchase_service;
mod queue_service;

pub use self::account_service::AccountService;
pub use self::auth::{
    LoginCredentials, LoginValidationError, PasswordDigest, Registration,
    RegistrationValidationError, StoredCredentials,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::purchase::{
    AmountField, Kilograms, NewPurchase, PageRequest, PageRequestError, Price, ProofRef,
    Purchase, PurchaseDraft, PurchaseId, PurchasePage, PurchaseValidationError,
};
pub use self::purchase_service::{PurchaseCommandService, PurchaseQueryService};
pub use self::queue::{DaysSinceLastBuy, QueueCandidate, QueueEntry, UrgencyBand, rank_queue};
pub use self::queue_service::QueueService;
pub use self::stats::PurchaseStats;
pub use self::trace_id::TraceId;
pub use self::user::{
    DisplayName, EmailAddress, NewUser, User, UserDraft, UserId, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use purchase_queue::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
