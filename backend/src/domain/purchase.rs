//! Purchase ledger entities and the request shapes used to page through them.
//!
//! Amounts are validated here so that no storage call ever sees a missing,
//! non-positive or non-finite weight or price.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Maximum accepted proof reference length.
pub const PROOF_REF_MAX: usize = 512;

/// Amount fields that share positive-finite validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    Kg,
    Price,
}

impl AmountField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Price => "price",
        }
    }
}

impl fmt::Display for AmountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors returned by purchase constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseValidationError {
    InvalidId,
    Missing { field: AmountField },
    NonPositive { field: AmountField },
    NonFinite { field: AmountField },
    EmptyProofRef,
    ProofRefTooLong { max: usize },
}

impl PurchaseValidationError {
    /// Wire field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::Missing { field } | Self::NonPositive { field } | Self::NonFinite { field } => {
                field.as_str()
            }
            Self::EmptyProofRef | Self::ProofRefTooLong { .. } => "proofRef",
        }
    }
}

impl fmt::Display for PurchaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "purchase id must be a positive integer"),
            Self::Missing { field } => write!(f, "{field} is required"),
            Self::NonPositive { field } => write!(f, "{field} must be greater than zero"),
            Self::NonFinite { field } => write!(f, "{field} must be a finite number"),
            Self::EmptyProofRef => write!(f, "proofRef must not be empty"),
            Self::ProofRefTooLong { max } => {
                write!(f, "proofRef must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for PurchaseValidationError {}

/// Stable purchase identifier assigned by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PurchaseId(i64);

impl PurchaseId {
    /// Validate and construct a [`PurchaseId`].
    pub fn new(raw: i64) -> Result<Self, PurchaseValidationError> {
        if raw <= 0 {
            return Err(PurchaseValidationError::InvalidId);
        }
        Ok(Self(raw))
    }

    /// Access the raw database identifier.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PurchaseId> for i64 {
    fn from(value: PurchaseId) -> Self {
        value.0
    }
}

impl TryFrom<i64> for PurchaseId {
    type Error = PurchaseValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn positive_finite(field: AmountField, raw: Option<f64>) -> Result<f64, PurchaseValidationError> {
    let value = raw.ok_or(PurchaseValidationError::Missing { field })?;
    if !value.is_finite() {
        return Err(PurchaseValidationError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(PurchaseValidationError::NonPositive { field });
    }
    Ok(value)
}

/// Purchased weight in kilograms; always positive and finite.
///
/// # Examples
/// ```
/// use purchase_queue::domain::Kilograms;
///
/// assert_eq!(Kilograms::new(Some(2.5)).unwrap().value(), 2.5);
/// assert!(Kilograms::new(Some(0.0)).is_err());
/// assert!(Kilograms::new(None).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Kilograms(f64);

impl Kilograms {
    /// Validate an optional raw weight.
    pub fn new(raw: Option<f64>) -> Result<Self, PurchaseValidationError> {
        positive_finite(AmountField::Kg, raw).map(Self)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Amount paid; always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    /// Validate an optional raw price.
    pub fn new(raw: Option<f64>) -> Result<Self, PurchaseValidationError> {
        positive_finite(AmountField::Price, raw).map(Self)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Opaque reference to a stored proof asset (for example an uploaded receipt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRef(String);

impl ProofRef {
    /// Validate a proof reference; surrounding whitespace is dropped.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PurchaseValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PurchaseValidationError::EmptyProofRef);
        }
        if trimmed.chars().count() > PROOF_REF_MAX {
            return Err(PurchaseValidationError::ProofRefTooLong { max: PROOF_REF_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ProofRef {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// A purchase the caller asked to record; ownership is fixed by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub user_id: UserId,
    pub purchased_at: DateTime<Utc>,
    pub kg: Kilograms,
    pub price: Price,
    pub proof_ref: Option<ProofRef>,
}

/// Input used to build a [`Purchase`] read back from the ledger.
#[derive(Debug, Clone)]
pub struct PurchaseDraft {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub purchased_at: DateTime<Utc>,
    pub kg: Kilograms,
    pub price: Price,
    pub proof_ref: Option<ProofRef>,
    pub created_at: DateTime<Utc>,
}

/// A recorded purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    id: PurchaseId,
    user_id: UserId,
    purchased_at: DateTime<Utc>,
    kg: Kilograms,
    price: Price,
    proof_ref: Option<ProofRef>,
    created_at: DateTime<Utc>,
}

impl Purchase {
    #[must_use]
    pub fn new(draft: PurchaseDraft) -> Self {
        let PurchaseDraft {
            id,
            user_id,
            purchased_at,
            kg,
            price,
            proof_ref,
            created_at,
        } = draft;
        Self {
            id,
            user_id,
            purchased_at,
            kg,
            price,
            proof_ref,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> PurchaseId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// When the purchase happened (client supplied or defaulted on record).
    #[must_use]
    pub fn purchased_at(&self) -> DateTime<Utc> {
        self.purchased_at
    }

    #[must_use]
    pub fn kg(&self) -> Kilograms {
        self.kg
    }

    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub fn proof_ref(&self) -> Option<&ProofRef> {
        self.proof_ref.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Default page size for purchase listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Errors raised while validating paging parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequestError {
    LimitOutOfRange { min: u32, max: u32 },
    NegativeOffset,
}

impl PageRequestError {
    /// Wire field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::LimitOutOfRange { .. } => "limit",
            Self::NegativeOffset => "offset",
        }
    }
}

impl fmt::Display for PageRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitOutOfRange { min, max } => {
                write!(f, "limit must be between {min} and {max}")
            }
            Self::NegativeOffset => write!(f, "offset must not be negative"),
        }
    }
}

impl std::error::Error for PageRequestError {}

/// Validated paging window over a user's purchases.
///
/// # Examples
/// ```
/// use purchase_queue::domain::PageRequest;
///
/// let page = PageRequest::new(None, None).unwrap();
/// assert_eq!((page.limit(), page.offset()), (50, 0));
/// assert!(PageRequest::new(Some(0), None).is_err());
/// assert!(PageRequest::new(None, Some(-1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Validate optional raw paging parameters, applying defaults.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, PageRequestError> {
        let limit = match limit {
            None => DEFAULT_PAGE_LIMIT,
            Some(raw) => u32::try_from(raw)
                .ok()
                .filter(|value| (1..=MAX_PAGE_LIMIT).contains(value))
                .ok_or(PageRequestError::LimitOutOfRange {
                    min: 1,
                    max: MAX_PAGE_LIMIT,
                })?,
        };
        let offset = match offset {
            None => 0,
            Some(raw) => u64::try_from(raw).map_err(|_| PageRequestError::NegativeOffset)?,
        };
        Ok(Self { limit, offset })
    }

    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }
}

/// One page of a user's purchases plus their overall count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PurchasePage {
    pub purchases: Vec<Purchase>,
    pub total: u64,
}
