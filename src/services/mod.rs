use thiserror::Error;

use crate::domain::deal::DealValidationError;
use crate::domain::tier::TierLimitKind;
use crate::domain::voucher::RedemptionStatus;
use crate::repository::errors::RepositoryError;
use crate::token::TokenError;

pub mod notifications;
pub mod pricing;
pub mod promotions;
pub mod vouchers;

/// Result type returned by all service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to callers of the promotions engine.
///
/// Validation, ownership and tier errors are detected before any
/// persistence. Token and state errors on the voucher path never corrupt the
/// stored redemption state.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller lacks the role required for the operation.
    #[error("unauthorized")]
    Unauthorized,
    /// The submitted deal configuration is invalid.
    #[error(transparent)]
    Validation(#[from] DealValidationError),
    /// Shape or length failures from the form payload.
    #[error("invalid input: {0}")]
    Form(String),
    /// The promotion window is inverted or empty.
    #[error("promotion window is invalid: ends_at must be after starts_at")]
    InvalidWindow,
    /// A promotion must hold at least one product.
    #[error("a promotion requires at least one product")]
    NoProducts,
    /// The promotion is switched off or outside its window.
    #[error("promotion is not live")]
    PromotionNotLive,
    /// Voucher operations require a voucher-type promotion.
    #[error("promotion does not support voucher redemption")]
    NotVoucherDeal,
    /// The requested product is not associated with the promotion.
    #[error("product is not part of the promotion")]
    ProductNotInPromotion,
    /// The named store does not sell the requested product.
    #[error("store does not sell the requested product")]
    StoreMismatch,
    /// The caller does not own the store selling the product.
    #[error("user {user_id} does not own the store selling product {product_id}")]
    ProductOwnership { user_id: i32, product_id: i32 },
    /// The caller does not own the promotion.
    #[error("user {user_id} does not own promotion {promotion_id}")]
    PromotionOwnership { user_id: i32, promotion_id: i32 },
    /// The caller does not own the store a voucher is bound to.
    #[error("user {user_id} does not own store {store_id}")]
    StoreOwnership { user_id: i32, store_id: i32 },
    /// A subscription tier cap was hit; the kind names which one.
    #[error("{0} limit reached for the current subscription tier")]
    TierLimit(TierLimitKind),
    /// The referenced promotion, product, user or redemption is absent.
    #[error("not found")]
    NotFound,
    /// The presented voucher token failed signature or claim checks.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// The redemption is in the wrong state for the requested transition.
    #[error("redemption is {current}, expected {expected}")]
    State {
        current: RedemptionStatus,
        expected: RedemptionStatus,
    },
    /// The voucher aged out before verification.
    #[error("voucher has expired")]
    Expired,
    /// Unexpected repository failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}
