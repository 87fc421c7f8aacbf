use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::product::Product;
use crate::domain::promotion::{NewPromotion, Promotion, PromotionListQuery, UpdatePromotion};
use crate::domain::store::Store;
use crate::domain::user::User;
use crate::domain::voucher::{NewVoucherRedemption, VoucherRedemption};
use crate::repository::errors::RepositoryResult;

pub mod errors;

pub mod bookmark;
pub mod product;
pub mod promotion;
pub mod store;
pub mod user;
pub mod voucher;

#[cfg(test)]
pub mod mock;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over promotion records.
pub trait PromotionReader {
    fn get_promotion_by_id(&self, id: i32) -> RepositoryResult<Option<Promotion>>;
    fn list_promotions(&self, query: PromotionListQuery) -> RepositoryResult<Vec<Promotion>>;
    /// Number of promotions owned by `owner_id` that are switched on and
    /// whose window contains `now`.
    fn count_live_promotions(&self, owner_id: i32, now: NaiveDateTime) -> RepositoryResult<usize>;
    /// Owner of the promotion, resolved through its products' stores.
    fn get_promotion_owner(&self, promotion_id: i32) -> RepositoryResult<Option<i32>>;
}

/// Write operations over promotion records.
pub trait PromotionWriter {
    /// Insert the promotion and its product associations in one transaction.
    fn create_promotion(
        &self,
        new_promotion: &NewPromotion,
        product_ids: &[i32],
    ) -> RepositoryResult<Promotion>;
    /// Associate further products, skipping ids already present.
    fn add_promotion_products(
        &self,
        promotion_id: i32,
        product_ids: &[i32],
    ) -> RepositoryResult<Promotion>;
    fn update_promotion(
        &self,
        promotion_id: i32,
        updates: &UpdatePromotion,
    ) -> RepositoryResult<Promotion>;
}

/// Read-only lookups over store records.
pub trait StoreReader {
    fn get_store_by_id(&self, id: i32) -> RepositoryResult<Option<Store>>;
}

/// Read-only lookups over product records.
pub trait ProductReader {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
    fn list_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<Product>>;
}

/// Read-only lookups over user records.
pub trait UserReader {
    fn get_user_by_id(&self, id: i32) -> RepositoryResult<Option<User>>;
}

/// Resolves notification fan-out audiences from bookmarks.
pub trait BookmarkReader {
    /// Distinct users who bookmarked any of the given products or stores.
    fn list_bookmarker_ids(
        &self,
        product_ids: &[i32],
        store_ids: &[i32],
    ) -> RepositoryResult<Vec<i32>>;
}

/// Read-only operations over voucher redemption records.
pub trait VoucherReader {
    fn get_redemption_by_id(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
}

/// Write operations over voucher redemption records.
///
/// Every `mark_*` transition is a compare-and-set: the row is updated only
/// if it is still in the transition's source state, and `Ok(None)` reports a
/// miss (row absent or no longer in that state) without touching the row.
pub trait VoucherWriter {
    fn create_redemption(
        &self,
        new_redemption: &NewVoucherRedemption,
    ) -> RepositoryResult<VoucherRedemption>;
    /// Pending -> Verified.
    fn mark_verified(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
    /// Verified -> Confirmed, recording the confirming merchant.
    fn mark_confirmed(
        &self,
        id: i32,
        merchant_id: i32,
    ) -> RepositoryResult<Option<VoucherRedemption>>;
    /// Verified -> Rejected.
    fn mark_rejected(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
    /// Pending -> Expired.
    fn mark_expired(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
    /// Bulk Pending -> Expired for rows past their expiry at `now`.
    fn expire_stale(&self, now: NaiveDateTime) -> RepositoryResult<usize>;
}
