use chrono::NaiveDateTime;
use mockall::mock;

use super::{
    BookmarkReader, ProductReader, PromotionReader, PromotionWriter, StoreReader, UserReader,
    VoucherReader, VoucherWriter,
};
use crate::domain::{
    product::Product,
    promotion::{NewPromotion, Promotion, PromotionListQuery, UpdatePromotion},
    store::Store,
    user::User,
    voucher::{NewVoucherRedemption, VoucherRedemption},
};
use crate::repository::errors::RepositoryResult;

mock! {
    pub PromotionReader {}

    impl PromotionReader for PromotionReader {
        fn get_promotion_by_id(&self, id: i32) -> RepositoryResult<Option<Promotion>>;
        fn list_promotions(&self, query: PromotionListQuery) -> RepositoryResult<Vec<Promotion>>;
        fn count_live_promotions(&self, owner_id: i32, now: NaiveDateTime) -> RepositoryResult<usize>;
        fn get_promotion_owner(&self, promotion_id: i32) -> RepositoryResult<Option<i32>>;
    }
}

mock! {
    pub PromotionWriter {}

    impl PromotionWriter for PromotionWriter {
        fn create_promotion(&self, new_promotion: &NewPromotion, product_ids: &[i32]) -> RepositoryResult<Promotion>;
        fn add_promotion_products(&self, promotion_id: i32, product_ids: &[i32]) -> RepositoryResult<Promotion>;
        fn update_promotion(&self, promotion_id: i32, updates: &UpdatePromotion) -> RepositoryResult<Promotion>;
    }
}

mock! {
    pub StoreReader {}

    impl StoreReader for StoreReader {
        fn get_store_by_id(&self, id: i32) -> RepositoryResult<Option<Store>>;
    }
}

mock! {
    pub ProductReader {}

    impl ProductReader for ProductReader {
        fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
        fn list_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<Product>>;
    }
}

mock! {
    pub UserReader {}

    impl UserReader for UserReader {
        fn get_user_by_id(&self, id: i32) -> RepositoryResult<Option<User>>;
    }
}

mock! {
    pub BookmarkReader {}

    impl BookmarkReader for BookmarkReader {
        fn list_bookmarker_ids(&self, product_ids: &[i32], store_ids: &[i32]) -> RepositoryResult<Vec<i32>>;
    }
}

mock! {
    pub VoucherReader {}

    impl VoucherReader for VoucherReader {
        fn get_redemption_by_id(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
    }
}

mock! {
    pub VoucherWriter {}

    impl VoucherWriter for VoucherWriter {
        fn create_redemption(&self, new_redemption: &NewVoucherRedemption) -> RepositoryResult<VoucherRedemption>;
        fn mark_verified(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
        fn mark_confirmed(&self, id: i32, merchant_id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
        fn mark_rejected(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
        fn mark_expired(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>>;
        fn expire_stale(&self, now: NaiveDateTime) -> RepositoryResult<usize>;
    }
}
