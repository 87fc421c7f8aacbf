use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::auth::{AuthenticatedUser, check_role};
use crate::domain::deal::DealConfig;
use crate::domain::voucher::{NewVoucherRedemption, RedemptionStatus, VoucherRedemption};
use crate::repository::{
    ProductReader, PromotionReader, StoreReader, UserReader, VoucherReader, VoucherWriter,
};
use crate::services::{ServiceError, ServiceResult};
use crate::token::{self, TokenError, VoucherClaims, VoucherSigner};
use crate::{CONSUMER_ROLE, MERCHANT_ROLE};

/// Token plus the display summary returned to the consumer on issuance.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherGrant {
    /// Opaque signed token to present at point of sale.
    pub token: String,
    /// Client-displayable fields, served alongside the token rather than
    /// decoded from it.
    pub summary: VoucherSummary,
}

/// Human-readable issuance summary.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherSummary {
    pub redemption_id: i32,
    pub consumer_name: String,
    pub promotion_id: i32,
    pub promotion_title: String,
    pub product_id: i32,
    pub product_name: String,
    pub voucher_value: f64,
    pub expires_at: NaiveDateTime,
}

/// Full redemption details shown to the merchant after verification.
#[derive(Debug, Clone, Serialize)]
pub struct RedemptionDetails {
    pub redemption: VoucherRedemption,
    pub consumer_name: String,
    pub consumer_email: String,
    pub promotion_title: String,
    pub voucher_value: f64,
    pub store_name: String,
    pub product_name: String,
}

/// Issues a signed redemption token for a voucher promotion.
///
/// The promotion must be live, of voucher type, and must include the
/// requested product; the named store must be the one selling the product.
/// The redemption row is created in the `Pending` state and the returned
/// token binds every reference field plus an expiry and a nonce.
pub fn generate_voucher_token<R, S>(
    repo: &R,
    signer: &S,
    consumer: &AuthenticatedUser,
    promotion_id: i32,
    store_id: i32,
    product_id: i32,
) -> ServiceResult<VoucherGrant>
where
    R: PromotionReader + ProductReader + UserReader + VoucherWriter + ?Sized,
    S: VoucherSigner + ?Sized,
{
    if !check_role(CONSUMER_ROLE, &consumer.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let promotion = repo
        .get_promotion_by_id(promotion_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let now = chrono::Local::now().naive_utc();
    if !promotion.is_live(now) {
        return Err(ServiceError::PromotionNotLive);
    }

    let voucher_value = match &promotion.deal {
        DealConfig::Voucher { voucher_value } => *voucher_value,
        _ => return Err(ServiceError::NotVoucherDeal),
    };

    if !promotion.product_ids.contains(&product_id) {
        return Err(ServiceError::ProductNotInPromotion);
    }

    let product = repo
        .get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    if product.store_id != store_id {
        return Err(ServiceError::StoreMismatch);
    }

    let consumer_user = repo
        .get_user_by_id(consumer.id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let redemption = repo
        .create_redemption(&NewVoucherRedemption {
            promotion_id,
            store_id,
            product_id,
            consumer_id: consumer.id,
            nonce: token::new_nonce(),
            issued_at: now,
            expires_at: token::expiry_for(now, signer.ttl()),
        })
        .map_err(ServiceError::from)?;

    let claims = VoucherClaims::for_redemption(&redemption);
    let token = signer.sign(&claims)?;

    Ok(VoucherGrant {
        token,
        summary: VoucherSummary {
            redemption_id: redemption.id,
            consumer_name: consumer_user.name,
            promotion_id,
            promotion_title: promotion.title,
            product_id,
            product_name: product.name,
            voucher_value,
            expires_at: redemption.expires_at,
        },
    })
}

/// Checks a presented token and moves its redemption to `Verified`.
///
/// Read-mostly: the only state changes are the `Pending -> Verified`
/// transition itself and, for a stale token, `Pending -> Expired`. Repeated
/// verification of an already-verified redemption is idempotent. A token
/// failing signature or claim checks causes no state change at all.
pub fn verify_voucher_token<R, S>(
    repo: &R,
    signer: &S,
    merchant: &AuthenticatedUser,
    raw_token: &str,
) -> ServiceResult<RedemptionDetails>
where
    R: VoucherReader
        + VoucherWriter
        + PromotionReader
        + ProductReader
        + StoreReader
        + UserReader
        + ?Sized,
    S: VoucherSigner + ?Sized,
{
    if !check_role(MERCHANT_ROLE, &merchant.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let (claims, redemption) = resolve_redemption(repo, signer, merchant, raw_token)?;

    if !claims.matches(&redemption) {
        return Err(ServiceError::Token(TokenError::ClaimsMismatch));
    }

    match redemption.status {
        RedemptionStatus::Verified => redemption_details(repo, redemption),
        RedemptionStatus::Confirmed | RedemptionStatus::Rejected | RedemptionStatus::Expired => {
            Err(ServiceError::State {
                current: redemption.status,
                expected: RedemptionStatus::Pending,
            })
        }
        RedemptionStatus::Pending => {
            let now = chrono::Local::now().naive_utc();
            if now >= redemption.expires_at {
                // Lazy expiry: stale pending rows are moved over as a side
                // effect of verification.
                let _ = repo.mark_expired(redemption.id).map_err(ServiceError::from)?;
                return Err(ServiceError::Expired);
            }

            match repo.mark_verified(redemption.id).map_err(ServiceError::from)? {
                Some(verified) => redemption_details(repo, verified),
                None => {
                    // Lost the transition race; report whatever won.
                    let current = repo
                        .get_redemption_by_id(redemption.id)
                        .map_err(ServiceError::from)?
                        .ok_or(ServiceError::NotFound)?;
                    if current.status == RedemptionStatus::Verified {
                        redemption_details(repo, current)
                    } else {
                        Err(ServiceError::State {
                            current: current.status,
                            expected: RedemptionStatus::Pending,
                        })
                    }
                }
            }
        }
    }
}

/// Consumes a verified voucher: `Verified -> Confirmed`, exactly once.
///
/// The transition is a compare-and-set against the stored status, so of two
/// racing confirmation attempts exactly one succeeds; the loser receives a
/// state error naming the actual state and no further change is made.
/// Expiry is not re-checked here: a redemption that reached `Verified` does
/// not age out while awaiting confirmation.
pub fn confirm_voucher_redemption<R, S>(
    repo: &R,
    signer: &S,
    merchant: &AuthenticatedUser,
    raw_token: &str,
) -> ServiceResult<VoucherRedemption>
where
    R: VoucherReader + VoucherWriter + StoreReader + ?Sized,
    S: VoucherSigner + ?Sized,
{
    if !check_role(MERCHANT_ROLE, &merchant.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let (claims, redemption) = resolve_redemption(repo, signer, merchant, raw_token)?;

    if !claims.matches(&redemption) {
        // A verified redemption presented with mismatching claims is
        // burned rather than left redeemable.
        if redemption.status == RedemptionStatus::Verified {
            let _ = repo.mark_rejected(redemption.id).map_err(ServiceError::from)?;
        }
        return Err(ServiceError::Token(TokenError::ClaimsMismatch));
    }

    match repo
        .mark_confirmed(redemption.id, merchant.id)
        .map_err(ServiceError::from)?
    {
        Some(confirmed) => Ok(confirmed),
        None => {
            let current = repo
                .get_redemption_by_id(redemption.id)
                .map_err(ServiceError::from)?
                .ok_or(ServiceError::NotFound)?;
            Err(ServiceError::State {
                current: current.status,
                expected: RedemptionStatus::Verified,
            })
        }
    }
}

/// Declines a verified redemption: `Verified -> Rejected`.
pub fn reject_voucher_redemption<R, S>(
    repo: &R,
    signer: &S,
    merchant: &AuthenticatedUser,
    raw_token: &str,
) -> ServiceResult<VoucherRedemption>
where
    R: VoucherReader + VoucherWriter + StoreReader + ?Sized,
    S: VoucherSigner + ?Sized,
{
    if !check_role(MERCHANT_ROLE, &merchant.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let (claims, redemption) = resolve_redemption(repo, signer, merchant, raw_token)?;

    if !claims.matches(&redemption) {
        return Err(ServiceError::Token(TokenError::ClaimsMismatch));
    }

    match repo.mark_rejected(redemption.id).map_err(ServiceError::from)? {
        Some(rejected) => Ok(rejected),
        None => {
            let current = repo
                .get_redemption_by_id(redemption.id)
                .map_err(ServiceError::from)?
                .ok_or(ServiceError::NotFound)?;
            Err(ServiceError::State {
                current: current.status,
                expected: RedemptionStatus::Verified,
            })
        }
    }
}

/// Bulk-expires stale pending redemptions; the sweeper binary's loop body.
pub fn expire_stale_redemptions<R>(repo: &R, now: NaiveDateTime) -> ServiceResult<usize>
where
    R: VoucherWriter + ?Sized,
{
    repo.expire_stale(now).map_err(ServiceError::from)
}

/// Decodes the token, loads the referenced redemption and checks that the
/// caller owns the store it is bound to.
fn resolve_redemption<R, S>(
    repo: &R,
    signer: &S,
    merchant: &AuthenticatedUser,
    raw_token: &str,
) -> ServiceResult<(VoucherClaims, VoucherRedemption)>
where
    R: VoucherReader + StoreReader + ?Sized,
    S: VoucherSigner + ?Sized,
{
    let claims = signer.verify(raw_token)?;

    let redemption_id = claims
        .redemption_id()
        .ok_or(ServiceError::Token(TokenError::Malformed))?;

    let redemption = repo
        .get_redemption_by_id(redemption_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::Token(TokenError::UnknownRedemption))?;

    let store = repo
        .get_store_by_id(redemption.store_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    if store.owner_id != merchant.id {
        return Err(ServiceError::StoreOwnership {
            user_id: merchant.id,
            store_id: redemption.store_id,
        });
    }

    Ok((claims, redemption))
}

fn redemption_details<R>(repo: &R, redemption: VoucherRedemption) -> ServiceResult<RedemptionDetails>
where
    R: PromotionReader + ProductReader + StoreReader + UserReader + ?Sized,
{
    let consumer = repo
        .get_user_by_id(redemption.consumer_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    let promotion = repo
        .get_promotion_by_id(redemption.promotion_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    let voucher_value = match &promotion.deal {
        DealConfig::Voucher { voucher_value } => *voucher_value,
        _ => return Err(ServiceError::NotVoucherDeal),
    };
    let store = repo
        .get_store_by_id(redemption.store_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    let product = repo
        .get_product_by_id(redemption.product_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    Ok(RedemptionDetails {
        redemption,
        consumer_name: consumer.name,
        consumer_email: consumer.email,
        promotion_title: promotion.title,
        voucher_value,
        store_name: store.name,
        product_name: product.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime};

    use crate::domain::product::Product;
    use crate::domain::promotion::{Promotion, PromotionListQuery};
    use crate::domain::store::Store;
    use crate::domain::tier::SubscriptionTier;
    use crate::domain::user::User;
    use crate::repository::errors::RepositoryResult;
    use crate::repository::mock::{
        MockProductReader, MockPromotionReader, MockStoreReader, MockUserReader, MockVoucherReader,
        MockVoucherWriter,
    };
    use crate::token::JwtVoucherSigner;

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_utc()
    }

    fn signer() -> JwtVoucherSigner {
        JwtVoucherSigner::new("voucher_test_secret", Duration::minutes(15))
    }

    fn consumer() -> AuthenticatedUser {
        AuthenticatedUser {
            id: 99,
            name: "Casey Consumer".to_string(),
            email: "casey@example.com".to_string(),
            roles: vec![CONSUMER_ROLE.to_string()],
        }
    }

    fn merchant() -> AuthenticatedUser {
        AuthenticatedUser {
            id: 11,
            name: "Morgan Merchant".to_string(),
            email: "morgan@example.com".to_string(),
            roles: vec![MERCHANT_ROLE.to_string()],
        }
    }

    fn voucher_promotion(id: i32, product_ids: Vec<i32>) -> Promotion {
        Promotion {
            id,
            title: "Free coffee".to_string(),
            description: None,
            starts_at: now() - Duration::days(1),
            ends_at: None,
            is_active: true,
            deal: DealConfig::Voucher {
                voucher_value: 5.0,
            },
            product_ids,
            created_at: now() - Duration::days(1),
            updated_at: now() - Duration::days(1),
        }
    }

    fn store(id: i32, owner_id: i32) -> Store {
        Store {
            id,
            owner_id,
            name: format!("Store {id}"),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn product(id: i32, store_id: i32) -> Product {
        Product {
            id,
            store_id,
            name: format!("Product {id}"),
            price: 12.5,
            currency: "USD".to_string(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn user(id: i32, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            email: format!("user{id}@example.com"),
            subscription_tier: SubscriptionTier::Basic,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn redemption(id: i32, status: RedemptionStatus) -> VoucherRedemption {
        VoucherRedemption {
            id,
            promotion_id: 7,
            store_id: 3,
            product_id: 1,
            consumer_id: 99,
            status,
            nonce: "nonce-nonce-nonce-nonce!".to_string(),
            issued_at: now(),
            expires_at: now() + Duration::minutes(15),
            verified_at: None,
            confirmed_at: None,
            confirmed_by: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    struct FakeRepo {
        promotion_reader: MockPromotionReader,
        product_reader: MockProductReader,
        store_reader: MockStoreReader,
        user_reader: MockUserReader,
        voucher_reader: MockVoucherReader,
        voucher_writer: MockVoucherWriter,
    }

    impl FakeRepo {
        fn new() -> Self {
            Self {
                promotion_reader: MockPromotionReader::new(),
                product_reader: MockProductReader::new(),
                store_reader: MockStoreReader::new(),
                user_reader: MockUserReader::new(),
                voucher_reader: MockVoucherReader::new(),
                voucher_writer: MockVoucherWriter::new(),
            }
        }
    }

    impl PromotionReader for FakeRepo {
        fn get_promotion_by_id(&self, id: i32) -> RepositoryResult<Option<Promotion>> {
            self.promotion_reader.get_promotion_by_id(id)
        }

        fn list_promotions(&self, query: PromotionListQuery) -> RepositoryResult<Vec<Promotion>> {
            self.promotion_reader.list_promotions(query)
        }

        fn count_live_promotions(
            &self,
            owner_id: i32,
            now: NaiveDateTime,
        ) -> RepositoryResult<usize> {
            self.promotion_reader.count_live_promotions(owner_id, now)
        }

        fn get_promotion_owner(&self, promotion_id: i32) -> RepositoryResult<Option<i32>> {
            self.promotion_reader.get_promotion_owner(promotion_id)
        }
    }

    impl ProductReader for FakeRepo {
        fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>> {
            self.product_reader.get_product_by_id(id)
        }

        fn list_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<Product>> {
            self.product_reader.list_products_by_ids(ids)
        }
    }

    impl StoreReader for FakeRepo {
        fn get_store_by_id(&self, id: i32) -> RepositoryResult<Option<Store>> {
            self.store_reader.get_store_by_id(id)
        }
    }

    impl UserReader for FakeRepo {
        fn get_user_by_id(&self, id: i32) -> RepositoryResult<Option<User>> {
            self.user_reader.get_user_by_id(id)
        }
    }

    impl VoucherReader for FakeRepo {
        fn get_redemption_by_id(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>> {
            self.voucher_reader.get_redemption_by_id(id)
        }
    }

    impl VoucherWriter for FakeRepo {
        fn create_redemption(
            &self,
            new_redemption: &NewVoucherRedemption,
        ) -> RepositoryResult<VoucherRedemption> {
            self.voucher_writer.create_redemption(new_redemption)
        }

        fn mark_verified(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>> {
            self.voucher_writer.mark_verified(id)
        }

        fn mark_confirmed(
            &self,
            id: i32,
            merchant_id: i32,
        ) -> RepositoryResult<Option<VoucherRedemption>> {
            self.voucher_writer.mark_confirmed(id, merchant_id)
        }

        fn mark_rejected(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>> {
            self.voucher_writer.mark_rejected(id)
        }

        fn mark_expired(&self, id: i32) -> RepositoryResult<Option<VoucherRedemption>> {
            self.voucher_writer.mark_expired(id)
        }

        fn expire_stale(&self, now: NaiveDateTime) -> RepositoryResult<usize> {
            self.voucher_writer.expire_stale(now)
        }
    }

    fn expect_store_owned_by(repo: &mut FakeRepo, owner_id: i32) {
        repo.store_reader
            .expect_get_store_by_id()
            .returning(move |id| Ok(Some(store(id, owner_id))));
    }

    fn signed_token_for(redemption: &VoucherRedemption) -> String {
        signer()
            .sign(&VoucherClaims::for_redemption(redemption))
            .expect("signing")
    }

    #[test]
    fn generate_requires_consumer_role() {
        let repo = FakeRepo::new();
        let result =
            generate_voucher_token(&repo, &signer(), &merchant(), 7, 3, 1);
        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn generate_rejects_non_voucher_promotions() {
        let mut repo = FakeRepo::new();
        repo.promotion_reader
            .expect_get_promotion_by_id()
            .returning(|id| {
                let mut promotion = voucher_promotion(id, vec![1]);
                promotion.deal = DealConfig::PercentageDiscount {
                    percentage_off: 20.0,
                };
                Ok(Some(promotion))
            });

        let result = generate_voucher_token(&repo, &signer(), &consumer(), 7, 3, 1);
        assert!(matches!(result, Err(ServiceError::NotVoucherDeal)));
    }

    #[test]
    fn generate_rejects_inactive_promotions() {
        let mut repo = FakeRepo::new();
        repo.promotion_reader
            .expect_get_promotion_by_id()
            .returning(|id| {
                let mut promotion = voucher_promotion(id, vec![1]);
                promotion.is_active = false;
                Ok(Some(promotion))
            });

        let result = generate_voucher_token(&repo, &signer(), &consumer(), 7, 3, 1);
        assert!(matches!(result, Err(ServiceError::PromotionNotLive)));
    }

    #[test]
    fn generate_rejects_products_outside_the_promotion() {
        let mut repo = FakeRepo::new();
        repo.promotion_reader
            .expect_get_promotion_by_id()
            .returning(|id| Ok(Some(voucher_promotion(id, vec![2]))));

        let result = generate_voucher_token(&repo, &signer(), &consumer(), 7, 3, 1);
        assert!(matches!(result, Err(ServiceError::ProductNotInPromotion)));
    }

    #[test]
    fn generate_rejects_store_product_mismatch() {
        let mut repo = FakeRepo::new();
        repo.promotion_reader
            .expect_get_promotion_by_id()
            .returning(|id| Ok(Some(voucher_promotion(id, vec![1]))));
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(product(id, 4))));

        let result = generate_voucher_token(&repo, &signer(), &consumer(), 7, 3, 1);
        assert!(matches!(result, Err(ServiceError::StoreMismatch)));
    }

    #[test]
    fn generate_creates_pending_redemption_and_verifiable_token() {
        let mut repo = FakeRepo::new();
        repo.promotion_reader
            .expect_get_promotion_by_id()
            .returning(|id| Ok(Some(voucher_promotion(id, vec![1]))));
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(product(id, 3))));
        repo.user_reader
            .expect_get_user_by_id()
            .returning(|id| Ok(Some(user(id, "Casey Consumer"))));
        repo.voucher_writer
            .expect_create_redemption()
            .times(1)
            .withf(|new_redemption| {
                assert_eq!(new_redemption.promotion_id, 7);
                assert_eq!(new_redemption.store_id, 3);
                assert_eq!(new_redemption.product_id, 1);
                assert_eq!(new_redemption.consumer_id, 99);
                assert!(new_redemption.expires_at > new_redemption.issued_at);
                true
            })
            .returning(|new_redemption| {
                let mut created = redemption(42, RedemptionStatus::Pending);
                created.nonce = new_redemption.nonce.clone();
                created.issued_at = new_redemption.issued_at;
                created.expires_at = new_redemption.expires_at;
                Ok(created)
            });

        let grant = generate_voucher_token(&repo, &signer(), &consumer(), 7, 3, 1)
            .expect("expected success");

        assert_eq!(grant.summary.redemption_id, 42);
        assert_eq!(grant.summary.consumer_name, "Casey Consumer");
        assert_eq!(grant.summary.voucher_value, 5.0);

        let claims = signer().verify(&grant.token).expect("token verifies");
        assert_eq!(claims.redemption_id(), Some(42));
        assert_eq!(claims.promotion_id, 7);
    }

    #[test]
    fn verify_transitions_pending_to_verified() {
        let mut repo = FakeRepo::new();
        let pending = redemption(42, RedemptionStatus::Pending);
        let token = signed_token_for(&pending);

        expect_store_owned_by(&mut repo, 11);
        let lookup = pending.clone();
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        let verified = {
            let mut verified = pending.clone();
            verified.status = RedemptionStatus::Verified;
            verified
        };
        repo.voucher_writer
            .expect_mark_verified()
            .times(1)
            .returning(move |_| Ok(Some(verified.clone())));
        repo.user_reader
            .expect_get_user_by_id()
            .returning(|id| Ok(Some(user(id, "Casey Consumer"))));
        repo.promotion_reader
            .expect_get_promotion_by_id()
            .returning(|id| Ok(Some(voucher_promotion(id, vec![1]))));
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(product(id, 3))));

        let details = verify_voucher_token(&repo, &signer(), &merchant(), &token)
            .expect("expected success");

        assert_eq!(details.redemption.status, RedemptionStatus::Verified);
        assert_eq!(details.consumer_name, "Casey Consumer");
        assert_eq!(details.voucher_value, 5.0);
    }

    #[test]
    fn verify_is_idempotent_once_verified() {
        let mut repo = FakeRepo::new();
        let verified = redemption(42, RedemptionStatus::Verified);
        let token = signed_token_for(&verified);

        expect_store_owned_by(&mut repo, 11);
        let lookup = verified.clone();
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        // No mark_verified expectation: a second verification must not
        // touch the row again.
        repo.user_reader
            .expect_get_user_by_id()
            .returning(|id| Ok(Some(user(id, "Casey Consumer"))));
        repo.promotion_reader
            .expect_get_promotion_by_id()
            .returning(|id| Ok(Some(voucher_promotion(id, vec![1]))));
        repo.product_reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(product(id, 3))));

        let details = verify_voucher_token(&repo, &signer(), &merchant(), &token)
            .expect("expected success");
        assert_eq!(details.redemption.status, RedemptionStatus::Verified);
    }

    #[test]
    fn verify_reports_terminal_states_specifically() {
        for status in [
            RedemptionStatus::Confirmed,
            RedemptionStatus::Rejected,
            RedemptionStatus::Expired,
        ] {
            let mut repo = FakeRepo::new();
            let terminal = redemption(42, status);
            let token = signed_token_for(&terminal);

            expect_store_owned_by(&mut repo, 11);
            let lookup = terminal.clone();
            repo.voucher_reader
                .expect_get_redemption_by_id()
                .returning(move |_| Ok(Some(lookup.clone())));

            let result = verify_voucher_token(&repo, &signer(), &merchant(), &token);
            match result {
                Err(ServiceError::State { current, .. }) => assert_eq!(current, status),
                other => panic!("expected state error for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn verify_expires_stale_pending_tokens() {
        let mut repo = FakeRepo::new();
        let mut stale = redemption(42, RedemptionStatus::Pending);
        stale.issued_at = now() - Duration::hours(2);
        stale.expires_at = now() - Duration::hours(1);
        let token = signed_token_for(&stale);

        expect_store_owned_by(&mut repo, 11);
        let lookup = stale.clone();
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        repo.voucher_writer
            .expect_mark_expired()
            .times(1)
            .withf(|id| *id == 42)
            .returning(|id| {
                let mut expired = redemption(id, RedemptionStatus::Expired);
                expired.status = RedemptionStatus::Expired;
                Ok(Some(expired))
            });

        let result = verify_voucher_token(&repo, &signer(), &merchant(), &token);
        assert!(matches!(result, Err(ServiceError::Expired)));
    }

    #[test]
    fn verify_rejects_tampered_tokens_without_touching_state() {
        let repo = FakeRepo::new();
        let pending = redemption(42, RedemptionStatus::Pending);
        let token = signed_token_for(&pending);

        // Corrupt the signature segment.
        let mut tampered = token[..token.len() - 4].to_string();
        tampered.push_str("AAAA");

        let result = verify_voucher_token(&repo, &signer(), &merchant(), &tampered);
        assert!(matches!(result, Err(ServiceError::Token(_))));
        // FakeRepo had no expectations: any repository call would have
        // panicked the test.
    }

    #[test]
    fn verify_requires_store_ownership() {
        let mut repo = FakeRepo::new();
        let pending = redemption(42, RedemptionStatus::Pending);
        let token = signed_token_for(&pending);

        expect_store_owned_by(&mut repo, 77);
        let lookup = pending.clone();
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));

        let result = verify_voucher_token(&repo, &signer(), &merchant(), &token);
        assert!(matches!(
            result,
            Err(ServiceError::StoreOwnership {
                user_id: 11,
                store_id: 3,
            })
        ));
    }

    #[test]
    fn confirm_consumes_a_verified_redemption_once() {
        let mut repo = FakeRepo::new();
        let verified = redemption(42, RedemptionStatus::Verified);
        let token = signed_token_for(&verified);

        expect_store_owned_by(&mut repo, 11);
        let lookup = verified.clone();
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        repo.voucher_writer
            .expect_mark_confirmed()
            .times(1)
            .withf(|id, merchant_id| {
                assert_eq!(*id, 42);
                assert_eq!(*merchant_id, 11);
                true
            })
            .returning(|id, merchant_id| {
                let mut confirmed = redemption(id, RedemptionStatus::Confirmed);
                confirmed.confirmed_by = Some(merchant_id);
                confirmed.confirmed_at = Some(now());
                Ok(Some(confirmed))
            });

        let confirmed = confirm_voucher_redemption(&repo, &signer(), &merchant(), &token)
            .expect("expected success");
        assert_eq!(confirmed.status, RedemptionStatus::Confirmed);
        assert_eq!(confirmed.confirmed_by, Some(11));
    }

    #[test]
    fn double_confirmation_reports_already_confirmed() {
        let mut repo = FakeRepo::new();
        let verified = redemption(42, RedemptionStatus::Verified);
        let token = signed_token_for(&verified);

        expect_store_owned_by(&mut repo, 11);
        let mut confirmed = verified.clone();
        confirmed.status = RedemptionStatus::Confirmed;
        // The nonce in the token still matches; the row is already consumed.
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(confirmed.clone())));
        repo.voucher_writer
            .expect_mark_confirmed()
            .returning(|_, _| Ok(None));

        let result = confirm_voucher_redemption(&repo, &signer(), &merchant(), &token);
        assert!(matches!(
            result,
            Err(ServiceError::State {
                current: RedemptionStatus::Confirmed,
                expected: RedemptionStatus::Verified,
            })
        ));
    }

    #[test]
    fn confirm_before_verification_reports_not_yet_verified() {
        let mut repo = FakeRepo::new();
        let pending = redemption(42, RedemptionStatus::Pending);
        let token = signed_token_for(&pending);

        expect_store_owned_by(&mut repo, 11);
        let lookup = pending.clone();
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        repo.voucher_writer
            .expect_mark_confirmed()
            .returning(|_, _| Ok(None));

        let result = confirm_voucher_redemption(&repo, &signer(), &merchant(), &token);
        assert!(matches!(
            result,
            Err(ServiceError::State {
                current: RedemptionStatus::Pending,
                expected: RedemptionStatus::Verified,
            })
        ));
    }

    #[test]
    fn reject_declines_a_verified_redemption() {
        let mut repo = FakeRepo::new();
        let verified = redemption(42, RedemptionStatus::Verified);
        let token = signed_token_for(&verified);

        expect_store_owned_by(&mut repo, 11);
        let lookup = verified.clone();
        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        repo.voucher_writer
            .expect_mark_rejected()
            .times(1)
            .returning(|id| Ok(Some(redemption(id, RedemptionStatus::Rejected))));

        let rejected = reject_voucher_redemption(&repo, &signer(), &merchant(), &token)
            .expect("expected success");
        assert_eq!(rejected.status, RedemptionStatus::Rejected);
    }

    #[test]
    fn unknown_redemption_reports_invalid_token() {
        let mut repo = FakeRepo::new();
        let pending = redemption(42, RedemptionStatus::Pending);
        let token = signed_token_for(&pending);

        repo.voucher_reader
            .expect_get_redemption_by_id()
            .returning(|_| Ok(None));

        let result = verify_voucher_token(&repo, &signer(), &merchant(), &token);
        assert!(matches!(
            result,
            Err(ServiceError::Token(TokenError::UnknownRedemption))
        ));
    }
}
