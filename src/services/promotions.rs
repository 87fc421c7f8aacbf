use std::collections::{HashMap, HashSet};

use crate::MERCHANT_ROLE;
use crate::domain::auth::{AuthenticatedUser, check_role};
use crate::domain::deal;
use crate::domain::product::Product;
use crate::domain::promotion::{NewPromotion, Promotion, PromotionListQuery, UpdatePromotion};
use crate::domain::tier;
use crate::forms::promotions::{AddProductsForm, CreatePromotionForm};
use crate::repository::{
    BookmarkReader, ProductReader, PromotionReader, PromotionWriter, StoreReader, UserReader,
};
use crate::services::notifications::{Notification, NotificationKind, Notifier};
use crate::services::{ServiceError, ServiceResult, pricing};

/// Creates a promotion for the authenticated merchant.
///
/// Success is determined by validation, ownership, tier policy and
/// persistence alone; the pricing escalation and the bookmark fan-out are
/// scheduled fire-and-forget and never fail the operation.
pub fn create_promotion<R, N>(
    repo: &R,
    notifier: &N,
    merchant: &AuthenticatedUser,
    form: CreatePromotionForm,
) -> ServiceResult<Promotion>
where
    R: PromotionReader
        + PromotionWriter
        + ProductReader
        + StoreReader
        + UserReader
        + BookmarkReader
        + ?Sized,
    N: Notifier + ?Sized,
{
    if !check_role(MERCHANT_ROLE, &merchant.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let payload = form
        .into_payload()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if let Some(ends_at) = payload.ends_at {
        if ends_at <= payload.starts_at {
            return Err(ServiceError::InvalidWindow);
        }
    }

    let deal = deal::validate(&payload.deal_type, &payload.deal, payload.product_ids.len())?;

    let products = load_owned_products(repo, merchant, &payload.product_ids)?;

    let merchant_user = repo
        .get_user_by_id(merchant.id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    let now = chrono::Local::now().naive_utc();
    let live_promotions = repo
        .count_live_promotions(merchant.id, now)
        .map_err(ServiceError::from)?;
    tier::check_limits(
        merchant_user.subscription_tier,
        live_promotions,
        payload.product_ids.len(),
    )
    .map_err(ServiceError::TierLimit)?;

    let mut new_promotion = NewPromotion::new(payload.title, payload.starts_at, deal);
    if let Some(description) = payload.description {
        new_promotion = new_promotion.with_description(description);
    }
    if let Some(ends_at) = payload.ends_at {
        new_promotion = new_promotion.with_ends_at(ends_at);
    }

    let promotion = repo
        .create_promotion(&new_promotion, &payload.product_ids)
        .map_err(ServiceError::from)?;

    schedule_pricing_escalation(notifier, &promotion, &products);
    schedule_created_fan_out(repo, notifier, &promotion, &products);

    Ok(promotion)
}

/// Associates further products with an existing promotion.
///
/// Product ids already present are silently ignored; the tier cap is checked
/// against the resulting distinct count.
pub fn add_products<R>(
    repo: &R,
    merchant: &AuthenticatedUser,
    promotion_id: i32,
    form: AddProductsForm,
) -> ServiceResult<Promotion>
where
    R: PromotionReader + PromotionWriter + ProductReader + StoreReader + UserReader + ?Sized,
{
    if !check_role(MERCHANT_ROLE, &merchant.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let product_ids = form
        .into_product_ids()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let promotion = repo
        .get_promotion_by_id(promotion_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    require_promotion_owner(repo, merchant, promotion_id)?;

    let existing: HashSet<i32> = promotion.product_ids.iter().copied().collect();
    let new_ids: Vec<i32> = product_ids
        .into_iter()
        .filter(|id| !existing.contains(id))
        .collect();

    if new_ids.is_empty() {
        return Ok(promotion);
    }

    load_owned_products(repo, merchant, &new_ids)?;

    let merchant_user = repo
        .get_user_by_id(merchant.id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    // Only the per-promotion product cap applies when amending; the
    // promotion-count cap concerns creation.
    tier::check_limits(
        merchant_user.subscription_tier,
        0,
        existing.len() + new_ids.len(),
    )
    .map_err(ServiceError::TierLimit)?;

    repo.add_promotion_products(promotion_id, &new_ids)
        .map_err(ServiceError::from)
}

/// Switches a promotion on or off.
pub fn set_promotion_status<R>(
    repo: &R,
    merchant: &AuthenticatedUser,
    promotion_id: i32,
    is_active: bool,
) -> ServiceResult<Promotion>
where
    R: PromotionReader + PromotionWriter + ?Sized,
{
    if !check_role(MERCHANT_ROLE, &merchant.roles) {
        return Err(ServiceError::Unauthorized);
    }

    require_promotion_owner(repo, merchant, promotion_id)?;

    let updates = UpdatePromotion::new().active(is_active);
    repo.update_promotion(promotion_id, &updates)
        .map_err(ServiceError::from)
}

/// Lists the authenticated merchant's promotions.
pub fn list_promotions<R>(
    repo: &R,
    merchant: &AuthenticatedUser,
) -> ServiceResult<Vec<Promotion>>
where
    R: PromotionReader + ?Sized,
{
    if !check_role(MERCHANT_ROLE, &merchant.roles) {
        return Err(ServiceError::Unauthorized);
    }

    repo.list_promotions(PromotionListQuery::new().owner(merchant.id))
        .map_err(ServiceError::from)
}

/// Loads the products and confirms every one belongs to a store owned by
/// the caller. `product_ids` must already be distinct.
fn load_owned_products<R>(
    repo: &R,
    merchant: &AuthenticatedUser,
    product_ids: &[i32],
) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + StoreReader + ?Sized,
{
    let products = repo
        .list_products_by_ids(product_ids)
        .map_err(ServiceError::from)?;

    if products.len() != product_ids.len() {
        return Err(ServiceError::NotFound);
    }

    let mut store_owners: HashMap<i32, i32> = HashMap::new();
    for product in &products {
        let owner_id = match store_owners.get(&product.store_id) {
            Some(owner_id) => *owner_id,
            None => {
                let store = repo
                    .get_store_by_id(product.store_id)
                    .map_err(ServiceError::from)?
                    .ok_or(ServiceError::NotFound)?;
                store_owners.insert(store.id, store.owner_id);
                store.owner_id
            }
        };

        if owner_id != merchant.id {
            return Err(ServiceError::ProductOwnership {
                user_id: merchant.id,
                product_id: product.id,
            });
        }
    }

    Ok(products)
}

fn require_promotion_owner<R>(
    repo: &R,
    merchant: &AuthenticatedUser,
    promotion_id: i32,
) -> ServiceResult<()>
where
    R: PromotionReader + ?Sized,
{
    let owner_id = repo
        .get_promotion_owner(promotion_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    if owner_id != merchant.id {
        return Err(ServiceError::PromotionOwnership {
            user_id: merchant.id,
            promotion_id,
        });
    }

    Ok(())
}

fn schedule_pricing_escalation<N>(notifier: &N, promotion: &Promotion, products: &[Product])
where
    N: Notifier + ?Sized,
{
    let reasons = pricing::questionable_reasons(&promotion.deal, products);
    if reasons.is_empty() {
        return;
    }

    notifier.notify(Notification {
        // Escalations carry no explicit targets; the dispatcher routes them
        // to the administrator audience.
        target_user_ids: Vec::new(),
        kind: NotificationKind::PricingEscalation,
        title: format!("Promotion `{}` needs pricing review", promotion.title),
        message: reasons.join("; "),
        promotion_id: Some(promotion.id),
        product_ids: promotion.product_ids.clone(),
        store_ids: distinct_store_ids(products),
    });
}

fn schedule_created_fan_out<R, N>(
    repo: &R,
    notifier: &N,
    promotion: &Promotion,
    products: &[Product],
) where
    R: BookmarkReader + ?Sized,
    N: Notifier + ?Sized,
{
    let store_ids = distinct_store_ids(products);

    let targets = match repo.list_bookmarker_ids(&promotion.product_ids, &store_ids) {
        Ok(targets) => targets,
        Err(err) => {
            log::error!(
                "Failed to resolve bookmark audience for promotion {}: {err}",
                promotion.id
            );
            return;
        }
    };

    if targets.is_empty() {
        return;
    }

    notifier.notify(Notification {
        target_user_ids: targets,
        kind: NotificationKind::PromotionCreated,
        title: format!("New promotion: {}", promotion.title),
        message: promotion
            .description
            .clone()
            .unwrap_or_else(|| "A promotion was created for items you bookmarked".to_string()),
        promotion_id: Some(promotion.id),
        product_ids: promotion.product_ids.clone(),
        store_ids,
    });
}

fn distinct_store_ids(products: &[Product]) -> Vec<i32> {
    let mut seen = HashSet::new();
    products
        .iter()
        .map(|product| product.store_id)
        .filter(|store_id| seen.insert(*store_id))
        .collect()
}
