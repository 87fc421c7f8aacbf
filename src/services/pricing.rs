//! Advisory pricing heuristics.
//!
//! A questionable result never blocks an operation; the lifecycle service
//! surfaces it as an escalation for manual review.

use crate::domain::deal::DealConfig;
use crate::domain::product::Product;

/// Prices below this are suspicious regardless of deal shape.
pub const MIN_REASONABLE_PRICE: f64 = 0.01;

/// Prices above this are suspicious regardless of deal shape.
pub const MAX_REASONABLE_PRICE: f64 = 1_000_000.0;

/// Stated discounts above this percentage warrant review.
pub const MAX_REASONABLE_DISCOUNT: f64 = 90.0;

/// Allowed gap, in percentage points, between a stated discount and the
/// discount implied by the price pair.
pub const DISCOUNT_MISMATCH_TOLERANCE: f64 = 5.0;

/// True when a listed price is implausibly small or large.
pub fn is_questionable_product_price(price: f64) -> bool {
    price < MIN_REASONABLE_PRICE || price > MAX_REASONABLE_PRICE
}

/// True when a stated discount is implausible on its own, or disagrees with
/// the supplied original/discounted price pair.
pub fn is_questionable_discount(
    discount_percent: f64,
    original_price: Option<f64>,
    discounted_price: Option<f64>,
) -> bool {
    if discount_percent > MAX_REASONABLE_DISCOUNT || discount_percent < 0.0 {
        return true;
    }

    if let (Some(original), Some(discounted)) = (original_price, discounted_price) {
        if discounted < MIN_REASONABLE_PRICE {
            return true;
        }
        if original > 0.0 {
            let actual = (original - discounted) / original * 100.0;
            if (actual - discount_percent).abs() > DISCOUNT_MISMATCH_TOLERANCE {
                return true;
            }
        }
    }

    false
}

/// Apply the heuristics to a deal and the products it covers, collecting
/// human-readable reasons for the escalation notification. Empty when the
/// combination looks sane.
pub fn questionable_reasons(deal: &DealConfig, products: &[Product]) -> Vec<String> {
    let mut reasons = Vec::new();

    for product in products {
        if is_questionable_product_price(product.price) {
            reasons.push(format!(
                "product {} has a questionable price of {}",
                product.id, product.price
            ));
        }
    }

    match deal {
        DealConfig::PercentageDiscount { percentage_off } => {
            if is_questionable_discount(*percentage_off, None, None) {
                reasons.push(format!("stated discount of {percentage_off}% is questionable"));
            }
            for product in products {
                let discounted = product.price * (1.0 - percentage_off / 100.0);
                if is_questionable_discount(*percentage_off, Some(product.price), Some(discounted))
                {
                    reasons.push(format!(
                        "discounted price {discounted:.2} for product {} is questionable",
                        product.id
                    ));
                }
            }
        }
        DealConfig::FixedDiscount { fixed_amount_off } => {
            for product in products {
                if product.price <= 0.0 {
                    continue;
                }
                let discounted = product.price - fixed_amount_off;
                let stated = fixed_amount_off / product.price * 100.0;
                if is_questionable_discount(stated, Some(product.price), Some(discounted)) {
                    reasons.push(format!(
                        "fixed discount of {fixed_amount_off} leaves product {} at {discounted:.2}",
                        product.id
                    ));
                }
            }
        }
        DealConfig::Bogo {
            buy_quantity,
            get_quantity,
        } => {
            let implied =
                f64::from(*get_quantity) / f64::from(buy_quantity + get_quantity) * 100.0;
            if is_questionable_discount(implied, None, None) {
                reasons.push(format!(
                    "buy {buy_quantity} get {get_quantity} implies a {implied:.0}% discount"
                ));
            }
        }
        DealConfig::Bundle { bundle_price } => {
            if is_questionable_product_price(*bundle_price) {
                reasons.push(format!("bundle price {bundle_price} is questionable"));
            }
            let total: f64 = products.iter().map(|product| product.price).sum();
            if total > 0.0 {
                let implied = (total - bundle_price) / total * 100.0;
                if is_questionable_discount(implied, Some(total), Some(*bundle_price)) {
                    reasons.push(format!(
                        "bundle price {bundle_price} implies a {implied:.0}% discount off {total:.2}"
                    ));
                }
            }
        }
        DealConfig::QuantityDiscount {
            quantity_discount, ..
        } => {
            if is_questionable_discount(*quantity_discount, None, None) {
                reasons.push(format!(
                    "stated quantity discount of {quantity_discount}% is questionable"
                ));
            }
        }
        DealConfig::Voucher { voucher_value } => {
            if is_questionable_product_price(*voucher_value) {
                reasons.push(format!("voucher value {voucher_value} is questionable"));
            }
        }
    }

    reasons
}
