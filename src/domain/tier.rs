use serde::{Deserialize, Serialize};

/// Merchant subscription level gating promotion quantity limits.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Basic,
    Pro,
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Basic
    }
}

impl SubscriptionTier {
    /// Stable string form used in the users table.
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Pro => "pro",
        }
    }

    /// Limits derived from the tier. `None` means unbounded.
    pub fn limits(self) -> TierLimits {
        match self {
            SubscriptionTier::Basic => TierLimits {
                max_active_promotions: Some(5),
                max_products_per_promotion: Some(10),
            },
            SubscriptionTier::Pro => TierLimits {
                max_active_promotions: None,
                max_products_per_promotion: None,
            },
        }
    }
}

impl From<&str> for SubscriptionTier {
    fn from(value: &str) -> Self {
        match value {
            "pro" => SubscriptionTier::Pro,
            _ => SubscriptionTier::Basic,
        }
    }
}

/// Quantity caps for a tier; `None` means no cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub max_active_promotions: Option<usize>,
    pub max_products_per_promotion: Option<usize>,
}

/// Which tier cap a request ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierLimitKind {
    ActivePromotions,
    ProductsPerPromotion,
}

impl std::fmt::Display for TierLimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierLimitKind::ActivePromotions => f.write_str("active promotion count"),
            TierLimitKind::ProductsPerPromotion => f.write_str("products per promotion"),
        }
    }
}

/// Evaluate the tier caps for an operation that would leave the merchant
/// with `active_promotions` live promotions and a promotion holding
/// `product_count` distinct products. Pure; never consults storage.
///
/// For creation, pass the merchant's current live promotion count; the new
/// promotion is rejected when the count has already reached the cap. For
/// add-products, pass the existing + newly requested distinct count.
pub fn check_limits(
    tier: SubscriptionTier,
    active_promotions: usize,
    product_count: usize,
) -> Result<(), TierLimitKind> {
    let limits = tier.limits();

    if let Some(max_promotions) = limits.max_active_promotions {
        if active_promotions >= max_promotions {
            return Err(TierLimitKind::ActivePromotions);
        }
    }

    if let Some(max_products) = limits.max_products_per_promotion {
        if product_count > max_products {
            return Err(TierLimitKind::ProductsPerPromotion);
        }
    }

    Ok(())
}
