use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::deal::{DealConfig, DealType};

/// Domain representation of a promotion and its associated products.
///
/// Ownership is not stored on the promotion itself; it is resolved
/// transitively through the associated products to their stores and the
/// stores' owning merchant.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Promotion {
    /// Unique identifier of the promotion.
    pub id: i32,
    /// Short title shown to consumers.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Start of the promotion window.
    pub starts_at: NaiveDateTime,
    /// Optional end of the promotion window; `None` means open-ended.
    pub ends_at: Option<NaiveDateTime>,
    /// Whether the promotion is switched on.
    pub is_active: bool,
    /// The validated deal configuration.
    pub deal: DealConfig,
    /// Distinct identifiers of the associated products.
    pub product_ids: Vec<i32>,
    /// Timestamp for when the promotion record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the promotion record.
    pub updated_at: NaiveDateTime,
}

impl Promotion {
    /// Whether the promotion is switched on and `now` falls inside its
    /// window.
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        self.is_active
            && self.starts_at <= now
            && self.ends_at.map(|ends_at| now < ends_at).unwrap_or(true)
    }
}

/// Payload required to insert a new promotion.
#[derive(Debug, Clone)]
pub struct NewPromotion {
    /// Short title shown to consumers.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Start of the promotion window.
    pub starts_at: NaiveDateTime,
    /// Optional end of the promotion window.
    pub ends_at: Option<NaiveDateTime>,
    /// Whether the promotion starts switched on.
    pub is_active: bool,
    /// The validated deal configuration.
    pub deal: DealConfig,
    /// Timestamp captured when the payload was created.
    pub updated_at: NaiveDateTime,
}

impl NewPromotion {
    /// Build a new promotion payload with the supplied details and current
    /// timestamp. Promotions start switched on.
    pub fn new(title: impl Into<String>, starts_at: NaiveDateTime, deal: DealConfig) -> Self {
        let now = chrono::Local::now().naive_utc();
        Self {
            title: title.into(),
            description: None,
            starts_at,
            ends_at: None,
            is_active: true,
            deal,
            updated_at: now,
        }
    }

    /// Attach a description to the promotion payload.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Close the promotion window at the given time.
    pub fn with_ends_at(mut self, ends_at: NaiveDateTime) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    /// Override whether the promotion starts switched on.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// Patch data applied when updating an existing promotion.
#[derive(Debug, Clone)]
pub struct UpdatePromotion {
    /// Optional title update.
    pub title: Option<String>,
    /// Optional description update, using inner `None` to clear it.
    pub description: Option<Option<String>>,
    /// Optional activation toggle.
    pub is_active: Option<bool>,
    /// Optional window-end update, using inner `None` to reopen the window.
    pub ends_at: Option<Option<NaiveDateTime>>,
    /// Timestamp captured when the patch was created.
    pub updated_at: NaiveDateTime,
}

impl Default for UpdatePromotion {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdatePromotion {
    /// Create a new patch object with no changes applied yet.
    pub fn new() -> Self {
        let now = chrono::Local::now().naive_utc();
        Self {
            title: None,
            description: None,
            is_active: None,
            ends_at: None,
            updated_at: now,
        }
    }

    /// Update the promotion title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Update the description, using `None` to clear an existing value.
    pub fn description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = Some(description.map(|value| value.into()));
        self
    }

    /// Switch the promotion on or off.
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Update the window end, using `None` to reopen the window.
    pub fn ends_at(mut self, ends_at: Option<NaiveDateTime>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }
}

/// Query definition used to list promotions.
#[derive(Debug, Clone)]
pub struct PromotionListQuery {
    /// Restrict to promotions whose products belong to this merchant.
    pub owner_id: Option<i32>,
    /// Restrict to promotions with this activation state.
    pub is_active: Option<bool>,
    /// Restrict to promotions of this deal type.
    pub deal_type: Option<DealType>,
}

impl Default for PromotionListQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl PromotionListQuery {
    /// Construct a query matching every promotion.
    pub fn new() -> Self {
        Self {
            owner_id: None,
            is_active: None,
            deal_type: None,
        }
    }

    /// Filter the results to promotions owned by `owner_id`.
    pub fn owner(mut self, owner_id: i32) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Filter the results by activation state.
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Filter the results by deal type.
    pub fn deal_type(mut self, deal_type: DealType) -> Self {
        self.deal_type = Some(deal_type);
        self
    }
}
