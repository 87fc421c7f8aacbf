use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::deal::DealFields;

/// Maximum allowed length for a promotion title.
const TITLE_MAX_LEN: u64 = 128;

/// Maximum allowed length for a promotion description.
const DESCRIPTION_MAX_LEN: u64 = 2048;

/// Result type returned by the promotion form helpers.
pub type PromotionFormResult<T> = Result<T, PromotionFormError>;

/// Errors that can occur while processing promotion forms.
#[derive(Debug, Error)]
pub enum PromotionFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// The provided title is empty after sanitization.
    #[error("promotion title cannot be empty")]
    EmptyTitle,
    /// No product ids were supplied.
    #[error("at least one product id is required")]
    NoProducts,
}

/// Payload submitted when creating a promotion.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePromotionForm {
    /// Title entered by the merchant.
    #[validate(length(min = 1, max = TITLE_MAX_LEN))]
    pub title: String,
    /// Optional longer description.
    #[validate(length(max = DESCRIPTION_MAX_LEN))]
    pub description: Option<String>,
    /// Start of the promotion window.
    pub starts_at: NaiveDateTime,
    /// Optional end of the promotion window.
    pub ends_at: Option<NaiveDateTime>,
    /// Requested deal variant, e.g. `percentage_discount`.
    pub deal_type: String,
    /// Per-variant deal fields.
    #[serde(flatten)]
    pub deal: DealFields,
    /// Products the promotion covers.
    pub product_ids: Vec<i32>,
}

/// Sanitized creation payload handed to the lifecycle service.
#[derive(Debug, Clone)]
pub struct CreatePromotionPayload {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub deal_type: String,
    pub deal: DealFields,
    /// Distinct product ids in first-appearance order.
    pub product_ids: Vec<i32>,
}

impl CreatePromotionForm {
    /// Validates and sanitizes the payload.
    pub fn into_payload(self) -> PromotionFormResult<CreatePromotionPayload> {
        self.validate()?;

        let title = sanitize_inline_text(&self.title);
        if title.is_empty() {
            return Err(PromotionFormError::EmptyTitle);
        }

        let description = self
            .description
            .as_deref()
            .map(sanitize_multiline_text)
            .filter(|value| !value.is_empty());

        let product_ids = dedupe_preserving_order(&self.product_ids);
        if product_ids.is_empty() {
            return Err(PromotionFormError::NoProducts);
        }

        Ok(CreatePromotionPayload {
            title,
            description,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            deal_type: self.deal_type,
            deal: self.deal,
            product_ids,
        })
    }
}

/// Payload submitted when associating further products with a promotion.
#[derive(Debug, Deserialize, Validate)]
pub struct AddProductsForm {
    /// Products to add.
    #[validate(length(min = 1))]
    pub product_ids: Vec<i32>,
}

impl AddProductsForm {
    /// Validates the payload into a distinct product id list.
    pub fn into_product_ids(self) -> PromotionFormResult<Vec<i32>> {
        self.validate()?;

        let product_ids = dedupe_preserving_order(&self.product_ids);
        if product_ids.is_empty() {
            return Err(PromotionFormError::NoProducts);
        }

        Ok(product_ids)
    }
}

fn dedupe_preserving_order(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

fn sanitize_multiline_text(input: &str) -> String {
    input
        .lines()
        .map(sanitize_inline_text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}
