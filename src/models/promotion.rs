use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::deal::DealConfig;
use crate::domain::promotion::{
    NewPromotion as DomainNewPromotion, Promotion as DomainPromotion,
    UpdatePromotion as DomainUpdatePromotion,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::promotions)]
pub struct Promotion {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub deal_type: String,
    pub percentage_off: Option<f64>,
    pub fixed_amount_off: Option<f64>,
    pub buy_quantity: Option<i32>,
    pub get_quantity: Option<i32>,
    pub bundle_price: Option<f64>,
    pub min_quantity: Option<i32>,
    pub quantity_discount: Option<f64>,
    pub voucher_value: Option<f64>,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::promotion_products)]
#[diesel(belongs_to(Promotion, foreign_key = promotion_id))]
pub struct PromotionProduct {
    pub id: i32,
    pub promotion_id: i32,
    pub product_id: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::promotion_products)]
pub struct NewPromotionProduct {
    pub promotion_id: i32,
    pub product_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::promotions)]
pub struct NewPromotion<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub deal_type: &'a str,
    pub percentage_off: Option<f64>,
    pub fixed_amount_off: Option<f64>,
    pub buy_quantity: Option<i32>,
    pub get_quantity: Option<i32>,
    pub bundle_price: Option<f64>,
    pub min_quantity: Option<i32>,
    pub quantity_discount: Option<f64>,
    pub voucher_value: Option<f64>,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::promotions)]
pub struct UpdatePromotion<'a> {
    pub title: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub is_active: Option<bool>,
    pub ends_at: Option<Option<NaiveDateTime>>,
    pub updated_at: NaiveDateTime,
}

impl Promotion {
    /// Reconstruct the typed deal configuration from the discriminator and
    /// the per-variant columns. `None` when the stored columns do not form
    /// the variant named by `deal_type`.
    pub fn deal_config(&self) -> Option<DealConfig> {
        match self.deal_type.as_str() {
            "percentage_discount" => self.percentage_off.map(|percentage_off| {
                DealConfig::PercentageDiscount { percentage_off }
            }),
            "fixed_discount" => self.fixed_amount_off.map(|fixed_amount_off| {
                DealConfig::FixedDiscount { fixed_amount_off }
            }),
            "bogo" => match (self.buy_quantity, self.get_quantity) {
                (Some(buy_quantity), Some(get_quantity)) => Some(DealConfig::Bogo {
                    buy_quantity,
                    get_quantity,
                }),
                _ => None,
            },
            "bundle" => self
                .bundle_price
                .map(|bundle_price| DealConfig::Bundle { bundle_price }),
            "quantity_discount" => match (self.min_quantity, self.quantity_discount) {
                (Some(min_quantity), Some(quantity_discount)) => {
                    Some(DealConfig::QuantityDiscount {
                        min_quantity,
                        quantity_discount,
                    })
                }
                _ => None,
            },
            "voucher" => self
                .voucher_value
                .map(|voucher_value| DealConfig::Voucher { voucher_value }),
            _ => None,
        }
    }

    /// Combine the row with its association rows into the domain shape.
    pub fn into_domain(self, product_ids: Vec<i32>) -> Option<DomainPromotion> {
        let deal = self.deal_config()?;
        Some(DomainPromotion {
            id: self.id,
            title: self.title,
            description: self.description,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
            deal,
            product_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewPromotion> for NewPromotion<'a> {
    fn from(value: &'a DomainNewPromotion) -> Self {
        let mut row = Self {
            title: value.title.as_str(),
            description: value.description.as_deref(),
            deal_type: value.deal.deal_type().as_str(),
            percentage_off: None,
            fixed_amount_off: None,
            buy_quantity: None,
            get_quantity: None,
            bundle_price: None,
            min_quantity: None,
            quantity_discount: None,
            voucher_value: None,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
            is_active: value.is_active,
            updated_at: value.updated_at,
        };

        match value.deal {
            DealConfig::PercentageDiscount { percentage_off } => {
                row.percentage_off = Some(percentage_off);
            }
            DealConfig::FixedDiscount { fixed_amount_off } => {
                row.fixed_amount_off = Some(fixed_amount_off);
            }
            DealConfig::Bogo {
                buy_quantity,
                get_quantity,
            } => {
                row.buy_quantity = Some(buy_quantity);
                row.get_quantity = Some(get_quantity);
            }
            DealConfig::Bundle { bundle_price } => {
                row.bundle_price = Some(bundle_price);
            }
            DealConfig::QuantityDiscount {
                min_quantity,
                quantity_discount,
            } => {
                row.min_quantity = Some(min_quantity);
                row.quantity_discount = Some(quantity_discount);
            }
            DealConfig::Voucher { voucher_value } => {
                row.voucher_value = Some(voucher_value);
            }
        }

        row
    }
}

impl<'a> From<&'a DomainUpdatePromotion> for UpdatePromotion<'a> {
    fn from(value: &'a DomainUpdatePromotion) -> Self {
        Self {
            title: value.title.as_deref(),
            description: value
                .description
                .as_ref()
                .map(|description| description.as_deref()),
            is_active: value.is_active,
            ends_at: value.ends_at,
            updated_at: value.updated_at,
        }
    }
}
