use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lookup shape of a sellable product. Product management lives outside the
/// promotions engine; pricing and store linkage are what the engine reads.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    /// Unique identifier of the product.
    pub id: i32,
    /// Identifier of the store selling the product.
    pub store_id: i32,
    /// Human-readable name of the product.
    pub name: String,
    /// Listed price in major currency units.
    pub price: f64,
    /// ISO 4217 currency code associated with the price.
    pub currency: String,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}
