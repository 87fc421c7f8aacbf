use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lookup shape of a merchant store. Store management itself lives outside
/// the promotions engine; only identity and ownership are consumed here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Store {
    /// Unique identifier of the store.
    pub id: i32,
    /// Identifier of the merchant user owning the store.
    pub owner_id: i32,
    /// Human-readable name of the store.
    pub name: String,
    /// Timestamp for when the store record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the store record.
    pub updated_at: NaiveDateTime,
}
