use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::tier::SubscriptionTier;

/// Lookup shape of a marketplace user. Account management lives outside the
/// promotions engine; the engine reads identity, display fields and the
/// subscription tier that gates promotion limits.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Unique identifier of the user.
    pub id: i32,
    /// Display name of the user.
    pub name: String,
    /// Email address of the user.
    pub email: String,
    /// Subscription level for merchant accounts.
    pub subscription_tier: SubscriptionTier,
    /// Timestamp for when the user record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the user record.
    pub updated_at: NaiveDateTime,
}
