use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle states of a voucher redemption.
///
/// Transitions are forward-only: `Pending -> Verified -> Confirmed`, with
/// `Pending -> Expired` and `Verified -> Rejected` as alternate terminal
/// edges. `Confirmed`, `Expired` and `Rejected` are terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// Token issued, not yet presented at point of sale.
    Pending,
    /// Merchant has checked the token; value not yet delivered.
    Verified,
    /// Value delivered; the voucher is consumed.
    Confirmed,
    /// The token aged out before verification.
    Expired,
    /// The merchant declined the redemption, or confirmation failed.
    Rejected,
}

impl RedemptionStatus {
    /// Stable string form used in the voucher_redemptions table.
    pub fn as_str(self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Verified => "verified",
            RedemptionStatus::Confirmed => "confirmed",
            RedemptionStatus::Expired => "expired",
            RedemptionStatus::Rejected => "rejected",
        }
    }

    /// Whether no further transitions are possible from this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RedemptionStatus::Confirmed | RedemptionStatus::Expired | RedemptionStatus::Rejected
        )
    }
}

impl From<&str> for RedemptionStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => RedemptionStatus::Pending,
            "verified" => RedemptionStatus::Verified,
            "confirmed" => RedemptionStatus::Confirmed,
            "expired" => RedemptionStatus::Expired,
            // Unknown stored values are treated as terminal.
            _ => RedemptionStatus::Rejected,
        }
    }
}

impl std::fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain representation of a single-use voucher redemption.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VoucherRedemption {
    /// Unique identifier of the redemption.
    pub id: i32,
    /// Promotion the voucher was issued against.
    pub promotion_id: i32,
    /// Store where the voucher is redeemable.
    pub store_id: i32,
    /// Product the voucher applies to.
    pub product_id: i32,
    /// Consumer the voucher was issued to.
    pub consumer_id: i32,
    /// Current lifecycle state.
    pub status: RedemptionStatus,
    /// Single-use nonce embedded in the signed token.
    pub nonce: String,
    /// When the token was issued.
    pub issued_at: NaiveDateTime,
    /// When the pending token stops being redeemable.
    pub expires_at: NaiveDateTime,
    /// When the merchant verified the token, if ever.
    pub verified_at: Option<NaiveDateTime>,
    /// When the redemption was confirmed, if ever.
    pub confirmed_at: Option<NaiveDateTime>,
    /// Merchant user who confirmed the redemption, if any.
    pub confirmed_by: Option<i32>,
    /// Timestamp for when the redemption record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the redemption record.
    pub updated_at: NaiveDateTime,
}

/// Payload required to insert a new redemption in the `Pending` state.
#[derive(Debug, Clone)]
pub struct NewVoucherRedemption {
    /// Promotion the voucher is issued against.
    pub promotion_id: i32,
    /// Store where the voucher is redeemable.
    pub store_id: i32,
    /// Product the voucher applies to.
    pub product_id: i32,
    /// Consumer the voucher is issued to.
    pub consumer_id: i32,
    /// Single-use nonce embedded in the signed token.
    pub nonce: String,
    /// When the token was issued.
    pub issued_at: NaiveDateTime,
    /// When the pending token stops being redeemable.
    pub expires_at: NaiveDateTime,
}
