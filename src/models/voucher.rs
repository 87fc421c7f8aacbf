use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::voucher::{
    NewVoucherRedemption as DomainNewVoucherRedemption, RedemptionStatus,
    VoucherRedemption as DomainVoucherRedemption,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::voucher_redemptions)]
pub struct VoucherRedemption {
    pub id: i32,
    pub promotion_id: i32,
    pub store_id: i32,
    pub product_id: i32,
    pub consumer_id: i32,
    pub status: String,
    pub nonce: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub verified_at: Option<NaiveDateTime>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub confirmed_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::voucher_redemptions)]
pub struct NewVoucherRedemption<'a> {
    pub promotion_id: i32,
    pub store_id: i32,
    pub product_id: i32,
    pub consumer_id: i32,
    pub status: &'a str,
    pub nonce: &'a str,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl From<VoucherRedemption> for DomainVoucherRedemption {
    fn from(value: VoucherRedemption) -> Self {
        Self {
            id: value.id,
            promotion_id: value.promotion_id,
            store_id: value.store_id,
            product_id: value.product_id,
            consumer_id: value.consumer_id,
            status: RedemptionStatus::from(value.status.as_str()),
            nonce: value.nonce,
            issued_at: value.issued_at,
            expires_at: value.expires_at,
            verified_at: value.verified_at,
            confirmed_at: value.confirmed_at,
            confirmed_by: value.confirmed_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewVoucherRedemption> for NewVoucherRedemption<'a> {
    fn from(value: &'a DomainNewVoucherRedemption) -> Self {
        Self {
            promotion_id: value.promotion_id,
            store_id: value.store_id,
            product_id: value.product_id,
            consumer_id: value.consumer_id,
            // Redemptions always enter the state machine as pending.
            status: RedemptionStatus::Pending.as_str(),
            nonce: value.nonce.as_str(),
            issued_at: value.issued_at,
            expires_at: value.expires_at,
        }
    }
}
