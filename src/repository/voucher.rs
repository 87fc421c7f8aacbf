use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    domain::voucher::{
        NewVoucherRedemption as DomainNewVoucherRedemption, RedemptionStatus,
        VoucherRedemption as DomainVoucherRedemption,
    },
    models::voucher::{
        NewVoucherRedemption as DbNewVoucherRedemption, VoucherRedemption as DbVoucherRedemption,
    },
    repository::errors::RepositoryResult,
    repository::{DieselRepository, VoucherReader, VoucherWriter},
};

impl VoucherReader for DieselRepository {
    fn get_redemption_by_id(&self, id: i32) -> RepositoryResult<Option<DomainVoucherRedemption>> {
        use crate::schema::voucher_redemptions;

        let mut conn = self.conn()?;
        let redemption = voucher_redemptions::table
            .filter(voucher_redemptions::id.eq(id))
            .first::<DbVoucherRedemption>(&mut conn)
            .optional()?;

        Ok(redemption.map(Into::into))
    }
}

impl VoucherWriter for DieselRepository {
    fn create_redemption(
        &self,
        new_redemption: &DomainNewVoucherRedemption,
    ) -> RepositoryResult<DomainVoucherRedemption> {
        use crate::schema::voucher_redemptions;

        let mut conn = self.conn()?;
        let db_new = DbNewVoucherRedemption::from(new_redemption);

        let created = diesel::insert_into(voucher_redemptions::table)
            .values(&db_new)
            .get_result::<DbVoucherRedemption>(&mut conn)?;

        Ok(created.into())
    }

    fn mark_verified(&self, id: i32) -> RepositoryResult<Option<DomainVoucherRedemption>> {
        use crate::schema::voucher_redemptions;

        let mut conn = self.conn()?;
        let now = chrono::Local::now().naive_utc();

        // Conditional update: only a still-pending row is moved forward.
        let updated = diesel::update(
            voucher_redemptions::table
                .filter(voucher_redemptions::id.eq(id))
                .filter(voucher_redemptions::status.eq(RedemptionStatus::Pending.as_str())),
        )
        .set((
            voucher_redemptions::status.eq(RedemptionStatus::Verified.as_str()),
            voucher_redemptions::verified_at.eq(Some(now)),
            voucher_redemptions::updated_at.eq(now),
        ))
        .get_result::<DbVoucherRedemption>(&mut conn)
        .optional()?;

        Ok(updated.map(Into::into))
    }

    fn mark_confirmed(
        &self,
        id: i32,
        merchant_id: i32,
    ) -> RepositoryResult<Option<DomainVoucherRedemption>> {
        use crate::schema::voucher_redemptions;

        let mut conn = self.conn()?;
        let now = chrono::Local::now().naive_utc();

        // The single-use guarantee lives here: of two racing confirmation
        // attempts, only one finds the row still verified.
        let updated = diesel::update(
            voucher_redemptions::table
                .filter(voucher_redemptions::id.eq(id))
                .filter(voucher_redemptions::status.eq(RedemptionStatus::Verified.as_str())),
        )
        .set((
            voucher_redemptions::status.eq(RedemptionStatus::Confirmed.as_str()),
            voucher_redemptions::confirmed_at.eq(Some(now)),
            voucher_redemptions::confirmed_by.eq(Some(merchant_id)),
            voucher_redemptions::updated_at.eq(now),
        ))
        .get_result::<DbVoucherRedemption>(&mut conn)
        .optional()?;

        Ok(updated.map(Into::into))
    }

    fn mark_rejected(&self, id: i32) -> RepositoryResult<Option<DomainVoucherRedemption>> {
        use crate::schema::voucher_redemptions;

        let mut conn = self.conn()?;
        let now = chrono::Local::now().naive_utc();

        let updated = diesel::update(
            voucher_redemptions::table
                .filter(voucher_redemptions::id.eq(id))
                .filter(voucher_redemptions::status.eq(RedemptionStatus::Verified.as_str())),
        )
        .set((
            voucher_redemptions::status.eq(RedemptionStatus::Rejected.as_str()),
            voucher_redemptions::updated_at.eq(now),
        ))
        .get_result::<DbVoucherRedemption>(&mut conn)
        .optional()?;

        Ok(updated.map(Into::into))
    }

    fn mark_expired(&self, id: i32) -> RepositoryResult<Option<DomainVoucherRedemption>> {
        use crate::schema::voucher_redemptions;

        let mut conn = self.conn()?;
        let now = chrono::Local::now().naive_utc();

        let updated = diesel::update(
            voucher_redemptions::table
                .filter(voucher_redemptions::id.eq(id))
                .filter(voucher_redemptions::status.eq(RedemptionStatus::Pending.as_str())),
        )
        .set((
            voucher_redemptions::status.eq(RedemptionStatus::Expired.as_str()),
            voucher_redemptions::updated_at.eq(now),
        ))
        .get_result::<DbVoucherRedemption>(&mut conn)
        .optional()?;

        Ok(updated.map(Into::into))
    }

    fn expire_stale(&self, now: NaiveDateTime) -> RepositoryResult<usize> {
        use crate::schema::voucher_redemptions;

        let mut conn = self.conn()?;

        let expired = diesel::update(
            voucher_redemptions::table
                .filter(voucher_redemptions::status.eq(RedemptionStatus::Pending.as_str()))
                .filter(voucher_redemptions::expires_at.le(now)),
        )
        .set((
            voucher_redemptions::status.eq(RedemptionStatus::Expired.as_str()),
            voucher_redemptions::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

        Ok(expired)
    }
}
