use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::{
    domain::promotion::{
        NewPromotion as DomainNewPromotion, Promotion as DomainPromotion, PromotionListQuery,
        UpdatePromotion as DomainUpdatePromotion,
    },
    models::promotion::{
        NewPromotion as DbNewPromotion, NewPromotionProduct, Promotion as DbPromotion,
        PromotionProduct as DbPromotionProduct, UpdatePromotion as DbUpdatePromotion,
    },
    repository::errors::{RepositoryError, RepositoryResult},
    repository::{DieselRepository, PromotionReader, PromotionWriter},
};

impl PromotionReader for DieselRepository {
    fn get_promotion_by_id(&self, id: i32) -> RepositoryResult<Option<DomainPromotion>> {
        use crate::schema::promotions;

        let mut conn = self.conn()?;
        let promotion = promotions::table
            .filter(promotions::id.eq(id))
            .first::<DbPromotion>(&mut conn)
            .optional()?;

        let Some(promotion) = promotion else {
            return Ok(None);
        };

        let product_ids = load_product_ids(&mut conn, promotion.id)?;
        into_domain(promotion, product_ids).map(Some)
    }

    fn list_promotions(&self, query: PromotionListQuery) -> RepositoryResult<Vec<DomainPromotion>> {
        use crate::schema::{products, promotion_products, promotions, stores};

        let mut conn = self.conn()?;

        let mut items = promotions::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(is_active) = query.is_active {
            items = items.filter(promotions::is_active.eq(is_active));
        }

        if let Some(deal_type) = query.deal_type {
            items = items.filter(promotions::deal_type.eq(deal_type.as_str()));
        }

        if let Some(owner_id) = query.owner_id {
            let owned = promotion_products::table
                .inner_join(products::table.inner_join(stores::table))
                .filter(stores::owner_id.eq(owner_id))
                .select(promotion_products::promotion_id)
                .distinct()
                .load::<i32>(&mut conn)?;
            items = items.filter(promotions::id.eq_any(owned));
        }

        let rows = items
            .order(promotions::created_at.desc())
            .load::<DbPromotion>(&mut conn)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let promotion_ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let mut id_map = load_product_ids_for_promotions(&mut conn, &promotion_ids)?;

        let mut promotions = Vec::with_capacity(rows.len());
        for row in rows {
            let product_ids = id_map.remove(&row.id).unwrap_or_default();
            promotions.push(into_domain(row, product_ids)?);
        }

        Ok(promotions)
    }

    fn count_live_promotions(&self, owner_id: i32, now: NaiveDateTime) -> RepositoryResult<usize> {
        use crate::schema::{products, promotion_products, promotions, stores};

        let mut conn = self.conn()?;

        let owned = promotion_products::table
            .inner_join(products::table.inner_join(stores::table))
            .filter(stores::owner_id.eq(owner_id))
            .select(promotion_products::promotion_id)
            .distinct()
            .load::<i32>(&mut conn)?;

        if owned.is_empty() {
            return Ok(0);
        }

        let count = promotions::table
            .filter(promotions::id.eq_any(owned))
            .filter(promotions::is_active.eq(true))
            .filter(promotions::starts_at.le(now))
            .filter(
                promotions::ends_at
                    .is_null()
                    .or(promotions::ends_at.gt(Some(now))),
            )
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count as usize)
    }

    fn get_promotion_owner(&self, promotion_id: i32) -> RepositoryResult<Option<i32>> {
        use crate::schema::{products, promotion_products, stores};

        let mut conn = self.conn()?;
        let owner_id = promotion_products::table
            .inner_join(products::table.inner_join(stores::table))
            .filter(promotion_products::promotion_id.eq(promotion_id))
            .select(stores::owner_id)
            .first::<i32>(&mut conn)
            .optional()?;

        Ok(owner_id)
    }
}

impl PromotionWriter for DieselRepository {
    fn create_promotion(
        &self,
        new_promotion: &DomainNewPromotion,
        product_ids: &[i32],
    ) -> RepositoryResult<DomainPromotion> {
        use crate::schema::{promotion_products, promotions};

        let mut conn = self.conn()?;
        let db_new = DbNewPromotion::from(new_promotion);
        let distinct_ids: BTreeSet<i32> = product_ids.iter().copied().collect();

        conn.transaction::<DomainPromotion, RepositoryError, _>(|conn| {
            let created = diesel::insert_into(promotions::table)
                .values(&db_new)
                .get_result::<DbPromotion>(conn)?;

            let associations: Vec<NewPromotionProduct> = distinct_ids
                .iter()
                .map(|product_id| NewPromotionProduct {
                    promotion_id: created.id,
                    product_id: *product_id,
                })
                .collect();

            diesel::insert_into(promotion_products::table)
                .values(&associations)
                .execute(conn)?;

            into_domain(created, distinct_ids.into_iter().collect())
        })
    }

    fn add_promotion_products(
        &self,
        promotion_id: i32,
        product_ids: &[i32],
    ) -> RepositoryResult<DomainPromotion> {
        use crate::schema::{promotion_products, promotions};

        let mut conn = self.conn()?;

        conn.transaction::<DomainPromotion, RepositoryError, _>(|conn| {
            let promotion = promotions::table
                .filter(promotions::id.eq(promotion_id))
                .first::<DbPromotion>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let existing = load_product_ids(conn, promotion_id)?;
            let existing_set: BTreeSet<i32> = existing.iter().copied().collect();

            let additions: Vec<NewPromotionProduct> = product_ids
                .iter()
                .copied()
                .collect::<BTreeSet<i32>>()
                .into_iter()
                .filter(|product_id| !existing_set.contains(product_id))
                .map(|product_id| NewPromotionProduct {
                    promotion_id,
                    product_id,
                })
                .collect();

            if !additions.is_empty() {
                diesel::insert_into(promotion_products::table)
                    .values(&additions)
                    .execute(conn)?;
            }

            let product_ids = load_product_ids(conn, promotion_id)?;
            into_domain(promotion, product_ids)
        })
    }

    fn update_promotion(
        &self,
        promotion_id: i32,
        updates: &DomainUpdatePromotion,
    ) -> RepositoryResult<DomainPromotion> {
        use crate::schema::promotions;

        let mut conn = self.conn()?;
        let db_updates = DbUpdatePromotion::from(updates);

        let updated = diesel::update(promotions::table.filter(promotions::id.eq(promotion_id)))
            .set(&db_updates)
            .get_result::<DbPromotion>(&mut conn)
            .optional()?
            .ok_or(RepositoryError::NotFound)?;

        let product_ids = load_product_ids(&mut conn, promotion_id)?;
        into_domain(updated, product_ids)
    }
}

fn into_domain(row: DbPromotion, product_ids: Vec<i32>) -> RepositoryResult<DomainPromotion> {
    let id = row.id;
    row.into_domain(product_ids).ok_or_else(|| {
        RepositoryError::InvalidData(format!("promotion {id} has inconsistent deal columns"))
    })
}

fn load_product_ids(conn: &mut SqliteConnection, promotion_id: i32) -> RepositoryResult<Vec<i32>> {
    use crate::schema::promotion_products;

    let ids = promotion_products::table
        .filter(promotion_products::promotion_id.eq(promotion_id))
        .order(promotion_products::product_id.asc())
        .select(promotion_products::product_id)
        .load::<i32>(conn)?;

    Ok(ids)
}

fn load_product_ids_for_promotions(
    conn: &mut SqliteConnection,
    promotion_ids: &[i32],
) -> RepositoryResult<HashMap<i32, Vec<i32>>> {
    use crate::schema::promotion_products;

    if promotion_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = promotion_products::table
        .filter(promotion_products::promotion_id.eq_any(promotion_ids))
        .order(promotion_products::product_id.asc())
        .load::<DbPromotionProduct>(conn)?;

    let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in rows {
        map.entry(row.promotion_id).or_default().push(row.product_id);
    }

    Ok(map)
}
