use diesel::prelude::*;

use crate::{
    domain::product::Product as DomainProduct,
    models::product::Product as DbProduct,
    repository::errors::RepositoryResult,
    repository::{DieselRepository, ProductReader},
};

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::id.eq(id))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(Into::into))
    }

    fn list_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<DomainProduct>> {
        use crate::schema::products;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .order(products::id.asc())
            .load::<DbProduct>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
