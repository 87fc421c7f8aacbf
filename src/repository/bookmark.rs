use diesel::prelude::*;

use crate::{
    repository::errors::RepositoryResult,
    repository::{BookmarkReader, DieselRepository},
};

impl BookmarkReader for DieselRepository {
    fn list_bookmarker_ids(
        &self,
        product_ids: &[i32],
        store_ids: &[i32],
    ) -> RepositoryResult<Vec<i32>> {
        use crate::schema::bookmarks;

        if product_ids.is_empty() && store_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;

        let product_refs: Vec<Option<i32>> = product_ids.iter().copied().map(Some).collect();
        let store_refs: Vec<Option<i32>> = store_ids.iter().copied().map(Some).collect();

        let user_ids = bookmarks::table
            .filter(
                bookmarks::product_id
                    .eq_any(product_refs)
                    .or(bookmarks::store_id.eq_any(store_refs)),
            )
            .select(bookmarks::user_id)
            .distinct()
            .load::<i32>(&mut conn)?;

        Ok(user_ids)
    }
}
