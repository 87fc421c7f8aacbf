use diesel::prelude::*;

use crate::{
    domain::store::Store as DomainStore,
    models::store::Store as DbStore,
    repository::errors::RepositoryResult,
    repository::{DieselRepository, StoreReader},
};

impl StoreReader for DieselRepository {
    fn get_store_by_id(&self, id: i32) -> RepositoryResult<Option<DomainStore>> {
        use crate::schema::stores;

        let mut conn = self.conn()?;
        let store = stores::table
            .filter(stores::id.eq(id))
            .first::<DbStore>(&mut conn)
            .optional()?;

        Ok(store.map(Into::into))
    }
}
