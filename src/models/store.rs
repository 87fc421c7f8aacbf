use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::store::Store as DomainStore;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::stores)]
pub struct Store {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::stores)]
pub struct NewStore<'a> {
    pub owner_id: i32,
    pub name: &'a str,
}

impl From<Store> for DomainStore {
    fn from(value: Store) -> Self {
        Self {
            id: value.id,
            owner_id: value.owner_id,
            name: value.name,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
