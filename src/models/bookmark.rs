use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::bookmarks)]
pub struct Bookmark {
    pub id: i32,
    pub user_id: i32,
    pub product_id: Option<i32>,
    pub store_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bookmarks)]
pub struct NewBookmark {
    pub user_id: i32,
    pub product_id: Option<i32>,
    pub store_id: Option<i32>,
}
