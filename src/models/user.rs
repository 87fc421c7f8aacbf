use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::tier::SubscriptionTier;
use crate::domain::user::User as DomainUser;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub subscription_tier: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subscription_tier: &'a str,
}

impl From<User> for DomainUser {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            subscription_tier: SubscriptionTier::from(value.subscription_tier.as_str()),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
