use diesel::prelude::*;

use crate::{
    domain::user::User as DomainUser,
    models::user::User as DbUser,
    repository::errors::RepositoryResult,
    repository::{DieselRepository, UserReader},
};

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: i32) -> RepositoryResult<Option<DomainUser>> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let user = users::table
            .filter(users::id.eq(id))
            .first::<DbUser>(&mut conn)
            .optional()?;

        Ok(user.map(Into::into))
    }
}
