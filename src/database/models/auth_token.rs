use diesel::prelude::*;
use lombok::AllArgsConstructor;

use crate::database::models::user::User;
use crate::database::schema::{auth_tokens, users};
use crate::error::AppResult;

#[derive(Queryable, Selectable, Insertable, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::auth_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuthToken {
    pub token: String,
    pub user_id: i32,
}

impl AuthToken {
    pub fn insert(&self, connection: &mut SqliteConnection) -> AppResult<()> {
        diesel::insert_into(auth_tokens::table)
            .values(self)
            .execute(connection)?;

        Ok(())
    }

    pub fn resolve(connection: &mut SqliteConnection, token: &str) -> AppResult<Option<User>> {
        let user = auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::token.eq(token))
            .select(User::as_select())
            .first(connection)
            .optional()?;

        Ok(user)
    }
}
