use diesel::prelude::*;
use itertools::Itertools;
use lombok::AllArgsConstructor;
use serde::Deserialize;
use tracing::trace_span;

use crate::database::schema::users;
use crate::error::{AppError, AppResult};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Hash)]
#[diesel(table_name = crate::database::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

impl User {
    pub fn find(connection: &mut SqliteConnection, user_id: i32) -> AppResult<User> {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(connection)
            .optional()?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub fn page(
        connection: &mut SqliteConnection,
        limit: i64,
        offset: i64,
    ) -> AppResult<(i64, Vec<User>)> {
        let span = trace_span!("loading users page");
        let _guard = span.enter();

        let count = users::table.count().get_result(connection)?;
        let page = users::table
            .order(users::id.asc())
            .limit(limit)
            .offset(offset)
            .select(User::as_select())
            .load(connection)?;

        Ok((count, page))
    }
}

#[derive(Insertable, Deserialize, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::users)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
}

impl NewUser {
    const MAX_LENGTH: usize = 50;

    pub fn validate(&self) -> AppResult<()> {
        validate_username(&self.username)?;

        if !self.email.contains('@') {
            return Err(AppError::validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }

        for (field, value) in [
            ("email", &self.email),
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{field} must not be empty")));
            }
            if value.chars().count() > Self::MAX_LENGTH {
                return Err(AppError::validation(format!(
                    "{field} must be at most {} characters",
                    Self::MAX_LENGTH
                )));
            }
        }

        Ok(())
    }

    pub fn insert(&self, connection: &mut SqliteConnection) -> AppResult<User> {
        self.validate()?;

        diesel::insert_into(users::table)
            .values(self)
            .returning(User::as_returning())
            .get_result(connection)
            .map_err(|e| match AppError::from(e) {
                AppError::DuplicateRelation(_) => AppError::DuplicateRelation(format!(
                    "A user with username {} or email {} already exists",
                    self.username, self.email
                )),
                other => other,
            })
    }
}

/// `me` is reserved for the current-user route.
pub fn validate_username(value: &str) -> AppResult<()> {
    if value.to_lowercase() == "me" {
        return Err(AppError::validation("Invalid username: me"));
    }

    let invalid_symbols = value
        .chars()
        .filter(|c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')))
        .unique()
        .join(", ");

    if !invalid_symbols.is_empty() {
        return Err(AppError::validation(format!(
            "Invalid characters in username: {invalid_symbols}"
        )));
    }

    Ok(())
}
