use diesel::prelude::*;
use lombok::AllArgsConstructor;
use serde::{Deserialize, Serialize};

use crate::database::schema::tags;
use crate::error::{AppError, AppResult};

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[diesel(table_name = crate::database::schema::tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl Tag {
    pub fn all(connection: &mut SqliteConnection) -> AppResult<Vec<Tag>> {
        let tags = tags::table
            .order(tags::id.asc())
            .select(Tag::as_select())
            .load(connection)?;

        Ok(tags)
    }

    pub fn find(connection: &mut SqliteConnection, tag_id: i32) -> AppResult<Tag> {
        tags::table
            .find(tag_id)
            .select(Tag::as_select())
            .first(connection)
            .optional()?
            .ok_or_else(|| AppError::not_found("Tag"))
    }

    /// Fails on the first id that has no tag, in request order.
    pub fn ensure_exist(connection: &mut SqliteConnection, tag_ids: &[i32]) -> AppResult<()> {
        let known: Vec<i32> = tags::table
            .filter(tags::id.eq_any(tag_ids))
            .select(tags::id)
            .load(connection)?;

        match tag_ids.iter().find(|id| !known.contains(id)) {
            Some(missing) => Err(AppError::not_found(format!("Tag {missing}"))),
            None => Ok(()),
        }
    }
}

#[derive(Insertable, Deserialize, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::tags)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl NewTag {
    pub fn insert(&self, connection: &mut SqliteConnection) -> AppResult<Tag> {
        let tag = diesel::insert_into(tags::table)
            .values(self)
            .returning(Tag::as_returning())
            .get_result(connection)?;

        Ok(tag)
    }
}
