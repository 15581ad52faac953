use diesel::prelude::*;
use lombok::AllArgsConstructor;

use crate::database::models::{recipe::Recipe, tag::Tag};
use crate::database::schema::recipe_tags;
use crate::error::AppResult;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Tag))]
#[diesel(table_name = crate::database::schema::recipe_tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecipeTag {
    pub id: i32,
    pub recipe_id: i32,
    pub tag_id: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::recipe_tags)]
pub struct NewRecipeTag {
    pub recipe_id: i32,
    pub tag_id: i32,
}

impl RecipeTag {
    pub fn replace_for_recipe(
        connection: &mut SqliteConnection,
        recipe_id: i32,
        tag_ids: &[i32],
    ) -> AppResult<()> {
        Tag::ensure_exist(connection, tag_ids)?;

        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
            .execute(connection)?;

        let rows: Vec<_> = tag_ids
            .iter()
            .map(|&tag_id| NewRecipeTag::new(recipe_id, tag_id))
            .collect();

        diesel::insert_into(recipe_tags::table)
            .values(&rows)
            .execute(connection)?;

        Ok(())
    }
}
