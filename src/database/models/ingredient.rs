use diesel::prelude::*;
use lombok::AllArgsConstructor;
use serde::{Deserialize, Serialize};

use crate::database::schema::ingredients;
use crate::error::{AppError, AppResult};

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[diesel(table_name = crate::database::schema::ingredients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl Ingredient {
    pub fn find(connection: &mut SqliteConnection, ingredient_id: i32) -> AppResult<Ingredient> {
        ingredients::table
            .find(ingredient_id)
            .select(Ingredient::as_select())
            .first(connection)
            .optional()?
            .ok_or_else(|| AppError::not_found(format!("Ingredient {ingredient_id}")))
    }
}

#[derive(Insertable, Deserialize, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

impl NewIngredient {
    pub fn insert(&self, connection: &mut SqliteConnection) -> AppResult<Ingredient> {
        let ingredient = diesel::insert_into(ingredients::table)
            .values(self)
            .returning(Ingredient::as_returning())
            .get_result(connection)?;

        Ok(ingredient)
    }

    pub fn insert_all(
        connection: &mut SqliteConnection,
        new_ingredients: &[NewIngredient],
    ) -> AppResult<usize> {
        let inserted = diesel::insert_into(ingredients::table)
            .values(new_ingredients)
            .execute(connection)?;

        Ok(inserted)
    }
}
