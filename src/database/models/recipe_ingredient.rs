use diesel::prelude::*;
use lombok::AllArgsConstructor;
use serde::{Deserialize, Serialize};

use crate::database::models::{ingredient::Ingredient, recipe::Recipe};
use crate::database::schema::recipe_ingredients;
use crate::error::{AppError, AppResult};

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq, Hash,
)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecipeIngredient {
    pub id: i32,
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub amount: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct NewRecipeIngredient {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub amount: i32,
}

/// One requested line of a recipe payload, `id` is the ingredient id.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

impl RecipeIngredient {
    pub fn for_recipe(
        connection: &mut SqliteConnection,
        recipe_id: i32,
    ) -> AppResult<Vec<RecipeIngredient>> {
        let lines = recipe_ingredients::table
            .filter(recipe_ingredients::recipe_id.eq(recipe_id))
            .order(recipe_ingredients::id.asc())
            .select(RecipeIngredient::as_select())
            .load(connection)?;

        Ok(lines)
    }

    /// Deletes every line of the recipe and writes `lines` in order.
    ///
    /// Not transactional by itself: callers wrap it together with the parent
    /// recipe write so a failing line leaves the previous set untouched.
    pub fn replace_for_recipe(
        connection: &mut SqliteConnection,
        recipe_id: i32,
        lines: &[IngredientAmount],
    ) -> AppResult<()> {
        diesel::delete(
            recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
        )
        .execute(connection)?;

        for line in lines {
            if line.amount < 1 {
                return Err(AppError::InvalidQuantity);
            }

            let ingredient = Ingredient::find(connection, line.id)?;

            diesel::insert_into(recipe_ingredients::table)
                .values(NewRecipeIngredient::new(recipe_id, ingredient.id, line.amount))
                .execute(connection)
                .map_err(|e| match AppError::from(e) {
                    AppError::DuplicateRelation(_) => AppError::validation(format!(
                        "Ingredient {} is listed more than once",
                        ingredient.name
                    )),
                    other => other,
                })?;
        }

        Ok(())
    }
}
