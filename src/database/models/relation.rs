use std::collections::HashSet;

use diesel::prelude::*;
use lombok::AllArgsConstructor;
use tracing::{debug, trace_span};

use crate::database::models::recipe::Recipe;
use crate::database::schema::{favorites, shopping_carts};
use crate::error::{AppError, AppResult};

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::favorites)]
pub struct NewFavorite {
    pub user_id: i32,
    pub recipe_id: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::shopping_carts)]
pub struct NewShoppingCartEntry {
    pub user_id: i32,
    pub recipe_id: i32,
}

/// The per-user recipe relations that share add/remove semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeRelation {
    Favorite,
    ShoppingCart,
}

impl RecipeRelation {
    fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::ShoppingCart => "the shopping cart",
        }
    }

    /// Inserts the (user, recipe) pair and relies on the store's unique
    /// constraint to reject a second insert.
    pub fn add(
        self,
        connection: &mut SqliteConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> AppResult<Recipe> {
        let span = trace_span!("adding recipe relation", relation = ?self, user_id, recipe_id);
        let _guard = span.enter();

        let recipe = Recipe::find(connection, recipe_id)?;

        let inserted = match self {
            RecipeRelation::Favorite => diesel::insert_into(favorites::table)
                .values(NewFavorite::new(user_id, recipe_id))
                .execute(connection),
            RecipeRelation::ShoppingCart => diesel::insert_into(shopping_carts::table)
                .values(NewShoppingCartEntry::new(user_id, recipe_id))
                .execute(connection),
        };

        inserted.map_err(|e| match AppError::from(e) {
            AppError::DuplicateRelation(_) => AppError::DuplicateRelation(format!(
                "Recipe is already in {}",
                self.label()
            )),
            other => other,
        })?;

        debug!("Recipe {recipe_id} added to {} of user {user_id}", self.label());
        Ok(recipe)
    }

    pub fn remove(
        self,
        connection: &mut SqliteConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> AppResult<()> {
        let span = trace_span!("removing recipe relation", relation = ?self, user_id, recipe_id);
        let _guard = span.enter();

        Recipe::find(connection, recipe_id)?;

        let deleted = match self {
            RecipeRelation::Favorite => diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            )
            .execute(connection)?,
            RecipeRelation::ShoppingCart => diesel::delete(
                shopping_carts::table
                    .filter(shopping_carts::user_id.eq(user_id))
                    .filter(shopping_carts::recipe_id.eq(recipe_id)),
            )
            .execute(connection)?,
        };

        if deleted == 0 {
            return Err(AppError::MissingRelation(format!(
                "Recipe is not in {}",
                self.label()
            )));
        }

        Ok(())
    }

    /// The subset of `recipe_ids` related to `user_id`.
    pub fn recipe_ids_among(
        self,
        connection: &mut SqliteConnection,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> AppResult<HashSet<i32>> {
        let ids: Vec<i32> = match self {
            RecipeRelation::Favorite => favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::recipe_id.eq_any(recipe_ids))
                .select(favorites::recipe_id)
                .load(connection)?,
            RecipeRelation::ShoppingCart => shopping_carts::table
                .filter(shopping_carts::user_id.eq(user_id))
                .filter(shopping_carts::recipe_id.eq_any(recipe_ids))
                .select(shopping_carts::recipe_id)
                .load(connection)?,
        };

        Ok(ids.into_iter().collect())
    }
}
