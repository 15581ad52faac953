use std::collections::BTreeMap;
use std::ops::Deref;

use diesel::prelude::*;
use serde::Serialize;
use tracing::{debug, trace_span};

use crate::database::schema::{ingredients, recipe_ingredients, shopping_carts};
use crate::error::AppResult;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Summed amounts keyed by (ingredient name, measurement unit).
///
/// Two ingredient records with the same name and unit land on the same row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    inner: BTreeMap<(String, String), i64>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub fn add_item(&mut self, name: &str, measurement_unit: &str, amount: i64) {
        self.inner
            .entry((name.to_owned(), measurement_unit.to_owned()))
            .and_modify(|total| *total += amount)
            .or_insert(amount);
    }

    pub fn for_user(connection: &mut SqliteConnection, user_id: i32) -> AppResult<Self> {
        let span = trace_span!("building shopping list", user_id);
        let _guard = span.enter();

        let in_cart = shopping_carts::table
            .filter(shopping_carts::user_id.eq(user_id))
            .select(shopping_carts::recipe_id);

        let lines: Vec<(String, String, i32)> = recipe_ingredients::table
            .inner_join(ingredients::table)
            .filter(recipe_ingredients::recipe_id.eq_any(in_cart))
            .select((
                ingredients::name,
                ingredients::measurement_unit,
                recipe_ingredients::amount,
            ))
            .load(connection)?;

        let mut list = ShoppingList::new();
        lines.iter().for_each(|(name, unit, amount)| {
            list.add_item(name, unit, i64::from(*amount));
        });

        debug!("{} cart lines merged into {} rows", lines.len(), list.len());
        Ok(list)
    }

    /// Rows sorted by (name, unit).
    pub fn rows(&self) -> Vec<ShoppingListRow> {
        self.inner
            .iter()
            .map(|((name, measurement_unit), total_amount)| ShoppingListRow {
                name: name.clone(),
                measurement_unit: measurement_unit.clone(),
                total_amount: *total_amount,
            })
            .collect()
    }

    pub fn render_text(&self) -> String {
        let mut text = String::from("Shopping list\n\n");
        for ((name, unit), amount) in self.iter() {
            text.push_str(&format!("{name} - {amount}, {unit}\n"));
        }
        text
    }
}

impl Deref for ShoppingList {
    type Target = BTreeMap<(String, String), i64>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::database::models::relation::RecipeRelation;
    use crate::test_support::{ingredient, recipe, tag, user};

    #[test]
    fn same_ingredient_across_recipes_is_summed() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let cook = user(&mut connection, "cook");
        let salt = ingredient(&mut connection, "Salt", "g");
        let water = ingredient(&mut connection, "Water", "ml");
        let soup = tag(&mut connection, "Soup", "soup");
        let a = recipe(&mut connection, cook.id, &[(salt.id, 5), (water.id, 500)], &[soup.id]);
        let b = recipe(&mut connection, cook.id, &[(salt.id, 3)], &[soup.id]);
        RecipeRelation::ShoppingCart
            .add(&mut connection, cook.id, a.id)
            .unwrap();
        RecipeRelation::ShoppingCart
            .add(&mut connection, cook.id, b.id)
            .unwrap();

        let list = ShoppingList::for_user(&mut connection, cook.id).unwrap();

        assert_eq!(
            list.rows(),
            vec![
                ShoppingListRow {
                    name: "Salt".to_owned(),
                    measurement_unit: "g".to_owned(),
                    total_amount: 8,
                },
                ShoppingListRow {
                    name: "Water".to_owned(),
                    measurement_unit: "ml".to_owned(),
                    total_amount: 500,
                },
            ]
        );
    }

    #[test]
    fn empty_cart_gives_no_rows() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let cook = user(&mut connection, "cook");

        let list = ShoppingList::for_user(&mut connection, cook.id).unwrap();

        assert!(list.rows().is_empty());
        assert_eq!(list.render_text(), "Shopping list\n\n");
    }

    #[test]
    fn rows_group_by_name_and_unit_not_identity() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let cook = user(&mut connection, "cook");
        let salt = ingredient(&mut connection, "Salt", "g");
        let same_salt = ingredient(&mut connection, "Salt", "g");
        let salt_pinch = ingredient(&mut connection, "Salt", "pinch");
        let soup = tag(&mut connection, "Soup", "soup");
        let a = recipe(
            &mut connection,
            cook.id,
            &[(salt.id, 2), (salt_pinch.id, 1)],
            &[soup.id],
        );
        let b = recipe(&mut connection, cook.id, &[(same_salt.id, 4)], &[soup.id]);
        RecipeRelation::ShoppingCart
            .add(&mut connection, cook.id, a.id)
            .unwrap();
        RecipeRelation::ShoppingCart
            .add(&mut connection, cook.id, b.id)
            .unwrap();

        let list = ShoppingList::for_user(&mut connection, cook.id).unwrap();

        assert_eq!(list.render_text(), "Shopping list\n\nSalt - 6, g\nSalt - 1, pinch\n");
    }

    #[test]
    fn other_users_carts_are_ignored() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let cook = user(&mut connection, "cook");
        let guest = user(&mut connection, "guest");
        let salt = ingredient(&mut connection, "Salt", "g");
        let soup = tag(&mut connection, "Soup", "soup");
        let a = recipe(&mut connection, cook.id, &[(salt.id, 5)], &[soup.id]);
        RecipeRelation::ShoppingCart
            .add(&mut connection, guest.id, a.id)
            .unwrap();

        assert!(ShoppingList::for_user(&mut connection, cook.id)
            .unwrap()
            .is_empty());
    }
}
