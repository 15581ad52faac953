use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, trace_span};

use crate::database::models::{
    ingredient::Ingredient,
    recipe_ingredient::{IngredientAmount, RecipeIngredient},
    recipe_tag::RecipeTag,
    tag::Tag,
    user::User,
};
use crate::database::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags, users};
use crate::error::{AppError, AppResult};

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub pub_date: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
struct NewRecipe<'a> {
    author_id: i32,
    name: &'a str,
    text: &'a str,
    cooking_time: i32,
    image: &'a str,
    pub_date: NaiveDateTime,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
struct RecipeChangeset<'a> {
    name: Option<&'a str>,
    text: Option<&'a str>,
    cooking_time: Option<i32>,
    image: Option<&'a str>,
    pub_date: NaiveDateTime,
}

/// Body of a create or update request. Absent fields are left untouched on
/// update and rejected on create (except `image`).
#[derive(Deserialize, Debug, Default, Clone)]
pub struct RecipePayload {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
}

impl RecipePayload {
    const NAME_MAX_LENGTH: usize = 200;

    pub fn validate(&self) -> AppResult<()> {
        if let Some(ingredients) = &self.ingredients {
            if ingredients.is_empty() {
                return Err(AppError::validation("At least one ingredient is required"));
            }
            if ingredients.iter().any(|line| line.amount < 1) {
                return Err(AppError::InvalidQuantity);
            }
            if !ingredients.iter().map(|line| line.id).all_unique() {
                return Err(AppError::validation("Ingredients must not repeat"));
            }
        }

        if let Some(tags) = &self.tags {
            if tags.is_empty() {
                return Err(AppError::validation("At least one tag is required"));
            }
            if !tags.iter().all_unique() {
                return Err(AppError::validation("Tags must not repeat"));
            }
        }

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Recipe name must not be empty"));
            }
            if name.chars().count() > Self::NAME_MAX_LENGTH {
                return Err(AppError::validation(format!(
                    "Recipe name must be at most {} characters",
                    Self::NAME_MAX_LENGTH
                )));
            }
        }

        if matches!(&self.text, Some(text) if text.trim().is_empty()) {
            return Err(AppError::validation("Recipe text must not be empty"));
        }

        if matches!(self.cooking_time, Some(minutes) if minutes < 1) {
            return Err(AppError::validation(
                "Cooking time must be at least 1 minute",
            ));
        }

        Ok(())
    }
}

fn require<'a, T>(value: &'a Option<T>, field: &str) -> AppResult<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| AppError::validation(format!("Field {field} is required")))
}

impl Recipe {
    pub fn find(connection: &mut SqliteConnection, recipe_id: i32) -> AppResult<Recipe> {
        recipes::table
            .find(recipe_id)
            .select(Recipe::as_select())
            .first(connection)
            .optional()?
            .ok_or_else(|| AppError::not_found("Recipe"))
    }

    pub fn create(
        connection: &mut SqliteConnection,
        author_id: i32,
        payload: &RecipePayload,
    ) -> AppResult<Recipe> {
        let span = trace_span!("creating recipe", author_id);
        let _guard = span.enter();

        payload.validate()?;
        let ingredients = require(&payload.ingredients, "ingredients")?;
        let tags = require(&payload.tags, "tags")?;
        let new_recipe = NewRecipe {
            author_id,
            name: require(&payload.name, "name")?,
            text: require(&payload.text, "text")?,
            cooking_time: *require(&payload.cooking_time, "cooking_time")?,
            image: payload.image.as_deref().unwrap_or_default(),
            pub_date: Utc::now().naive_utc(),
        };

        let recipe = connection.transaction::<_, AppError, _>(|connection| {
            let recipe = diesel::insert_into(recipes::table)
                .values(&new_recipe)
                .returning(Recipe::as_returning())
                .get_result(connection)?;

            RecipeTag::replace_for_recipe(connection, recipe.id, tags)?;
            RecipeIngredient::replace_for_recipe(connection, recipe.id, ingredients)?;

            Ok(recipe)
        })?;

        debug!("Created recipe {} for author {author_id}", recipe.id);
        Ok(recipe)
    }

    /// Applies the present fields of `payload`. Tag and ingredient sets are
    /// replaced wholesale, inside the same transaction as the parent row.
    pub fn update(
        connection: &mut SqliteConnection,
        recipe_id: i32,
        payload: &RecipePayload,
    ) -> AppResult<Recipe> {
        let span = trace_span!("updating recipe", recipe_id);
        let _guard = span.enter();

        payload.validate()?;
        let changeset = RecipeChangeset {
            name: payload.name.as_deref(),
            text: payload.text.as_deref(),
            cooking_time: payload.cooking_time,
            image: payload.image.as_deref(),
            pub_date: Utc::now().naive_utc(),
        };

        connection.transaction::<_, AppError, _>(|connection| {
            let recipe = diesel::update(recipes::table.find(recipe_id))
                .set(&changeset)
                .returning(Recipe::as_returning())
                .get_result(connection)
                .optional()?
                .ok_or_else(|| AppError::not_found("Recipe"))?;

            if let Some(tags) = &payload.tags {
                RecipeTag::replace_for_recipe(connection, recipe_id, tags)?;
            }
            if let Some(ingredients) = &payload.ingredients {
                RecipeIngredient::replace_for_recipe(connection, recipe_id, ingredients)?;
            }

            Ok(recipe)
        })
    }

    pub fn delete(connection: &mut SqliteConnection, recipe_id: i32) -> AppResult<()> {
        let deleted = diesel::delete(recipes::table.find(recipe_id)).execute(connection)?;
        if deleted == 0 {
            return Err(AppError::not_found("Recipe"));
        }

        debug!("Deleted recipe {recipe_id}");
        Ok(())
    }

    pub fn latest_by_authors(
        connection: &mut SqliteConnection,
        authors: &[User],
    ) -> AppResult<Vec<Vec<Recipe>>> {
        let recipes = Recipe::belonging_to(authors)
            .order((recipes::pub_date.desc(), recipes::id.desc()))
            .select(Recipe::as_select())
            .load(connection)?;

        Ok(recipes.grouped_by(authors))
    }
}

/// A recipe together with everything its full representation shows.
#[derive(Debug, Clone)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    pub author: User,
    pub tags: Vec<Tag>,
    pub lines: Vec<(RecipeIngredient, Ingredient)>,
}

impl RecipeDetails {
    pub fn load(
        connection: &mut SqliteConnection,
        recipes: Vec<Recipe>,
    ) -> AppResult<Vec<RecipeDetails>> {
        let span = trace_span!("loading recipe details", count = recipes.len());
        let _guard = span.enter();

        let tags_per_recipe = RecipeTag::belonging_to(&recipes)
            .inner_join(tags::table)
            .order(recipe_tags::id.asc())
            .select((RecipeTag::as_select(), Tag::as_select()))
            .load::<(RecipeTag, Tag)>(connection)?
            .grouped_by(&recipes);

        let lines_per_recipe = RecipeIngredient::belonging_to(&recipes)
            .inner_join(ingredients::table)
            .order(recipe_ingredients::id.asc())
            .select((RecipeIngredient::as_select(), Ingredient::as_select()))
            .load::<(RecipeIngredient, Ingredient)>(connection)?
            .grouped_by(&recipes);

        let author_ids = recipes.iter().map(|recipe| recipe.author_id).unique().collect_vec();
        let authors: HashMap<i32, User> = users::table
            .filter(users::id.eq_any(&author_ids))
            .select(User::as_select())
            .load::<User>(connection)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        recipes
            .into_iter()
            .zip(tags_per_recipe)
            .zip(lines_per_recipe)
            .map(|((recipe, tags), lines)| {
                let author = authors
                    .get(&recipe.author_id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found("Author"))?;

                Ok(RecipeDetails {
                    recipe,
                    author,
                    tags: tags.into_iter().map(|(_, tag)| tag).collect(),
                    lines,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::test_support::{ingredient, recipe_payload as payload, tag, user};

    fn line_set(connection: &mut SqliteConnection, recipe_id: i32) -> Vec<(i32, i32)> {
        RecipeIngredient::for_recipe(connection, recipe_id)
            .unwrap()
            .into_iter()
            .map(|line| (line.ingredient_id, line.amount))
            .collect()
    }

    #[test]
    fn create_writes_recipe_tags_and_lines() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");
        let flour = ingredient(&mut connection, "Flour", "g");
        let milk = ingredient(&mut connection, "Milk", "ml");
        let breakfast = tag(&mut connection, "Breakfast", "breakfast");

        let recipe = Recipe::create(
            &mut connection,
            author.id,
            &payload(&[(flour.id, 200), (milk.id, 300)], &[breakfast.id]),
        )
        .unwrap();

        assert_eq!(recipe.author_id, author.id);
        assert_eq!(
            line_set(&mut connection, recipe.id),
            vec![(flour.id, 200), (milk.id, 300)]
        );

        let details = RecipeDetails::load(&mut connection, vec![recipe]).unwrap();
        assert_eq!(details[0].tags, vec![breakfast]);
        assert_eq!(details[0].author, author);
        assert_eq!(details[0].lines.len(), 2);
    }

    #[test]
    fn create_rejects_zero_amount_before_writing() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");
        let flour = ingredient(&mut connection, "Flour", "g");
        let tag = tag(&mut connection, "Breakfast", "breakfast");

        let error = Recipe::create(
            &mut connection,
            author.id,
            &payload(&[(flour.id, 0)], &[tag.id]),
        )
        .unwrap_err();

        assert!(matches!(error, AppError::InvalidQuantity));
        let count: i64 = recipes::table.count().get_result(&mut connection).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn create_with_unknown_ingredient_leaves_no_recipe_behind() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");
        let flour = ingredient(&mut connection, "Flour", "g");
        let tag = tag(&mut connection, "Breakfast", "breakfast");

        let error = Recipe::create(
            &mut connection,
            author.id,
            &payload(&[(flour.id, 10), (999, 1)], &[tag.id]),
        )
        .unwrap_err();

        assert!(matches!(error, AppError::NotFound(_)));
        let count: i64 = recipes::table.count().get_result(&mut connection).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn failed_update_keeps_previous_ingredient_set() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");
        let flour = ingredient(&mut connection, "Flour", "g");
        let milk = ingredient(&mut connection, "Milk", "ml");
        let eggs = ingredient(&mut connection, "Eggs", "pcs");
        let sugar = ingredient(&mut connection, "Sugar", "g");
        let tag = tag(&mut connection, "Breakfast", "breakfast");
        let recipe = Recipe::create(
            &mut connection,
            author.id,
            &payload(&[(flour.id, 200), (milk.id, 300)], &[tag.id]),
        )
        .unwrap();
        let before = line_set(&mut connection, recipe.id);

        // Third of four lines references a missing ingredient.
        let mut update = payload(
            &[(eggs.id, 2), (sugar.id, 30), (4242, 1), (flour.id, 100)],
            &[tag.id],
        );
        update.name = Some("Renamed".to_owned());
        let error = Recipe::update(&mut connection, recipe.id, &update).unwrap_err();

        assert!(matches!(error, AppError::NotFound(_)));
        assert_eq!(line_set(&mut connection, recipe.id), before);
        assert_eq!(Recipe::find(&mut connection, recipe.id).unwrap().name, "Pancakes");
    }

    #[test]
    fn failed_line_write_inside_update_rolls_back() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");
        let flour = ingredient(&mut connection, "Flour", "g");
        let milk = ingredient(&mut connection, "Milk", "ml");
        let eggs = ingredient(&mut connection, "Eggs", "pcs");
        let tag = tag(&mut connection, "Breakfast", "breakfast");
        let recipe = Recipe::create(
            &mut connection,
            author.id,
            &payload(&[(flour.id, 200)], &[tag.id]),
        )
        .unwrap();

        let lines = [
            IngredientAmount { id: milk.id, amount: 1 },
            IngredientAmount { id: eggs.id, amount: 2 },
            IngredientAmount { id: flour.id, amount: 0 },
            IngredientAmount { id: milk.id, amount: 4 },
        ];
        let result = connection.transaction::<(), AppError, _>(|connection| {
            RecipeIngredient::replace_for_recipe(connection, recipe.id, &lines)
        });

        assert!(matches!(result, Err(AppError::InvalidQuantity)));
        assert_eq!(line_set(&mut connection, recipe.id), vec![(flour.id, 200)]);
    }

    #[test]
    fn update_replaces_lines_and_keeps_absent_fields() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");
        let flour = ingredient(&mut connection, "Flour", "g");
        let milk = ingredient(&mut connection, "Milk", "ml");
        let tag = tag(&mut connection, "Breakfast", "breakfast");
        let recipe = Recipe::create(
            &mut connection,
            author.id,
            &payload(&[(flour.id, 200)], &[tag.id]),
        )
        .unwrap();

        let update = RecipePayload {
            ingredients: Some(vec![IngredientAmount { id: milk.id, amount: 50 }]),
            cooking_time: Some(5),
            ..RecipePayload::default()
        };
        let updated = Recipe::update(&mut connection, recipe.id, &update).unwrap();

        assert_eq!(updated.cooking_time, 5);
        assert_eq!(updated.name, "Pancakes");
        assert!(updated.pub_date >= recipe.pub_date);
        assert_eq!(line_set(&mut connection, recipe.id), vec![(milk.id, 50)]);
    }

    #[test]
    fn payload_validation_rejects_repeats_and_bad_times() {
        let repeated = payload(&[(1, 1), (1, 2)], &[1]);
        assert!(matches!(repeated.validate(), Err(AppError::Validation(_))));

        let repeated_tags = payload(&[(1, 1)], &[1, 1]);
        assert!(matches!(repeated_tags.validate(), Err(AppError::Validation(_))));

        let mut instant = payload(&[(1, 1)], &[1]);
        instant.cooking_time = Some(0);
        assert!(matches!(instant.validate(), Err(AppError::Validation(_))));

        let empty = payload(&[], &[1]);
        assert!(matches!(empty.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn create_requires_mandatory_fields() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");

        let error = Recipe::create(&mut connection, author.id, &RecipePayload::default())
            .unwrap_err();

        assert_eq!(error.to_string(), "Field ingredients is required");
    }

    #[test]
    fn deleting_recipe_cascades_to_lines() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let author = user(&mut connection, "anna");
        let flour = ingredient(&mut connection, "Flour", "g");
        let tag = tag(&mut connection, "Breakfast", "breakfast");
        let recipe = Recipe::create(
            &mut connection,
            author.id,
            &payload(&[(flour.id, 200)], &[tag.id]),
        )
        .unwrap();

        Recipe::delete(&mut connection, recipe.id).unwrap();

        assert!(line_set(&mut connection, recipe.id).is_empty());
        assert!(matches!(
            Recipe::delete(&mut connection, recipe.id),
            Err(AppError::NotFound(_))
        ));
    }
}
