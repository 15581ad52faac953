//! Seeding helpers shared by the unit tests.

use diesel::SqliteConnection;

use crate::database::models::{
    ingredient::{Ingredient, NewIngredient},
    recipe::{Recipe, RecipePayload},
    recipe_ingredient::IngredientAmount,
    tag::{NewTag, Tag},
    user::{NewUser, User},
};

pub(crate) fn user(connection: &mut SqliteConnection, username: &str) -> User {
    NewUser::new(
        format!("{username}@example.com"),
        username.to_owned(),
        "Test".to_owned(),
        "User".to_owned(),
        false,
    )
    .insert(connection)
    .expect("insert user")
}

pub(crate) fn ingredient(connection: &mut SqliteConnection, name: &str, unit: &str) -> Ingredient {
    NewIngredient::new(name.to_owned(), unit.to_owned())
        .insert(connection)
        .expect("insert ingredient")
}

pub(crate) fn tag(connection: &mut SqliteConnection, name: &str, slug: &str) -> Tag {
    NewTag::new(name.to_owned(), format!("#{slug}"), slug.to_owned())
        .insert(connection)
        .expect("insert tag")
}

pub(crate) fn recipe_payload(lines: &[(i32, i32)], tags: &[i32]) -> RecipePayload {
    RecipePayload {
        ingredients: Some(
            lines
                .iter()
                .map(|&(id, amount)| IngredientAmount { id, amount })
                .collect(),
        ),
        tags: Some(tags.to_vec()),
        name: Some("Pancakes".to_owned()),
        text: Some("Mix and fry".to_owned()),
        cooking_time: Some(20),
        image: None,
    }
}

pub(crate) fn recipe(
    connection: &mut SqliteConnection,
    author_id: i32,
    lines: &[(i32, i32)],
    tags: &[i32],
) -> Recipe {
    Recipe::create(connection, author_id, &recipe_payload(lines, tags)).expect("create recipe")
}
