//! Response bodies. Everything that depends on who is asking is resolved
//! here, per request.

use std::collections::HashMap;

use diesel::SqliteConnection;
use itertools::Itertools;
use serde::Serialize;

use crate::database::models::{
    follow::Follow,
    recipe::{Recipe, RecipeDetails},
    tag::Tag,
    user::User,
};
use crate::error::{AppError, AppResult};
use crate::filters::recipe_filter::RecipeAnnotations;
use crate::viewer::Viewer;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }

    pub fn load_many(
        connection: &mut SqliteConnection,
        viewer: &Viewer,
        users: Vec<User>,
    ) -> AppResult<Vec<UserView>> {
        let followed = match viewer.user_id() {
            Some(viewer_id) => {
                let ids = users.iter().map(|user| user.id).collect_vec();
                Follow::followed_among(connection, viewer_id, &ids)?
            }
            None => Default::default(),
        };

        Ok(users
            .into_iter()
            .map(|user| {
                let is_subscribed = followed.contains(&user.id);
                UserView::new(user, is_subscribed)
            })
            .collect())
    }

    pub fn load(connection: &mut SqliteConnection, viewer: &Viewer, user: User) -> AppResult<Self> {
        Self::load_many(connection, viewer, vec![user])?
            .pop()
            .ok_or_else(|| AppError::Internal("user view was not built".to_owned()))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientLineView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeView {
    pub id: i32,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<IngredientLineView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeView {
    pub fn load_many(
        connection: &mut SqliteConnection,
        viewer: &Viewer,
        recipes: Vec<Recipe>,
    ) -> AppResult<Vec<RecipeView>> {
        let ids = recipes.iter().map(|recipe| recipe.id).collect_vec();
        let annotations = RecipeAnnotations::load(connection, viewer, &ids)?;
        let details = RecipeDetails::load(connection, recipes)?;

        let authors = details.iter().map(|d| d.author.clone()).unique().collect_vec();
        let authors: HashMap<i32, UserView> = UserView::load_many(connection, viewer, authors)?
            .into_iter()
            .map(|author| (author.id, author))
            .collect();

        details
            .into_iter()
            .map(|details| {
                let author = authors.get(&details.author.id).cloned().ok_or_else(|| {
                    AppError::Internal(format!("author {} was not loaded", details.author.id))
                })?;

                Ok(RecipeView {
                    id: details.recipe.id,
                    tags: details.tags,
                    author,
                    ingredients: details
                        .lines
                        .into_iter()
                        .map(|(line, ingredient)| IngredientLineView {
                            id: ingredient.id,
                            name: ingredient.name,
                            measurement_unit: ingredient.measurement_unit,
                            amount: line.amount,
                        })
                        .collect(),
                    is_favorited: annotations.is_favorited(details.recipe.id),
                    is_in_shopping_cart: annotations.is_in_shopping_cart(details.recipe.id),
                    name: details.recipe.name,
                    image: details.recipe.image,
                    text: details.recipe.text,
                    cooking_time: details.recipe.cooking_time,
                })
            })
            .collect()
    }

    pub fn load(connection: &mut SqliteConnection, viewer: &Viewer, recipe: Recipe) -> AppResult<Self> {
        Self::load_many(connection, viewer, vec![recipe])?
            .pop()
            .ok_or_else(|| AppError::Internal("recipe view was not built".to_owned()))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortRecipeView {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for ShortRecipeView {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<ShortRecipeView>,
    pub recipes_count: usize,
}

impl SubscriptionView {
    /// `recipes_limit` caps the embedded list, `recipes_count` is always the
    /// full total.
    pub fn load_many(
        connection: &mut SqliteConnection,
        authors: Vec<User>,
        recipes_limit: Option<usize>,
    ) -> AppResult<Vec<SubscriptionView>> {
        let recipes = Recipe::latest_by_authors(connection, &authors)?;

        Ok(authors
            .into_iter()
            .zip(recipes)
            .map(|(author, recipes)| {
                let recipes_count = recipes.len();
                let shown = recipes_limit.unwrap_or(recipes_count);

                SubscriptionView {
                    author: UserView::new(author, true),
                    recipes: recipes
                        .into_iter()
                        .take(shown)
                        .map(ShortRecipeView::from)
                        .collect(),
                    recipes_count,
                }
            })
            .collect())
    }
}
