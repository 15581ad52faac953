use std::collections::HashSet;

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use tracing::{debug, trace_span};

use crate::database::models::{recipe::Recipe, relation::RecipeRelation};
use crate::database::schema::{favorites, recipe_tags, recipes, shopping_carts, tags};
use crate::error::AppResult;
use crate::filters::{pagination::Pagination, query_params::QueryParams};
use crate::viewer::Viewer;

/// Recipe listing criteria taken from the query string.
///
/// `is_favorited` and `is_in_shopping_cart` only ever narrow the result when
/// they are true *and* the viewer is known. A false value is not a negation
/// and an anonymous viewer makes both no-ops.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<i32>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_params(params: &QueryParams) -> Self {
        Self {
            tags: params
                .get_all("tags")
                .iter()
                .filter(|slug| !slug.is_empty())
                .cloned()
                .collect(),
            author: params.get_parsed("author"),
            is_favorited: params.get_bool("is_favorited").unwrap_or(false),
            is_in_shopping_cart: params.get_bool("is_in_shopping_cart").unwrap_or(false),
        }
    }

    fn relations(&self) -> impl Iterator<Item = RecipeRelation> {
        [
            (self.is_favorited, RecipeRelation::Favorite),
            (self.is_in_shopping_cart, RecipeRelation::ShoppingCart),
        ]
        .into_iter()
        .filter_map(|(enabled, relation)| enabled.then_some(relation))
    }

    pub fn apply<'a>(
        &self,
        mut query: recipes::BoxedQuery<'a, Sqlite>,
        viewer: &Viewer,
    ) -> recipes::BoxedQuery<'a, Sqlite> {
        if !self.tags.is_empty() {
            let tagged = recipe_tags::table
                .inner_join(tags::table)
                .filter(tags::slug.eq_any(self.tags.clone()))
                .select(recipe_tags::recipe_id);
            query = query.filter(recipes::id.eq_any(tagged));
        }

        if let Some(author) = self.author {
            query = query.filter(recipes::author_id.eq(author));
        }

        if let Some(user_id) = viewer.user_id() {
            for relation in self.relations() {
                query = match relation {
                    RecipeRelation::Favorite => query.filter(
                        recipes::id.eq_any(
                            favorites::table
                                .filter(favorites::user_id.eq(user_id))
                                .select(favorites::recipe_id),
                        ),
                    ),
                    RecipeRelation::ShoppingCart => query.filter(
                        recipes::id.eq_any(
                            shopping_carts::table
                                .filter(shopping_carts::user_id.eq(user_id))
                                .select(shopping_carts::recipe_id),
                        ),
                    ),
                };
            }
        }

        query
    }

    /// Newest first. Returns the total match count along with the page.
    pub fn load_page(
        &self,
        connection: &mut SqliteConnection,
        viewer: &Viewer,
        pagination: Pagination,
    ) -> AppResult<(i64, Vec<Recipe>)> {
        let span = trace_span!("filtering recipes", filter = ?self);
        let _guard = span.enter();

        let count = self
            .apply(recipes::table.into_boxed(), viewer)
            .count()
            .get_result(connection)?;

        let page = self
            .apply(recipes::table.into_boxed(), viewer)
            .order((recipes::pub_date.desc(), recipes::id.desc()))
            .limit(pagination.limit)
            .offset(pagination.offset())
            .select(Recipe::as_select())
            .load(connection)?;

        debug!("{count} recipes matched, {} on page {}", page.len(), pagination.page);
        Ok((count, page))
    }
}

/// Per-viewer flags for a batch of recipes, looked up at query time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeAnnotations {
    favorited: HashSet<i32>,
    in_shopping_cart: HashSet<i32>,
}

impl RecipeAnnotations {
    pub fn load(
        connection: &mut SqliteConnection,
        viewer: &Viewer,
        recipe_ids: &[i32],
    ) -> AppResult<Self> {
        let Some(user_id) = viewer.user_id() else {
            return Ok(Self::default());
        };

        Ok(Self {
            favorited: RecipeRelation::Favorite.recipe_ids_among(connection, user_id, recipe_ids)?,
            in_shopping_cart: RecipeRelation::ShoppingCart.recipe_ids_among(
                connection,
                user_id,
                recipe_ids,
            )?,
        })
    }

    pub fn is_favorited(&self, recipe_id: i32) -> bool {
        self.favorited.contains(&recipe_id)
    }

    pub fn is_in_shopping_cart(&self, recipe_id: i32) -> bool {
        self.in_shopping_cart.contains(&recipe_id)
    }
}
