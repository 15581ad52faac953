use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::api::views::{RecipeView, ShortRecipeView};
use crate::database::models::{
    recipe::{Recipe, RecipePayload},
    relation::RecipeRelation,
};
use crate::error::AppResult;
use crate::filters::{
    pagination::{Page, Pagination},
    query_params::QueryParams,
    recipe_filter::RecipeFilter,
};
use crate::shopping_list::ShoppingList;
use crate::state::AppState;
use crate::viewer::Viewer;

pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<RecipeView>>> {
    let params: QueryParams = query.into_iter().collect();
    let filter = RecipeFilter::from_params(&params);
    let pagination = Pagination::from_params(&params);

    let page = state
        .run(move |connection| {
            let (count, recipes) = filter.load_page(connection, &viewer, pagination)?;
            let results = RecipeView::load_many(connection, &viewer, recipes)?;
            Ok(Page { count, results })
        })
        .await?;

    Ok(Json(page))
}

pub async fn retrieve(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(recipe_id): Path<i32>,
) -> AppResult<Json<RecipeView>> {
    let view = state
        .run(move |connection| {
            let recipe = Recipe::find(connection, recipe_id)?;
            RecipeView::load(connection, &viewer, recipe)
        })
        .await?;

    Ok(Json(view))
}

pub async fn create(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<RecipePayload>,
) -> AppResult<(StatusCode, Json<RecipeView>)> {
    let author_id = viewer.require_user()?.id;

    let view = state
        .run(move |connection| {
            let recipe = Recipe::create(connection, author_id, &payload)?;
            RecipeView::load(connection, &viewer, recipe)
        })
        .await?;

    info!("Recipe {} published by user {author_id}", view.id);
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<RecipePayload>,
) -> AppResult<Json<RecipeView>> {
    viewer.require_user()?;

    let view = state
        .run(move |connection| {
            let recipe = Recipe::find(connection, recipe_id)?;
            viewer.ensure_can_edit(&recipe)?;

            let recipe = Recipe::update(connection, recipe_id, &payload)?;
            RecipeView::load(connection, &viewer, recipe)
        })
        .await?;

    Ok(Json(view))
}

pub async fn delete(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(recipe_id): Path<i32>,
) -> AppResult<StatusCode> {
    viewer.require_user()?;

    state
        .run(move |connection| {
            let recipe = Recipe::find(connection, recipe_id)?;
            viewer.ensure_can_edit(&recipe)?;
            Recipe::delete(connection, recipe_id)
        })
        .await?;

    info!("Recipe {recipe_id} deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn add_relation(
    state: AppState,
    viewer: Viewer,
    recipe_id: i32,
    relation: RecipeRelation,
) -> AppResult<(StatusCode, Json<ShortRecipeView>)> {
    let user_id = viewer.require_user()?.id;

    let recipe = state
        .run(move |connection| relation.add(connection, user_id, recipe_id))
        .await?;

    Ok((StatusCode::CREATED, Json(ShortRecipeView::from(recipe))))
}

async fn remove_relation(
    state: AppState,
    viewer: Viewer,
    recipe_id: i32,
    relation: RecipeRelation,
) -> AppResult<StatusCode> {
    let user_id = viewer.require_user()?.id;

    state
        .run(move |connection| relation.remove(connection, user_id, recipe_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(recipe_id): Path<i32>,
) -> AppResult<(StatusCode, Json<ShortRecipeView>)> {
    add_relation(state, viewer, recipe_id, RecipeRelation::Favorite).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(recipe_id): Path<i32>,
) -> AppResult<StatusCode> {
    remove_relation(state, viewer, recipe_id, RecipeRelation::Favorite).await
}

pub async fn add_to_shopping_cart(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(recipe_id): Path<i32>,
) -> AppResult<(StatusCode, Json<ShortRecipeView>)> {
    add_relation(state, viewer, recipe_id, RecipeRelation::ShoppingCart).await
}

pub async fn remove_from_shopping_cart(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(recipe_id): Path<i32>,
) -> AppResult<StatusCode> {
    remove_relation(state, viewer, recipe_id, RecipeRelation::ShoppingCart).await
}

pub async fn download_shopping_cart(
    State(state): State<AppState>,
    viewer: Viewer,
) -> AppResult<Response> {
    let user_id = viewer.require_user()?.id;

    let list = state
        .run(move |connection| ShoppingList::for_user(connection, user_id))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        list.render_text(),
    )
        .into_response())
}
