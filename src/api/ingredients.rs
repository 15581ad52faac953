use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::database::models::ingredient::Ingredient;
use crate::error::AppResult;
use crate::filters::{ingredient_filter::IngredientFilter, query_params::QueryParams};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Json<Vec<Ingredient>>> {
    let params: QueryParams = query.into_iter().collect();
    let filter = IngredientFilter::from_params(&params);

    let ingredients = state.run(move |connection| filter.load(connection)).await?;

    Ok(Json(ingredients))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i32>,
) -> AppResult<Json<Ingredient>> {
    let ingredient = state
        .run(move |connection| Ingredient::find(connection, ingredient_id))
        .await?;

    Ok(Json(ingredient))
}
