use axum::{
    extract::{Path, State},
    Json,
};

use crate::database::models::tag::Tag;
use crate::error::AppResult;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Tag>>> {
    let tags = state.run(Tag::all).await?;

    Ok(Json(tags))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(tag_id): Path<i32>,
) -> AppResult<Json<Tag>> {
    let tag = state.run(move |connection| Tag::find(connection, tag_id)).await?;

    Ok(Json(tag))
}
