use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::api::views::{SubscriptionView, UserView};
use crate::database::models::{follow::Follow, user::User};
use crate::error::{AppError, AppResult};
use crate::filters::{
    pagination::{Page, Pagination},
    query_params::QueryParams,
};
use crate::state::AppState;
use crate::viewer::Viewer;

pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<UserView>>> {
    let params: QueryParams = query.into_iter().collect();
    let pagination = Pagination::from_params(&params);

    let page = state
        .run(move |connection| {
            let (count, users) = User::page(connection, pagination.limit, pagination.offset())?;
            let results = UserView::load_many(connection, &viewer, users)?;
            Ok(Page { count, results })
        })
        .await?;

    Ok(Json(page))
}

pub async fn retrieve(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(user_id): Path<i32>,
) -> AppResult<Json<UserView>> {
    let view = state
        .run(move |connection| {
            let user = User::find(connection, user_id)?;
            UserView::load(connection, &viewer, user)
        })
        .await?;

    Ok(Json(view))
}

pub async fn me(viewer: Viewer) -> AppResult<Json<UserView>> {
    let user = viewer.require_user()?.clone();

    Ok(Json(UserView::new(user, false)))
}

pub async fn subscriptions(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<SubscriptionView>>> {
    let user_id = viewer.require_user()?.id;
    let params: QueryParams = query.into_iter().collect();
    let pagination = Pagination::from_params(&params);
    let recipes_limit = params.get_parsed::<usize>("recipes_limit");

    let page = state
        .run(move |connection| {
            let (count, authors) =
                Follow::authors_page(connection, user_id, pagination.limit, pagination.offset())?;
            let results = SubscriptionView::load_many(connection, authors, recipes_limit)?;
            Ok(Page { count, results })
        })
        .await?;

    Ok(Json(page))
}

pub async fn subscribe(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(author_id): Path<i32>,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<(StatusCode, Json<SubscriptionView>)> {
    let user_id = viewer.require_user()?.id;
    let params: QueryParams = query.into_iter().collect();
    let recipes_limit = params.get_parsed::<usize>("recipes_limit");

    let view = state
        .run(move |connection| {
            let author = Follow::subscribe(connection, user_id, author_id)?;
            let views = SubscriptionView::load_many(connection, vec![author], recipes_limit)?;
            Ok(views.into_iter().next())
        })
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    info!("User {user_id} subscribed to {author_id}");
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(author_id): Path<i32>,
) -> AppResult<StatusCode> {
    let user_id = viewer.require_user()?.id;

    state
        .run(move |connection| Follow::unsubscribe(connection, user_id, author_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
