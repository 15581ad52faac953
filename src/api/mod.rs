pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/recipes/", get(recipes::list).post(recipes::create))
        .route(
            "/api/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/api/recipes/:id/",
            get(recipes::retrieve)
                .patch(recipes::update)
                .delete(recipes::delete),
        )
        .route(
            "/api/recipes/:id/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/api/recipes/:id/shopping_cart/",
            post(recipes::add_to_shopping_cart).delete(recipes::remove_from_shopping_cart),
        )
        .route("/api/ingredients/", get(ingredients::list))
        .route("/api/ingredients/:id/", get(ingredients::retrieve))
        .route("/api/tags/", get(tags::list))
        .route("/api/tags/:id/", get(tags::retrieve))
        .route("/api/users/", get(users::list))
        .route("/api/users/me/", get(users::me))
        .route("/api/users/subscriptions/", get(users::subscriptions))
        .route("/api/users/:id/", get(users::retrieve))
        .route(
            "/api/users/:id/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .with_state(state)
}
