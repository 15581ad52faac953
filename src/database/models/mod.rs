pub mod auth_token;
pub mod follow;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod relation;
pub mod tag;
pub mod user;
