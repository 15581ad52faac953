pub mod ingredient_filter;
pub mod pagination;
pub mod query_params;
pub mod recipe_filter;
