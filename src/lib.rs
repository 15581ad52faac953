#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod data_loader;
pub mod database;
pub mod error;
pub mod filters;
pub mod shopping_list;
pub mod state;
pub mod viewer;

#[cfg(test)]
mod test_support;
