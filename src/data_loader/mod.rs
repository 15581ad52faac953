pub mod data_loader;
pub mod json_loader;
