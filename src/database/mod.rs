pub mod connection;
pub mod functions;
pub mod models;
pub mod schema;
