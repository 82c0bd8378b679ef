pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod notify;
pub mod store;
pub mod templates_structs;
