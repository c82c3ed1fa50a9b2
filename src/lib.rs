pub mod accounts;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod feed;
pub mod follows;
pub mod forms;
pub mod media;
pub mod models;
pub mod pagination;
pub mod render;
pub mod routes;

#[cfg(test)]
mod testing;
