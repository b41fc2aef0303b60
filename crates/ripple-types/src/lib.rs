pub mod api;
pub mod events;
pub mod keys;
pub mod models;
pub mod query;
