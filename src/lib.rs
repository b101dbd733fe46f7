pub mod app;
pub mod cli;
pub mod database;
pub mod factory;
pub mod persistence;
pub mod render;
pub mod store;
pub mod terminal;
pub mod types;
pub mod utils;
