pub mod crawlers;
pub mod domain;
pub mod errors;
pub mod models;
pub mod processing;
pub mod repository;
pub mod server;
