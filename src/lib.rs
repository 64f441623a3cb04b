// Phreddit - threaded discussion forum backend

// Core domain logic
pub mod comment_tree;
pub mod models;
pub mod search;
pub mod sort;
pub mod timefmt;

// Persistence and operations
pub mod database;
pub mod service;

// HTTP surface and process wiring
pub mod app_state;
pub mod config;
pub mod routes;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
