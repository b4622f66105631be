//! SQLite persistence adapter.
//!
//! Provides the SQLite-backed [`SqliteStore`] using Diesel ORM with
//! embedded migrations.

pub mod database;
pub mod store;

pub use database::connection::{create_pool, run_migrations, DbPool};
pub use store::SqliteStore;
