//! # quikchat-database
//!
//! PostgreSQL connection management, embedded migrations, and the
//! relational implementations of the core storage and directory traits.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{PgEventStore, PgGroupDirectory, PgUserDirectory};
