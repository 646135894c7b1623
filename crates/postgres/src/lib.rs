//! PostgreSQL access authenticated with Entra ID access tokens.
//!
//! A [`TokenAuthDatabase`] obtains a token for the Azure Database for
//! PostgreSQL scope on every call, opens a single connection with the token
//! as its password, runs one unit of work and closes the connection.

pub mod config;
pub mod database;
pub mod error;
pub mod schema;

pub use config::PostgresConfig;
pub use database::{DemoDatabase, DemoUser, TokenAuthDatabase};
pub use error::DatabaseError;
