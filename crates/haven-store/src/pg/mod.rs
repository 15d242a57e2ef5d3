//! PostgreSQL-backed store.
//!
//! One `PgStore` wraps the connection pool; the per-entity trait
//! implementations live in the sibling modules.

mod assignment;
mod connection;
mod invitation;
mod migration;
mod organization;
mod reset;
mod resource;
mod token;
mod user;

pub use connection::DatabasePool;
pub use migration::run_migrations;

use sqlx::PgPool;

/// PostgreSQL implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
