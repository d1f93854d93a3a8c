//! MySQL-backed store adapter.

mod snapshot;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    query,
};

#[derive(Clone)]
pub struct MysqlRepositories {
    pool: Arc<MySqlPool>,
}

impl MysqlRepositories {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Open a pool capped at `max_connections`; reload queries queue behind
    /// request traffic once the cap is reached.
    pub async fn connect(url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
        MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}
