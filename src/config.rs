use std::env;

use sqlx::postgres::PgPoolOptions;

use crate::{constants::DEFAULT_MAX_CONNECTIONS, error::QueryError, postgres::PgStore};

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub max_connections: u32,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| "JWT_SECRET must be set".to_string())?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .map_err(|_| format!("DATABASE_MAX_CONNECTIONS is not a number: {value}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(ApiConfig {
            database_url,
            jwt_secret,
            max_connections,
        })
    }

    pub async fn connect(&self) -> Result<PgStore, potion::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(QueryError::from)?;

        log::info!(
            "connected to database with {} max connections",
            self.max_connections
        );

        Ok(PgStore::new(pool))
    }
}
