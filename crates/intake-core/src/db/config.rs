//! Database connection configuration

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use super::{DbError, DbResult};

/// Connection and pool settings
///
/// `url` wins when set; otherwise the discrete host/port/database/user/
/// password fields are used.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            database: "intake".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Load configuration from environment variables
    ///
    /// Recognized variables: `DATABASE_URL`, `DB_HOST`, `DB_PORT`,
    /// `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_MAX_CONNECTIONS`,
    /// `DB_MIN_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> DbResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.url = Some(url);
        }

        if let Ok(host) = std::env::var("DB_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("DB_PORT") {
            config.port = port
                .parse()
                .map_err(|_| DbError::config(format!("DB_PORT is not a port number: {}", port)))?;
        }

        if let Ok(database) = std::env::var("DB_NAME") {
            config.database = database;
        }

        if let Ok(user) = std::env::var("DB_USER") {
            config.user = user;
        }

        if let Ok(password) = std::env::var("DB_PASSWORD") {
            config.password = password;
        }

        if let Ok(max) = std::env::var("DB_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .map_err(|_| DbError::config(format!("DB_MAX_CONNECTIONS is not a number: {}", max)))?;
        }

        if let Ok(min) = std::env::var("DB_MIN_CONNECTIONS") {
            config.min_connections = min
                .parse()
                .map_err(|_| DbError::config(format!("DB_MIN_CONNECTIONS is not a number: {}", min)))?;
        }

        if let Ok(timeout) = std::env::var("DB_ACQUIRE_TIMEOUT") {
            config.acquire_timeout_secs = timeout
                .parse()
                .map_err(|_| DbError::config(format!("DB_ACQUIRE_TIMEOUT is not a number: {}", timeout)))?;
        }

        Ok(config)
    }

    /// Check pool bounds before building a pool
    pub fn validate(&self) -> DbResult<()> {
        if self.max_connections == 0 {
            return Err(DbError::config("max_connections must be greater than zero"));
        }
        if self.min_connections > self.max_connections {
            return Err(DbError::config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    pub(crate) fn connect_options(&self) -> DbResult<PgConnectOptions> {
        match &self.url {
            Some(url) => url
                .parse()
                .map_err(|e| DbError::config(format!("invalid DATABASE_URL: {}", e))),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .database(&self.database)
                .username(&self.user)
                .password(&self.password)),
        }
    }

    pub(crate) fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert!(config.url.is_none());
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("DATABASE_URL", "postgresql://localhost/intake_test");
        std::env::set_var("DB_MAX_CONNECTIONS", "3");

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(
            config.url.as_deref(),
            Some("postgresql://localhost/intake_test")
        );
        assert_eq!(config.max_connections, 3);

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("DB_MAX_CONNECTIONS");
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        std::env::set_var("DB_PORT", "not-a-port");
        let result = DatabaseConfig::from_env();
        std::env::remove_var("DB_PORT");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_min_above_max() {
        let config = DatabaseConfig {
            max_connections: 2,
            min_connections: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connect_options_from_discrete_fields() {
        let config = DatabaseConfig::default();
        assert!(config.connect_options().is_ok());
    }

    #[test]
    fn test_connect_options_rejects_bad_url() {
        let config = DatabaseConfig {
            url: Some("://not-a-url".to_string()),
            ..Default::default()
        };
        assert!(config.connect_options().is_err());
    }
}
