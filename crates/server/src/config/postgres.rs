use azlab_postgres::PostgresConfig;
use serde::Deserialize;

/// Azure Database for `PostgreSQL` target.
///
/// ```toml
/// [postgres]
/// server = "my-demo-pg"
/// database = "postgres"
/// user = "my-webapp"
/// ```
#[derive(Debug, Deserialize)]
pub struct PostgresServerConfig {
    /// Short server name (`AZURE_POSTGRESQL_SERVER`).
    #[serde(default)]
    pub server: Option<String>,
    /// Full host name, for servers outside `postgres.database.azure.com`.
    #[serde(default)]
    pub host: Option<String>,
    /// Database name (`AZURE_POSTGRESQL_DATABASE`).
    #[serde(default = "default_database")]
    pub database: String,
    /// Entra ID login role (`AZURE_POSTGRESQL_USER`).
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSL mode (`disable`, `prefer`, `require`, `verify-ca`, `verify-full`).
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
}

impl Default for PostgresServerConfig {
    fn default() -> Self {
        Self {
            server: None,
            host: None,
            database: default_database(),
            user: None,
            port: default_port(),
            ssl_mode: default_ssl_mode(),
        }
    }
}

impl PostgresServerConfig {
    pub fn to_postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            server: self.server.clone(),
            host: self.host.clone(),
            database: self.database.clone(),
            user: self.user.clone(),
            port: self.port,
            ssl_mode: self.ssl_mode.clone(),
        }
    }
}

fn default_database() -> String {
    "postgres".to_owned()
}

fn default_port() -> u16 {
    5432
}

fn default_ssl_mode() -> String {
    "require".to_owned()
}
