/// Connection settings for an Azure Database for `PostgreSQL` flexible server.
///
/// There is no password: the access token obtained for each call is used
/// in its place.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Short server name (e.g. `my-demo-pg`), expanded to
    /// `{server}.postgres.database.azure.com`.
    pub server: Option<String>,

    /// Full host name; takes precedence over `server` when set.
    pub host: Option<String>,

    /// Database name.
    pub database: String,

    /// Entra ID principal name used as the login role.
    pub user: Option<String>,

    pub port: u16,

    /// SSL mode for the connection (`disable`, `prefer`, `require`, `verify-ca`, `verify-full`).
    pub ssl_mode: String,
}

/// DNS suffix of Azure Database for `PostgreSQL` servers.
pub const AZURE_POSTGRES_SUFFIX: &str = ".postgres.database.azure.com";

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            server: None,
            host: None,
            database: String::from("postgres"),
            user: None,
            port: 5432,
            ssl_mode: String::from("require"),
        }
    }
}

impl PostgresConfig {
    /// Whether enough is configured to attempt a connection.
    pub fn is_configured(&self) -> bool {
        (self.server.is_some() || self.host.is_some()) && self.user.is_some()
    }

    /// Resolve the host to connect to, or `None` when neither `host` nor
    /// `server` is set.
    pub fn resolved_host(&self) -> Option<String> {
        if let Some(host) = &self.host {
            return Some(host.clone());
        }
        self.server.as_deref().map(|server| {
            if server.contains('.') {
                server.to_owned()
            } else {
                format!("{server}{AZURE_POSTGRES_SUFFIX}")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = PostgresConfig::default();
        assert_eq!(cfg.database, "postgres");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.ssl_mode, "require");
        assert!(!cfg.is_configured());
        assert_eq!(cfg.resolved_host(), None);
    }

    #[test]
    fn server_name_expands_to_azure_host() {
        let cfg = PostgresConfig {
            server: Some("demo-pg".into()),
            ..PostgresConfig::default()
        };
        assert_eq!(
            cfg.resolved_host().as_deref(),
            Some("demo-pg.postgres.database.azure.com")
        );
    }

    #[test]
    fn fully_qualified_server_is_kept() {
        let cfg = PostgresConfig {
            server: Some("demo-pg.postgres.database.azure.com".into()),
            ..PostgresConfig::default()
        };
        assert_eq!(
            cfg.resolved_host().as_deref(),
            Some("demo-pg.postgres.database.azure.com")
        );
    }

    #[test]
    fn explicit_host_wins() {
        let cfg = PostgresConfig {
            server: Some("demo-pg".into()),
            host: Some("localhost".into()),
            user: Some("app@contoso.com".into()),
            ..PostgresConfig::default()
        };
        assert_eq!(cfg.resolved_host().as_deref(), Some("localhost"));
        assert!(cfg.is_configured());
    }
}
