use std::sync::Arc;

use async_trait::async_trait;
use azlab_azure::{AzureError, POSTGRES_SCOPE, TokenCredential};
use chrono::NaiveDateTime;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};
use tracing::{debug, info, instrument, warn};

use crate::config::PostgresConfig;
use crate::error::DatabaseError;
use crate::schema;

/// A row of the demo users table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: Option<NaiveDateTime>,
}

/// The database operations exposed by the demo.
#[async_trait]
pub trait DemoDatabase: Send + Sync {
    /// The server's `version()` string.
    async fn server_version(&self) -> Result<String, DatabaseError>;

    /// Ensure the users table exists, seed it when empty, and return every
    /// row, newest first. Runs in a single transaction.
    async fn list_users(&self) -> Result<Vec<DemoUser>, DatabaseError>;
}

fn parse_ssl_mode(mode: &str) -> Result<PgSslMode, DatabaseError> {
    match mode {
        "disable" => Ok(PgSslMode::Disable),
        "prefer" => Ok(PgSslMode::Prefer),
        "require" => Ok(PgSslMode::Require),
        "verify-ca" => Ok(PgSslMode::VerifyCa),
        "verify-full" => Ok(PgSslMode::VerifyFull),
        other => Err(DatabaseError::Configuration(format!(
            "unknown ssl_mode: {other}"
        ))),
    }
}

/// Build `PgConnectOptions` from a [`PostgresConfig`], using `password`
/// (an access token) as the login password.
pub(crate) fn build_connect_options(
    config: &PostgresConfig,
    password: &str,
) -> Result<PgConnectOptions, DatabaseError> {
    let host = config.resolved_host().ok_or_else(|| {
        DatabaseError::Configuration("AZURE_POSTGRESQL_SERVER is not configured".to_owned())
    })?;
    let user = config.user.as_deref().ok_or_else(|| {
        DatabaseError::Configuration("AZURE_POSTGRESQL_USER is not configured".to_owned())
    })?;

    Ok(PgConnectOptions::new_without_pgpass()
        .host(&host)
        .port(config.port)
        .username(user)
        .password(password)
        .database(&config.database)
        .ssl_mode(parse_ssl_mode(&config.ssl_mode)?))
}

/// [`DemoDatabase`] backed by one fresh connection per call, authenticated
/// with an Entra ID access token.
pub struct TokenAuthDatabase {
    config: PostgresConfig,
    credential: Arc<dyn TokenCredential>,
}

impl std::fmt::Debug for TokenAuthDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthDatabase")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenAuthDatabase {
    /// Create a database handle. No connection is opened until an
    /// operation runs.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Configuration`] if the server or user is
    /// missing, or the SSL mode is unknown.
    pub fn new(
        config: PostgresConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, DatabaseError> {
        build_connect_options(&config, "")?;
        Ok(Self { config, credential })
    }

    async fn connect(&self) -> Result<PgConnection, DatabaseError> {
        let token = self
            .credential
            .get_token(&[POSTGRES_SCOPE], None)
            .await
            .map_err(AzureError::from)?;
        let options = build_connect_options(&self.config, token.token.secret())?;
        debug!(
            host = options.get_host(),
            database = ?options.get_database(),
            user = options.get_username(),
            "opening token-authenticated connection"
        );

        PgConnection::connect_with(&options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))
    }

    async fn close(conn: PgConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close connection cleanly");
        }
    }

    async fn load_users(conn: &mut PgConnection) -> Result<Vec<DemoUser>, sqlx::Error> {
        let mut tx = conn.begin().await?;

        schema::ensure_users_table(&mut tx).await?;
        let seeded = schema::seed_if_empty(&mut tx).await?;
        if seeded > 0 {
            info!(rows = seeded, "seeded sample users");
        }

        let select = format!(
            "SELECT id, name, email, created_at FROM {} ORDER BY created_at DESC",
            schema::USERS_TABLE
        );
        let rows: Vec<(i32, String, String, Option<NaiveDateTime>)> =
            sqlx::query_as(&select).fetch_all(&mut *tx).await?;

        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, email, created_at)| DemoUser {
                id,
                name,
                email,
                created_at,
            })
            .collect())
    }
}

#[async_trait]
impl DemoDatabase for TokenAuthDatabase {
    #[instrument(skip(self), fields(database = %self.config.database))]
    async fn server_version(&self) -> Result<String, DatabaseError> {
        let mut conn = self.connect().await?;

        let result: Result<(String,), sqlx::Error> =
            sqlx::query_as("SELECT version()").fetch_one(&mut conn).await;
        Self::close(conn).await;

        let (version,) = result.map_err(|e| DatabaseError::Query(e.to_string()))?;
        info!("database version queried");
        Ok(version)
    }

    #[instrument(skip(self), fields(database = %self.config.database))]
    async fn list_users(&self) -> Result<Vec<DemoUser>, DatabaseError> {
        let mut conn = self.connect().await?;

        let result = Self::load_users(&mut conn).await;
        Self::close(conn).await;

        let users = result.map_err(|e| DatabaseError::Query(e.to_string()))?;
        info!(count = users.len(), "users listed");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use azlab_azure::{AccessToken, Secret, TokenRequestOptions};
    use azure_core::error::ErrorKind;
    use azure_core::time::OffsetDateTime;

    use super::*;

    #[derive(Debug)]
    struct FailingCredential;

    #[async_trait]
    impl TokenCredential for FailingCredential {
        async fn get_token(
            &self,
            _scopes: &[&str],
            _options: Option<TokenRequestOptions<'_>>,
        ) -> azure_core::Result<AccessToken> {
            Err(azure_core::Error::new(
                ErrorKind::Credential,
                "FailingCredential: no identity",
            ))
        }
    }

    #[derive(Debug)]
    struct FixedToken;

    #[async_trait]
    impl TokenCredential for FixedToken {
        async fn get_token(
            &self,
            scopes: &[&str],
            _options: Option<TokenRequestOptions<'_>>,
        ) -> azure_core::Result<AccessToken> {
            assert_eq!(scopes, [POSTGRES_SCOPE]);
            Ok(AccessToken::new(
                Secret::new("pg-token".to_owned()),
                OffsetDateTime::now_utc(),
            ))
        }
    }

    fn configured() -> PostgresConfig {
        PostgresConfig {
            server: Some("demo-pg".into()),
            user: Some("webapp-identity".into()),
            ..PostgresConfig::default()
        }
    }

    #[test]
    fn connect_options_use_azure_host_and_token() {
        let options = build_connect_options(&configured(), "pg-token").unwrap();
        assert_eq!(options.get_host(), "demo-pg.postgres.database.azure.com");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "webapp-identity");
        assert_eq!(options.get_database(), Some("postgres"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
    }

    #[test]
    fn unknown_ssl_mode_is_rejected() {
        let cfg = PostgresConfig {
            ssl_mode: "sometimes".into(),
            ..configured()
        };
        let err = build_connect_options(&cfg, "t").unwrap_err();
        assert_eq!(err.to_string(), "configuration error: unknown ssl_mode: sometimes");
    }

    #[test]
    fn missing_server_is_a_configuration_error() {
        let cfg = PostgresConfig {
            user: Some("u".into()),
            ..PostgresConfig::default()
        };
        let err = TokenAuthDatabase::new(cfg, Arc::new(FixedToken)).unwrap_err();
        assert!(matches!(err, DatabaseError::Configuration(_)));
        assert!(err.to_string().contains("AZURE_POSTGRESQL_SERVER"));
    }

    #[test]
    fn missing_user_is_a_configuration_error() {
        let cfg = PostgresConfig {
            server: Some("demo-pg".into()),
            ..PostgresConfig::default()
        };
        let err = TokenAuthDatabase::new(cfg, Arc::new(FixedToken)).unwrap_err();
        assert!(err.to_string().contains("AZURE_POSTGRESQL_USER"));
    }

    #[tokio::test]
    async fn credential_failure_surfaces_before_connecting() {
        let db = TokenAuthDatabase::new(configured(), Arc::new(FailingCredential)).unwrap();
        let err = db.server_version().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Credential(_)));
        assert!(err.to_string().contains("FailingCredential: no identity"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let cfg = PostgresConfig {
            host: Some("127.0.0.1".into()),
            port,
            ssl_mode: "disable".into(),
            ..configured()
        };
        let db = TokenAuthDatabase::new(cfg, Arc::new(FixedToken)).unwrap();
        let err = db.list_users().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Connection(_)));
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use azlab_azure::{AccessToken, Secret, TokenRequestOptions};
    use azure_core::time::OffsetDateTime;

    use super::*;

    /// Hands out `PGPASSWORD` as the "token" so a plain local server works.
    #[derive(Debug)]
    struct PasswordCredential(String);

    #[async_trait]
    impl TokenCredential for PasswordCredential {
        async fn get_token(
            &self,
            _scopes: &[&str],
            _options: Option<TokenRequestOptions<'_>>,
        ) -> azure_core::Result<AccessToken> {
            Ok(AccessToken::new(
                Secret::new(self.0.clone()),
                OffsetDateTime::now_utc(),
            ))
        }
    }

    fn test_database() -> TokenAuthDatabase {
        let env = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        let config = PostgresConfig {
            host: Some(env("PGHOST", "localhost")),
            user: Some(env("PGUSER", "postgres")),
            database: env("PGDATABASE", "postgres"),
            ssl_mode: "disable".into(),
            ..PostgresConfig::default()
        };
        let credential = Arc::new(PasswordCredential(env("PGPASSWORD", "postgres")));
        TokenAuthDatabase::new(config, credential).expect("valid config")
    }

    #[tokio::test]
    async fn version_and_seeded_users() {
        let db = test_database();

        let version = db.server_version().await.expect("version should succeed");
        assert!(version.starts_with("PostgreSQL"));

        let users = db.list_users().await.expect("list should succeed");
        assert!(users.len() >= 3);
        assert!(users.iter().any(|u| u.email == "juan.perez@example.com"));
    }
}
