mod postgres;
mod server;
mod storage;
mod telemetry;


pub use postgres::*;
pub use server::*;
pub use storage::*;
pub use telemetry::*;

use azlab_azure::AzureBaseConfig;
use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the azlab server, loaded from a TOML file and
/// then overridden by the environment.
#[derive(Debug, Default, Deserialize)]
pub struct AzlabConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob Storage targets.
    #[serde(default)]
    pub storage: StorageConfig,
    /// `PostgreSQL` target.
    #[serde(default)]
    pub postgres: PostgresServerConfig,
    /// Credential chain settings.
    #[serde(default)]
    pub identity: AzureBaseConfig,
    /// OpenTelemetry trace export.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Hosting details, environment only.
    #[serde(skip)]
    pub site: SiteInfo,
}

impl AzlabConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ServerError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Unset and empty values leave the
    /// configured value in place.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_STORAGE_ACCOUNT") {
            self.storage.account_name = Some(v);
        }
        if let Some(v) = get("AZURE_STORAGE_CONTAINER") {
            self.storage.files_container = v;
        }
        if let Some(v) = get("AZURE_STORAGE_ENDPOINT") {
            self.storage.endpoint_url = Some(v);
        }

        if let Some(v) = get("AZURE_POSTGRESQL_SERVER") {
            self.postgres.server = Some(v);
        }
        if let Some(v) = get("AZURE_POSTGRESQL_DATABASE") {
            self.postgres.database = v;
        }
        if let Some(v) = get("AZURE_POSTGRESQL_USER") {
            self.postgres.user = Some(v);
        }

        if let Some(v) = get("AZURE_TENANT_ID") {
            self.identity.tenant_id = Some(v);
        }
        if let Some(v) = get("AZURE_CLIENT_ID") {
            self.identity.client_id = Some(v);
        }
        if let Some(v) = get("AZURE_CLIENT_SECRET") {
            self.identity.client_secret = Some(v);
        }

        if let Some(v) = get("PORT") {
            self.server.port = v
                .trim()
                .parse()
                .map_err(|e| ServerError::Config(format!("invalid PORT {v:?}: {e}")))?;
        }

        if let Some(v) = get("WEBSITE_SITE_NAME") {
            self.site.site_name = v;
        }
        if let Some(v) = get("WEBSITE_RESOURCE_GROUP") {
            self.site.resource_group = v;
        }
        if let Some(v) = get("WEBSITE_SKU") {
            self.site.sku = v;
        }

        Ok(())
    }
}
