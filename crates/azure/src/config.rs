use serde::{Deserialize, Serialize};

/// Identity settings shared by every credential in the default chain.
///
/// Mirrors the service-principal variables the Azure SDKs read
/// (`AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`). The managed
/// identity endpoint (`IDENTITY_ENDPOINT`/`IDENTITY_HEADER` on App Service,
/// IMDS elsewhere) is discovered by `azure_identity` itself.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureBaseConfig {
    /// Entra ID tenant ID for service-principal authentication.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Application (client) ID. Used by the service principal and, when no
    /// service principal secret is present, as the user-assigned managed
    /// identity to request.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Service-principal client secret. Redacted in `Debug`.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Whether the managed identity endpoint is tried.
    #[serde(default = "default_true")]
    pub use_managed_identity: bool,

    /// Whether the Azure CLI is tried as the last resort.
    #[serde(default = "default_true")]
    pub use_azure_cli: bool,
}

fn default_true() -> bool {
    true
}

impl std::fmt::Debug for AzureBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBaseConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("use_managed_identity", &self.use_managed_identity)
            .field("use_azure_cli", &self.use_azure_cli)
            .finish()
    }
}

impl Default for AzureBaseConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            use_managed_identity: true,
            use_azure_cli: true,
        }
    }
}

impl AzureBaseConfig {
    /// Set the Entra ID tenant ID.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the application (client) ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the service-principal client secret.
    #[must_use]
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Enable or disable the managed identity source.
    #[must_use]
    pub fn with_managed_identity(mut self, enabled: bool) -> Self {
        self.use_managed_identity = enabled;
        self
    }

    /// Enable or disable the Azure CLI fallback.
    #[must_use]
    pub fn with_azure_cli(mut self, enabled: bool) -> Self {
        self.use_azure_cli = enabled;
        self
    }

    /// Whether all three service-principal settings are present.
    pub fn has_service_principal(&self) -> bool {
        self.tenant_id.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }

    /// The user-assigned identity to request from the managed identity
    /// endpoint, if any.
    ///
    /// When a full service principal is configured the client ID belongs to
    /// it, so the system-assigned identity is used instead.
    pub fn managed_identity_client_id(&self) -> Option<&str> {
        if self.client_secret.is_some() {
            None
        } else {
            self.client_id.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AzureBaseConfig::default();
        assert!(config.tenant_id.is_none());
        assert!(config.client_id.is_none());
        assert!(config.client_secret.is_none());
        assert!(config.use_managed_identity);
        assert!(config.use_azure_cli);
        assert!(!config.has_service_principal());
    }

    #[test]
    fn builder_chain() {
        let config = AzureBaseConfig::default()
            .with_tenant_id("tid-123")
            .with_client_id("cid-456")
            .with_client_secret("secret-789")
            .with_managed_identity(false)
            .with_azure_cli(false);
        assert_eq!(config.tenant_id.as_deref(), Some("tid-123"));
        assert_eq!(config.client_id.as_deref(), Some("cid-456"));
        assert!(config.has_service_principal());
        assert!(!config.use_managed_identity);
        assert!(!config.use_azure_cli);
    }

    #[test]
    fn client_id_selects_user_assigned_identity_without_secret() {
        let config = AzureBaseConfig::default().with_client_id("uami");
        assert_eq!(config.managed_identity_client_id(), Some("uami"));

        let config = config.with_client_secret("s");
        assert!(config.managed_identity_client_id().is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AzureBaseConfig::default().with_client_secret("super-private");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-private"));
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        let config: AzureBaseConfig = serde_json::from_str(r#"{"tenant_id":"t"}"#).unwrap();
        assert_eq!(config.tenant_id.as_deref(), Some("t"));
        assert!(config.use_managed_identity);
        assert!(config.use_azure_cli);
    }
}
