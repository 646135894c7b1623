//! Token credentials and the default credential chain.
//!
//! The individual sources come from `azure_identity`. No token is cached by
//! the chain: every [`TokenCredential::get_token`] call asks each source in
//! turn.

use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::{AccessToken, Secret, TokenCredential, TokenRequestOptions};
use azure_core::error::ErrorKind;
use azure_core::time::OffsetDateTime;
use azure_identity::{ManagedIdentityCredentialOptions, UserAssignedId};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::AzureBaseConfig;
use crate::error::AzureError;

/// Scope for Azure Storage data-plane access.
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Scope for Azure Database for PostgreSQL Entra ID authentication.
pub const POSTGRES_SCOPE: &str = "https://ossrdbms-aad.database.windows.net/.default";

const ENVIRONMENT: &str = "EnvironmentCredential";
const MANAGED_IDENTITY: &str = "ManagedIdentityCredential";
const AZURE_CLI: &str = "AzureCliCredential";

/// One named source in a [`DefaultAzureCredential`].
struct Source {
    name: &'static str,
    credential: Arc<dyn TokenCredential>,
}

/// Tries a fixed list of credentials in order and returns the first token.
///
/// Built from [`AzureBaseConfig`] the chain is:
///
/// 1. `EnvironmentCredential`: a `ClientSecretCredential` for the configured
///    service principal;
/// 2. `ManagedIdentityCredential`: App Service or IMDS, optionally for a
///    user-assigned identity;
/// 3. `AzureCliCredential`: the signed-in `az` session.
///
/// Sources whose configuration is absent are skipped, and the reason is
/// reported alongside the real failures if the whole chain fails.
pub struct DefaultAzureCredential {
    sources: Vec<Source>,
    skipped: Vec<String>,
}

impl std::fmt::Debug for DefaultAzureCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name).collect();
        f.debug_struct("DefaultAzureCredential")
            .field("sources", &names)
            .field("skipped", &self.skipped)
            .finish()
    }
}

impl DefaultAzureCredential {
    /// Build the chain described by `config`.
    pub fn new(config: &AzureBaseConfig) -> Result<Self, AzureError> {
        let mut chain = Self::empty();

        if let (Some(tenant_id), Some(client_id), Some(secret)) = (
            &config.tenant_id,
            &config.client_id,
            &config.client_secret,
        ) {
            debug!(tenant_id = %tenant_id, "adding ClientSecretCredential");
            let credential = azure_identity::ClientSecretCredential::new(
                tenant_id,
                client_id.clone(),
                Secret::new(secret.clone()),
                None,
            )?;
            chain = chain.with_source(ENVIRONMENT, credential);
        } else {
            chain = chain.with_skipped(
                ENVIRONMENT,
                "AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET are not all set",
            );
        }

        if config.use_managed_identity {
            let options = config
                .managed_identity_client_id()
                .map(|id| ManagedIdentityCredentialOptions {
                    user_assigned_id: Some(UserAssignedId::ClientId(id.to_owned())),
                    ..Default::default()
                });
            let credential = azure_identity::ManagedIdentityCredential::new(options)?;
            chain = chain.with_source(MANAGED_IDENTITY, credential);
        } else {
            chain = chain.with_skipped(MANAGED_IDENTITY, "disabled by configuration");
        }

        if config.use_azure_cli {
            let credential = azure_identity::AzureCliCredential::new(None)?;
            chain = chain.with_source(AZURE_CLI, credential);
        } else {
            chain = chain.with_skipped(AZURE_CLI, "disabled by configuration");
        }

        Ok(chain)
    }

    fn empty() -> Self {
        Self {
            sources: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Append a source to the chain.
    #[must_use]
    pub fn with_source(mut self, name: &'static str, credential: Arc<dyn TokenCredential>) -> Self {
        self.sources.push(Source { name, credential });
        self
    }

    #[must_use]
    fn with_skipped(mut self, name: &str, reason: &str) -> Self {
        self.skipped.push(format!("{name}: {reason}"));
        self
    }

    /// Names of the sources that will be tried, in order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name).collect()
    }
}

impl Default for DefaultAzureCredential {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl TokenCredential for DefaultAzureCredential {
    async fn get_token(
        &self,
        scopes: &[&str],
        options: Option<TokenRequestOptions<'_>>,
    ) -> azure_core::Result<AccessToken> {
        let mut attempts = self.skipped.clone();

        for source in &self.sources {
            match source.credential.get_token(scopes, options.clone()).await {
                Ok(token) => {
                    info!(source = source.name, "acquired token");
                    return Ok(token);
                }
                Err(e) => {
                    debug!(source = source.name, error = %e, "credential source failed");
                    attempts.push(format!("{}: {e}", source.name));
                }
            }
        }

        warn!(attempts = attempts.len(), "no credential source produced a token");
        Err(azure_core::Error::new(
            ErrorKind::Credential,
            format!(
                "DefaultAzureCredential failed to retrieve a token: {}",
                attempts.join("; ")
            ),
        ))
    }
}

/// Build the default credential chain from configuration.
///
/// See [`DefaultAzureCredential`] for the order in which sources are tried.
pub fn build_default_credential(
    config: &AzureBaseConfig,
) -> Result<Arc<dyn TokenCredential>, AzureError> {
    debug!(?config, "building DefaultAzureCredential");
    Ok(Arc::new(DefaultAzureCredential::new(config)?))
}

/// Expiry of `token` as a `chrono` timestamp.
pub fn expires_on_utc(token: &AccessToken) -> DateTime<Utc> {
    to_chrono(token.expires_on)
}

pub(crate) fn to_chrono(at: OffsetDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(at.unix_timestamp(), at.nanosecond()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use azure_core::time::Duration;

    use super::*;

    #[derive(Debug)]
    struct Failing(&'static str);

    #[async_trait]
    impl TokenCredential for Failing {
        async fn get_token(
            &self,
            _scopes: &[&str],
            _options: Option<TokenRequestOptions<'_>>,
        ) -> azure_core::Result<AccessToken> {
            Err(azure_core::Error::new(ErrorKind::Credential, self.0))
        }
    }

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenCredential for Counting {
        async fn get_token(
            &self,
            scopes: &[&str],
            _options: Option<TokenRequestOptions<'_>>,
        ) -> azure_core::Result<AccessToken> {
            assert_eq!(scopes, [STORAGE_SCOPE]);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken::new(
                Secret::new(format!("token-{n}")),
                OffsetDateTime::now_utc() + Duration::hours(1),
            ))
        }
    }

    #[tokio::test]
    async fn first_successful_source_wins() {
        let good = Arc::new(Counting::default());
        let chain = DefaultAzureCredential::default()
            .with_source("first", Arc::new(Failing("no endpoint")))
            .with_source("second", good.clone())
            .with_source("third", Arc::new(Failing("never asked")));

        let token = chain.get_token(&[STORAGE_SCOPE], None).await.unwrap();
        assert_eq!(token.token.secret(), "token-0");
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tokens_are_not_cached() {
        let good = Arc::new(Counting::default());
        let chain = DefaultAzureCredential::default().with_source("only", good.clone());

        chain.get_token(&[STORAGE_SCOPE], None).await.unwrap();
        let second = chain.get_token(&[STORAGE_SCOPE], None).await.unwrap();
        assert_eq!(second.token.secret(), "token-1");
        assert_eq!(good.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_chain_lists_every_attempt() {
        let chain = DefaultAzureCredential::default()
            .with_skipped(ENVIRONMENT, "not configured")
            .with_source(MANAGED_IDENTITY, Arc::new(Failing("endpoint unreachable")))
            .with_source(AZURE_CLI, Arc::new(Failing("az not found")));

        let err = chain.get_token(&[STORAGE_SCOPE], None).await.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Credential));

        let text = AzureError::from(err).to_string();
        assert!(text.starts_with("DefaultAzureCredential failed to retrieve a token"));
        assert!(text.contains("EnvironmentCredential: not configured"));
        assert!(text.contains("ManagedIdentityCredential: endpoint unreachable"));
        assert!(text.contains("AzureCliCredential: az not found"));
    }

    #[test]
    fn chain_order_follows_config() {
        let config = AzureBaseConfig::default()
            .with_tenant_id("tid")
            .with_client_id("cid")
            .with_client_secret("secret");
        let chain = DefaultAzureCredential::new(&config).unwrap();
        assert_eq!(
            chain.source_names(),
            [ENVIRONMENT, MANAGED_IDENTITY, AZURE_CLI]
        );
        assert!(chain.skipped.is_empty());
    }

    #[test]
    fn missing_service_principal_is_skipped() {
        let config = AzureBaseConfig::default().with_azure_cli(false);
        let chain = DefaultAzureCredential::new(&config).unwrap();
        assert_eq!(chain.source_names(), [MANAGED_IDENTITY]);
        assert_eq!(chain.skipped.len(), 2);
        assert!(chain.skipped[0].starts_with(ENVIRONMENT));
        assert!(chain.skipped[1].starts_with(AZURE_CLI));
    }

    #[test]
    fn debug_lists_sources_only() {
        let config = AzureBaseConfig::default()
            .with_tenant_id("tid")
            .with_client_id("cid")
            .with_client_secret("super-private");
        let chain = DefaultAzureCredential::new(&config).unwrap();
        let debug = format!("{chain:?}");
        assert!(debug.contains("EnvironmentCredential"));
        assert!(!debug.contains("super-private"));
    }

    #[test]
    fn expiry_converts_to_chrono() {
        let token = AccessToken::new(
            Secret::new("t".to_owned()),
            OffsetDateTime::from_unix_timestamp(1_893_456_000).unwrap(),
        );
        assert_eq!(
            expires_on_utc(&token).to_rfc3339(),
            "2030-01-01T00:00:00+00:00"
        );
    }
}
