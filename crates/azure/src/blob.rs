use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_storage_blob::BlobServiceClient;
use azure_storage_blob::models::BlockBlobClientUploadOptions;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::auth::to_chrono;
use crate::error::AzureError;

/// Where the Blob service lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Azure Storage account name.
    pub account_name: Option<String>,

    /// Optional endpoint override for local development (e.g. `Azurite`).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl BlobConfig {
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: Some(account_name.into()),
            endpoint_url: None,
        }
    }

    /// Set the endpoint URL override.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// The service endpoint: the override if set, otherwise
    /// `https://{account}.blob.core.windows.net`.
    pub fn endpoint(&self) -> Result<String, AzureError> {
        if let Some(url) = &self.endpoint_url {
            return Ok(url.trim_end_matches('/').to_owned());
        }
        let account = self.account_name.as_deref().ok_or_else(|| {
            AzureError::Configuration("AZURE_STORAGE_ACCOUNT is not configured".to_owned())
        })?;
        Ok(format!("https://{account}.blob.core.windows.net"))
    }
}

/// A blob as reported by a container listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobItem {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// The blob operations the demo needs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download a blob's full contents.
    async fn read_blob(&self, container: &str, name: &str) -> Result<Bytes, AzureError>;

    /// List every blob in a container, across all result pages.
    async fn list_blobs(&self, container: &str) -> Result<Vec<BlobItem>, AzureError>;

    /// Create or overwrite a block blob.
    async fn upload_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), AzureError>;

    async fn delete_blob(&self, container: &str, name: &str) -> Result<(), AzureError>;
}

/// [`BlobStore`] backed by the Azure Storage Blob SDK.
///
/// The SDK's bearer-token policy asks the credential for a storage token on
/// every request.
pub struct AzureBlobStore {
    service_client: BlobServiceClient,
    endpoint: String,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    pub fn new(config: &BlobConfig, credential: Arc<dyn TokenCredential>) -> Result<Self, AzureError> {
        let endpoint = config.endpoint()?;
        let service_client = BlobServiceClient::new(&endpoint, Some(credential), None)
            .map_err(|e| AzureError::Configuration(format!("blob client error: {e}")))?;
        Ok(Self {
            service_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn read_blob(&self, container: &str, name: &str) -> Result<Bytes, AzureError> {
        debug!("downloading blob");
        let blob_client = self.service_client.blob_client(container, name);
        let response = blob_client.download(None).await?;
        let body: Bytes = response.into_body().collect().await?;
        info!(size = body.len(), "blob downloaded");
        Ok(body)
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn list_blobs(&self, container: &str) -> Result<Vec<BlobItem>, AzureError> {
        let container_client = self.service_client.blob_container_client(container);
        let mut pages = container_client.list_blobs(None)?.into_pages();

        let mut items = Vec::new();
        while let Some(page) = pages.try_next().await? {
            let listing = page.into_model()?;
            debug!(entries = listing.segment.blob_items.len(), "received listing page");
            for blob in listing.segment.blob_items {
                let Some(name) = blob.name.and_then(|n| {
                    let encoded = n.encoded == Some(true);
                    n.content.map(|c| decode_blob_name(&c, encoded))
                }) else {
                    warn!("skipping listing entry without a name");
                    continue;
                };
                let properties = blob.properties;
                items.push(BlobItem {
                    name,
                    size: properties
                        .as_ref()
                        .and_then(|p| p.content_length)
                        .unwrap_or_default(),
                    last_modified: properties.and_then(|p| p.last_modified).map(to_chrono),
                });
            }
        }

        info!(count = items.len(), "blobs listed");
        Ok(items)
    }

    #[instrument(skip(self, data), fields(endpoint = %self.endpoint, size = data.len()))]
    async fn upload_blob(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), AzureError> {
        let blob_client = self.service_client.blob_client(container, name);
        let content_length = data.len() as u64;
        let options = BlockBlobClientUploadOptions {
            blob_content_type: Some(content_type.to_owned()),
            ..Default::default()
        };

        blob_client
            .upload(data.into(), true, content_length, Some(options))
            .await?;
        info!("blob uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn delete_blob(&self, container: &str, name: &str) -> Result<(), AzureError> {
        let blob_client = self.service_client.blob_client(container, name);
        blob_client.delete(None).await?;
        info!("blob deleted");
        Ok(())
    }
}

/// Blob names the service cannot represent in XML come back percent-encoded
/// with `Encoded="true"`.
fn decode_blob_name(content: &str, encoded: bool) -> String {
    if encoded {
        percent_decode_str(content).decode_utf8_lossy().into_owned()
    } else {
        content.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use azure_core::credentials::{AccessToken, TokenRequestOptions};
    use azure_core::error::ErrorKind;

    use super::*;

    #[derive(Debug)]
    struct NoToken;

    #[async_trait]
    impl TokenCredential for NoToken {
        async fn get_token(
            &self,
            _scopes: &[&str],
            _options: Option<TokenRequestOptions<'_>>,
        ) -> azure_core::Result<AccessToken> {
            Err(azure_core::Error::new(ErrorKind::Credential, "unused"))
        }
    }

    #[test]
    fn endpoint_defaults_to_account_host() {
        let config = BlobConfig::new("labstorage");
        assert_eq!(
            config.endpoint().unwrap(),
            "https://labstorage.blob.core.windows.net"
        );
    }

    #[test]
    fn endpoint_override_wins() {
        let config = BlobConfig::new("devstoreaccount1")
            .with_endpoint_url("https://127.0.0.1:10000/devstoreaccount1/");
        assert_eq!(
            config.endpoint().unwrap(),
            "https://127.0.0.1:10000/devstoreaccount1"
        );
    }

    #[test]
    fn endpoint_requires_account() {
        let err = BlobConfig::default().endpoint().unwrap_err();
        assert!(matches!(err, AzureError::Configuration(_)));
        assert!(err.to_string().contains("AZURE_STORAGE_ACCOUNT is not configured"));
    }

    #[test]
    fn store_requires_account() {
        let err = AzureBlobStore::new(&BlobConfig::default(), Arc::new(NoToken)).unwrap_err();
        assert!(matches!(err, AzureError::Configuration(_)));
    }

    #[test]
    fn store_targets_account_endpoint() {
        let store = AzureBlobStore::new(&BlobConfig::new("labstorage"), Arc::new(NoToken)).unwrap();
        assert_eq!(store.endpoint(), "https://labstorage.blob.core.windows.net");
        assert!(format!("{store:?}").contains("labstorage"));
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(decode_blob_name("reports/q1 2026.csv", false), "reports/q1 2026.csv");
        assert_eq!(decode_blob_name("100%25.txt", false), "100%25.txt");
    }

    #[test]
    fn encoded_names_are_decoded() {
        assert_eq!(decode_blob_name("bad%01name.txt", true), "bad\u{1}name.txt");
        assert_eq!(decode_blob_name("caf%C3%A9.md", true), "café.md");
    }
}
