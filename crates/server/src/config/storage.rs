use azlab_azure::BlobConfig;
use serde::Deserialize;

/// Blob Storage targets.
///
/// ```toml
/// [storage]
/// account_name = "mystorageacct"
/// files_container = "uploads"
/// ```
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Storage account name (`AZURE_STORAGE_ACCOUNT`).
    #[serde(default)]
    pub account_name: Option<String>,
    /// Endpoint override for local emulators (`AZURE_STORAGE_ENDPOINT`).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Container used by the file manager (`AZURE_STORAGE_CONTAINER`).
    #[serde(default = "default_files_container")]
    pub files_container: String,
    /// Container holding the blob read by `GET /test-storage`.
    #[serde(default = "default_demo_container")]
    pub demo_container: String,
    /// Blob read by `GET /test-storage`.
    #[serde(default = "default_demo_blob")]
    pub demo_blob: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_name: None,
            endpoint_url: None,
            files_container: default_files_container(),
            demo_container: default_demo_container(),
            demo_blob: default_demo_blob(),
        }
    }
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        self.account_name.is_some() || self.endpoint_url.is_some()
    }

    pub fn to_blob_config(&self) -> BlobConfig {
        BlobConfig {
            account_name: self.account_name.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

fn default_files_container() -> String {
    "uploads".to_owned()
}

fn default_demo_container() -> String {
    "demo".to_owned()
}

fn default_demo_blob() -> String {
    "mensaje.txt".to_owned()
}
