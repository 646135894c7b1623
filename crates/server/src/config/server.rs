use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on. Overridden by `PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body for `POST /upload`, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

/// Hosting details shown on the landing page.
///
/// Not read from TOML; filled from the App Service `WEBSITE_*` variables,
/// each defaulting to `Local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub site_name: String,
    pub resource_group: String,
    pub sku: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            site_name: "Local".to_owned(),
            resource_group: "Local".to_owned(),
            sku: "Local".to_owned(),
        }
    }
}
