//! Keyless access to Azure services for the azlab demo.
//!
//! - [`auth`]: the default credential chain over `azure_identity`
//!   (service principal, managed identity, Azure CLI).
//! - [`blob`]: Blob Storage operations over `azure_storage_blob`.
//!
//! All credentials share a common [`AzureBaseConfig`].

pub mod auth;
pub mod blob;
pub mod config;
pub mod error;

// Re-exports for convenience.
pub use auth::{
    DefaultAzureCredential, POSTGRES_SCOPE, STORAGE_SCOPE, build_default_credential,
    expires_on_utc,
};
pub use azure_core::credentials::{AccessToken, Secret, TokenCredential, TokenRequestOptions};
pub use blob::{AzureBlobStore, BlobConfig, BlobItem, BlobStore};
pub use config::AzureBaseConfig;
pub use error::AzureError;
