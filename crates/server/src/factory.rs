//! Construction of the per-request Azure clients.
//!
//! Handlers never share a credential, blob client or database handle: each
//! request asks the [`ServiceFactory`] for fresh ones.

use std::sync::Arc;

use azlab_azure::{
    AzureBaseConfig, AzureBlobStore, AzureError, BlobConfig, BlobStore, TokenCredential,
    build_default_credential,
};
use azlab_postgres::{DatabaseError, DemoDatabase, PostgresConfig, TokenAuthDatabase};

use crate::config::AzlabConfig;

/// Builds the clients a request needs.
pub trait ServiceFactory: Send + Sync {
    /// A fresh credential chain.
    fn credential(&self) -> Result<Arc<dyn TokenCredential>, AzureError>;

    /// A Blob Storage client backed by a fresh credential.
    fn blob_store(&self) -> Result<Arc<dyn BlobStore>, AzureError>;

    /// A database handle backed by a fresh credential.
    fn database(&self) -> Result<Arc<dyn DemoDatabase>, DatabaseError>;
}

/// [`ServiceFactory`] that talks to real Azure endpoints.
#[derive(Debug, Clone)]
pub struct AzureServiceFactory {
    identity: AzureBaseConfig,
    blob: BlobConfig,
    postgres: PostgresConfig,
}

impl AzureServiceFactory {
    pub fn new(identity: AzureBaseConfig, blob: BlobConfig, postgres: PostgresConfig) -> Self {
        Self {
            identity,
            blob,
            postgres,
        }
    }

    pub fn from_config(config: &AzlabConfig) -> Self {
        Self::new(
            config.identity.clone(),
            config.storage.to_blob_config(),
            config.postgres.to_postgres_config(),
        )
    }
}

impl ServiceFactory for AzureServiceFactory {
    fn credential(&self) -> Result<Arc<dyn TokenCredential>, AzureError> {
        build_default_credential(&self.identity)
    }

    fn blob_store(&self) -> Result<Arc<dyn BlobStore>, AzureError> {
        let store = AzureBlobStore::new(&self.blob, self.credential()?)?;
        Ok(Arc::new(store))
    }

    fn database(&self) -> Result<Arc<dyn DemoDatabase>, DatabaseError> {
        let db = TokenAuthDatabase::new(self.postgres.clone(), self.credential()?)?;
        Ok(Arc::new(db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> AzureServiceFactory {
        AzureServiceFactory::new(
            AzureBaseConfig::default().with_azure_cli(false),
            BlobConfig::default(),
            PostgresConfig::default(),
        )
    }

    #[test]
    fn credential_is_built_per_call() {
        let factory = factory();
        let a = factory.credential().unwrap();
        let b = factory.credential().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn blob_store_requires_account() {
        let err = factory().blob_store().err().unwrap();
        assert!(err.to_string().contains("AZURE_STORAGE_ACCOUNT is not configured"));
    }

    #[test]
    fn database_requires_server() {
        let err = factory().database().err().unwrap();
        assert!(err.to_string().contains("AZURE_POSTGRESQL_SERVER"));
    }

    #[test]
    fn configured_factory_builds_clients() {
        let factory = AzureServiceFactory::new(
            AzureBaseConfig::default(),
            BlobConfig::new("labstorage"),
            PostgresConfig {
                server: Some("lab-pg".into()),
                user: Some("lab-webapp".into()),
                ..PostgresConfig::default()
            },
        );
        assert!(factory.blob_store().is_ok());
        assert!(factory.database().is_ok());
    }
}
