use thiserror::Error;

/// Errors from the token-authenticated database layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Required connection settings are missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No access token could be obtained for the database scope.
    #[error(transparent)]
    Credential(#[from] azlab_azure::AzureError),

    /// The server could not be reached or rejected the login.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A statement failed after the connection was established.
    #[error("query failed: {0}")]
    Query(String),
}
