//! Shared types for the storage backend
//!
//! Configuration, remote entry representation, authenticated user, upload
//! options and the provider error type.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Bucket used when none is configured
pub const DEFAULT_BUCKET: &str = "user-files";

/// Progress callback invoked with `(bytes_sent, bytes_total)`
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Connection settings for the hosted auth + storage service
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: SecretString,
    /// Bucket holding the user's files
    pub bucket: String,
    /// Access token of an existing session, if the host already has one
    pub access_token: Option<SecretString>,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: SecretString::from(anon_key.into()),
            bucket: DEFAULT_BUCKET.to_string(),
            access_token: None,
        }
    }

    /// Check that the configuration can address a backend at all
    pub fn validate(&self) -> Result<(), ProviderError> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| ProviderError::InvalidConfig(format!("Invalid backend URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::InvalidConfig(format!(
                "Backend URL must use http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.anon_key.expose_secret().trim().is_empty() {
            return Err(ProviderError::InvalidConfig("API key is required".to_string()));
        }
        if self.bucket.trim().is_empty() {
            return Err(ProviderError::InvalidConfig("Bucket name is required".to_string()));
        }
        Ok(())
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// A single object returned by a listing
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntry {
    /// Object id; the store reports none for folders
    pub id: Option<String>,
    /// Name relative to the listed prefix
    pub name: Option<String>,
    /// Size in bytes; folders carry no metadata and so no size
    pub size: Option<u64>,
    /// Creation timestamp (RFC 3339)
    pub created_at: Option<String>,
}

impl RemoteEntry {
    /// Convenience constructor for a plain file entry
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            id: Some(format!("obj-{}", name)),
            name: Some(name),
            size: Some(size),
            created_at: None,
        }
    }

    /// A subfolder as the store lists it: a bare name with no id or metadata
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            size: None,
            created_at: None,
        }
    }

    /// True for anything that is not a real object: nameless entries, names
    /// ending in `/`, and folders (no id and no metadata).
    pub fn is_folder_placeholder(&self) -> bool {
        match self.name.as_deref() {
            None | Some("") => true,
            Some(name) if name.ends_with('/') => true,
            Some(_) => self.id.is_none() && self.size.is_none(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// The authenticated user, as far as the UI cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Options for an upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Overwrite an existing object with the same key
    pub upsert: bool,
    /// MIME type of the payload
    pub content_type: Option<String>,
    /// Cache lifetime in seconds sent as `cache-control: max-age=...`
    pub cache_control_secs: u32,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            upsert: true,
            content_type: None,
            cache_control_secs: 3600,
        }
    }
}

/// Errors produced by a storage backend
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Not connected to server")]
    NotConnected,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Path already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and the backend's message to an error
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ProviderError::AuthenticationFailed(message),
            403 => ProviderError::PermissionDenied(message),
            404 => ProviderError::NotFound(message),
            409 => ProviderError::AlreadyExists(message),
            _ => ProviderError::ServerError(format!("{} ({})", message, status)),
        }
    }
}
