//! Storage Providers Module
//!
//! The application talks to exactly one hosted backend that offers both
//! authentication and object storage. This module defines the contract the
//! UI workflows rely on, so the workflows never depend on a concrete HTTP
//! client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           StorageProvider Trait             │
//! │  sign_in, list, upload, download, etc.      │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//!              ┌────────────────┐
//!              │    Supabase    │
//!              │ (auth+storage) │
//!              └────────────────┘
//! ```

pub mod types;
pub mod supabase;

pub use types::*;
pub use supabase::SupabaseProvider;

use async_trait::async_trait;

/// Remote backend contract
///
/// All object paths are keys inside the single configured bucket, never
/// starting with `/`.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Get display name for this provider instance
    fn display_name(&self) -> String;

    /// Query the user of the active session, `None` when nobody is signed in
    async fn current_user(&mut self) -> Result<Option<AuthUser>, ProviderError>;

    /// Authenticate with email and password, establishing a session
    async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser, ProviderError>;

    /// End the active session
    async fn sign_out(&mut self) -> Result<(), ProviderError>;

    /// List the objects directly under `prefix`
    async fn list(&mut self, prefix: &str) -> Result<Vec<RemoteEntry>, ProviderError>;

    /// Upload bytes to `path`
    async fn upload(
        &mut self,
        path: &str,
        data: Vec<u8>,
        options: UploadOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), ProviderError>;

    /// Download a file to memory (returns bytes)
    async fn download_to_bytes(&mut self, path: &str) -> Result<Vec<u8>, ProviderError>;

    /// Move an object to a new key
    async fn rename(&mut self, from: &str, to: &str) -> Result<(), ProviderError>;

    /// Remove an object
    async fn delete(&mut self, path: &str) -> Result<(), ProviderError>;

    /// Public URL of an object; no access checks or expiry are applied
    fn public_url(&self, path: &str) -> Result<String, ProviderError>;
}
