//! Supabase Provider
//!
//! Implements StorageProvider against a hosted Supabase project: GoTrue for
//! password sign-in and the Storage REST API for objects in one bucket.
//!
//! Auth: `apikey: {anon}` on every request, plus `Authorization: Bearer {token}`
//! where the token is the session access token, or the anon key when signed out.
//! Keys: percent-encoded per path segment, `/` kept as separator.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::header::{HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    AuthUser, ProgressCallback, ProviderError, RemoteEntry, StorageProvider, SupabaseConfig,
    UploadOptions,
};

/// Upload body is streamed in chunks of this size; progress fires per chunk
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Page size used for listings (the hosted API default)
const LIST_LIMIT: u32 = 100;

fn supabase_log(msg: &str) {
    info!("[SUPABASE] {}", msg);
}

// ─── API Response Types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        AuthUser { id: user.id, email: user.email }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueTokenResponse {
    access_token: String,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct StorageObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StorageObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    metadata: Option<StorageObjectMetadata>,
}

impl From<StorageObject> for RemoteEntry {
    fn from(object: StorageObject) -> Self {
        RemoteEntry {
            id: object.id,
            name: object.name,
            size: object.metadata.and_then(|meta| meta.size),
            created_at: object.created_at,
        }
    }
}

// ─── Provider ────────────────────────────────────────────────────────────

pub struct SupabaseProvider {
    config: SupabaseConfig,
    client: reqwest::Client,
    access_token: Option<SecretString>,
}

impl SupabaseProvider {
    pub fn new(config: SupabaseConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let access_token = config.access_token.clone();
        Self { config, client, access_token }
    }

    // ─── Helpers ─────────────────────────────────────────────────────────

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.config.base_url(), path)
    }

    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.config.base_url(), path)
    }

    fn object_url(&self, key: &str) -> String {
        self.storage_url(&format!("/object/{}/{}", self.config.bucket, encode_key(key)))
    }

    fn bearer(&self) -> &str {
        match self.access_token {
            Some(ref token) => token.expose_secret(),
            None => self.config.anon_key.expose_secret(),
        }
    }

    /// Build a request carrying the `apikey` and bearer headers
    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, ProviderError> {
        let apikey = HeaderValue::from_str(self.config.anon_key.expose_secret()).map_err(|e| {
            ProviderError::InvalidConfig(format!("Invalid characters in API key: {}", e))
        })?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.bearer())).map_err(|e| {
            ProviderError::AuthenticationFailed(format!("Invalid characters in token: {}", e))
        })?;
        Ok(self
            .client
            .request(method, url)
            .header("apikey", apikey)
            .header(AUTHORIZATION, auth))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, ProviderError> {
        let resp = request
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(format!("{} failed: {}", what, e)))?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = extract_error_message(&body);
        warn!("[SUPABASE] {} returned {}: {}", what, status, message);
        Err(ProviderError::from_status(status, message))
    }
}

/// Percent-encode each segment of an object key, keeping `/` separators
fn encode_key(key: &str) -> String {
    key.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Pull a human-readable message out of an error body
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["msg", "error_description", "message", "error"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

fn require_key(path: &str) -> Result<&str, ProviderError> {
    let key = path.trim_start_matches('/');
    if key.is_empty() {
        return Err(ProviderError::InvalidPath("empty object path".to_string()));
    }
    Ok(key)
}

// ─── StorageProvider Implementation ──────────────────────────────────────

#[async_trait]
impl StorageProvider for SupabaseProvider {
    fn display_name(&self) -> String {
        format!("Supabase ({})", self.config.bucket)
    }

    async fn current_user(&mut self) -> Result<Option<AuthUser>, ProviderError> {
        if self.access_token.is_none() {
            debug!("[SUPABASE] No access token, no active session");
            return Ok(None);
        }

        let request = self.request(Method::GET, &self.auth_url("/user"))?;
        match self.send(request, "Get user").await {
            Ok(resp) => {
                let user: GoTrueUser = resp
                    .json()
                    .await
                    .map_err(|e| ProviderError::ParseError(format!("Parse user failed: {}", e)))?;
                Ok(Some(user.into()))
            }
            Err(ProviderError::AuthenticationFailed(msg)) | Err(ProviderError::PermissionDenied(msg)) => {
                debug!("[SUPABASE] Session rejected: {}", msg);
                self.access_token = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser, ProviderError> {
        supabase_log(&format!("Signing in {}", email));

        let body = serde_json::json!({ "email": email, "password": password });
        let request = self
            .request(Method::POST, &self.auth_url("/token?grant_type=password"))?
            .json(&body);

        let resp = request
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(format!("Sign in failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            warn!("[SUPABASE] Sign in rejected ({}): {}", status, message);
            return Err(ProviderError::AuthenticationFailed(message));
        }

        let token: GoTrueTokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Parse token response failed: {}", e)))?;

        self.access_token = Some(SecretString::from(token.access_token));
        Ok(token.user.into())
    }

    async fn sign_out(&mut self) -> Result<(), ProviderError> {
        if self.access_token.is_none() {
            return Ok(());
        }
        let request = self.request(Method::POST, &self.auth_url("/logout"))?;
        let result = self.send(request, "Sign out").await.map(|_| ());
        self.access_token = None;
        supabase_log("Signed out");
        result
    }

    async fn list(&mut self, prefix: &str) -> Result<Vec<RemoteEntry>, ProviderError> {
        let prefix = prefix.trim_matches('/');
        let body = serde_json::json!({
            "prefix": prefix,
            "limit": LIST_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });
        let url = self.storage_url(&format!("/object/list/{}", self.config.bucket));
        let request = self.request(Method::POST, &url)?.json(&body);
        let resp = self.send(request, "List").await?;

        let objects: Vec<StorageObject> = resp
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Parse list response failed: {}", e)))?;

        debug!("[SUPABASE] Listed {} objects under '{}'", objects.len(), prefix);
        Ok(objects.into_iter().map(RemoteEntry::from).collect())
    }

    async fn upload(
        &mut self,
        path: &str,
        data: Vec<u8>,
        options: UploadOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), ProviderError> {
        let key = require_key(path)?;
        let total = data.len() as u64;
        let content_type = options.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(key).first_or_octet_stream().to_string()
        });

        supabase_log(&format!("Uploading {} ({} bytes)", key, total));

        let progress: Option<Arc<dyn Fn(u64, u64) + Send + Sync>> = on_progress.map(Arc::from);
        let stream_progress = progress.clone();
        let chunks: Vec<Vec<u8>> = data.chunks(UPLOAD_CHUNK_SIZE).map(|c| c.to_vec()).collect();
        let mut sent: u64 = 0;
        let stream = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            if let Some(ref cb) = stream_progress {
                cb(sent, total);
            }
            Ok::<Vec<u8>, std::io::Error>(chunk)
        });
        let body = reqwest::Body::wrap_stream(stream);

        let request = self
            .request(Method::POST, &self.object_url(key))?
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, format!("max-age={}", options.cache_control_secs))
            .header(CONTENT_LENGTH, total)
            .body(body);

        // Streaming bodies cannot be replayed, so uploads are never retried here.
        self.send(request, "Upload").await.map_err(|e| match e {
            ProviderError::NetworkError(msg) => ProviderError::TransferFailed(msg),
            other => other,
        })?;

        if total == 0 {
            if let Some(ref cb) = progress {
                cb(0, 0);
            }
        }
        Ok(())
    }

    async fn download_to_bytes(&mut self, path: &str) -> Result<Vec<u8>, ProviderError> {
        let key = require_key(path)?;
        let url = self.storage_url(&format!(
            "/object/authenticated/{}/{}",
            self.config.bucket,
            encode_key(key)
        ));
        let request = self.request(Method::GET, &url)?;
        let resp = self.send(request, "Download").await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::TransferFailed(format!("Read download body failed: {}", e)))?;
        debug!("[SUPABASE] Downloaded {} ({} bytes)", key, bytes.len());
        Ok(bytes.to_vec())
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), ProviderError> {
        let source = require_key(from)?;
        let destination = require_key(to)?;
        let body = serde_json::json!({
            "bucketId": self.config.bucket,
            "sourceKey": source,
            "destinationKey": destination,
        });
        let request = self.request(Method::POST, &self.storage_url("/object/move"))?.json(&body);
        self.send(request, "Move").await?;
        supabase_log(&format!("Moved {} -> {}", source, destination));
        Ok(())
    }

    async fn delete(&mut self, path: &str) -> Result<(), ProviderError> {
        let key = require_key(path)?;
        let body = serde_json::json!({ "prefixes": [key] });
        let url = self.storage_url(&format!("/object/{}", self.config.bucket));
        let request = self.request(Method::DELETE, &url)?.json(&body);
        self.send(request, "Remove").await?;
        supabase_log(&format!("Removed {}", key));
        Ok(())
    }

    fn public_url(&self, path: &str) -> Result<String, ProviderError> {
        let key = require_key(path)?;
        Ok(self.storage_url(&format!(
            "/object/public/{}/{}",
            self.config.bucket,
            encode_key(key)
        )))
    }
}
