//! Runtime configuration
//!
//! Backend settings come from flags or `SKYVAULT_*` environment variables.
//! Nothing is read from or written to disk.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;

use crate::providers::{ProviderError, SupabaseConfig, DEFAULT_BUCKET};

/// Timing and locations used by the UI workflows
#[derive(Debug, Clone)]
pub struct UiSettings {
    /// Quiet period after the last search keystroke before filtering
    pub search_debounce: Duration,
    /// How long the upload success indicator stays up before the panel closes
    pub upload_success_delay: Duration,
    /// Where downloads are saved
    pub download_dir: PathBuf,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            upload_success_delay: Duration::from_millis(1500),
            download_dir: default_download_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: SupabaseConfig,
    pub ui: UiSettings,
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "skyvault",
    about = "SkyVault - browse, upload and share files in your cloud bucket",
    version
)]
pub struct Cli {
    /// Backend project URL
    #[arg(long, env = "SKYVAULT_URL")]
    pub url: String,

    /// Public API key of the project
    #[arg(long, env = "SKYVAULT_ANON_KEY", hide_env_values = true)]
    pub anon_key: String,

    /// Storage bucket holding user files
    #[arg(long, env = "SKYVAULT_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Access token of an existing session
    #[arg(long, env = "SKYVAULT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Directory downloads are written to
    #[arg(long, env = "SKYVAULT_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Search debounce window in milliseconds
    #[arg(long, default_value_t = 300)]
    pub search_debounce_ms: u64,

    /// Delay before the upload panel closes after a successful batch
    #[arg(long, default_value_t = 1500)]
    pub success_delay_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<AppConfig, ProviderError> {
        let backend = SupabaseConfig {
            url: self.url,
            anon_key: SecretString::from(self.anon_key),
            bucket: self.bucket,
            access_token: self
                .access_token
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
        };
        backend.validate()?;

        let ui = UiSettings {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            upload_success_delay: Duration::from_millis(self.success_delay_ms),
            download_dir: self.download_dir.unwrap_or_else(default_download_dir),
        };

        Ok(AppConfig { backend, ui, verbose: self.verbose })
    }
}
