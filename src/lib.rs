// SkyVault - cloud file manager for a hosted auth + storage backend
// Session gate, file browser and upload workflows behind a front-end surface

pub mod browser;
pub mod config;
pub mod controller;
pub mod dir_path;
pub mod error;
pub mod format;
pub mod notification;
pub mod providers;
pub mod session;
pub mod surface;
pub mod terminal;
pub mod upload;
pub mod view;

#[cfg(test)]
mod testing;

pub use browser::FileAction;
pub use config::{AppConfig, Cli, UiSettings};
pub use controller::AppController;
pub use dir_path::DirPath;
pub use error::{WorkflowError, WorkflowResult};
pub use notification::{Notification, NotificationKind};
pub use providers::{StorageProvider, SupabaseConfig, SupabaseProvider};
pub use session::{Session, SessionState};
pub use surface::Surface;
pub use upload::{DragEvent, EventDisposition, LocalFile, UploadReport};
pub use view::{Panel, ViewMode, ViewState};
