//! Host interactions the workflows need from a front end
//!
//! Everything here is blocking from the workflow's point of view: a confirm
//! or prompt suspends the workflow until the user answers.

use std::sync::Arc;

use crate::notification::Notification;

/// Receives the upload percentage (0-100) as bytes are sent
pub type ProgressListener = Arc<dyn Fn(u8) + Send + Sync>;

pub trait Surface: Send {
    /// Show a transient message
    fn notify(&mut self, notification: &Notification);

    /// Ask a yes/no question
    fn confirm(&mut self, message: &str) -> bool;

    /// Ask for a line of text, pre-filled with `default`. `None` means cancelled.
    fn prompt(&mut self, message: &str, default: &str) -> Option<String>;

    /// Offer downloaded bytes to the user as a local file
    fn save_file(&mut self, file_name: &str, data: &[u8]) -> std::io::Result<()>;

    /// Show a preview of a stored object
    fn preview(&mut self, object_path: &str);

    /// Present a share link for copying
    fn present_share_link(&mut self, file_name: &str, url: &str);

    /// Live progress hook for uploads, if the surface draws one
    fn progress_listener(&self) -> Option<ProgressListener> {
        None
    }
}
