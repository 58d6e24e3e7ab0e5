//! File Listing & Action Workflow
//!
//! Listing, breadcrumb navigation, the five per-file actions, the context
//! menu, the view toggle and the debounced name filter. Every action issues
//! at most one mutating remote call and re-renders from a fresh listing
//! afterwards; nothing is updated optimistically.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::controller::AppController;
use crate::dir_path::{breadcrumbs, DirPath, SEPARATOR};
use crate::error::{WorkflowError, WorkflowResult};
use crate::format::is_previewable;
use crate::notification::Notification;
use crate::providers::RemoteEntry;
use crate::view::{Panel, ViewMode};

pub const LOAD_FAILED: &str = "Failed to load files. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Open,
    Download,
    Delete,
    Rename,
    Share,
}

impl FileAction {
    pub const ALL: [FileAction; 5] = [
        FileAction::Open,
        FileAction::Download,
        FileAction::Delete,
        FileAction::Rename,
        FileAction::Share,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Open => "open",
            FileAction::Download => "download",
            FileAction::Delete => "delete",
            FileAction::Rename => "rename",
            FileAction::Share => "share",
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("Unknown action: {}", s))
    }
}

fn action_failed(action: FileAction) -> String {
    format!("Failed to {} file. Please try again.", action)
}

/// Pending search term, applied once the input has been quiet for `wait`
#[derive(Debug, Clone)]
pub struct SearchDebounce {
    wait: Duration,
    pending: Option<(String, Instant)>,
}

impl SearchDebounce {
    pub fn new(wait: Duration) -> Self {
        Self { wait, pending: None }
    }

    /// Record a keystroke; restarts the quiet period
    pub fn input(&mut self, term: &str, now: Instant) {
        self.pending = Some((term.to_string(), now + self.wait));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Hand out the term if its deadline has passed
    pub fn take_ready(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, at)) if *at <= now => self.pending.take().map(|(term, _)| term),
            _ => None,
        }
    }
}

impl AppController {
    // ─── Listing ───────────────────────────────────────────────────────

    /// List `path` and render it. Path and breadcrumbs are committed only
    /// when the listing succeeds; a failure leaves the view as it was.
    /// Returns whether the view was updated.
    pub async fn list_directory(&mut self, path: DirPath) -> bool {
        if !self.is_authenticated() {
            debug!("Skipping listing of {}: not signed in", path);
            return false;
        }

        debug!("Listing {}", path);
        match self.provider.list(path.as_prefix()).await {
            Ok(entries) => {
                let files: Vec<RemoteEntry> = entries
                    .into_iter()
                    .filter(|e| !e.is_folder_placeholder())
                    .collect();
                info!("Listed {} files in {}", files.len(), path);

                self.view.breadcrumbs = breadcrumbs(&path);
                self.view.render_entries(&files, &path);
                self.current_path = path;
                true
            }
            Err(e) => {
                self.report_failure(LOAD_FAILED.to_string(), &e);
                false
            }
        }
    }

    /// Re-list the current directory
    pub async fn refresh(&mut self) -> bool {
        let path = self.current_path.clone();
        self.list_directory(path).await
    }

    /// Follow the breadcrumb at `index` (0 is the root)
    pub async fn navigate_to_crumb(&mut self, index: usize) -> bool {
        let Some(crumb) = self.view.breadcrumbs.get(index) else {
            debug!("No breadcrumb at index {}", index);
            return false;
        };
        let target = crumb.target.clone();
        self.list_directory(target).await
    }

    // ─── Per-file actions ──────────────────────────────────────────────

    /// Run `action` on the file `file_name` of the current directory.
    /// Failures end in a single notification naming the action.
    pub async fn perform_action(&mut self, file_name: &str, action: FileAction) {
        info!("Action {} on {}", action, file_name);
        if let Err(e) = self.run_action(file_name, action).await {
            self.report_failure(action_failed(action), &e);
        }
    }

    async fn run_action(&mut self, file_name: &str, action: FileAction) -> WorkflowResult<()> {
        if !self.is_authenticated() {
            return Err(WorkflowError::NotAuthenticated);
        }
        let key = self.current_path.join(file_name);

        match action {
            FileAction::Open => {
                if is_previewable(file_name) {
                    self.notify(Notification::info(format!("Previewing {}", key)));
                    self.surface.preview(&key);
                    Ok(())
                } else {
                    self.download_file(file_name, &key).await
                }
            }
            FileAction::Download => self.download_file(file_name, &key).await,
            FileAction::Delete => self.delete_file(file_name, &key).await,
            FileAction::Rename => self.rename_file(file_name, &key).await,
            FileAction::Share => {
                let url = self.provider.public_url(&key)?;
                self.surface.present_share_link(file_name, &url);
                self.notify(Notification::success("Share link ready!"));
                Ok(())
            }
        }
    }

    async fn download_file(&mut self, file_name: &str, key: &str) -> WorkflowResult<()> {
        let data = self.provider.download_to_bytes(key).await?;
        debug!("Downloaded {} ({} bytes)", key, data.len());
        self.surface.save_file(file_name, &data)?;
        self.notify(Notification::success("Download started!"));
        Ok(())
    }

    /// Confirmed delete; the directory is re-listed whatever the outcome
    async fn delete_file(&mut self, file_name: &str, key: &str) -> WorkflowResult<()> {
        let question = format!("Are you sure you want to delete \"{}\"?", file_name);
        if !self.surface.confirm(&question) {
            debug!("Delete of {} declined", key);
            return Ok(());
        }

        let result = self.provider.delete(key).await;
        if result.is_ok() {
            self.notify(Notification::success("File deleted successfully!"));
        }
        self.refresh().await;
        result.map_err(WorkflowError::from)
    }

    /// Move within the same directory. Cancelled, empty or unchanged input
    /// does nothing, and so does a name containing the separator.
    async fn rename_file(&mut self, file_name: &str, key: &str) -> WorkflowResult<()> {
        let new_name = match self.surface.prompt("Enter new file name:", file_name) {
            Some(name) if !name.is_empty() && name != file_name && !name.contains(SEPARATOR) => {
                name
            }
            _ => {
                debug!("Rename of {} skipped", key);
                return Ok(());
            }
        };

        let destination = self.current_path.join(&new_name);
        self.provider.rename(key, &destination).await?;
        self.notify(Notification::success("File renamed successfully!"));
        self.refresh().await;
        Ok(())
    }

    // ─── Context menu ──────────────────────────────────────────────────

    /// Target a rendered file with the context menu
    pub fn open_context_menu(&mut self, file_name: &str) -> bool {
        if self.view.find_row(file_name).is_none() {
            return false;
        }
        self.view.context_target = Some(file_name.to_string());
        self.view.panels.show(Panel::ContextMenu);
        true
    }

    pub fn close_context_menu(&mut self) {
        self.view.context_target = None;
        self.view.panels.hide(Panel::ContextMenu);
    }

    /// Close the menu and run `action` on its target
    pub async fn choose_context_action(&mut self, action: FileAction) {
        let target = self.view.context_target.take();
        self.view.panels.hide(Panel::ContextMenu);
        if let Some(file_name) = target {
            self.perform_action(&file_name, action).await;
        }
    }

    // ─── View mode & search ────────────────────────────────────────────

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        debug!("View mode {:?}", mode);
        self.view.set_mode(mode);
    }

    pub fn on_search_input(&mut self, term: &str) {
        self.on_search_input_at(term, Instant::now());
    }

    pub fn on_search_input_at(&mut self, term: &str, now: Instant) {
        self.search.input(term, now);
    }

    /// Apply the pending term if its quiet period is over
    pub fn flush_search(&mut self, now: Instant) -> bool {
        match self.search.take_ready(now) {
            Some(term) => {
                debug!("Filtering by {:?}", term);
                self.view.search_term = term;
                self.view.apply_search();
                true
            }
            None => false,
        }
    }

    /// Wait out the quiet period and apply the pending term
    pub async fn settle_search(&mut self) -> bool {
        let Some(deadline) = self.search.deadline() else {
            return false;
        };
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.flush_search(Instant::now())
    }
}
