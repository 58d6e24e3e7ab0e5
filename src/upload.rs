//! Upload Workflow
//!
//! A batch is processed strictly one file at a time. Before each file the
//! current directory is listed again, so a collision check always reflects
//! the overwrite decisions made earlier in the same batch. The first failed
//! upload aborts the rest of the batch; files already sent stay uploaded.

use std::collections::VecDeque;
use std::path::Path;

use tracing::{debug, info};

use crate::controller::AppController;
use crate::dir_path::DirPath;
use crate::error::{WorkflowError, WorkflowResult};
use crate::providers::{ProgressCallback, UploadOptions};
use crate::view::{percent_of, Panel};

pub const UPLOAD_FAILED: &str = "Failed to upload files. Please try again.";

/// A local file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { name: name.into(), content_type: None, data }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Not a file: {}", path.display()),
                )
            })?;
        let data = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path).first().map(|m| m.to_string());
        Ok(Self { name, content_type, data })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionDecision {
    /// Nothing with this name exists yet
    Upload,
    /// The user agreed to replace the existing file
    Overwrite,
    /// The user declined; the file is not sent
    Skip,
}

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub file: LocalFile,
    /// Object key the file is written to
    pub target_path: String,
}

/// Ordered queue of the files of one batch
#[derive(Debug, Clone, Default)]
pub struct UploadJob {
    pending: VecDeque<UploadItem>,
}

impl UploadJob {
    pub fn new(files: Vec<LocalFile>, dir: &DirPath) -> Self {
        let pending = files
            .into_iter()
            .map(|file| UploadItem { target_path: dir.join(&file.name), file })
            .collect();
        Self { pending }
    }

    pub fn next(&mut self) -> Option<UploadItem> {
        self.pending.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

/// Outcome of a completed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    Drop(Vec<LocalFile>),
}

/// Tells the host that the event was handled here and its default
/// behaviour (opening the dropped file) must not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Consumed,
}

impl AppController {
    /// Upload `files` into the current directory. Returns `None` when the
    /// batch was empty or failed; the failure has already been notified.
    pub async fn submit(&mut self, files: Vec<LocalFile>) -> Option<UploadReport> {
        if files.is_empty() {
            return None;
        }

        self.view.panels.hide(Panel::UploadArea);
        self.view.panels.show(Panel::UploadProgress);
        self.view.upload_progress.reset();

        let mut job = UploadJob::new(files, &self.current_path);
        info!("Uploading {} files to {}", job.remaining(), self.current_path);

        match self.run_batch(&mut job).await {
            Ok(report) => {
                info!(
                    "Upload batch done: {} uploaded, {} skipped",
                    report.uploaded.len(),
                    report.skipped.len()
                );
                self.view.panels.hide(Panel::UploadProgress);
                self.view.panels.show(Panel::UploadSuccess);

                tokio::time::sleep(self.settings.upload_success_delay).await;

                self.refresh().await;
                self.reset_upload_state();
                self.view.panels.hide(Panel::UploadModal);
                Some(report)
            }
            Err(e) => {
                debug!("Batch aborted with {} files left", job.remaining());
                self.report_failure(UPLOAD_FAILED.to_string(), &e);
                self.reset_upload_state();
                None
            }
        }
    }

    async fn run_batch(&mut self, job: &mut UploadJob) -> WorkflowResult<UploadReport> {
        if !self.is_authenticated() {
            return Err(WorkflowError::NotAuthenticated);
        }

        let mut report = UploadReport::default();
        while let Some(UploadItem { file, target_path }) = job.next() {
            let decision = self.resolve_collision(&file.name).await?;
            if decision == CollisionDecision::Skip {
                debug!("Skipping {}", target_path);
                report.skipped.push(target_path);
                continue;
            }

            self.view.upload_progress.reset();
            let options = UploadOptions {
                upsert: true,
                content_type: file.content_type,
                ..Default::default()
            };
            let callback = self.progress_callback();
            self.provider
                .upload(&target_path, file.data, options, Some(callback))
                .await?;
            info!("Uploaded {} ({:?})", target_path, decision);
            report.uploaded.push(target_path);
        }
        Ok(report)
    }

    /// Re-list the current directory and ask before replacing `file_name`
    async fn resolve_collision(&mut self, file_name: &str) -> WorkflowResult<CollisionDecision> {
        let existing = self.provider.list(self.current_path.as_prefix()).await?;
        if !existing.iter().any(|e| e.name.as_deref() == Some(file_name)) {
            return Ok(CollisionDecision::Upload);
        }

        let question = format!("\"{}\" already exists. Overwrite?", file_name);
        if self.surface.confirm(&question) {
            Ok(CollisionDecision::Overwrite)
        } else {
            Ok(CollisionDecision::Skip)
        }
    }

    fn progress_callback(&self) -> ProgressCallback {
        let indicator = self.view.upload_progress.clone();
        let listener = self.surface.progress_listener();
        Box::new(move |loaded, total| {
            let percent = percent_of(loaded, total);
            indicator.set(percent);
            if let Some(listener) = &listener {
                listener(percent);
            }
        })
    }

    // ─── Upload panel ──────────────────────────────────────────────────

    /// Open or close the upload panel; closing resets it
    pub fn toggle_upload_modal(&mut self) -> bool {
        let visible = self.view.panels.toggle(Panel::UploadModal);
        if !visible {
            self.reset_upload_state();
        }
        visible
    }

    /// Back to the idle drop-target display
    pub fn reset_upload_state(&mut self) {
        self.view.panels.show(Panel::UploadArea);
        self.view.panels.hide(Panel::UploadProgress);
        self.view.panels.hide(Panel::UploadSuccess);
        self.view.upload_progress.reset();
        self.view.drop_highlight = false;
    }

    pub async fn handle_drag_event(&mut self, event: DragEvent) -> EventDisposition {
        match event {
            DragEvent::Enter | DragEvent::Over => self.view.drop_highlight = true,
            DragEvent::Leave => self.view.drop_highlight = false,
            DragEvent::Drop(files) => {
                self.view.drop_highlight = false;
                self.submit(files).await;
            }
        }
        EventDisposition::Consumed
    }

    pub async fn on_files_picked(&mut self, files: Vec<LocalFile>) -> Option<UploadReport> {
        self.submit(files).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{controller, signed_in_controller, Call};

    fn files(names: &[&str]) -> Vec<LocalFile> {
        names
            .iter()
            .map(|n| LocalFile::new(*n, n.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_job_targets_current_directory() {
        let mut job = UploadJob::new(files(&["a.txt", "b.txt"]), &DirPath::parse("docs"));
        assert_eq!(job.remaining(), 2);
        assert_eq!(job.next().unwrap().target_path, "docs/a.txt");
        assert_eq!(job.next().unwrap().target_path, "docs/b.txt");
        assert!(job.next().is_none());
    }

    #[tokio::test]
    async fn test_local_file_read_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let file = LocalFile::read(&path).await.unwrap();

        assert_eq!(file.name, "photo.png");
        assert_eq!(file.content_type.as_deref(), Some("image/png"));
        assert_eq!(file.data, b"png-bytes");
    }

    #[tokio::test]
    async fn test_batch_uploads_sequentially_with_per_file_check() {
        let (mut ctl, backend, surface) = signed_in_controller().await;
        ctl.toggle_upload_modal();
        backend.lock().unwrap().calls.clear();

        let report = ctl.submit(files(&["a.txt", "b.txt"])).await.unwrap();

        assert_eq!(report.uploaded, vec!["a.txt", "b.txt"]);
        let state = backend.lock().unwrap();
        let kinds: Vec<&str> = state.calls.iter().map(Call::kind).collect();
        assert_eq!(kinds, vec!["list", "upload", "list", "upload", "list"]);
        assert!(state.objects.contains_key("b.txt"));
        drop(state);

        assert!(surface.lock().unwrap().confirms.is_empty());
        assert!(!ctl.view().is_visible(Panel::UploadModal));
        assert!(ctl.view().is_visible(Panel::UploadArea));
        assert!(!ctl.view().is_visible(Panel::UploadSuccess));
        assert_eq!(ctl.view().rows.len(), 2);
    }

    #[tokio::test]
    async fn test_collision_refused_skips_file() {
        let (mut ctl, backend, surface) = signed_in_controller().await;
        backend.lock().unwrap().put("a.txt", b"old");
        surface.lock().unwrap().confirm_answers.push_back(false);

        let report = ctl.submit(files(&["a.txt", "b.txt"])).await.unwrap();

        assert_eq!(report.skipped, vec!["a.txt"]);
        assert_eq!(report.uploaded, vec!["b.txt"]);
        let state = backend.lock().unwrap();
        assert_eq!(state.objects["a.txt"], b"old");
        assert!(!state.calls.iter().any(|c| matches!(c, Call::Upload { path, .. } if path == "a.txt")));
        assert_eq!(
            surface.lock().unwrap().confirms,
            vec!["\"a.txt\" already exists. Overwrite?"]
        );
    }

    #[tokio::test]
    async fn test_collision_accepted_overwrites_with_upsert() {
        let (mut ctl, backend, surface) = signed_in_controller().await;
        backend.lock().unwrap().put("a.txt", b"old");
        surface.lock().unwrap().confirm_answers.push_back(true);

        let report = ctl.submit(files(&["a.txt"])).await.unwrap();

        assert_eq!(report.uploaded, vec!["a.txt"]);
        let state = backend.lock().unwrap();
        assert_eq!(state.objects["a.txt"], b"a.txt");
        assert!(state
            .calls
            .contains(&Call::Upload { path: "a.txt".into(), upsert: true }));
    }

    #[tokio::test]
    async fn test_failure_aborts_rest_of_batch() {
        let (mut ctl, backend, surface) = signed_in_controller().await;
        ctl.toggle_upload_modal();
        backend.lock().unwrap().failing_uploads.insert("b.txt".into());

        let report = ctl.submit(files(&["a.txt", "b.txt", "c.txt"])).await;

        assert!(report.is_none());
        let state = backend.lock().unwrap();
        assert!(state.objects.contains_key("a.txt"));
        assert!(!state.objects.contains_key("c.txt"));
        assert!(!state.calls.iter().any(|c| matches!(c, Call::Upload { path, .. } if path == "c.txt")));
        drop(state);

        let log = surface.lock().unwrap();
        assert_eq!(log.notifications.last().unwrap().message, UPLOAD_FAILED);
        assert!(ctl.view().is_visible(Panel::UploadArea));
        assert!(!ctl.view().is_visible(Panel::UploadProgress));
        assert!(ctl.view().is_visible(Panel::UploadModal));
    }

    #[tokio::test]
    async fn test_upload_requires_session() {
        let (mut ctl, backend, surface) = controller();

        assert!(ctl.submit(files(&["a.txt"])).await.is_none());

        assert!(backend.lock().unwrap().calls.is_empty());
        assert_eq!(
            surface.lock().unwrap().notifications.last().unwrap().message,
            UPLOAD_FAILED
        );
    }

    #[tokio::test]
    async fn test_progress_reaches_listener() {
        let (mut ctl, _backend, surface) = signed_in_controller().await;

        ctl.submit(vec![LocalFile::new("big.bin", vec![0u8; 10])]).await;

        assert_eq!(surface.lock().unwrap().progress, vec![50, 100]);
        assert_eq!(ctl.view().upload_progress.get(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_ignored() {
        let (mut ctl, backend, _surface) = signed_in_controller().await;
        backend.lock().unwrap().calls.clear();

        assert!(ctl.submit(Vec::new()).await.is_none());
        assert!(backend.lock().unwrap().calls.is_empty());
        assert!(ctl.view().is_visible(Panel::UploadArea));
    }

    #[tokio::test]
    async fn test_drag_events_are_consumed() {
        let (mut ctl, backend, _surface) = signed_in_controller().await;

        assert_eq!(ctl.handle_drag_event(DragEvent::Enter).await, EventDisposition::Consumed);
        assert!(ctl.view().drop_highlight);
        assert_eq!(ctl.handle_drag_event(DragEvent::Leave).await, EventDisposition::Consumed);
        assert!(!ctl.view().drop_highlight);

        let disposition = ctl.handle_drag_event(DragEvent::Drop(files(&["d.txt"]))).await;

        assert_eq!(disposition, EventDisposition::Consumed);
        assert!(backend.lock().unwrap().objects.contains_key("d.txt"));
    }

    #[tokio::test]
    async fn test_closing_modal_resets_upload_ui() {
        let (mut ctl, _backend, _surface) = signed_in_controller().await;
        assert!(ctl.toggle_upload_modal());
        ctl.view.panels.hide(Panel::UploadArea);
        ctl.view.panels.show(Panel::UploadProgress);
        ctl.view.upload_progress.set(40);

        assert!(!ctl.toggle_upload_modal());

        assert!(ctl.view().is_visible(Panel::UploadArea));
        assert!(!ctl.view().is_visible(Panel::UploadProgress));
        assert_eq!(ctl.view().upload_progress.get(), 0);
    }
}
