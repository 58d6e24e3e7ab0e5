//! In-memory backend and scripted front end for workflow tests

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::UiSettings;
use crate::controller::AppController;
use crate::notification::Notification;
use crate::providers::{
    AuthUser, ProgressCallback, ProviderError, RemoteEntry, StorageProvider, UploadOptions,
};
use crate::surface::{ProgressListener, Surface};

pub const EMAIL: &str = "alice@example.com";
pub const PASSWORD: &str = "secret1";

pub fn user() -> AuthUser {
    AuthUser { id: "user-1".to_string(), email: Some(EMAIL.to_string()) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CurrentUser,
    SignIn(String, String),
    SignOut,
    List(String),
    Upload { path: String, upsert: bool },
    Download(String),
    Rename(String, String),
    Delete(String),
    PublicUrl(String),
}

impl Call {
    pub fn kind(&self) -> &'static str {
        match self {
            Call::CurrentUser => "current_user",
            Call::SignIn(..) => "sign_in",
            Call::SignOut => "sign_out",
            Call::List(_) => "list",
            Call::Upload { .. } => "upload",
            Call::Download(_) => "download",
            Call::Rename(..) => "rename",
            Call::Delete(_) => "delete",
            Call::PublicUrl(_) => "public_url",
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    pub objects: BTreeMap<String, Vec<u8>>,
    pub signed_in: Option<AuthUser>,
    /// Operations (by `Call::kind`) that fail with a server error
    pub failing: HashSet<&'static str>,
    /// Object keys whose upload fails
    pub failing_uploads: HashSet<String>,
}

impl FakeState {
    pub fn put(&mut self, key: &str, data: &[u8]) {
        self.objects.insert(key.to_string(), data.to_vec());
    }

    pub fn list_calls(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::List(_))).count()
    }

    fn record(&mut self, call: Call) -> Result<(), ProviderError> {
        let kind = call.kind();
        self.calls.push(call);
        if self.failing.contains(kind) {
            return Err(ProviderError::ServerError(format!("{} failed", kind)));
        }
        Ok(())
    }
}

/// Backend keeping objects in a map. Listing returns the files directly under
/// the prefix, and one bare-named entry with no id or size per subfolder, the
/// way the hosted store reports folders.
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    pub fn new() -> (Self, Arc<Mutex<FakeState>>) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        (Self { state: state.clone() }, state)
    }
}

#[async_trait]
impl StorageProvider for FakeProvider {
    fn display_name(&self) -> String {
        "memory".to_string()
    }

    async fn current_user(&mut self) -> Result<Option<AuthUser>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CurrentUser)?;
        Ok(state.signed_in.clone())
    }

    async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::SignIn(email.to_string(), password.to_string()))?;
        if email != EMAIL || password != PASSWORD {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid login credentials".to_string(),
            ));
        }
        state.signed_in = Some(user());
        Ok(user())
    }

    async fn sign_out(&mut self) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.signed_in = None;
        state.record(Call::SignOut)
    }

    async fn list(&mut self, prefix: &str) -> Result<Vec<RemoteEntry>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::List(prefix.to_string()))?;

        let mut files = Vec::new();
        let mut folders = BTreeSet::new();
        for (key, data) in &state.objects {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((folder, _)) => {
                    folders.insert(folder.to_string());
                }
                None => files.push(RemoteEntry::file(rest, data.len() as u64)),
            }
        }
        let mut entries: Vec<RemoteEntry> = folders
            .into_iter()
            .map(RemoteEntry::folder)
            .collect();
        entries.extend(files);
        Ok(entries)
    }

    async fn upload(
        &mut self,
        path: &str,
        data: Vec<u8>,
        options: UploadOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), ProviderError> {
        {
            let mut state = self.state.lock().unwrap();
            state.record(Call::Upload { path: path.to_string(), upsert: options.upsert })?;
            if state.failing_uploads.contains(path) {
                return Err(ProviderError::TransferFailed(format!("upload of {} failed", path)));
            }
            if !options.upsert && state.objects.contains_key(path) {
                return Err(ProviderError::AlreadyExists(path.to_string()));
            }
        }

        let total = data.len() as u64;
        if let Some(cb) = &on_progress {
            cb(total / 2, total);
            cb(total, total);
        }
        self.state.lock().unwrap().objects.insert(path.to_string(), data);
        Ok(())
    }

    async fn download_to_bytes(&mut self, path: &str) -> Result<Vec<u8>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Download(path.to_string()))?;
        state
            .objects
            .get(path)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Rename(from.to_string(), to.to_string()))?;
        let data = state
            .objects
            .remove(from)
            .ok_or_else(|| ProviderError::NotFound(from.to_string()))?;
        state.objects.insert(to.to_string(), data);
        Ok(())
    }

    async fn delete(&mut self, path: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Delete(path.to_string()))?;
        state.objects.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> Result<String, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::PublicUrl(path.to_string()))?;
        Ok(format!("memory://public/{}", path))
    }
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub notifications: Vec<Notification>,
    pub confirms: Vec<String>,
    pub prompts: Vec<String>,
    pub saved: Vec<(String, Vec<u8>)>,
    pub previews: Vec<String>,
    pub shared: Vec<(String, String)>,
    pub progress: Vec<u8>,
    /// Answers handed out by `confirm`; an empty queue answers "no"
    pub confirm_answers: VecDeque<bool>,
    /// Answers handed out by `prompt`; an empty queue cancels
    pub prompt_answers: VecDeque<Option<String>>,
}

pub struct ScriptedSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl ScriptedSurface {
    pub fn new() -> (Self, Arc<Mutex<SurfaceLog>>) {
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        (Self { log: log.clone() }, log)
    }
}

impl Surface for ScriptedSurface {
    fn notify(&mut self, notification: &Notification) {
        self.log.lock().unwrap().notifications.push(notification.clone());
    }

    fn confirm(&mut self, message: &str) -> bool {
        let mut log = self.log.lock().unwrap();
        log.confirms.push(message.to_string());
        log.confirm_answers.pop_front().unwrap_or(false)
    }

    fn prompt(&mut self, message: &str, _default: &str) -> Option<String> {
        let mut log = self.log.lock().unwrap();
        log.prompts.push(message.to_string());
        log.prompt_answers.pop_front().flatten()
    }

    fn save_file(&mut self, file_name: &str, data: &[u8]) -> std::io::Result<()> {
        self.log.lock().unwrap().saved.push((file_name.to_string(), data.to_vec()));
        Ok(())
    }

    fn preview(&mut self, object_path: &str) {
        self.log.lock().unwrap().previews.push(object_path.to_string());
    }

    fn present_share_link(&mut self, file_name: &str, url: &str) {
        self.log
            .lock()
            .unwrap()
            .shared
            .push((file_name.to_string(), url.to_string()));
    }

    fn progress_listener(&self) -> Option<ProgressListener> {
        let log = self.log.clone();
        Some(Arc::new(move |percent| log.lock().unwrap().progress.push(percent)))
    }
}

pub fn settings() -> UiSettings {
    UiSettings {
        search_debounce: Duration::from_millis(300),
        upload_success_delay: Duration::ZERO,
        download_dir: std::env::temp_dir(),
    }
}

pub fn controller() -> (AppController, Arc<Mutex<FakeState>>, Arc<Mutex<SurfaceLog>>) {
    let (provider, backend) = FakeProvider::new();
    let (surface, log) = ScriptedSurface::new();
    let ctl = AppController::new(Box::new(provider), Box::new(surface), settings());
    (ctl, backend, log)
}

/// Controller signed in as the test user, with the call log cleared
pub async fn signed_in_controller() -> (AppController, Arc<Mutex<FakeState>>, Arc<Mutex<SurfaceLog>>)
{
    let (mut ctl, backend, log) = controller();
    ctl.sign_in(EMAIL, PASSWORD)
        .await
        .expect("test credentials are accepted");
    backend.lock().unwrap().calls.clear();
    (ctl, backend, log)
}
