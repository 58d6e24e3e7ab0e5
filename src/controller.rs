//! Application controller
//!
//! `AppController` owns all client-side state: the session, the current
//! directory, the presentation model, and the handles to the backend and the
//! front end. Each workflow (session, browser, upload) is an `impl` block on
//! this type in its own module, so every workflow receives the same state by
//! `&mut self` instead of reaching into globals.
//!
//! Workflows run one at a time on the caller's task; at most one mutating
//! remote call is in flight at any moment.

use std::fmt;

use tracing::{info, warn};

use crate::browser::SearchDebounce;
use crate::config::UiSettings;
use crate::dir_path::DirPath;
use crate::notification::Notification;
use crate::providers::StorageProvider;
use crate::session::SessionState;
use crate::surface::Surface;
use crate::view::ViewState;

pub struct AppController {
    pub(crate) provider: Box<dyn StorageProvider>,
    pub(crate) surface: Box<dyn Surface>,
    pub(crate) session: SessionState,
    pub(crate) current_path: DirPath,
    pub(crate) view: ViewState,
    pub(crate) settings: UiSettings,
    pub(crate) search: SearchDebounce,
}

impl AppController {
    pub fn new(
        provider: Box<dyn StorageProvider>,
        surface: Box<dyn Surface>,
        settings: UiSettings,
    ) -> Self {
        info!("Controller ready for {}", provider.display_name());
        let search = SearchDebounce::new(settings.search_debounce);
        Self {
            provider,
            surface,
            session: SessionState::Unauthenticated,
            current_path: DirPath::root(),
            view: ViewState::default(),
            settings,
            search,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn current_path(&self) -> &DirPath {
        &self.current_path
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn settings(&self) -> &UiSettings {
        &self.settings
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        info!("Notify {}", notification);
        self.surface.notify(&notification);
    }

    /// Report a failed step: the raw error goes to the log, the user gets
    /// only the generic message.
    pub(crate) fn report_failure(&mut self, user_message: String, error: &dyn fmt::Display) {
        warn!("{} ({})", user_message, error);
        self.surface.notify(&Notification::error(user_message));
    }
}
