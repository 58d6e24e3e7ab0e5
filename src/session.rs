//! Session Gate
//!
//! Two states, `Unauthenticated` and `Authenticated`. The initial state is
//! decided by `check_current_session` at start-up; afterwards only a
//! successful sign-in, a sign-out, or a failed session check move between
//! them. Each transition also flips the panels that depend on it.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::controller::AppController;
use crate::dir_path::{breadcrumbs, DirPath};
use crate::notification::Notification;
use crate::providers::{AuthUser, ProviderError};
use crate::view::Panel;

/// The authenticated user context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

impl Session {
    /// First character of the email, uppercased
    pub fn avatar_initial(&self) -> Option<char> {
        self.email
            .as_deref()
            .and_then(|e| e.chars().next())
            .and_then(|c| c.to_uppercase().next())
    }
}

impl From<AuthUser> for Session {
    fn from(user: AuthUser) -> Self {
        Session { user_id: user.id, email: user.email }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }
}

/// Sign-in failure, already phrased for the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AuthError(pub String);

pub const EMPTY_CREDENTIALS: &str = "Please enter both email and password";

/// Map a backend authentication message to one of the fixed user strings
pub fn friendly_auth_error(raw: &str) -> AuthError {
    let message = match raw {
        "Invalid login credentials" => "Invalid email or password",
        "Email not confirmed" => "Please verify your email first",
        "User already registered" => "Email already in use",
        "Password should be at least 6 characters" => "Password must be 6+ characters",
        _ => "Authentication failed. Please try again.",
    };
    AuthError(message.to_string())
}

impl AppController {
    /// Decide the initial state from the backend's view of the session.
    /// A failed query counts as "no session" and is not reported to the user.
    pub async fn check_current_session(&mut self) -> Option<Session> {
        debug!("Checking auth state");
        match self.provider.current_user().await {
            Ok(Some(user)) => {
                let session = Session::from(user);
                info!("User is authenticated: {}", session.user_id);
                self.enter_authenticated(session.clone()).await;
                Some(session)
            }
            Ok(None) => {
                debug!("No authenticated user");
                self.enter_unauthenticated();
                None
            }
            Err(e) => {
                warn!("Auth state check failed: {}", e);
                self.enter_unauthenticated();
                None
            }
        }
    }

    /// Sign in with trimmed credentials; on success the root is listed
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        let password = password.trim();
        debug!("Attempting sign in with: {}", email);

        match self.provider.sign_in(email, password).await {
            Ok(user) => {
                let session = Session::from(user);
                info!("Sign in successful: {}", session.user_id);
                self.enter_authenticated(session.clone()).await;
                Ok(session)
            }
            Err(ProviderError::AuthenticationFailed(message)) => {
                warn!("Sign in failed: {}", message);
                Err(friendly_auth_error(&message))
            }
            Err(e) => {
                warn!("Sign in failed: {}", e);
                Err(friendly_auth_error(&e.to_string()))
            }
        }
    }

    /// Handler for the login form. Empty fields are rejected before any
    /// remote call. Returns whether the user is now signed in.
    pub async fn submit_login_form(&mut self, email: &str, password: &str) -> bool {
        if email.trim().is_empty() || password.trim().is_empty() {
            self.notify(Notification::error(EMPTY_CREDENTIALS));
            return false;
        }

        match self.sign_in(email, password).await {
            Ok(_) => {
                self.view.panels.hide(Panel::AuthModal);
                self.notify(Notification::success("Login successful!"));
                true
            }
            Err(e) => {
                self.notify(Notification::error(e.0));
                false
            }
        }
    }

    pub async fn sign_out(&mut self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!("Sign out call failed: {}", e);
        }
        info!("Signed out");
        self.enter_unauthenticated();
    }

    /// Show or hide the sign-in dialog, returning its new visibility
    pub fn toggle_auth_modal(&mut self) -> bool {
        self.view.panels.toggle(Panel::AuthModal)
    }

    async fn enter_authenticated(&mut self, session: Session) {
        let panels = &mut self.view.panels;
        panels.show(Panel::FileBrowser);
        panels.hide(Panel::WelcomeSection);
        panels.show(Panel::UploadButton);
        panels.show(Panel::UserMenu);
        panels.hide(Panel::AuthButton);
        if let Some(initial) = session.avatar_initial() {
            self.view.avatar = Some(initial);
        }
        self.session = SessionState::Authenticated(session);

        self.list_directory(DirPath::root()).await;
    }

    fn enter_unauthenticated(&mut self) {
        let panels = &mut self.view.panels;
        panels.show(Panel::WelcomeSection);
        panels.hide(Panel::FileBrowser);
        panels.hide(Panel::UploadButton);
        panels.hide(Panel::UserMenu);
        panels.show(Panel::AuthButton);

        self.session = SessionState::Unauthenticated;
        self.view.avatar = None;
        self.current_path = DirPath::root();
        self.view.breadcrumbs = breadcrumbs(&self.current_path);
        self.view.clear_entries();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{controller, Call};

    #[test]
    fn test_friendly_auth_error_table() {
        assert_eq!(friendly_auth_error("Invalid login credentials").0, "Invalid email or password");
        assert_eq!(friendly_auth_error("Email not confirmed").0, "Please verify your email first");
        assert_eq!(friendly_auth_error("User already registered").0, "Email already in use");
        assert_eq!(
            friendly_auth_error("Password should be at least 6 characters").0,
            "Password must be 6+ characters"
        );
        assert_eq!(
            friendly_auth_error("database is on fire").0,
            "Authentication failed. Please try again."
        );
    }

    #[test]
    fn test_avatar_initial() {
        let session = Session { user_id: "u1".into(), email: Some("alice@example.com".into()) };
        assert_eq!(session.avatar_initial(), Some('A'));
        let anonymous = Session { user_id: "u2".into(), email: None };
        assert_eq!(anonymous.avatar_initial(), None);
    }

    #[tokio::test]
    async fn test_unauthenticated_load_shows_welcome() {
        let (mut ctl, backend, surface) = controller();

        assert!(ctl.check_current_session().await.is_none());

        assert!(ctl.view().is_visible(Panel::WelcomeSection));
        assert!(ctl.view().is_visible(Panel::AuthButton));
        assert!(!ctl.view().is_visible(Panel::FileBrowser));
        assert!(!ctl.view().is_visible(Panel::UploadButton));
        assert_eq!(backend.lock().unwrap().list_calls(), 0);
        assert!(surface.lock().unwrap().notifications.is_empty());
    }

    #[tokio::test]
    async fn test_failed_session_check_is_silent() {
        let (mut ctl, backend, surface) = controller();
        backend.lock().unwrap().failing.insert("current_user");

        assert!(ctl.check_current_session().await.is_none());

        assert!(!ctl.is_authenticated());
        assert!(ctl.view().is_visible(Panel::WelcomeSection));
        assert!(surface.lock().unwrap().notifications.is_empty());
    }

    #[tokio::test]
    async fn test_existing_session_lists_root() {
        let (mut ctl, backend, _surface) = controller();
        backend.lock().unwrap().signed_in = Some(crate::testing::user());

        let session = ctl.check_current_session().await.unwrap();

        assert_eq!(session.email.as_deref(), Some("alice@example.com"));
        assert!(ctl.view().is_visible(Panel::FileBrowser));
        assert_eq!(ctl.view().avatar, Some('A'));
        assert_eq!(backend.lock().unwrap().list_calls(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_lists_root_exactly_once() {
        let (mut ctl, backend, surface) = controller();
        ctl.check_current_session().await;
        ctl.toggle_auth_modal();

        assert!(ctl.submit_login_form("  alice@example.com ", " secret1 ").await);

        assert!(ctl.is_authenticated());
        assert!(ctl.view().is_visible(Panel::FileBrowser));
        assert!(ctl.view().is_visible(Panel::UserMenu));
        assert!(!ctl.view().is_visible(Panel::WelcomeSection));
        assert!(!ctl.view().is_visible(Panel::AuthButton));
        assert!(!ctl.view().is_visible(Panel::AuthModal));

        let state = backend.lock().unwrap();
        assert!(state
            .calls
            .contains(&Call::SignIn("alice@example.com".into(), "secret1".into())));
        assert_eq!(state.calls.iter().filter(|c| **c == Call::List(String::new())).count(), 1);
        assert_eq!(
            surface.lock().unwrap().notifications.last().map(|n| n.message.as_str()),
            Some("Login successful!")
        );
    }

    #[tokio::test]
    async fn test_bad_credentials_are_mapped() {
        let (mut ctl, _backend, surface) = controller();

        assert!(!ctl.submit_login_form("alice@example.com", "wrong").await);

        assert!(!ctl.is_authenticated());
        let log = surface.lock().unwrap();
        let last = log.notifications.last().unwrap();
        assert!(last.is_error());
        assert_eq!(last.message, "Invalid email or password");
    }

    #[tokio::test]
    async fn test_empty_credentials_short_circuit() {
        let (mut ctl, backend, surface) = controller();

        assert!(!ctl.submit_login_form("   ", "secret1").await);

        assert!(backend.lock().unwrap().calls.is_empty());
        assert_eq!(surface.lock().unwrap().notifications[0].message, EMPTY_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_sign_out_resets_state() {
        let (mut ctl, backend, _surface) = controller();
        backend.lock().unwrap().put("docs/a.txt", b"a");
        ctl.sign_in("alice@example.com", "secret1").await.unwrap();
        ctl.list_directory(DirPath::parse("docs")).await;
        assert_eq!(ctl.view().rows.len(), 1);

        ctl.sign_out().await;

        assert!(!ctl.is_authenticated());
        assert!(ctl.current_path().is_root());
        assert!(ctl.view().rows.is_empty());
        assert!(ctl.view().is_visible(Panel::WelcomeSection));
        assert_eq!(ctl.view().avatar, None);
        assert!(backend.lock().unwrap().calls.contains(&Call::SignOut));
    }
}
