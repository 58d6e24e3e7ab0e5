//! Terminal front end
//!
//! A line-oriented `Surface`, a text renderer for `ViewState` and the
//! command language of the `skyvault` binary.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::browser::FileAction;
use crate::controller::AppController;
use crate::dir_path::DirPath;
use crate::notification::{Notification, NotificationKind};
use crate::surface::{ProgressListener, Surface};
use crate::upload::LocalFile;
use crate::view::{Panel, ViewMode, ViewState};

/// Produces the next line of user input, `None` at end of input
pub type LineSource = Box<dyn FnMut() -> io::Result<Option<String>> + Send>;

pub fn read_stdin_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin().read_line(&mut line)?;
    Ok((read > 0).then_some(line))
}

pub fn stdin_lines() -> LineSource {
    Box::new(read_stdin_line)
}

pub struct TerminalSurface {
    download_dir: PathBuf,
    input: LineSource,
    out: Box<dyn Write + Send>,
    bar: ProgressBar,
}

impl TerminalSurface {
    pub fn new(download_dir: PathBuf) -> Self {
        Self::with_io(download_dir, stdin_lines(), Box::new(io::stdout()))
    }

    pub fn with_io(download_dir: PathBuf, input: LineSource, out: Box<dyn Write + Send>) -> Self {
        let style = ProgressStyle::with_template("Uploading [{bar:40.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        let bar = ProgressBar::new(100);
        bar.set_style(style);
        Self { download_dir, input, out, bar }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        let _ = write!(self.out, "{} ", question);
        let _ = self.out.flush();
        match (self.input)() {
            Ok(line) => line.map(|l| l.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }

    fn say(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
    }
}

impl Surface for TerminalSurface {
    fn notify(&mut self, notification: &Notification) {
        let marker = match notification.kind {
            NotificationKind::Success => "✓",
            NotificationKind::Error => "✗",
            NotificationKind::Info => "ℹ",
        };
        self.say(&format!("{} {}", marker, notification.message));
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.ask(&format!("{} [y/N]", message))
            .map(|answer| matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    /// An empty answer keeps `default`; end of input cancels
    fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        let answer = self.ask(&format!("{} [{}]", message, default))?;
        if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }

    fn save_file(&mut self, file_name: &str, data: &[u8]) -> io::Result<()> {
        let base = Path::new(file_name).file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("Bad file name: {}", file_name))
        })?;
        std::fs::create_dir_all(&self.download_dir)?;
        let target = self.download_dir.join(base);
        std::fs::write(&target, data)?;
        debug!("Saved {} bytes to {}", data.len(), target.display());
        self.say(&format!("Saved to {}", target.display()));
        Ok(())
    }

    fn preview(&mut self, object_path: &str) {
        self.say(&format!("[preview] {}", object_path));
    }

    fn present_share_link(&mut self, file_name: &str, url: &str) {
        self.say(&format!("Share link for {}:\n  {}", file_name, url));
    }

    fn progress_listener(&self) -> Option<ProgressListener> {
        let bar = self.bar.clone();
        Some(Arc::new(move |percent| {
            if bar.is_finished() {
                bar.reset();
            }
            bar.set_position(u64::from(percent));
            if percent >= 100 {
                bar.finish_and_clear();
            }
        }))
    }
}

// ─── Rendering ─────────────────────────────────────────────────────────

/// Draw the presentation model as plain text
pub fn render(view: &ViewState) -> String {
    let mut out = String::new();

    if view.is_visible(Panel::WelcomeSection) {
        out.push_str("Welcome to SkyVault. Sign in with: login <email> <password>\n");
        return out;
    }

    if let Some(initial) = view.avatar {
        let _ = writeln!(out, "({})", initial);
    }

    let trail: Vec<String> = view
        .breadcrumbs
        .iter()
        .enumerate()
        .map(|(i, crumb)| format!("[{}] {}", i, crumb.label))
        .collect();
    let _ = writeln!(out, "{}", trail.join(" > "));

    if !view.search_term.is_empty() {
        let _ = writeln!(out, "Filter: {}", view.search_term);
    }

    if view.is_visible(Panel::EmptyState) {
        out.push_str("  (no files)\n");
    } else if view.is_visible(Panel::ListView) {
        for row in view.visible_rows() {
            let _ = writeln!(
                out,
                "  {:<32} {:<20} {:>10}  {}",
                row.name, row.type_label, row.size_label, row.modified_label
            );
        }
    } else if view.is_visible(Panel::GridView) {
        let cards: Vec<String> = view
            .visible_cards()
            .map(|c| format!("[{}] {}", c.extension, c.name))
            .collect();
        for line in cards.chunks(3) {
            let _ = writeln!(out, "  {}", line.join("    "));
        }
    }

    if view.is_visible(Panel::UploadProgress) {
        let _ = writeln!(out, "Uploading... {}%", view.upload_progress.get());
    }
    if view.is_visible(Panel::UploadSuccess) {
        out.push_str("Upload complete\n");
    }
    out
}

// ─── Commands ──────────────────────────────────────────────────────────

pub const HELP: &str = "\
Commands:
  login <email> <password>   Sign in
  logout                     Sign out
  ls                         Refresh the current directory
  cd <path>                  Change directory (/abs, rel, ..)
  crumb <n>                  Jump to breadcrumb n
  open|get|rm|mv|share <name>  Act on a file
  put <files...>             Upload local files here
  find <term>                Filter by name (empty clears)
  view list|grid             Switch view
  help                       This text
  quit                       Exit
Quote arguments that contain spaces: put \"my notes.txt\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    List,
    Cd(String),
    Crumb(usize),
    Action(FileAction, String),
    Put(Vec<PathBuf>),
    Find(String),
    View(ViewMode),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let need_arg = |what: &str| -> Result<String, String> {
            if rest.is_empty() {
                Err(format!("Usage: {} {}", word, what))
            } else {
                Ok(rest.to_string())
            }
        };

        match word {
            "login" => {
                let mut parts = split_args(rest)?.into_iter();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(email), Some(password), None) => Ok(Command::Login { email, password }),
                    _ => Err("Usage: login <email> <password>".to_string()),
                }
            }
            "logout" => Ok(Command::Logout),
            "ls" => Ok(Command::List),
            "cd" => need_arg("<path>").map(Command::Cd),
            "crumb" => rest
                .parse()
                .map(Command::Crumb)
                .map_err(|_| "Usage: crumb <n>".to_string()),
            "open" => need_arg("<name>").map(|n| Command::Action(FileAction::Open, n)),
            "get" => need_arg("<name>").map(|n| Command::Action(FileAction::Download, n)),
            "rm" => need_arg("<name>").map(|n| Command::Action(FileAction::Delete, n)),
            "mv" => need_arg("<name>").map(|n| Command::Action(FileAction::Rename, n)),
            "share" => need_arg("<name>").map(|n| Command::Action(FileAction::Share, n)),
            "put" => {
                let files: Vec<PathBuf> = split_args(rest)?.into_iter().map(PathBuf::from).collect();
                if files.is_empty() {
                    Err("Usage: put <files...>".to_string())
                } else {
                    Ok(Command::Put(files))
                }
            }
            "find" => Ok(Command::Find(rest.to_string())),
            "view" => match rest {
                "list" => Ok(Command::View(ViewMode::List)),
                "grid" => Ok(Command::View(ViewMode::Grid)),
                _ => Err("Usage: view list|grid".to_string()),
            },
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command: {} (try help)", other)),
        }
    }
}

/// Split on whitespace, honouring `"..."` and `'...'` quoting and `\`
/// escapes, so arguments may contain spaces.
pub fn split_args(input: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                let escaped = chars.next().ok_or("Trailing backslash")?;
                current.push(escaped);
                in_arg = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_arg = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_arg = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote".to_string());
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

/// Resolve a `cd` argument against the current directory
pub fn resolve_cd(current: &DirPath, arg: &str) -> DirPath {
    if arg == ".." {
        current.parent()
    } else if arg.starts_with('/') {
        DirPath::parse(arg)
    } else {
        DirPath::parse(&current.join(arg))
    }
}

/// Run one command against the controller. Returns `false` on quit.
pub async fn run_command(ctl: &mut AppController, command: Command, out: &mut dyn Write) -> bool {
    match command {
        Command::Login { email, password } => {
            ctl.submit_login_form(&email, &password).await;
        }
        Command::Logout => ctl.sign_out().await,
        Command::List => {
            ctl.refresh().await;
        }
        Command::Cd(arg) => {
            let target = resolve_cd(ctl.current_path(), &arg);
            ctl.list_directory(target).await;
        }
        Command::Crumb(index) => {
            if !ctl.navigate_to_crumb(index).await {
                let _ = writeln!(out, "No breadcrumb {}", index);
            }
        }
        Command::Action(action, name) => {
            ctl.perform_action(&name, action).await;
        }
        Command::Put(paths) => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                match LocalFile::read(path).await {
                    Ok(file) => files.push(file),
                    Err(e) => {
                        let _ = writeln!(out, "Cannot read {}: {}", path.display(), e);
                    }
                }
            }
            ctl.on_files_picked(files).await;
        }
        Command::Find(term) => {
            ctl.on_search_input(&term);
            ctl.settle_search().await;
        }
        Command::View(mode) => ctl.set_view_mode(mode),
        Command::Help => {
            let _ = writeln!(out, "{}", HELP);
        }
        Command::Quit => return false,
    }
    true
}
