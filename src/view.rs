//! Presentation model
//!
//! `ViewState` is what a front end draws: which panels are visible, the
//! rendered rows of the file list and grid, the breadcrumb trail, the avatar
//! and the upload progress. Workflows only ever mutate this model; the
//! surface decides how to paint it.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::dir_path::{breadcrumbs, Breadcrumb, DirPath};
use crate::format::{file_extension, file_icon, file_type_label, format_file_size, format_timestamp};
use crate::providers::RemoteEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Panel {
    FileBrowser,
    WelcomeSection,
    UploadButton,
    UserMenu,
    AuthButton,
    AuthModal,
    EmptyState,
    ListView,
    GridView,
    UploadModal,
    UploadArea,
    UploadProgress,
    UploadSuccess,
    ContextMenu,
}

/// Visibility flags, one per panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panels {
    hidden: BTreeSet<Panel>,
}

impl Panels {
    pub fn show(&mut self, panel: Panel) {
        self.hidden.remove(&panel);
    }

    pub fn hide(&mut self, panel: Panel) {
        self.hidden.insert(panel);
    }

    pub fn set_visible(&mut self, panel: Panel, visible: bool) {
        if visible {
            self.show(panel)
        } else {
            self.hide(panel)
        }
    }

    /// Flip a panel, returning its new visibility
    pub fn toggle(&mut self, panel: Panel) -> bool {
        let visible = !self.is_visible(panel);
        self.set_visible(panel, visible);
        visible
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        !self.hidden.contains(&panel)
    }
}

impl Default for Panels {
    fn default() -> Self {
        let hidden = [
            Panel::FileBrowser,
            Panel::UploadButton,
            Panel::UserMenu,
            Panel::AuthModal,
            Panel::EmptyState,
            Panel::GridView,
            Panel::UploadModal,
            Panel::UploadProgress,
            Panel::UploadSuccess,
            Panel::ContextMenu,
        ]
        .into_iter()
        .collect();
        Self { hidden }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

/// A row of the list view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub name: String,
    pub extension: String,
    pub type_label: String,
    pub icon: &'static str,
    pub size_label: String,
    pub modified_label: String,
    /// Directory the row was rendered for
    pub dir: DirPath,
    pub filtered_out: bool,
}

/// A card of the grid view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCard {
    pub name: String,
    pub extension: String,
    pub type_label: String,
    pub icon: &'static str,
    pub dir: DirPath,
    pub filtered_out: bool,
}

impl FileRow {
    pub fn from_entry(entry: &RemoteEntry, dir: &DirPath) -> Self {
        let name = entry.display_name().to_string();
        let extension = file_extension(&name);
        Self {
            type_label: file_type_label(&extension),
            icon: file_icon(&extension),
            size_label: format_file_size(entry.size.unwrap_or(0)),
            modified_label: format_timestamp(entry.created_at.as_deref()),
            dir: dir.clone(),
            filtered_out: false,
            extension,
            name,
        }
    }
}

impl FileCard {
    pub fn from_entry(entry: &RemoteEntry, dir: &DirPath) -> Self {
        let name = entry.display_name().to_string();
        let extension = file_extension(&name);
        Self {
            type_label: file_type_label(&extension),
            icon: file_icon(&extension),
            dir: dir.clone(),
            filtered_out: false,
            extension,
            name,
        }
    }
}

/// Shared upload percentage, written from progress callbacks
#[derive(Debug, Clone, Default)]
pub struct ProgressIndicator(Arc<AtomicU8>);

impl ProgressIndicator {
    pub fn set(&self, percent: u8) {
        self.0.store(percent.min(100), Ordering::Relaxed);
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.set(0);
    }
}

/// Percentage of `loaded` over `total`, rounded; an empty transfer is complete
pub fn percent_of(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = loaded.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub panels: Panels,
    pub mode: ViewMode,
    pub rows: Vec<FileRow>,
    pub cards: Vec<FileCard>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub avatar: Option<char>,
    pub upload_progress: ProgressIndicator,
    pub drop_highlight: bool,
    /// File targeted by the open context menu
    pub context_target: Option<String>,
    pub search_term: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            panels: Panels::default(),
            mode: ViewMode::default(),
            rows: Vec::new(),
            cards: Vec::new(),
            breadcrumbs: breadcrumbs(&DirPath::root()),
            avatar: None,
            upload_progress: ProgressIndicator::default(),
            drop_highlight: false,
            context_target: None,
            search_term: String::new(),
        }
    }
}

impl ViewState {
    pub fn is_visible(&self, panel: Panel) -> bool {
        self.panels.is_visible(panel)
    }

    /// Replace the rendered listing. Both representations are rebuilt from
    /// the same entries, so their counts always match.
    pub fn render_entries(&mut self, entries: &[RemoteEntry], dir: &DirPath) {
        self.rows = entries.iter().map(|e| FileRow::from_entry(e, dir)).collect();
        self.cards = entries.iter().map(|e| FileCard::from_entry(e, dir)).collect();
        self.context_target = None;
        self.panels.hide(Panel::ContextMenu);
        self.apply_search();
        self.sync_listing_panels();
    }

    pub fn clear_entries(&mut self) {
        self.rows.clear();
        self.cards.clear();
        self.context_target = None;
        self.panels.hide(Panel::ContextMenu);
        self.sync_listing_panels();
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.sync_listing_panels();
    }

    /// Empty listing shows the empty state and hides both views; otherwise
    /// the view matching the current mode is shown.
    fn sync_listing_panels(&mut self) {
        let has_entries = !self.rows.is_empty();
        self.panels.set_visible(Panel::EmptyState, !has_entries);
        self.panels
            .set_visible(Panel::ListView, has_entries && self.mode == ViewMode::List);
        self.panels
            .set_visible(Panel::GridView, has_entries && self.mode == ViewMode::Grid);
    }

    /// Hide rows and cards whose name does not contain the search term
    pub fn apply_search(&mut self) {
        let needle = self.search_term.to_lowercase();
        let matches = |name: &str| needle.is_empty() || name.to_lowercase().contains(&needle);
        for row in &mut self.rows {
            row.filtered_out = !matches(&row.name);
        }
        for card in &mut self.cards {
            card.filtered_out = !matches(&card.name);
        }
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &FileRow> {
        self.rows.iter().filter(|r| !r.filtered_out)
    }

    pub fn visible_cards(&self) -> impl Iterator<Item = &FileCard> {
        self.cards.iter().filter(|c| !c.filtered_out)
    }

    pub fn find_row(&self, name: &str) -> Option<&FileRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}
