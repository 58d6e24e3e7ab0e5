//! Directory path state and breadcrumb derivation
//!
//! The remote store has no real directories, only key prefixes. A `DirPath`
//! is such a prefix: empty for the root, otherwise `seg/seg/` with no leading
//! separator and exactly one trailing one.

use std::fmt;

pub const SEPARATOR: char = '/';

/// Label shown for the root crumb
pub const ROOT_LABEL: &str = "SkyVault";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DirPath(String);

impl DirPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize any user- or crumb-supplied path into prefix form.
    ///
    /// Empty segments are dropped, so `"/a//b"` becomes `"a/b/"`.
    pub fn parse(raw: &str) -> Self {
        let mut prefix = String::new();
        for segment in raw.split(SEPARATOR).filter(|s| !s.is_empty()) {
            prefix.push_str(segment);
            prefix.push(SEPARATOR);
        }
        Self(prefix)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The prefix as sent to the remote store
    pub fn as_prefix(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// The enclosing directory; the root is its own parent
    pub fn parent(&self) -> Self {
        let segments: Vec<&str> = self.segments().collect();
        match segments.split_last() {
            Some((_, rest)) => Self::parse(&rest.join("/")),
            None => Self::root(),
        }
    }

    /// Object key of `file_name` inside this directory
    pub fn join(&self, file_name: &str) -> String {
        format!("{}{}", self.0, file_name)
    }
}

impl fmt::Display for DirPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "/{}", self.0)
        }
    }
}

/// One clickable element of the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    pub target: DirPath,
}

/// Build the trail for `path`: the root crumb, then one crumb per segment
/// whose target is the first N segments each followed by a separator.
pub fn breadcrumbs(path: &DirPath) -> Vec<Breadcrumb> {
    let mut trail = vec![Breadcrumb {
        label: ROOT_LABEL.to_string(),
        target: DirPath::root(),
    }];

    let mut accumulated = String::new();
    for segment in path.segments() {
        accumulated.push_str(segment);
        accumulated.push(SEPARATOR);
        trail.push(Breadcrumb {
            label: segment.to_string(),
            target: DirPath(accumulated.clone()),
        });
    }
    trail
}
