//! VirtualPath - hierarchical entry paths rooted at `/`

use crate::{validate_name, FsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path separator used by every virtual path
pub const SEPARATOR: char = '/';

/// A normalized, absolute path inside the registry
///
/// Invariants:
/// - always starts with `/`
/// - never ends with `/` unless it is the root
/// - no empty, `.` or `..` segments
///
/// Serialized as its plain string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualPath {
    display: String,
}

impl VirtualPath {
    /// The root sentinel `/`
    pub fn root() -> Self {
        Self {
            display: SEPARATOR.to_string(),
        }
    }

    /// Parse and normalize a user supplied path
    ///
    /// Repeated and trailing separators are collapsed; a missing leading
    /// separator is added. Each segment must be a valid entry name.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FsError::InvalidPath("path must not be empty".to_string()));
        }

        let mut display = String::with_capacity(trimmed.len() + 1);
        for segment in trimmed.split(SEPARATOR).filter(|s| !s.is_empty()) {
            validate_name(segment)
                .map_err(|e| FsError::InvalidPath(format!("{}: {}", trimmed, e)))?;
            display.push(SEPARATOR);
            display.push_str(segment);
        }

        if display.is_empty() {
            return Ok(Self::root());
        }

        Ok(Self { display })
    }

    /// Is this the root sentinel?
    pub fn is_root(&self) -> bool {
        self.display.len() == 1
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Append a child name
    pub fn join(&self, name: &str) -> Result<Self> {
        validate_name(name)?;

        let display = if self.is_root() {
            format!("{}{}", SEPARATOR, name)
        } else {
            format!("{}{}{}", self.display, SEPARATOR, name)
        };

        Ok(Self { display })
    }

    /// Containing folder, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        match self.display.rfind(SEPARATOR) {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self {
                display: self.display[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Last segment, `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.display.rsplit(SEPARATOR).next()
    }

    /// Path segments below the root
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.display.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// True if `self` equals `ancestor` or lies somewhere below it
    pub fn starts_with(&self, ancestor: &VirtualPath) -> bool {
        self == ancestor || self.is_descendant_of(ancestor)
    }

    /// True if `self` lies strictly below `ancestor`
    pub fn is_descendant_of(&self, ancestor: &VirtualPath) -> bool {
        if ancestor.is_root() {
            return !self.is_root();
        }

        self.display.len() > ancestor.display.len()
            && self.display.starts_with(&ancestor.display)
            && self.display[ancestor.display.len()..].starts_with(SEPARATOR)
    }

    /// Replace the `from` prefix with `to`
    ///
    /// Returns `None` when `self` is not `from` or one of its descendants.
    pub fn rebase(&self, from: &VirtualPath, to: &VirtualPath) -> Option<Self> {
        if self == from {
            return Some(to.clone());
        }
        if !self.is_descendant_of(from) {
            return None;
        }

        let rest = if from.is_root() {
            &self.display[1..]
        } else {
            &self.display[from.display.len() + 1..]
        };

        let display = if to.is_root() {
            format!("{}{}", SEPARATOR, rest)
        } else {
            format!("{}{}{}", to.display, SEPARATOR, rest)
        };

        Some(Self { display })
    }

    /// Cumulative prefixes from the root down to `self`, both inclusive
    ///
    /// `/Docs/2024` -> `["/", "/Docs", "/Docs/2024"]`
    pub fn breadcrumbs(&self) -> Vec<Self> {
        let mut crumbs = vec![Self::root()];
        let mut current = Self::root();

        for segment in self.segments() {
            current = Self {
                display: if current.is_root() {
                    format!("{}{}", SEPARATOR, segment)
                } else {
                    format!("{}{}{}", current.display, SEPARATOR, segment)
                },
            };
            crumbs.push(current.clone());
        }

        crumbs
    }
}

impl Default for VirtualPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl FromStr for VirtualPath {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VirtualPath {
    type Error = FsError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VirtualPath> for String {
    fn from(path: VirtualPath) -> Self {
        path.display
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> VirtualPath {
        VirtualPath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(p("/").as_str(), "/");
        assert_eq!(p("///").as_str(), "/");
        assert_eq!(p("Docs").as_str(), "/Docs");
        assert_eq!(p("/Docs//2024/").as_str(), "/Docs/2024");
    }

    #[test]
    fn test_parse_rejects_bad_segments() {
        assert!(VirtualPath::parse("").is_err());
        assert!(VirtualPath::parse("/Docs/../etc").is_err());
        assert!(VirtualPath::parse("/Docs/./x").is_err());
    }

    #[test]
    fn test_join_and_parent() {
        let root = VirtualPath::root();
        let docs = root.join("Docs").unwrap();
        assert_eq!(docs.as_str(), "/Docs");

        let file = docs.join("a.txt").unwrap();
        assert_eq!(file.as_str(), "/Docs/a.txt");
        assert_eq!(file.parent(), Some(docs.clone()));
        assert_eq!(docs.parent(), Some(root.clone()));
        assert_eq!(root.parent(), None);
        assert_eq!(file.file_name(), Some("a.txt"));
        assert_eq!(root.file_name(), None);

        assert!(docs.join("a/b").is_err());
        assert!(docs.join("").is_err());
        assert!(docs.join("a.txt ").is_err());
        assert!(VirtualPath::parse("/Docs /a.txt").is_err());
    }

    #[test]
    fn test_descendant_checks() {
        let docs = p("/Docs");
        assert!(p("/Docs/a.txt").is_descendant_of(&docs));
        assert!(p("/Docs/x/y").is_descendant_of(&docs));
        assert!(!p("/Docs").is_descendant_of(&docs));
        assert!(!p("/Docsy").is_descendant_of(&docs));
        assert!(p("/Docs").starts_with(&docs));
        assert!(p("/Docs").is_descendant_of(&VirtualPath::root()));
        assert!(!VirtualPath::root().is_descendant_of(&VirtualPath::root()));
    }

    #[test]
    fn test_rebase() {
        let from = p("/Docs");
        let to = p("/Papers");
        assert_eq!(p("/Docs").rebase(&from, &to), Some(p("/Papers")));
        assert_eq!(p("/Docs/a/b.txt").rebase(&from, &to), Some(p("/Papers/a/b.txt")));
        assert_eq!(p("/Docsy/a").rebase(&from, &to), None);

        let nested = p("/Archive/2024");
        assert_eq!(p("/Docs/a.txt").rebase(&from, &nested), Some(p("/Archive/2024/a.txt")));
    }

    #[test]
    fn test_breadcrumbs() {
        let crumbs: Vec<String> = p("/Docs/2024/q1")
            .breadcrumbs()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(crumbs, vec!["/", "/Docs", "/Docs/2024", "/Docs/2024/q1"]);
        assert_eq!(VirtualPath::root().breadcrumbs(), vec![VirtualPath::root()]);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&p("/Docs/a.txt")).unwrap();
        assert_eq!(json, "\"/Docs/a.txt\"");
        let back: VirtualPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("/Docs/a.txt"));
        assert!(serde_json::from_str::<VirtualPath>("\"/a/../b\"").is_err());
    }
}
