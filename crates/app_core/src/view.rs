//! View projection: what the dashboard shows for a directory
//!
//! Everything here is a pure function of the registry and the settings;
//! nothing is cached, so a listing can never go stale.

use crate::entry::Entry;
use crate::registry::EntryRegistry;
use app_fs::{natural_cmp, FileCategory, VirtualPath};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "size")]
    Size,
    #[serde(rename = "type")]
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    #[serde(rename = "grid")]
    Grid,
    #[serde(rename = "list")]
    List,
}

/// Type filter offered by the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Folder,
    Image,
    Document,
    Media,
}

impl TypeFilter {
    pub fn matches(self, entry: &Entry) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Folder => entry.is_folder(),
            TypeFilter::Image => entry.category().map_or(false, FileCategory::is_image),
            TypeFilter::Document => entry.category().map_or(false, FileCategory::is_document),
            TypeFilter::Media => entry.category().map_or(false, FileCategory::is_media),
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortBy::Name),
            "date" | "modified" => Ok(SortBy::Date),
            "size" => Ok(SortBy::Size),
            "type" => Ok(SortBy::Type),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "folder" | "folders" => Ok(TypeFilter::Folder),
            "image" | "images" => Ok(TypeFilter::Image),
            "document" | "documents" => Ok(TypeFilter::Document),
            "media" => Ok(TypeFilter::Media),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// Search, filter and sort state applied to a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSettings {
    pub query: String,
    pub filter: TypeFilter,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl ViewSettings {
    /// Case-insensitive substring match on the name; empty query matches all
    pub fn matches_query(&self, entry: &Entry) -> bool {
        let query = self.query.trim();
        query.is_empty() || entry.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Entries directly inside `path`, filtered and sorted
///
/// The sort is stable over insertion order, so equal keys keep their
/// creation order in both directions.
pub fn list_directory<'a>(
    registry: &'a EntryRegistry,
    path: &VirtualPath,
    settings: &ViewSettings,
) -> Vec<&'a Entry> {
    let mut listing: Vec<&Entry> = registry
        .children(path)
        .filter(|e| settings.matches_query(e) && settings.filter.matches(e))
        .collect();

    listing.sort_by(|a, b| {
        let cmp = compare(a, b, settings.sort_by);
        match settings.sort_order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });

    listing
}

fn compare(a: &Entry, b: &Entry, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Name => natural_cmp(&a.name, &b.name),
        SortBy::Date => a.modified_at.cmp(&b.modified_at),
        SortBy::Size => a.size.cmp(&b.size),
        // By kind name, so files come before folders ascending
        SortBy::Type => a.kind.as_str().cmp(b.kind.as_str()),
    }
}

/// Cumulative path prefixes from the root to `path`
pub fn breadcrumb(path: &VirtualPath) -> Vec<VirtualPath> {
    path.breadcrumbs()
}
