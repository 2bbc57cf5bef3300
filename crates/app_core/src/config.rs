//! Application configuration

use crate::command::CommandId;
use crate::view::{SortBy, SortOrder, ViewMode};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub filer: FilerConfig,
    pub transfer: TransferConfig,
    pub search: SearchConfig,
    pub storage: StorageConfig,
    /// Command id -> shell words that invoke it
    pub aliases: HashMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            filer: FilerConfig::default(),
            transfer: TransferConfig::default(),
            search: SearchConfig::default(),
            storage: StorageConfig::default(),
            aliases: default_aliases(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Owner stamped on new entries; supplied by the identity provider
    pub owner_id: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            owner_id: "current-user".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilerConfig {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub view_mode: ViewMode,
    pub recent_limit: usize,
}

impl Default for FilerConfig {
    fn default() -> Self {
        Self {
            sort_by: SortBy::Name,
            sort_order: SortOrder::Ascending,
            view_mode: ViewMode::Grid,
            recent_limit: crate::registry::DEFAULT_RECENT_LIMIT,
        }
    }
}

/// Simulated upload pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub tick_interval_ms: u64,
    /// Upper bound of the per-tick progress increment, in percent
    pub max_increment: f32,
    /// How long a finished record stays visible
    pub completion_grace_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 200,
            max_increment: 10.0,
            completion_grace_ms: 3000,
        }
    }
}

impl TransferConfig {
    /// Smallest usable per-tick ceiling; anything lower would never finish
    pub const MIN_INCREMENT: f32 = 0.1;

    /// `max_increment` clamped to `[MIN_INCREMENT, 100]`
    pub fn increment_ceiling(&self) -> f32 {
        if self.max_increment.is_nan() {
            return Self::default().max_increment;
        }
        self.max_increment.clamp(Self::MIN_INCREMENT, 100.0)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn completion_grace(&self) -> Duration {
        Duration::from_millis(self.completion_grace_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key the snapshot is stored under
    pub store_name: String,
    /// Snapshot lifetime; `None` keeps it forever
    pub ttl_secs: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_name: "file-storage".to_string(),
            ttl_secs: None,
        }
    }
}

impl StorageConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Load configuration from the platform config file
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `config_path`, defaults if it does not exist
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the platform config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "NexusFiles", "NexusFiles")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Command id bound to a shell word, if any
    pub fn resolve_alias(&self, word: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, words)| words.iter().any(|w| w == word))
            .map(|(id, _)| id.as_str())
    }
}

fn default_aliases() -> HashMap<String, Vec<String>> {
    let mut al = HashMap::new();

    // ========================================
    // Navigation (nav.*)
    // ========================================

    al.insert(CommandId::NAV_CHANGE_DIR.into(), vec!["cd".into()]);
    al.insert(CommandId::NAV_BACK.into(), vec!["back".into()]);
    al.insert(CommandId::NAV_FORWARD.into(), vec!["forward".into(), "fwd".into()]);
    al.insert(CommandId::NAV_UP.into(), vec!["up".into(), "..".into()]);
    al.insert(CommandId::NAV_PRINT_DIR.into(), vec!["pwd".into()]);

    // ========================================
    // View (view.*)
    // ========================================

    al.insert(CommandId::VIEW_LIST.into(), vec!["ls".into(), "dir".into()]);
    al.insert(CommandId::VIEW_SEARCH.into(), vec!["search".into(), "/".into()]);
    al.insert(CommandId::VIEW_FILTER.into(), vec!["filter".into()]);
    al.insert(CommandId::VIEW_SORT.into(), vec!["sort".into()]);
    al.insert(CommandId::VIEW_MODE.into(), vec!["view".into()]);
    al.insert(CommandId::VIEW_RECENT.into(), vec!["recent".into()]);
    al.insert(CommandId::VIEW_STARRED.into(), vec!["starred".into()]);
    al.insert(CommandId::VIEW_TRANSFERS.into(), vec!["transfers".into()]);

    // ========================================
    // Selection (select.*)
    // ========================================

    al.insert(CommandId::SELECT_ITEM.into(), vec!["select".into(), "sel".into()]);
    al.insert(CommandId::SELECT_ALL.into(), vec!["selectall".into()]);
    al.insert(CommandId::SELECT_CLEAR.into(), vec!["deselect".into()]);

    // ========================================
    // File (file.*)
    // ========================================

    al.insert(CommandId::FILE_NEW_FOLDER.into(), vec!["mkdir".into()]);
    al.insert(CommandId::FILE_UPLOAD.into(), vec!["upload".into()]);
    al.insert(CommandId::FILE_OPEN.into(), vec!["open".into()]);
    al.insert(CommandId::FILE_RENAME.into(), vec!["rename".into()]);
    al.insert(CommandId::FILE_MOVE_TO.into(), vec!["mv".into()]);
    al.insert(CommandId::FILE_COPY_TO.into(), vec!["cp".into()]);
    al.insert(CommandId::FILE_DELETE.into(), vec!["rm".into(), "del".into()]);
    al.insert(CommandId::FILE_COPY.into(), vec!["copy".into()]);
    al.insert(CommandId::FILE_CUT.into(), vec!["cut".into()]);
    al.insert(CommandId::FILE_PASTE.into(), vec!["paste".into()]);

    // ========================================
    // Metadata (meta.*)
    // ========================================

    al.insert(CommandId::META_STAR.into(), vec!["star".into()]);
    al.insert(CommandId::META_SHARE.into(), vec!["share".into()]);
    al.insert(CommandId::META_TAG.into(), vec!["tag".into()]);
    al.insert(CommandId::META_UNTAG.into(), vec!["untag".into()]);

    // ========================================
    // App (app.*)
    // ========================================

    al.insert(CommandId::APP_HELP.into(), vec!["help".into(), "?".into()]);
    al.insert(CommandId::APP_QUIT.into(), vec!["quit".into(), "exit".into(), "q".into()]);

    al
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.general.owner_id, "current-user");
        assert_eq!(config.filer.recent_limit, 20);
        assert_eq!(config.transfer.tick_interval(), Duration::from_millis(200));
        assert_eq!(config.transfer.completion_grace(), Duration::from_millis(3000));
        assert_eq!(config.search.debounce(), Duration::from_millis(300));
        assert_eq!(config.storage.store_name, "file-storage");
        assert_eq!(config.storage.ttl(), None);
        assert_eq!(config.resolve_alias("ls"), Some(CommandId::VIEW_LIST));
        assert_eq!(config.resolve_alias("nope"), None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[filer]\nsort_by = \"size\"\nview_mode = \"list\"\n\n[storage]\nttl_secs = 60\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.filer.sort_by, SortBy::Size);
        assert_eq!(config.filer.view_mode, ViewMode::List);
        assert_eq!(config.filer.sort_order, SortOrder::Ascending);
        assert_eq!(config.storage.ttl(), Some(Duration::from_secs(60)));
        assert_eq!(config.transfer.max_increment, 10.0);
    }

    #[test]
    fn test_increment_ceiling_is_positive() {
        let mut transfer = TransferConfig::default();
        assert_eq!(transfer.increment_ceiling(), 10.0);

        for bad in [0.0, -5.0, f32::NEG_INFINITY] {
            transfer.max_increment = bad;
            assert_eq!(transfer.increment_ceiling(), TransferConfig::MIN_INCREMENT);
        }
        transfer.max_increment = f32::NAN;
        assert_eq!(transfer.increment_ceiling(), 10.0);
        transfer.max_increment = 500.0;
        assert_eq!(transfer.increment_ceiling(), 100.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.general.owner_id = "alice".into();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.general.owner_id, "alice");
        assert_eq!(loaded.resolve_alias("mkdir"), Some(CommandId::FILE_NEW_FOLDER));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.transfer.tick_interval_ms, 200);
    }
}
