use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const INDEX_FILE_NAME: &str = "_organize_index.json";
pub const SIDECAR_FILE_NAME: &str = "_folder_meta.json";
pub const CLEANUP_REPORT_FILE_NAME: &str = "_cleanup_report.json";
pub const REPORTS_DIR_NAME: &str = "_reports";
pub const LOCK_FILE_NAME: &str = ".folio.lock";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub organize_root: PathBuf,
    #[serde(default = "default_folder")]
    pub default_folder: String,
    #[serde(default = "default_reserved_prefixes")]
    pub reserved_prefixes: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// External program used as the folder renamer, argv style.
    #[serde(default)]
    pub rename_command: Option<Vec<String>>,
    /// Seconds the renamer may run for one folder before it is killed.
    #[serde(default = "default_rename_timeout_secs")]
    pub rename_timeout_secs: u64,
    #[serde(default)]
    pub thresholds: MatchThresholds,
}

/// Similarity cut-offs for folder routing and clustering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchThresholds {
    pub placement_sequence: f64,
    pub placement_parent_min: f64,
    pub placement_tree_min: f64,
    pub cluster_containment: f64,
    pub cluster_sequence: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            placement_sequence: 0.6,
            placement_parent_min: 0.3,
            placement_tree_min: 0.4,
            cluster_containment: 0.3,
            cluster_sequence: 0.65,
        }
    }
}

fn default_folder() -> String {
    "unsorted".to_string()
}

fn default_rename_timeout_secs() -> u64 {
    30
}

fn default_reserved_prefixes() -> Vec<String> {
    vec!["_".to_string(), ".".to_string()]
}

impl AppConfig {
    pub fn new(organize_root: impl Into<PathBuf>) -> Self {
        Self {
            organize_root: organize_root.into(),
            default_folder: default_folder(),
            reserved_prefixes: default_reserved_prefixes(),
            ignore_patterns: Vec::new(),
            rename_command: None,
            rename_timeout_secs: default_rename_timeout_secs(),
            thresholds: MatchThresholds::default(),
        }
    }

    /// Sidecars, index, reports and the lock file all carry a reserved prefix.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
    }

    pub fn is_reserved_os(&self, name: Option<&OsStr>) -> bool {
        match name {
            Some(name) => self.is_reserved(&name.to_string_lossy()),
            None => false,
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.organize_root.join(INDEX_FILE_NAME)
    }

    pub fn cleanup_report_path(&self) -> PathBuf {
        self.organize_root.join(CLEANUP_REPORT_FILE_NAME)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.organize_root.join(REPORTS_DIR_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.organize_root.join(LOCK_FILE_NAME)
    }

    /// Root-relative path with `/` separators, as stored in the index.
    pub fn relative(&self, path: &Path) -> String {
        relative_to(&self.organize_root, path)
    }
}

pub fn relative_to(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Load `Config.toml` (optional) overlaid with `FOLIO_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("organize_root", "./organized")?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("FOLIO")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("reserved_prefixes")
                .with_list_parse_key("ignore_patterns")
                .with_list_parse_key("rename_command"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        let config = AppConfig::new("/tmp/root");
        assert!(config.is_reserved("_folder_meta.json"));
        assert!(config.is_reserved(".folio.lock"));
        assert!(!config.is_reserved("report.txt"));
        assert!(!config.is_reserved("my_file_.txt"));
    }

    #[test]
    fn test_empty_prefix_reserves_nothing() {
        let mut config = AppConfig::new("/tmp/root");
        config.reserved_prefixes = vec![String::new()];
        assert!(!config.is_reserved("anything"));
    }

    #[test]
    fn test_relative_uses_forward_slashes() {
        let config = AppConfig::new("/tmp/root");
        let path = Path::new("/tmp/root").join("clients").join("acme");
        assert_eq!(config.relative(&path), "clients/acme");
        assert_eq!(config.relative(Path::new("/tmp/root")), "");
    }

    #[test]
    fn test_default_thresholds() {
        let t = MatchThresholds::default();
        assert_eq!(t.placement_sequence, 0.6);
        assert_eq!(t.placement_tree_min, 0.4);
        assert_eq!(t.cluster_containment, 0.3);
        assert_eq!(t.cluster_sequence, 0.65);
    }
}
