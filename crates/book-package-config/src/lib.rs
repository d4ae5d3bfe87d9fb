use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://git.door43.org/api/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// A repository on the resource host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub owner: String,
    pub repo: String,
}

impl ResourceConfig {
    fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }
}

/// A scripture translation the reader can switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Short label, e.g. `ULT`.
    pub name: String,
    pub owner: String,
    pub repo: String,
    /// Folder holding the USFM books inside the resource directory.
    pub books_dir: String,
}

/// Resources the helps pane reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpsConfig {
    pub notes: ResourceConfig,
    pub word_links: ResourceConfig,
    pub questions: ResourceConfig,
    pub words: ResourceConfig,
    pub academy: ResourceConfig,
}

impl Default for HelpsConfig {
    fn default() -> Self {
        Self {
            notes: ResourceConfig::new("unfoldingWord", "en_tn"),
            word_links: ResourceConfig::new("unfoldingWord", "en_twl"),
            questions: ResourceConfig::new("unfoldingWord", "en_tq"),
            words: ResourceConfig::new("unfoldingWord", "en_tw"),
            academy: ResourceConfig::new("unfoldingWord", "en_ta"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Synced resources live under `<data_dir>/resources`.
    pub data_dir: PathBuf,
    pub api_base: String,
    /// Everything `sync` downloads.
    pub resources: Vec<ResourceConfig>,
    pub translations: Vec<TranslationConfig>,
    pub helps: HelpsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            api_base: DEFAULT_API_BASE.to_string(),
            resources: vec![
                ResourceConfig::new("unfoldingWord", "en_ust"),
                ResourceConfig::new("unfoldingWord", "en_ult"),
                ResourceConfig::new("unfoldingWord", "en_tn"),
                ResourceConfig::new("unfoldingWord", "en_twl"),
                ResourceConfig::new("unfoldingWord", "en_tq"),
                ResourceConfig::new("unfoldingWord", "en_tw"),
                ResourceConfig::new("unfoldingWord", "en_ta"),
                ResourceConfig::new("Worldview", "en_bsb"),
            ],
            translations: vec![
                TranslationConfig {
                    name: "ULT".to_string(),
                    owner: "unfoldingWord".to_string(),
                    repo: "en_ult".to_string(),
                    books_dir: "en_ult".to_string(),
                },
                TranslationConfig {
                    name: "BSB".to_string(),
                    owner: "Worldview".to_string(),
                    repo: "en_bsb".to_string(),
                    books_dir: "en_bsb".to_string(),
                },
            ],
            helps: HelpsConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded data directory
        config.data_dir = Self::expand_path(&config.data_dir).unwrap_or(config.data_dir);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/book-package-reader");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_data_dir() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/book-package-reader");
        PathBuf::from(data_dir.as_ref())
    }

    /// Look a translation up by name, ignoring case.
    pub fn translation(&self, name: &str) -> Option<&TranslationConfig> {
        self.translations
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/book-package-reader/config.toml"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(!config.data_dir.to_string_lossy().starts_with('~'));
        assert!(config.data_dir.ends_with(".local/share/book-package-reader"));
        assert_eq!(config.api_base, "https://git.door43.org/api/v1");
        assert_eq!(config.resources.len(), 8);
        assert_eq!(config.resources[7], ResourceConfig::new("Worldview", "en_bsb"));
        assert_eq!(config.helps.academy.repo, "en_ta");
    }

    #[test]
    fn test_translation_lookup() {
        let config = Config::default();

        assert_eq!(config.translation("bsb").unwrap().books_dir, "en_bsb");
        assert_eq!(config.translation("ULT").unwrap().owner, "unfoldingWord");
        assert!(config.translation("UST").is_none());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            data_dir: PathBuf::from("/tmp/test-data"),
            ..Config::default()
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str(
            r#"
api_base = "https://example.org/api/v1"

[helps.notes]
owner = "someone"
repo = "en_tn"
"#,
        )
        .unwrap();

        assert_eq!(config.api_base, "https://example.org/api/v1");
        assert_eq!(config.helps.notes.owner, "someone");
        assert_eq!(config.helps.words, ResourceConfig::new("unfoldingWord", "en_tw"));
        assert_eq!(config.resources, Config::default().resources);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("BPR_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$BPR_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path).unwrap();
        assert_eq!(expanded, PathBuf::from("/test/env/path/subdir"));

        unsafe {
            env::remove_var("BPR_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "data_dir = [not valid").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            data_dir: PathBuf::from("/tmp/test-data"),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_config_with_env_var_in_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        unsafe {
            env::set_var("BPR_DATA_ROOT", "/custom/data");
        }
        std::fs::write(&config_file, "data_dir = \"$BPR_DATA_ROOT/reader\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data/reader"));

        unsafe {
            env::remove_var("BPR_DATA_ROOT");
        }
    }
}
