//! Configuration loading and discovery for `ccexport.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{CcConfig, IndexConfig, OutputConfig, ProjectConfig, ValidateConfig, WatchConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "ccexport.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse ccexport.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override scene directory
    pub assets: Option<PathBuf>,
    /// Override asset prefix
    pub asset_prefix: Option<String>,
    /// Override prebuilt uuid index
    pub index_file: Option<PathBuf>,
    /// Enable strict validation
    pub strict: Option<bool>,
    /// Pretty-print documents
    pub pretty: Option<bool>,
}

/// Find ccexport.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for ccexport.toml
/// 2. Check XDG_CONFIG_HOME/ccexport/ccexport.toml (or ~/.config/ccexport/ccexport.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find ccexport.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("ccexport").join(CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find ccexport.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a ccexport.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns a default
/// configuration.
///
/// # Example
/// ```ignore
/// let config = load_config(Some(Path::new("my-game/ccexport.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<CcConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

fn load_config_file(path: &Path) -> Result<CcConfig, ConfigError> {
    log::debug!("loading config from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let config: CcConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Create a default configuration when no ccexport.toml is found.
///
/// The project name is the current directory name.
pub fn default_config() -> CcConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    CcConfig {
        project: ProjectConfig {
            name: project_name,
            assets: PathBuf::from("assets"),
            out: PathBuf::from("json"),
            asset_prefix: String::new(),
            sources: vec!["**/*.fire".to_string()],
        },
        index: IndexConfig::default(),
        output: OutputConfig::default(),
        validate: ValidateConfig::default(),
        watch: WatchConfig::default(),
    }
}

/// Merge CLI overrides into a configuration. CLI arguments take precedence
/// over config file values.
pub fn merge_cli_overrides(config: &mut CcConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }

    if let Some(ref assets) = overrides.assets {
        config.project.assets = assets.clone();
    }

    if let Some(ref prefix) = overrides.asset_prefix {
        config.project.asset_prefix = prefix.clone();
    }

    if let Some(ref file) = overrides.index_file {
        config.index.file = Some(file.clone());
    }

    if let Some(strict) = overrides.strict {
        config.validate.strict = strict;
    }

    if let Some(pretty) = overrides.pretty {
        config.output.pretty = pretty;
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"[project]\nname = \"test\"")
            .expect("should write config content");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"[project]\nname = \"test\"")
            .expect("should write config content");

        let subdir = temp.path().join("assets").join("scenes");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        assert_eq!(find_config_from(temp.path().to_path_buf()), None);
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(
                br#"
[project]
name = "test-project"
asset_prefix = "res"

[output]
pretty = false
"#,
            )
            .expect("should write config content");

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.project.name, "test-project");
        assert_eq!(config.project.asset_prefix, "res");
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_config_explicit_missing_file_errors() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"this is not valid toml {{{")
            .expect("should write invalid config");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(
                br#"
[project]
name = ""

[watch]
debounce_ms = 0
"#,
            )
            .expect("should write invalid config");

        match load_config(Some(&config_path)) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_cli_overrides_multiple() {
        let mut config = default_config();
        let overrides = CliOverrides {
            out: Some(PathBuf::from("dist")),
            asset_prefix: Some("creator".to_string()),
            index_file: Some(PathBuf::from("uuids.json")),
            strict: Some(true),
            ..Default::default()
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.project.out, PathBuf::from("dist"));
        assert_eq!(config.project.asset_prefix, "creator");
        assert_eq!(config.index.file, Some(PathBuf::from("uuids.json")));
        assert!(config.validate.strict);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/project");
        assert_eq!(resolve_path(root, Path::new("/other/path")), PathBuf::from("/other/path"));
        assert_eq!(resolve_path(root, Path::new("assets")), PathBuf::from("/project/assets"));
    }

    #[test]
    fn test_project_root() {
        let config_path = Path::new("/project/ccexport.toml");
        assert_eq!(project_root(config_path), Some(Path::new("/project")));
    }

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(!config.project.name.is_empty());
        assert_eq!(config.project.out, PathBuf::from("json"));
        assert!(config.is_valid());
    }
}
