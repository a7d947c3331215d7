//! Configuration schema types for `ccexport.toml`
//!
//! Defines the structure and validation rules for exporter project configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Directory scenes are discovered in
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    /// Output directory for scene documents
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Prefix for paths the runtime loads directly
    #[serde(default)]
    pub asset_prefix: String,
    /// Glob patterns for scene files, relative to `assets`
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

fn default_assets() -> PathBuf {
    PathBuf::from("assets")
}

fn default_out() -> PathBuf {
    PathBuf::from("json")
}

fn default_sources() -> Vec<String> {
    vec!["**/*.fire".to_string()]
}

/// Where asset uuids are looked up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Prebuilt uuid index; when absent the mounts are scanned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Roots scanned for `.meta` files
    #[serde(default = "default_mounts")]
    pub mounts: Vec<PathBuf>,
    /// Editor import cache holding sidecar documents
    #[serde(default = "default_library")]
    pub library: PathBuf,
}

fn default_mounts() -> Vec<PathBuf> {
    vec![default_assets()]
}

fn default_library() -> PathBuf {
    PathBuf::from("library")
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { file: None, mounts: default_mounts(), library: default_library() }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Tab-indent documents instead of writing them compact
    #[serde(default = "default_true")]
    pub pretty: bool,
    /// Merged resource manifest, relative to the output directory
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Project settings file holding the collision matrix
    #[serde(default = "default_settings")]
    pub settings: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_manifest() -> PathBuf {
    PathBuf::from("resources.json")
}

fn default_settings() -> PathBuf {
    PathBuf::from("settings/project.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true, manifest: default_manifest(), settings: default_settings() }
    }
}

/// Validation settings for the build process
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidateConfig {
    /// Fail a file that converted with warnings
    #[serde(default)]
    pub strict: bool,
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100, clear_screen: true }
    }
}

/// Complete ccexport.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CcConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Asset index settings
    #[serde(default)]
    pub index: IndexConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Validation settings
    #[serde(default)]
    pub validate: ValidateConfig,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "project.sources")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ccexport.toml: '{}' {}", self.field, self.message)
    }
}

impl CcConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.project.sources.is_empty() {
            errors.push(ConfigValidationError {
                field: "project.sources".to_string(),
                message: "must contain at least one glob pattern".to_string(),
            });
        }
        for (i, pattern) in self.project.sources.iter().enumerate() {
            if let Err(e) = glob::Pattern::new(pattern) {
                errors.push(ConfigValidationError {
                    field: format!("project.sources[{}]", i),
                    message: format!("is not a valid glob pattern: {}", e),
                });
            }
        }

        if self.index.file.is_none() && self.index.mounts.is_empty() {
            errors.push(ConfigValidationError {
                field: "index.mounts".to_string(),
                message: "must list at least one root when no index file is given".to_string(),
            });
        }

        if self.output.manifest.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "output.manifest".to_string(),
                message: "must be a file name".to_string(),
            });
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let toml = r#"
[project]
name = "test-project"
"#;
        let config: CcConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.name, "test-project");
        assert_eq!(config.project.assets, PathBuf::from("assets"));
        assert_eq!(config.project.out, PathBuf::from("json"));
        assert_eq!(config.project.sources, vec!["**/*.fire".to_string()]);
        assert_eq!(config.project.asset_prefix, "");
        assert_eq!(config.index.mounts, vec![PathBuf::from("assets")]);
        assert!(config.output.pretty);
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[project]
name = "my-game"
assets = "game/assets"
out = "dist/json"
asset_prefix = "creator"
sources = ["scenes/**/*.fire", "prefabs/**/*.prefab"]

[index]
file = "asset-index.json"
mounts = ["game/assets", "packages/ui"]
library = "game/library"

[output]
pretty = false
manifest = "manifest.json"
settings = "game/settings/project.json"

[validate]
strict = true

[watch]
debounce_ms = 200
clear_screen = false
"#;
        let config: CcConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.project.asset_prefix, "creator");
        assert_eq!(config.project.sources.len(), 2);
        assert_eq!(config.index.file, Some(PathBuf::from("asset-index.json")));
        assert_eq!(config.index.mounts.len(), 2);
        assert_eq!(config.index.library, PathBuf::from("game/library"));
        assert!(!config.output.pretty);
        assert_eq!(config.output.manifest, PathBuf::from("manifest.json"));
        assert!(config.validate.strict);
        assert_eq!(config.watch.debounce_ms, 200);
        assert!(!config.watch.clear_screen);
    }

    #[test]
    fn test_validation_empty_name() {
        let toml = r#"
[project]
name = ""
"#;
        let config: CcConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "project.name"));
    }

    #[test]
    fn test_validation_bad_glob() {
        let toml = r#"
[project]
name = "test"
sources = ["scenes/[*.fire"]
"#;
        let config: CcConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "project.sources[0]"));
    }

    #[test]
    fn test_validation_no_sources() {
        let toml = r#"
[project]
name = "test"
sources = []
"#;
        let config: CcConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().iter().any(|e| e.field == "project.sources"));
    }

    #[test]
    fn test_validation_no_index_source() {
        let toml = r#"
[project]
name = "test"

[index]
mounts = []
"#;
        let config: CcConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().iter().any(|e| e.field == "index.mounts"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigValidationError { field: "watch.debounce_ms".into(), message: "must be a positive integer".into() };
        assert_eq!(err.to_string(), "ccexport.toml: 'watch.debounce_ms' must be a positive integer");
    }
}
