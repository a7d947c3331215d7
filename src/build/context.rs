//! Build context containing configuration and state for a build.

use crate::config::CcConfig;
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// The context provides access to all information needed to execute a build,
/// including the configuration, project root, and output directories.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: CcConfig,
    /// Project root directory (where ccexport.toml is located)
    project_root: PathBuf,
    /// Whether to run in strict mode (warnings are errors)
    strict: bool,
    /// Whether to run in verbose mode
    verbose: bool,
    /// Optional filter to build matching scenes only
    target_filter: Option<Vec<String>>,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: CcConfig, project_root: PathBuf) -> Self {
        let strict = config.validate.strict;
        Self { config, project_root, strict, verbose: false, target_filter: None }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CcConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Directory scenes are discovered in.
    pub fn assets_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.assets)
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Merged resource manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        let manifest = &self.config.output.manifest;
        if manifest.is_absolute() {
            manifest.clone()
        } else {
            self.out_dir().join(manifest)
        }
    }

    /// Project settings file holding the collision matrix.
    pub fn settings_path(&self) -> PathBuf {
        self.resolve_path(&self.config.output.settings)
    }

    /// Prebuilt uuid index, if configured.
    pub fn index_file(&self) -> Option<PathBuf> {
        self.config.index.file.as_deref().map(|p| self.resolve_path(p))
    }

    pub fn asset_prefix(&self) -> &str {
        &self.config.project.asset_prefix
    }

    pub fn is_pretty(&self) -> bool {
        self.config.output.pretty
    }

    /// Whether strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Build only scenes whose path contains one of `targets`.
    pub fn with_filter(mut self, targets: Vec<String>) -> Self {
        self.target_filter = Some(targets);
        self
    }

    /// Get the target filter.
    pub fn target_filter(&self) -> Option<&[String]> {
        self.target_filter.as_deref()
    }

    /// Resolve a path relative to the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::resolve_path(&self.project_root, path)
    }
}
