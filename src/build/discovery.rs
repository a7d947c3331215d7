//! Scene file discovery for the build system.
//!
//! Discovers `.fire` and `.prefab` files based on glob patterns from the
//! configuration and maps each one to the document it produces.

use crate::build::BuildContext;
use glob::glob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Error during source discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// IO error during file enumeration
    Io(std::io::Error),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::Io(err) => write!(f, "IO error during discovery: {}", err),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<std::io::Error> for DiscoveryError {
    fn from(err: std::io::Error) -> Self {
        DiscoveryError::Io(err)
    }
}

/// One scene to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTarget {
    /// Source path relative to the assets directory, `/` separated
    pub id: String,
    /// Scene or prefab file
    pub source: PathBuf,
    /// Document written for it
    pub output: PathBuf,
}

/// Ordered set of scenes a build converts.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    targets: Vec<SceneTarget>,
}

impl BuildPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&mut self, target: SceneTarget) {
        self.targets.push(target);
    }

    pub fn targets(&self) -> &[SceneTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Keep targets whose id contains any of `filter`.
    pub fn filter(self, filter: &[String]) -> Self {
        let targets =
            self.targets.into_iter().filter(|t| filter.iter().any(|f| t.id.contains(f.as_str()))).collect();
        Self { targets }
    }
}

/// Discover scene files matching a glob pattern.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = base_dir.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths =
        glob(&pattern_str).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() && is_scene_file(&path) {
                    files.push(path);
                }
            }
            Err(e) => log::warn!("error reading path: {}", e),
        }
    }

    files.sort();
    Ok(files)
}

/// Check if a path is a scene or prefab file.
pub fn is_scene_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("fire") | Some("prefab"))
}

/// Discover all scene files from the configured patterns, deduplicated and sorted.
pub fn discover_all_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    let assets_dir = ctx.assets_dir();
    let mut all_files = BTreeSet::new();

    for pattern in &ctx.config().project.sources {
        all_files.extend(discover_files(&assets_dir, pattern)?);
    }

    Ok(all_files.into_iter().collect())
}

/// Create a build plan: one target per discovered scene, its document
/// mirroring the scene's place under the assets directory.
pub fn create_build_plan(ctx: &BuildContext) -> Result<BuildPlan, DiscoveryError> {
    let assets_dir = ctx.assets_dir();
    let out_dir = ctx.out_dir();
    let mut plan = BuildPlan::new();

    for source in discover_all_sources(ctx)? {
        let relative = source.strip_prefix(&assets_dir).unwrap_or(&source).to_path_buf();
        let id = relative.to_string_lossy().replace('\\', "/");
        let output = out_dir.join(relative.with_extension("json"));
        plan.add_target(SceneTarget { id, source, output });
    }

    log::debug!("build plan has {} scenes", plan.len());
    Ok(plan)
}
