//! Build pipeline orchestration.
//!
//! Converts every discovered scene in order, writes one document per scene
//! and one manifest merged across all of them.

use crate::assets::{AssetDatabase, IndexError};
use crate::build::{create_build_plan, BuildContext, BuildPlan, BuildResult, DiscoveryError, SceneTarget, TargetResult};
use crate::convert::{ConvertOptions, SceneConverter};
use crate::document::{collision_matrix, write_document, write_manifest, CollisionRow};
use crate::resolver::ResourceManifest;
use serde_json::Value;
use std::fs;
use std::time::Instant;

/// Error during build execution.
#[derive(Debug)]
pub enum BuildError {
    /// Discovery error
    Discovery(DiscoveryError),
    /// Asset index could not be loaded
    Index(IndexError),
    /// IO error
    Io(std::io::Error),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Discovery(e) => write!(f, "Discovery error: {}", e),
            BuildError::Index(e) => write!(f, "Asset index error: {}", e),
            BuildError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<DiscoveryError> for BuildError {
    fn from(e: DiscoveryError) -> Self {
        BuildError::Discovery(e)
    }
}

impl From<IndexError> for BuildError {
    fn from(e: IndexError) -> Self {
        BuildError::Index(e)
    }
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Io(e)
    }
}

/// Load the project's asset index: the prebuilt file when configured,
/// otherwise a scan of the mounts.
pub fn load_asset_index(ctx: &BuildContext) -> Result<AssetDatabase, IndexError> {
    match ctx.index_file() {
        Some(file) => AssetDatabase::from_index_file(&file),
        None => {
            let index = &ctx.config().index;
            AssetDatabase::scan(ctx.project_root(), &index.mounts, &index.library)
        }
    }
}

/// Collision matrix from the project settings file. A missing or unreadable
/// settings file yields an empty matrix.
pub fn load_collision_matrix(ctx: &BuildContext) -> Vec<CollisionRow> {
    let path = ctx.settings_path();
    let contents = match fs::read(&path) {
        Ok(contents) => contents,
        Err(e) => {
            log::debug!("no project settings at {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Value>(&contents) {
        Ok(settings) => collision_matrix(&settings),
        Err(e) => {
            log::warn!("ignoring invalid project settings {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    context: BuildContext,
    /// Whether to stop on first error
    fail_fast: bool,
    /// Whether to do a dry run (don't write anything)
    dry_run: bool,
}

impl BuildPipeline {
    pub fn new(context: BuildContext) -> Self {
        Self { context, fail_fast: false, dry_run: false }
    }

    /// Set fail-fast mode (stop on first error).
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set dry-run mode (discover only).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Discover scenes, convert them and write the outputs.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let plan = create_build_plan(&self.context)?;
        let plan = match self.context.target_filter() {
            Some(filter) => plan.filter(filter),
            None => plan,
        };

        let mut result = self.execute_plan(&plan)?;
        result.total_duration = start.elapsed();
        Ok(result)
    }

    fn execute_plan(&self, plan: &BuildPlan) -> Result<BuildResult, BuildError> {
        let mut result = BuildResult::new();

        if self.context.is_verbose() {
            println!("Build plan: {} scenes", plan.len());
            for target in plan.targets() {
                println!("  - {}", target.id);
            }
        }

        if self.dry_run {
            for target in plan.targets() {
                result.add_result(TargetResult::skipped(target.id.clone()));
            }
            return Ok(result);
        }

        let index = load_asset_index(&self.context)?;
        let options = ConvertOptions {
            asset_prefix: self.context.asset_prefix().to_string(),
            collision_matrix: load_collision_matrix(&self.context),
        };
        let converter = SceneConverter::new(&index, options);
        fs::create_dir_all(self.context.out_dir())?;

        let mut manifest = ResourceManifest::new();
        for target in plan.targets() {
            let target_result = self.execute_target(&converter, target, &mut manifest);
            let failed = target_result.status.is_failure();
            result.add_result(target_result);
            if failed && self.fail_fast {
                return Ok(result);
            }
        }

        if result.success_count() > 0 {
            let path = self.context.manifest_path();
            write_manifest(&manifest, &path, self.context.is_pretty())?;
            result.resources = manifest.len();
            result.manifest = Some(path);
        }

        Ok(result)
    }

    /// Convert one scene and write its document; its resources join `manifest`.
    fn execute_target(
        &self,
        converter: &SceneConverter<'_>,
        target: &SceneTarget,
        manifest: &mut ResourceManifest,
    ) -> TargetResult {
        let start = Instant::now();

        if self.context.is_verbose() {
            println!("Converting: {} ...", target.id);
        }

        let output = match converter.convert_file(&target.source) {
            Ok(output) => output,
            Err(e) => return TargetResult::failed(target.id.clone(), e.to_string(), start.elapsed()),
        };
        let warnings: Vec<String> = output.warnings.iter().map(|w| w.to_string()).collect();

        if self.context.is_strict() && !warnings.is_empty() {
            let error = format!("{} warnings in strict mode: {}", warnings.len(), warnings.join("; "));
            return TargetResult::failed(target.id.clone(), error, start.elapsed()).with_warnings(warnings);
        }

        if let Err(e) = write_document(&output.document, &target.output, self.context.is_pretty()) {
            let error = format!("Failed to write {}: {}", target.output.display(), e);
            return TargetResult::failed(target.id.clone(), error, start.elapsed());
        }

        for (key, descriptor) in output.manifest {
            manifest.entry(key).or_insert(descriptor);
        }

        let duration = start.elapsed();
        if self.context.is_verbose() {
            println!("  Done in {:?}", duration);
        }
        TargetResult::success(target.id.clone(), target.output.clone(), output.document.root.count(), duration)
            .with_warnings(warnings)
    }
}
