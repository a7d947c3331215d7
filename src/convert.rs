//! Top-level conversion of scene and prefab files

use std::path::{Path, PathBuf};

use crate::assets::AssetIndex;
use crate::context::{ConversionContext, ConversionState};
use crate::document::{CollisionRow, SceneDocument};
use crate::error::{ConvertError, Result};
use crate::nodes::build_node;
use crate::record::RecordStore;
use crate::resolver::{ResourceManifest, ResourceResolver};

/// Settings applied to every converted file.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Prefix for paths the runtime loads directly (`/` appended if missing)
    pub asset_prefix: String,
    /// Collision matrix copied into every document
    pub collision_matrix: Vec<CollisionRow>,
}

/// Result of converting one file.
#[derive(Debug)]
pub struct ConversionOutput {
    pub document: SceneDocument,
    /// Resources the document refers to, keyed by uuid or derived key
    pub manifest: ResourceManifest,
    /// Non-fatal problems met along the way
    pub warnings: Vec<ConvertError>,
}

/// Converts files against one asset index.
pub struct SceneConverter<'i> {
    index: &'i dyn AssetIndex,
    options: ConvertOptions,
}

impl<'i> SceneConverter<'i> {
    pub fn new(index: &'i dyn AssetIndex, options: ConvertOptions) -> Self {
        Self { index, options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a `.fire` or `.prefab` file read through the asset index.
    pub fn convert_file(&self, path: &Path) -> Result<ConversionOutput> {
        log::info!("converting {}", path.display());
        let bytes = self
            .index
            .read_file(path)
            .map_err(|source| ConvertError::Io { path: path.to_path_buf(), source })?;
        self.convert_bytes(&bytes)
    }

    /// Convert an in-memory record array. Scene files are rooted at their
    /// `cc.SceneAsset`, prefab files at the `cc.Prefab` data node.
    pub fn convert_bytes(&self, bytes: &[u8]) -> Result<ConversionOutput> {
        let records = RecordStore::load(bytes)?;
        let root = records
            .scene_root()
            .or_else(|| records.prefab_root())
            .ok_or_else(|| ConvertError::malformed(None, "no cc.SceneAsset or cc.Prefab root record"))?;

        let mut state = ConversionState::new(ResourceResolver::new(self.index), &self.options.asset_prefix);
        let root = {
            let mut ctx = ConversionContext::new(&records, &mut state);
            build_node(&mut ctx, root)?
        };

        let ConversionState { resolver, clips, asset_prefix, design_resolution, fit_policy, warnings, .. } = state;
        let (manifest, frames) = resolver.into_parts();

        let mut document = SceneDocument::new(root);
        document.design_resolution = design_resolution;
        document.resolution_fit_policy = fit_policy;
        document.sprite_frames = frames
            .into_iter()
            .map(|mut frame| {
                frame.texture_path = format!("{}{}", asset_prefix, frame.texture_path);
                frame
            })
            .collect();
        document.animation_clips = clips.into_clips();
        document.collision_matrix = self.options.collision_matrix.clone();

        log::info!(
            "converted {} nodes, {} resources, {} warnings",
            document.root.count(),
            manifest.len(),
            warnings.len()
        );
        Ok(ConversionOutput { document, manifest, warnings })
    }

    /// Convert files one after another; a failing file does not stop the rest.
    pub fn convert_batch<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<(PathBuf, Result<ConversionOutput>)> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let result = self.convert_file(path);
                if let Err(e) = &result {
                    log::warn!("{}: {}", path.display(), e);
                }
                (path.to_path_buf(), result)
            })
            .collect()
    }
}

/// Convert one file.
pub fn convert_scene_file(index: &dyn AssetIndex, path: &Path, options: &ConvertOptions) -> Result<ConversionOutput> {
    SceneConverter::new(index, options.clone()).convert_file(path)
}

/// Convert one in-memory file.
pub fn convert_scene_bytes(index: &dyn AssetIndex, bytes: &[u8], options: &ConvertOptions) -> Result<ConversionOutput> {
    SceneConverter::new(index, options.clone()).convert_bytes(bytes)
}
