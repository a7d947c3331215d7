//! Resource resolution
//!
//! Maps asset uuids to file paths through an [`AssetIndex`] and discovers the
//! derived files a runtime needs next to the referenced asset: atlas frames,
//! bitmap font pages, spine atlases and textures, tile map sources.
//!
//! Every resolved resource lands in the resource manifest, keyed by uuid (or
//! by a derived key such as `<uuid>-atlas`), in first-resolution order. A
//! resolver lives for exactly one top-level file conversion.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

use crate::assets::AssetIndex;
use crate::error::{ConvertError, Result};

/// Location of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Absolute (or index-relative) path of the file
    pub fullpath: PathBuf,
    /// Path relative to the owning mount root, `/`-separated
    pub relative_path: String,
}

/// Resources referenced by a conversion, keyed by uuid or derived key.
pub type ResourceManifest = IndexMap<String, ResourceDescriptor>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Geometry of one sprite frame, taken from its owner's `.meta` sub-asset table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteFrameDescriptor {
    /// Name nodes use to refer to this frame: the bare frame name for atlas
    /// frames, the texture path for standalone images
    pub name: String,
    /// Relative path of the texture the frame lives in
    pub texture_path: String,
    pub trim_rect: Rect,
    pub offset: Vec2,
    pub rotated: bool,
    pub original_size: Size,
    /// Whether the frame comes from a packed atlas rather than a standalone image
    pub is_atlas_packed: bool,
    /// Nine-slice insets, when any border is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_rect: Option<Rect>,
}

impl SpriteFrameDescriptor {
    fn from_meta(frame_name: &str, meta: &Value, texture_path: &str, is_atlas_packed: bool) -> Self {
        let num = |key: &str| meta.get(key).and_then(Value::as_f64).unwrap_or(0.0);

        let (width, height) = (num("width"), num("height"));
        let (top, bottom) = (num("borderTop"), num("borderBottom"));
        let (left, right) = (num("borderLeft"), num("borderRight"));
        let center_rect = (top != 0.0 || bottom != 0.0 || left != 0.0 || right != 0.0).then(|| Rect {
            x: left,
            y: top,
            w: width - right - left,
            h: height - bottom - top,
        });

        let name = if is_atlas_packed { frame_name } else { texture_path };
        Self {
            name: name.to_string(),
            texture_path: texture_path.to_string(),
            trim_rect: Rect { x: num("trimX"), y: num("trimY"), w: width, h: height },
            offset: Vec2 { x: num("offsetX"), y: num("offsetY") },
            rotated: meta.get("rotated").and_then(Value::as_bool).unwrap_or(false),
            original_size: Size { w: num("rawWidth"), h: num("rawHeight") },
            is_atlas_packed,
            center_rect,
        }
    }

    /// Name nodes use to refer to this frame, also its name in the frame table.
    pub fn lookup_name(&self) -> &str {
        &self.name
    }
}

/// Files making up a spine skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonPaths {
    pub json: String,
    pub atlas: String,
}

/// Cached uuid to path resolution for one conversion run.
pub struct ResourceResolver<'i> {
    index: &'i dyn AssetIndex,
    resources: ResourceManifest,
    frames: IndexMap<String, SpriteFrameDescriptor>,
    /// Frame uuids whose metadata was read but does not declare them
    missing_frames: IndexSet<String>,
}

impl<'i> ResourceResolver<'i> {
    pub fn new(index: &'i dyn AssetIndex) -> Self {
        Self { index, resources: IndexMap::new(), frames: IndexMap::new(), missing_frames: IndexSet::new() }
    }

    /// Resolve a uuid to its file and mount-relative path.
    pub fn resolve_path(&mut self, uuid: &str) -> Result<ResourceDescriptor> {
        if let Some(found) = self.resources.get(uuid) {
            return Ok(found.clone());
        }

        let fullpath = self.index.asset_path(uuid).ok_or_else(|| ConvertError::unknown_asset(uuid))?;
        let mount = self.index.asset_mount(uuid).ok_or_else(|| ConvertError::unknown_asset(uuid))?;
        let descriptor = ResourceDescriptor { relative_path: relative_to(&fullpath, &mount), fullpath };

        self.resources.insert(uuid.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    /// Name a node should use for a sprite frame (see [`SpriteFrameDescriptor::lookup_name`]).
    pub fn sprite_frame_name(&mut self, uuid: &str) -> Result<String> {
        self.sprite_frame(uuid).map(|frame| frame.lookup_name().to_string())
    }

    /// Whether a sprite frame belongs to a packed atlas.
    pub fn is_atlas_frame(&mut self, uuid: &str) -> Result<bool> {
        self.sprite_frame(uuid).map(|frame| frame.is_atlas_packed)
    }

    /// Descriptor of a sprite frame, loading it and every sibling frame
    /// declared by the same metadata on first use.
    pub fn sprite_frame(&mut self, uuid: &str) -> Result<&SpriteFrameDescriptor> {
        if !self.frames.contains_key(uuid) && !self.missing_frames.contains(uuid) {
            self.load_sprite_frames(uuid)?;
            if !self.frames.contains_key(uuid) {
                self.missing_frames.insert(uuid.to_string());
            }
        }
        self.frames.get(uuid).ok_or_else(|| {
            ConvertError::sidecar(uuid, "sprite frame is not declared by its texture metadata")
        })
    }

    fn load_sprite_frames(&mut self, uuid: &str) -> Result<()> {
        let document = self.read_document(uuid)?;
        let content = document
            .get("content")
            .ok_or_else(|| ConvertError::sidecar(uuid, "sprite frame document has no content"))?;
        let texture = content
            .get("texture")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConvertError::sidecar(uuid, "sprite frame has no texture"))?;
        let atlas = content.get("atlas").and_then(Value::as_str).unwrap_or_default();

        let is_atlas_packed = !atlas.is_empty();
        let meta_uuid = if is_atlas_packed { atlas } else { texture };
        let texture_path = self.resolve_path(texture)?.relative_path;
        let sub_metas = self.index.sub_metas(meta_uuid).ok_or_else(|| ConvertError::unknown_asset(meta_uuid))?;

        for (name, meta) in &sub_metas {
            let Some(frame_uuid) = meta.get("uuid").and_then(Value::as_str) else {
                continue;
            };
            if !self.frames.contains_key(frame_uuid) {
                let frame = SpriteFrameDescriptor::from_meta(name, meta, &texture_path, is_atlas_packed);
                self.frames.insert(frame_uuid.to_string(), frame);
            }
        }
        log::debug!("registered {} sprite frames from {}", sub_metas.len(), meta_uuid);
        Ok(())
    }

    /// Relative path of a bitmap (`.fnt`) or TrueType font.
    pub fn font_path(&mut self, uuid: &str) -> Result<String> {
        if let Some(found) = self.resources.get(uuid) {
            return Ok(found.relative_path.clone());
        }

        let document = self.read_document(uuid)?;
        let descriptor = match document.get("__type__").and_then(Value::as_str) {
            Some("cc.BitmapFont") => {
                let frame_uuid = uuid_at(&document, "spriteFrame")
                    .ok_or_else(|| ConvertError::sidecar(uuid, "bitmap font has no sprite frame"))?;
                let frame_document = self.read_document(frame_uuid)?;
                let texture = frame_document
                    .pointer("/content/texture")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ConvertError::sidecar(frame_uuid, "font page has no texture"))?;
                let page = self.resolve_path(texture)?;
                self.resources.insert(frame_uuid.to_string(), page.clone());
                ResourceDescriptor {
                    fullpath: page.fullpath.with_extension("fnt"),
                    relative_path: swap_extension(&page.relative_path, "fnt"),
                }
            }
            Some("cc.TTFFont") => {
                let raw_file = first_raw_file(&document)
                    .ok_or_else(|| ConvertError::sidecar(uuid, "font has no raw file"))?;
                let (folder, stem) = self.resource_folder(uuid)?;
                ResourceDescriptor {
                    fullpath: folder.join(raw_file),
                    relative_path: format!("{}/{}", stem, raw_file),
                }
            }
            other => {
                return Err(ConvertError::sidecar(
                    uuid,
                    format!("unsupported font type {}", other.unwrap_or("<none>")),
                ))
            }
        };

        let relative = descriptor.relative_path.clone();
        self.resources.insert(uuid.to_string(), descriptor);
        Ok(relative)
    }

    /// Skeleton JSON and atlas of a spine asset; textures join the manifest.
    pub fn skeleton(&mut self, uuid: &str) -> Result<SkeletonPaths> {
        let atlas_key = format!("{}-atlas", uuid);
        if let (Some(json), Some(atlas)) = (self.resources.get(uuid), self.resources.get(&atlas_key)) {
            return Ok(SkeletonPaths {
                json: json.relative_path.clone(),
                atlas: atlas.relative_path.clone(),
            });
        }

        let document = self.read_document(uuid)?;
        let (folder, stem) = self.resource_folder(uuid)?;
        let files = self
            .index
            .list_dir(&folder)
            .map_err(|e| ConvertError::sidecar(uuid, format!("cannot list {}: {}", folder.display(), e)))?;
        let skeleton_file = files
            .iter()
            .find(|f| f.extension().and_then(|e| e.to_str()) == Some("json"))
            .or_else(|| files.last())
            .ok_or_else(|| ConvertError::sidecar(uuid, "skeleton folder is empty"))?;
        let file_name = skeleton_file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let json = ResourceDescriptor {
            fullpath: skeleton_file.clone(),
            relative_path: format!("{}/{}", stem, file_name),
        };

        let atlas_uuid = uuid_at(&document, "atlasUrl")
            .ok_or_else(|| ConvertError::sidecar(uuid, "skeleton has no atlas"))?;
        let atlas = self.resolve_path(atlas_uuid)?;

        self.resources.insert(uuid.to_string(), json.clone());
        self.resources.insert(atlas_key, atlas.clone());
        for (i, texture) in uuid_list(&document, "textures").into_iter().enumerate() {
            let descriptor = self.resolve_path(texture)?;
            self.resources.insert(format!("{}-texture-{}", uuid, i), descriptor);
        }

        Ok(SkeletonPaths { json: json.relative_path, atlas: atlas.relative_path })
    }

    /// Relative path of a tile map's `.tmx` file, found next to its last texture.
    pub fn tiled_map_path(&mut self, uuid: &str) -> Result<String> {
        if let Some(found) = self.resources.get(uuid) {
            return Ok(found.relative_path.clone());
        }

        let document = self.read_document(uuid)?;
        let mut last_texture = None;
        for texture in uuid_list(&document, "textures") {
            last_texture = Some(self.resolve_path(texture)?);
        }
        let texture = last_texture.ok_or_else(|| ConvertError::sidecar(uuid, "tile map has no textures"))?;

        let descriptor = ResourceDescriptor {
            fullpath: texture.fullpath.with_extension("tmx"),
            relative_path: swap_extension(&texture.relative_path, "tmx"),
        };
        let relative = descriptor.relative_path.clone();
        self.resources.insert(uuid.to_string(), descriptor);
        Ok(relative)
    }

    /// Add a derived resource that has no uuid of its own.
    pub fn register(&mut self, key: impl Into<String>, descriptor: ResourceDescriptor) {
        self.resources.insert(key.into(), descriptor);
    }

    /// Parse the imported JSON document of an asset.
    pub fn read_document(&self, uuid: &str) -> Result<Value> {
        let path = self.index.import_path(uuid).ok_or_else(|| ConvertError::unknown_asset(uuid))?;
        self.read_json(uuid, &path)
    }

    /// Parse the source file of an asset as JSON.
    pub fn read_asset_json(&self, uuid: &str) -> Result<Value> {
        let path = self.index.asset_path(uuid).ok_or_else(|| ConvertError::unknown_asset(uuid))?;
        self.read_json(uuid, &path)
    }

    /// Raw bytes of an asset's source file.
    pub fn read_asset(&self, uuid: &str) -> Result<Vec<u8>> {
        let path = self.index.asset_path(uuid).ok_or_else(|| ConvertError::unknown_asset(uuid))?;
        self.index
            .read_file(&path)
            .map_err(|e| ConvertError::sidecar(uuid, format!("cannot read {}: {}", path.display(), e)))
    }

    fn read_json(&self, uuid: &str, path: &Path) -> Result<Value> {
        let bytes = self
            .index
            .read_file(path)
            .map_err(|e| ConvertError::sidecar(uuid, format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ConvertError::sidecar(uuid, format!("invalid JSON in {}: {}", path.display(), e)))
    }

    /// Folder the editor copies an asset's raw files into (`<importdir>/<uuid>`)
    /// and the stem used for their relative paths.
    fn resource_folder(&self, uuid: &str) -> Result<(PathBuf, String)> {
        let import = self.index.import_path(uuid).ok_or_else(|| ConvertError::unknown_asset(uuid))?;
        let stem = import.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let folder = import.parent().unwrap_or_else(|| Path::new("")).join(uuid);
        Ok((folder, stem))
    }

    pub fn resources(&self) -> &ResourceManifest {
        &self.resources
    }

    /// Sprite frames in registration order.
    pub fn sprite_frames(&self) -> impl Iterator<Item = &SpriteFrameDescriptor> {
        self.frames.values()
    }

    /// Consume the resolver, returning the manifest and sprite frame table.
    pub fn into_parts(self) -> (ResourceManifest, Vec<SpriteFrameDescriptor>) {
        (self.resources, self.frames.into_values().collect())
    }
}

/// `path` relative to `root` with `/` separators.
pub fn relative_to(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace the extension of a `/`-separated path.
pub fn swap_extension(path: &str, extension: &str) -> String {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(dot) => format!("{}.{}", &path[..name_start + dot], extension),
        None => format!("{}.{}", path, extension),
    }
}

fn uuid_at<'v>(document: &'v Value, key: &str) -> Option<&'v str> {
    document.get(key)?.get("__uuid__")?.as_str()
}

fn uuid_list<'v>(document: &'v Value, key: &str) -> Vec<&'v str> {
    document
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|t| t.get("__uuid__").and_then(Value::as_str)).collect())
        .unwrap_or_default()
}

fn first_raw_file(document: &Value) -> Option<&str> {
    document.get("_rawFiles")?.as_array()?.first()?.as_str()
}

/// Convenience for building a sub-meta table in tests and hosts.
pub fn sub_meta_table<I, K>(entries: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
