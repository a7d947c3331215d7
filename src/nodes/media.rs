//! Nodes backed by external media: tile maps, particles, skeletal
//! animations, video and web views

use serde_json::Value;

use super::base::{start, walk_children};
use super::props::{copy, copy_all, Kind};
use crate::classify::Variant;
use crate::context::ConversionContext;
use crate::document::CanonicalNode;
use crate::error::{ConvertError, Result};
use crate::record::Record;
use crate::resolver::ResourceDescriptor;

const RESOURCE_TYPE_LOCAL: i64 = 1;

fn finish(ctx: &mut ConversionContext<'_, '_>, record: &Record, mut out: CanonicalNode) -> Result<CanonicalNode> {
    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

/// Tile map; its base `contentSize` moves to `desiredContentSize`.
pub(super) fn build_tiled_map(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::TiledMap)?;
    let content_size = out.base.shift_remove("contentSize");

    if let Some(map) = ctx.require_component(index, record, Variant::TiledMap, "cc.TiledMap") {
        match map.uuid_ref("_tmxFile") {
            Some(uuid) => {
                if let Some(path) = ctx.tiled_map_path(uuid) {
                    out.set("tmxFilename", ctx.prefixed(&path));
                }
            }
            None => ctx.incomplete(index, Variant::TiledMap, "missing tmx file"),
        }
    }
    if let Some(size) = content_size {
        out.set("desiredContentSize", size);
    }

    finish(ctx, record, out)
}

pub(super) fn build_particle_system(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::ParticleSystem)?;

    if let Some(particles) = ctx.require_component(index, record, Variant::ParticleSystem, "cc.ParticleSystem") {
        match particles.uuid_ref("_file") {
            Some(uuid) => {
                if let Some(path) = ctx.resource_path(uuid) {
                    out.set("particleFilename", ctx.prefixed(&path));
                }
            }
            None => ctx.incomplete(index, Variant::ParticleSystem, "missing particle file"),
        }
        if let Some(path) = particles.uuid_ref("_texture").and_then(|uuid| ctx.resource_path(uuid)) {
            out.set("texturePath", ctx.prefixed(&path));
        }
    }

    finish(ctx, record, out)
}

pub(super) fn build_spine_skeleton(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::SpineSkeleton)?;

    if let Some(skeleton) = ctx.require_component(index, record, Variant::SpineSkeleton, "sp.Skeleton") {
        match skeleton.uuid_ref("_N$skeletonData") {
            Some(uuid) => {
                if let Some(paths) = ctx.skeleton(uuid) {
                    out.set("jsonFile", ctx.prefixed(&paths.json));
                    out.set("atlasFile", ctx.prefixed(&paths.atlas));
                }
            }
            None => ctx.incomplete(index, Variant::SpineSkeleton, "missing skeleton data"),
        }
        copy_all(
            skeleton,
            &[
                ("defaultSkin", "defaultSkin"),
                ("defaultAnimation", "defaultAnimation"),
                ("loop", "loop"),
                ("premultipliedAlpha", "_premultipliedAlpha"),
                ("timeScale", "_N$timeScale"),
                ("debugSlots", "_N$debugSlots"),
                ("debugBones", "_N$debugBones"),
            ],
            &mut out.properties,
        );
    }

    finish(ctx, record, out)
}

/// Armature animation. The atlas image named inside the texture data file
/// joins the manifest as `<atlas uuid>_image`.
pub(super) fn build_dragon_bones(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::DragonBones)?;

    if let Some(display) = ctx.require_component(index, record, Variant::DragonBones, "dragonBones.ArmatureDisplay") {
        copy_all(
            display,
            &[
                ("armature", "_armatureName"),
                ("animation", "_animationName"),
                ("timeScale", "_N$timeScale"),
                ("playTimes", "playTimes"),
            ],
            &mut out.properties,
        );

        if let Some(uuid) = display.uuid_ref("_N$dragonAsset") {
            if let Some(path) = ctx.resource_path(uuid) {
                out.set("boneDataPath", ctx.prefixed(&path));
                let data = ctx.state.resolver.read_asset_json(uuid);
                if let Some(data) = ctx.recover(data) {
                    match data.get("name") {
                        Some(name) => out.set("boneDataName", name.clone()),
                        None => ctx.warn(ConvertError::sidecar(uuid, "bone data has no name")),
                    }
                }
            }
        }

        if let Some(uuid) = display.uuid_ref("_N$dragonAtlasAsset") {
            if let Some(atlas) = ctx.resource(uuid) {
                out.set("textureDataPath", ctx.prefixed(&atlas.relative_path));
                let data = ctx.state.resolver.read_asset_json(uuid);
                if let Some(data) = ctx.recover(data) {
                    match data.get("imagePath").and_then(Value::as_str) {
                        Some(image) => {
                            let descriptor = sibling_file(&atlas, image);
                            ctx.state.resolver.register(format!("{}_image", uuid), descriptor);
                        }
                        None => ctx.warn(ConvertError::sidecar(uuid, "texture data has no imagePath")),
                    }
                }
            }
        }
    }

    finish(ctx, record, out)
}

/// A file named `name` in the same folder as `descriptor`.
fn sibling_file(descriptor: &ResourceDescriptor, name: &str) -> ResourceDescriptor {
    let fullpath = match descriptor.fullpath.parent() {
        Some(parent) => parent.join(name),
        None => name.into(),
    };
    let relative_path = match descriptor.relative_path.rfind('/') {
        Some(i) => format!("{}/{}", &descriptor.relative_path[..i], name),
        None => name.to_string(),
    };
    ResourceDescriptor { fullpath, relative_path }
}

pub(super) fn build_video_player(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::VideoPlayer)?;

    if let Some(video) = ctx.require_component(index, record, Variant::VideoPlayer, "cc.VideoPlayer") {
        let is_local = video.i64_field("_resourceType") == Some(RESOURCE_TYPE_LOCAL);
        out.set("isLocal", is_local);
        copy(video, "_N$isFullscreen", "fullScreen", Kind::Value, &mut out.properties);
        copy(video, "_N$keepAspectRatio", "keepAspect", Kind::Value, &mut out.properties);
        if is_local {
            match video.uuid_ref("_clip") {
                Some(uuid) => {
                    if let Some(path) = ctx.resource_path(uuid) {
                        out.set("url", ctx.prefixed(&path));
                    }
                }
                None => ctx.incomplete(index, Variant::VideoPlayer, "local video without a clip"),
            }
        } else {
            copy(video, "_remoteURL", "url", Kind::Value, &mut out.properties);
        }
    }

    finish(ctx, record, out)
}

pub(super) fn build_web_view(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::WebView)?;
    if let Some(web) = ctx.require_component(index, record, Variant::WebView, "cc.WebView") {
        copy(web, "_url", "url", Kind::Value, &mut out.properties);
    }
    finish(ctx, record, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_sibling_file() {
        let atlas = ResourceDescriptor {
            fullpath: PathBuf::from("/p/assets/bones/hero_tex.json"),
            relative_path: "bones/hero_tex.json".into(),
        };
        let image = sibling_file(&atlas, "hero_tex.png");
        assert_eq!(image.fullpath, PathBuf::from("/p/assets/bones/hero_tex.png"));
        assert_eq!(image.relative_path, "bones/hero_tex.png");
    }

    #[test]
    fn test_sibling_file_at_root() {
        let atlas = ResourceDescriptor { fullpath: PathBuf::from("/p/a.json"), relative_path: "a.json".into() };
        assert_eq!(sibling_file(&atlas, "a.png").relative_path, "a.png");
    }
}
