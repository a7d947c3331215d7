//! Sprites, labels, rich text, masks and motion streaks

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::base::{start, walk_children};
use super::props::{copy, copy_all, enum_name, Kind};
use crate::classify::Variant;
use crate::context::ConversionContext;
use crate::document::CanonicalNode;
use crate::error::Result;

const SPRITE_TYPES: &[&str] = &["Simple", "Sliced", "Tiled", "Filled"];
const SIZE_MODES: &[&str] = &["Custom", "Trimmed", "Raw"];
pub(super) const H_ALIGNMENTS: &[&str] = &["Left", "Center", "Right"];
const V_ALIGNMENTS: &[&str] = &["Top", "Center", "Bottom"];
const OVERFLOW_TYPES: &[&str] = &["None", "Clamp", "Shrink", "ResizeHeight"];
const MASK_TYPES: &[&str] = &["Rect", "Ellipse", "ImageStencil"];

pub(super) fn build_sprite(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::Sprite)?;

    if let Some(sprite) = ctx.require_component(index, record, Variant::Sprite, "cc.Sprite") {
        // the rest only makes sense for a frame that resolves
        let name = sprite.uuid_ref("_spriteFrame").and_then(|uuid| ctx.sprite_frame_name(uuid));
        if let Some(name) = name {
            out.set("spriteFrameName", name);
            if let Some(t) = enum_name(sprite, "_type", SPRITE_TYPES) {
                out.set("spriteType", t);
            }
            copy(sprite, "_srcBlendFactor", "srcBlend", Kind::Value, &mut out.properties);
            copy(sprite, "_dstBlendFactor", "dstBlend", Kind::Value, &mut out.properties);
            copy(sprite, "_isTrimmedMode", "trimEnabled", Kind::Value, &mut out.properties);
            if let Some(mode) = enum_name(sprite, "_sizeMode", SIZE_MODES) {
                out.set("sizeMode", mode);
            }
        }
    }

    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

pub(super) fn build_label(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::Label)?;

    if let Some(label) = ctx.require_component(index, record, Variant::Label, "cc.Label") {
        copy_all(label, &[("fontSize", "_fontSize"), ("labelText", "_N$string")], &mut out.properties);

        if let Some(outline) = ctx.records().component(record, "cc.LabelOutline") {
            let mut info = serde_json::Map::new();
            if let Some(color) = outline.field("_color").and_then(|c| super::convert(c, Kind::Rgba)) {
                info.insert("color".to_string(), color);
            }
            if let Some(width) = outline.field("_width") {
                info.insert("width".to_string(), width.clone());
            }
            out.set("outline", Value::Object(info));
        }

        set_enum(&mut out, "horizontalAlignment", enum_name(label, "_N$horizontalAlign", H_ALIGNMENTS));
        set_enum(&mut out, "verticalAlignment", enum_name(label, "_N$verticalAlign", V_ALIGNMENTS));
        set_enum(&mut out, "overflowType", enum_name(label, "_N$overflow", OVERFLOW_TYPES));
        copy(label, "_enableWrapText", "enableWrap", Kind::Value, &mut out.properties);

        if label.bool_field("_isSystemFontUsed").unwrap_or(false) {
            out.set("fontType", "System");
            out.set("fontName", "arial");
        } else {
            match label.uuid_ref("_N$file") {
                Some(uuid) => {
                    if let Some(font) = ctx.font_path(uuid) {
                        out.set("fontName", ctx.prefixed(&font));
                        if font.ends_with(".ttf") {
                            out.set("fontType", "TTF");
                        } else if font.ends_with(".fnt") {
                            out.set("fontType", "BMFont");
                        } else {
                            ctx.incomplete(index, Variant::Label, format!("font '{}' is neither TTF nor bitmap", font));
                        }
                    }
                }
                None => ctx.incomplete(index, Variant::Label, "custom font without a font file"),
            }
            copy(label, "_lineHeight", "lineHeight", Kind::Value, &mut out.properties);
        }
    }

    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

fn set_enum(out: &mut CanonicalNode, key: &str, name: Option<&'static str>) {
    if let Some(name) = name {
        out.set(key, name);
    }
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn outline_attributes() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"(<outline color|width)=(\w*) (color|width)=(\w*)")
}

fn image_source() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"<img src='(\w+)'")
}

fn image_tag() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"(<img\s+src='\w+')")
}

/// Rewrite rich text markup into the form the runtime parser accepts.
///
/// Quotes the first pair of bare outline attributes, turns the first
/// `<br/>` into a newline and wraps text that does not open with a tag in
/// `<font>`.
pub fn rewrite_markup(text: &str) -> String {
    let mut text = match outline_attributes() {
        Some(re) => re.replacen(text, 1, "${1}='${2}' ${3}='${4}'").into_owned(),
        None => text.to_string(),
    };
    text = text.replacen("<br/>", "\n", 1);
    if !text.starts_with('<') {
        text = format!("<font>{}</font>", text);
    }
    text
}

/// Size the first inline image tag.
fn size_image(text: &str, width: f64, height: f64) -> String {
    match image_tag() {
        Some(re) => re
            .replacen(text, 1, format!("${{1}} width='{}' height='{}'", width, height).as_str())
            .into_owned(),
        None => text.to_string(),
    }
}

pub(super) fn build_rich_text(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::RichText)?;

    if let Some(rich) = ctx.require_component(index, record, Variant::RichText, "cc.RichText") {
        let mut text = rewrite_markup(rich.str_field("_N$string").unwrap_or_default());

        if let Some(atlas) = rich.uuid_ref("_N$imageAtlas") {
            let source = image_source()
                .and_then(|re| re.captures(&text))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            match source {
                Some(source) => {
                    if let Some((w, h)) = atlas_image_size(ctx, atlas, &source) {
                        text = size_image(&text, w, h);
                    }
                }
                None => ctx.incomplete(index, Variant::RichText, "image atlas set but no <img> tag"),
            }
        }

        out.set("text", text);
        set_enum(&mut out, "horizontalAlignment", enum_name(rich, "_N$horizontalAlign", H_ALIGNMENTS));
        copy_all(
            rich,
            &[("fontSize", "_N$fontSize"), ("maxWidth", "_N$maxWidth"), ("lineHeight", "_N$lineHeight")],
            &mut out.properties,
        );
        if let Some(font) = rich.uuid_ref("_N$font").and_then(|uuid| ctx.font_path(uuid)) {
            out.set("fontFilename", font);
        }
    }

    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

/// Original size of the frame an atlas names `source`, registering the frame.
fn atlas_image_size(ctx: &mut ConversionContext<'_, '_>, atlas: &str, source: &str) -> Option<(f64, f64)> {
    let document = ctx.state.resolver.read_document(atlas);
    let document = ctx.recover(document)?;
    let Some(frame) = document
        .pointer(&format!("/_spriteFrames/{}/__uuid__", source))
        .and_then(Value::as_str)
    else {
        ctx.warn(crate::error::ConvertError::sidecar(atlas, format!("atlas has no frame '{}'", source)));
        return None;
    };
    let size = ctx.state.resolver.sprite_frame(frame).map(|f| f.original_size);
    ctx.recover(size).map(|s| (s.w, s.h))
}

pub(super) fn build_mask(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::Mask)?;

    if let Some(mask) = ctx.require_component(index, record, Variant::Mask, "cc.Mask") {
        let mask_type = enum_name(mask, "_type", MASK_TYPES);
        set_enum(&mut out, "type", mask_type);
        copy(mask, "_N$inverted", "inverted", Kind::Value, &mut out.properties);
        match mask_type {
            Some("Ellipse") => copy(mask, "_segements", "segments", Kind::Value, &mut out.properties),
            Some("ImageStencil") => {
                copy(mask, "_N$alphaThreshold", "alphaThreshold", Kind::Value, &mut out.properties);
                match mask.uuid_ref("_N$spriteFrame") {
                    Some(uuid) => {
                        if let Some(name) = ctx.sprite_frame_name(uuid) {
                            out.set("spriteFrame", name);
                        }
                    }
                    None => ctx.incomplete(index, Variant::Mask, "image stencil without a sprite frame"),
                }
            }
            _ => {}
        }
    }

    let children = ctx.records().children(record);
    walk_children(ctx, &mut out.children, &children, None)?;
    Ok(out)
}

/// Streak drawn behind a node; never has children of its own.
pub(super) fn build_motion_streak(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let (record, mut out) = start(ctx, index, Variant::MotionStreak)?;

    if let Some(streak) = ctx.require_component(index, record, Variant::MotionStreak, "cc.MotionStreak") {
        copy(streak, "_fadeTime", "timeToFade", Kind::Value, &mut out.properties);
        copy(streak, "_minSeg", "minSeg", Kind::Value, &mut out.properties);
        copy(streak, "_stroke", "strokeWidth", Kind::Value, &mut out.properties);
        copy(streak, "_color", "strokeColor", Kind::Rgb, &mut out.properties);
        copy(streak, "_fastMode", "fastMode", Kind::Value, &mut out.properties);
        match streak.uuid_ref("_texture") {
            Some(uuid) => {
                if let Some(path) = ctx.resource_path(uuid) {
                    out.set("texturePath", ctx.prefixed(&path));
                }
            }
            None => ctx.incomplete(index, Variant::MotionStreak, "missing texture"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_plain_text() {
        assert_eq!(rewrite_markup("hello"), "<font>hello</font>");
    }

    #[test]
    fn test_rewrite_line_break_first_only() {
        assert_eq!(rewrite_markup("<b>a</b><br/>b<br/>"), "<b>a</b>\nb<br/>");
    }

    #[test]
    fn test_rewrite_outline_attributes() {
        assert_eq!(
            rewrite_markup("<outline color=red width=4>hi</outline>"),
            "<outline color='red' width='4'>hi</outline>"
        );
    }

    #[test]
    fn test_rewrite_outline_width_first() {
        let out = rewrite_markup("<outline width=4 color=red>hi</outline>");
        assert_eq!(out, "<outline width='4' color='red'>hi</outline>");
    }

    #[test]
    fn test_size_image() {
        assert_eq!(
            size_image("<img src='coin'/>", 32.0, 16.0),
            "<img src='coin' width='32' height='16'/>"
        );
    }
}
