//! Node variant builders
//!
//! Each builder turns one node record (plus the components attached to it)
//! into a [`CanonicalNode`]. Base properties come from a shared field table
//! in [`base`]; variant properties come from the distinguishing component.
//! Builders that consume structural children (scroll view content, toggle
//! backgrounds, page view indicators) walk only what remains.

mod base;
mod controls;
mod media;
mod props;
mod renderers;
mod views;

pub use base::{base_properties, walk_children};
pub use props::{convert, enum_name, Kind};

use crate::classify::{classify, Variant};
use crate::context::ConversionContext;
use crate::document::CanonicalNode;
use crate::error::Result;
use crate::prefab;

/// Classify and build the node at `index`, including its subtree.
///
/// A node reachable from its own children fails with `MalformedInput`.
pub fn build_node(ctx: &mut ConversionContext<'_, '_>, index: usize) -> Result<CanonicalNode> {
    let records = ctx.records();
    let record = records.get(index)?;
    let variant = if record.record_type == "cc.Scene" {
        Variant::Scene
    } else {
        classify(record, records)
    };
    ctx.enter_node(index)?;
    let built = build_variant(ctx, index, variant);
    ctx.exit_node();
    built
}

/// Build the node at `index` as a given variant.
pub fn build_variant(ctx: &mut ConversionContext<'_, '_>, index: usize, variant: Variant) -> Result<CanonicalNode> {
    match variant {
        Variant::Node | Variant::Scene => base::build_container(ctx, index, variant),
        Variant::Canvas => views::build_canvas(ctx, index),
        Variant::Sprite => renderers::build_sprite(ctx, index),
        Variant::Label => renderers::build_label(ctx, index),
        Variant::RichText => renderers::build_rich_text(ctx, index),
        Variant::Mask => renderers::build_mask(ctx, index),
        Variant::MotionStreak => renderers::build_motion_streak(ctx, index),
        Variant::Button => controls::build_button(ctx, index),
        Variant::ProgressBar => controls::build_progress_bar(ctx, index),
        Variant::Slider => controls::build_slider(ctx, index),
        Variant::Toggle => controls::build_toggle(ctx, index),
        Variant::ToggleGroup => controls::build_toggle_group(ctx, index),
        Variant::EditBox => controls::build_edit_box(ctx, index),
        Variant::ScrollView => views::build_scroll_view(ctx, index),
        Variant::PageView => views::build_page_view(ctx, index),
        Variant::TiledMap => media::build_tiled_map(ctx, index),
        Variant::ParticleSystem => media::build_particle_system(ctx, index),
        Variant::SpineSkeleton => media::build_spine_skeleton(ctx, index),
        Variant::DragonBones => media::build_dragon_bones(ctx, index),
        Variant::VideoPlayer => media::build_video_player(ctx, index),
        Variant::WebView => media::build_web_view(ctx, index),
        Variant::Prefab => prefab::inline_prefab(ctx, index),
    }
}
