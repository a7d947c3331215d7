//! Conversion context
//!
//! [`ConversionState`] is everything one top-level file conversion owns:
//! the resource resolver, the clip library, canvas settings and the warning
//! list. [`ConversionContext`] pairs that state with the record store being
//! walked; inlining a prefab scopes a new context over the prefab's records
//! while sharing the state.

use crate::animation::ClipLibrary;
use crate::classify::Variant;
use crate::document::FitPolicy;
use crate::error::{ConvertError, Result};
use crate::record::{Record, RecordStore};
use crate::resolver::{ResourceDescriptor, ResourceResolver, Size, SkeletonPaths};

/// Per-file state shared by every builder.
pub struct ConversionState<'i> {
    pub resolver: ResourceResolver<'i>,
    pub clips: ClipLibrary,
    /// Prefix for runtime-loaded paths, empty or ending with `/`
    pub asset_prefix: String,
    pub design_resolution: Option<Size>,
    pub fit_policy: Option<FitPolicy>,
    pub warnings: Vec<ConvertError>,
    /// Uuids of the prefabs currently being inlined, outermost first
    pub prefab_chain: Vec<String>,
}

impl<'i> ConversionState<'i> {
    pub fn new(resolver: ResourceResolver<'i>, asset_prefix: &str) -> Self {
        Self {
            resolver,
            clips: ClipLibrary::new(),
            asset_prefix: normalize_prefix(asset_prefix),
            design_resolution: None,
            fit_policy: None,
            warnings: Vec::new(),
            prefab_chain: Vec::new(),
        }
    }
}

/// Append `/` to a non-empty prefix that lacks it.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// The record store being walked plus the shared per-file state.
pub struct ConversionContext<'c, 'i> {
    records: &'c RecordStore,
    pub state: &'c mut ConversionState<'i>,
    /// Indices of the nodes being built in `records`, outermost first
    ancestors: Vec<usize>,
}

impl<'c, 'i> ConversionContext<'c, 'i> {
    pub fn new(records: &'c RecordStore, state: &'c mut ConversionState<'i>) -> Self {
        Self { records, state, ancestors: Vec::new() }
    }

    pub fn records(&self) -> &'c RecordStore {
        self.records
    }

    /// Context over another record store sharing this file's state.
    pub fn scoped<'s>(&'s mut self, records: &'s RecordStore) -> ConversionContext<'s, 'i> {
        ConversionContext { records, state: &mut *self.state, ancestors: Vec::new() }
    }

    /// Record a non-fatal problem.
    pub fn warn(&mut self, error: ConvertError) {
        log::warn!("{}", error);
        self.state.warnings.push(error);
    }

    /// Keep a successful value, turning a failure into a warning.
    pub fn recover<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.warn(e);
                None
            }
        }
    }

    /// `path` with the asset prefix in front.
    pub fn prefixed(&self, path: &str) -> String {
        format!("{}{}", self.state.asset_prefix, path)
    }

    pub fn sprite_frame_name(&mut self, uuid: &str) -> Option<String> {
        let result = self.state.resolver.sprite_frame_name(uuid);
        self.recover(result)
    }

    pub fn is_atlas_frame(&mut self, uuid: &str) -> Option<bool> {
        let result = self.state.resolver.is_atlas_frame(uuid);
        self.recover(result)
    }

    pub fn resource(&mut self, uuid: &str) -> Option<ResourceDescriptor> {
        let result = self.state.resolver.resolve_path(uuid);
        self.recover(result)
    }

    /// Mount-relative path of an asset.
    pub fn resource_path(&mut self, uuid: &str) -> Option<String> {
        self.resource(uuid).map(|d| d.relative_path)
    }

    pub fn font_path(&mut self, uuid: &str) -> Option<String> {
        let result = self.state.resolver.font_path(uuid);
        self.recover(result)
    }

    pub fn skeleton(&mut self, uuid: &str) -> Option<SkeletonPaths> {
        let result = self.state.resolver.skeleton(uuid);
        self.recover(result)
    }

    pub fn tiled_map_path(&mut self, uuid: &str) -> Option<String> {
        let result = self.state.resolver.tiled_map_path(uuid);
        self.recover(result)
    }

    /// Name of a normalized clip, loading it on first use.
    pub fn clip_name(&mut self, uuid: &str) -> Option<String> {
        let ConversionState { clips, resolver, .. } = &mut *self.state;
        let result = clips.load(uuid, resolver).map(|clip| clip.name.clone());
        self.recover(result)
    }

    /// First component of `component_type` on a node, warning when absent.
    pub fn require_component(
        &mut self,
        index: usize,
        node: &Record,
        variant: Variant,
        component_type: &str,
    ) -> Option<&'c Record> {
        let found = self.records.component(node, component_type);
        if found.is_none() {
            self.warn(ConvertError::incomplete(
                index,
                variant.object_type(),
                format!("missing {} component", component_type),
            ));
        }
        found
    }

    /// Report a missing reference or component.
    pub fn incomplete(&mut self, index: usize, variant: Variant, what: impl Into<String>) {
        self.warn(ConvertError::incomplete(index, variant.object_type(), what));
    }

    /// Mark a prefab as being inlined; fails when it already is.
    pub fn enter_prefab(&mut self, uuid: &str) -> Result<()> {
        if self.state.prefab_chain.iter().any(|u| u == uuid) {
            let mut chain = self.state.prefab_chain.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(uuid);
            return Err(ConvertError::malformed(None, format!("prefab instances itself ({})", chain)));
        }
        self.state.prefab_chain.push(uuid.to_string());
        Ok(())
    }

    pub fn exit_prefab(&mut self) {
        self.state.prefab_chain.pop();
    }

    /// Mark a node as being built; fails when it is already one of its own ancestors.
    pub fn enter_node(&mut self, index: usize) -> Result<()> {
        if self.ancestors.contains(&index) {
            let chain: Vec<String> = self.ancestors.iter().chain([&index]).map(usize::to_string).collect();
            return Err(ConvertError::malformed(
                Some(index),
                format!("node is its own ancestor ({})", chain.join(" -> ")),
            ));
        }
        self.ancestors.push(index);
        Ok(())
    }

    pub fn exit_node(&mut self) {
        self.ancestors.pop();
    }
}
