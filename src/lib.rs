//! ccexport - Library for converting Cocos Creator scenes into canonical
//! JSON scene documents
//!
//! This library provides functionality to:
//! - Load the flat, index-addressed record arrays of `.fire` and `.prefab` files
//! - Classify nodes by their components and build a canonical node tree
//! - Resolve asset uuids to file paths, sprite frames and animation clips
//! - Build whole projects from a `ccexport.toml`, once or in watch mode
//!
//! # Example
//!
//! ```ignore
//! use ccexport::assets::AssetDatabase;
//! use ccexport::convert::{convert_scene_file, ConvertOptions};
//!
//! let index = AssetDatabase::scan(project, &["assets".into()], "library".as_ref())?;
//! let output = convert_scene_file(&index, scene, &ConvertOptions::default())?;
//! println!("{}", ccexport::document::to_json(&output.document, true)?);
//! ```

pub mod animation;
pub mod assets;
pub mod build;
pub mod classify;
pub mod cli;
pub mod config;
pub mod context;
pub mod convert;
pub mod document;
pub mod error;
pub mod nodes;
pub mod prefab;
pub mod record;
pub mod resolver;
pub mod watch;

pub use assets::{AssetDatabase, AssetEntry, AssetIndex, MemoryAssetIndex};
pub use convert::{convert_scene_bytes, convert_scene_file, ConversionOutput, ConvertOptions, SceneConverter};
pub use document::{CanonicalNode, SceneDocument};
pub use error::{ConvertError, Result};
