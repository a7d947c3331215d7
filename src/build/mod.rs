//! Project build for ccexport
//!
//! Converts every scene of a Creator project into scene documents plus one
//! merged resource manifest.
//!
//! # Overview
//!
//! - **Discovery**: find scene files using glob patterns from config
//! - **Execution**: convert each scene in order, isolating failures
//!
//! # Example
//!
//! ```ignore
//! use ccexport::build::{BuildContext, BuildPipeline};
//! use ccexport::config::load_config;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config, project_root);
//! let result = BuildPipeline::new(context).build()?;
//! println!("{}", result.summary());
//! ```

pub mod context;
pub mod discovery;
pub mod pipeline;
pub mod result;

pub use context::*;
pub use discovery::*;
pub use pipeline::*;
pub use result::*;
