//! Project configuration (`ccexport.toml`)

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
