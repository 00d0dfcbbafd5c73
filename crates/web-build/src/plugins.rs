//! Transformations applied while bundling: import aliases for scripts, SASS for stylesheets.
pub mod sass;
pub mod ts_paths;

pub use ts_paths::{TsPaths, TsPathsPlugin};
