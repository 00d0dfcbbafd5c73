use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::BuildError;

/// Compiles an SCSS/Sass entry point (and everything it `@use`s or `@import`s) into plain CSS.
///
/// Imports resolve relative to the importing file first, then against `load_paths` in order.
pub fn compile(
    label: &'static str,
    entry: &Path,
    load_paths: &[PathBuf],
) -> Result<String, BuildError> {
    let options = load_paths
        .iter()
        .fold(grass::Options::default(), |options, path| options.load_path(path));

    let css = grass::from_path(entry, &options).map_err(|e| BuildError::Stylesheet {
        label,
        entry: entry.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!(name: "sass", "{} compiled to {} bytes of CSS", entry.display(), css.len());

    Ok(css)
}

/// Search paths for stylesheet imports that are not relative to the importing file.
pub fn default_load_paths(source_dir: &Path) -> Vec<PathBuf> {
    vec![source_dir.to_path_buf(), source_dir.join("node_modules")]
}
