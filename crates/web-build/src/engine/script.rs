use std::sync::Arc;

use rolldown::{
    Bundler, BundlerOptions, InputItem, OutputFormat, Platform, RawMinifyOptions, SourceMapType,
};
use tracing::debug;

use crate::{
    config::BuildConfig,
    errors::BuildError,
    plugins::{TsPaths, TsPathsPlugin},
};

/// Bundles a script entry point with rolldown, writing `<output_name>.js` next to its source map.
pub(super) async fn bundle(config: &BuildConfig) -> Result<(), BuildError> {
    let bundler_options = BundlerOptions {
        input: Some(vec![InputItem {
            name: Some(config.output_name()),
            import: config.entry_point.to_string_lossy().to_string(),
        }]),
        dir: Some(config.output_dir().to_string_lossy().to_string()),
        format: Some(OutputFormat::Iife),
        platform: Some(Platform::Browser),
        minify: Some(RawMinifyOptions::Bool(config.minify)),
        sourcemap: config.sourcemap.then_some(SourceMapType::File),
        ..Default::default()
    };

    // A project without a tsconfig simply has no aliases
    let ts_paths = match config.tsconfig() {
        Some(tsconfig) if tsconfig.exists() => Some(TsPaths::from_tsconfig(tsconfig)?),
        _ => None,
    };

    let bundler = match ts_paths {
        Some(paths) if !paths.is_empty() => {
            debug!(name: "build", "Resolving {} imports through {:?}", config.label, config.tsconfig());
            Bundler::with_plugins(bundler_options, vec![Arc::new(TsPathsPlugin::new(paths))])
        }
        _ => Bundler::new(bundler_options),
    };

    let mut bundler = bundler.map_err(|e| bundle_error(config, format!("{:?}", e)))?;

    bundler
        .write()
        .await
        .map_err(|e| bundle_error(config, format!("{:?}", e)))?;

    Ok(())
}

fn bundle_error(config: &BuildConfig, message: String) -> BuildError {
    BuildError::Bundle {
        label: config.label,
        entry: config.entry_point.clone(),
        message,
    }
}
