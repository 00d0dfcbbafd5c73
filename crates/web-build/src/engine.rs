//! The build engine: turns one [`BuildConfig`] into files on disk.
use std::{
    fmt::{self, Display, Formatter},
    fs,
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};

use colored::Colorize;

use crate::{
    config::{AssetKind, BuildConfig},
    errors::BuildError,
    logging::{TimingThresholds, format_elapsed_time},
};

mod script;
mod style;

/// Anything able to build a single configuration.
///
/// Orchestration only goes through this trait, the real work lives in [`Bundler`].
pub trait Engine: Send + Sync + 'static {
    fn build(
        &self,
        config: &BuildConfig,
    ) -> impl Future<Output = Result<BuildReport, BuildError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub size: u64,
}

/// What a successful build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub label: &'static str,
    pub outputs: Vec<OutputFile>,
    pub duration: Duration,
}

impl BuildReport {
    /// Collects the artifact and its source map, if the configuration asked for one.
    pub fn collect(config: &BuildConfig, duration: Duration) -> Result<Self, BuildError> {
        let mut paths = vec![config.outfile.clone()];
        if config.sourcemap {
            paths.push(config.sourcemap_file());
        }

        let outputs = paths
            .into_iter()
            .map(|path| {
                let size = fs::metadata(&path)
                    .map_err(|source| BuildError::Read {
                        path: path.clone(),
                        source,
                    })?
                    .len();
                Ok(OutputFile { path, size })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok(Self {
            label: config.label,
            outputs,
            duration,
        })
    }
}

impl BuildReport {
    /// Lists the written files and how long the build took, coloured against `thresholds`.
    pub fn describe(&self, thresholds: TimingThresholds) -> String {
        let outputs = self
            .outputs
            .iter()
            .map(|output| format!("{} ({} bytes)", output.path.display(), output.size))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{} {}",
            outputs.dimmed(),
            format_elapsed_time(self.duration, thresholds)
        )
    }
}

impl Display for BuildReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(TimingThresholds::BUILD))
    }
}

/// The default engine: rolldown for scripts, grass and lightningcss for stylesheets.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bundler;

impl Engine for Bundler {
    async fn build(&self, config: &BuildConfig) -> Result<BuildReport, BuildError> {
        let start = quanta::Instant::now();

        ensure_dir(config.output_dir())?;

        match config.kind() {
            AssetKind::Script => script::bundle(config).await?,
            AssetKind::Stylesheet => style::bundle(config)?,
        }

        BuildReport::collect(config, start.elapsed())
    }
}

fn ensure_dir(dir: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(dir).map_err(|source| BuildError::Write {
        path: dir.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, content: &[u8]) -> Result<(), BuildError> {
    fs::write(path, content).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}
