//! Builds the web frontend: one script bundle and two stylesheet bundles.
//!
//! Two modes exist. [`Mode::Batch`] builds every bundle once, minified, one after the other.
//! [`Mode::Watch`] builds unminified and keeps rebuilding each bundle on its own whenever its
//! sources change.
//!
//! ```rust,no_run
//! use web_build::{BuildOptions, Bundler, Mode, configurations, run_batch};
//!
//! # async fn example() -> Result<(), web_build::errors::BuildError> {
//! let configs = configurations(&BuildOptions::default(), Mode::Batch);
//! let reports = run_batch(&Bundler, &configs).await?;
//! assert_eq!(reports.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod errors;
pub mod plugins;
pub mod watch;

mod batch;
mod config;
mod logging;
mod mode;

pub use batch::run_batch;
pub use config::{AssetKind, BuildConfig, BuildOptions, Plugin, Target, configurations};
pub use engine::{BuildReport, Bundler, Engine, OutputFile};
pub use logging::{TimingThresholds, format_elapsed_time, init_logging};
pub use mode::Mode;
pub use watch::run_watch;
