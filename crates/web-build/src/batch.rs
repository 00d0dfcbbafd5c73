use colored::Colorize;
use tracing::{error, info};

use crate::{
    config::BuildConfig,
    engine::{BuildReport, Engine},
    errors::BuildError,
    logging::{TimingThresholds, format_elapsed_time},
};

/// Builds each configuration once, strictly one after the other.
///
/// Stops at the first failure and returns it, later configurations are never submitted.
pub async fn run_batch<E: Engine>(
    engine: &E,
    configs: &[BuildConfig],
) -> Result<Vec<BuildReport>, BuildError> {
    let start = quanta::Instant::now();
    let mut reports = Vec::with_capacity(configs.len());

    for config in configs {
        info!(name: "build", "Building {} ({})…", config.label, config.outfile.display());

        match engine.build(config).await {
            Ok(report) => {
                info!(name: "build", "{} {}", config.label, report);
                reports.push(report);
            }
            Err(err) => {
                error!(name: "build", "{} build failed", config.label);
                return Err(err);
            }
        }
    }

    info!(
        name: "build",
        "{}",
        format!(
            "Built {} bundles in {}",
            reports.len(),
            format_elapsed_time(start.elapsed(), TimingThresholds::BUILD)
        )
        .bold()
    );

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{BuildOptions, Target, configurations},
        mode::Mode,
    };
    use std::{
        path::PathBuf,
        sync::{Arc, Mutex},
        time::Duration,
    };

    /// Records submissions and fails for one target.
    #[derive(Default)]
    struct RecordingEngine {
        submitted: Arc<Mutex<Vec<Target>>>,
        fail_on: Option<Target>,
    }

    impl Engine for RecordingEngine {
        async fn build(&self, config: &BuildConfig) -> Result<BuildReport, BuildError> {
            self.submitted.lock().unwrap().push(config.target);
            tokio::task::yield_now().await;

            if self.fail_on == Some(config.target) {
                return Err(BuildError::Bundle {
                    label: config.label,
                    entry: config.entry_point.clone(),
                    message: "Unexpected token".to_string(),
                });
            }

            Ok(BuildReport {
                label: config.label,
                outputs: vec![],
                duration: Duration::from_millis(1),
            })
        }
    }

    fn configs() -> [BuildConfig; 3] {
        configurations(
            &BuildOptions {
                source_dir: PathBuf::from("web/js"),
            },
            Mode::Batch,
        )
    }

    #[tokio::test]
    async fn test_builds_all_in_order() {
        let engine = RecordingEngine::default();

        let reports = run_batch(&engine, &configs()).await.unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(*engine.submitted.lock().unwrap(), Target::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let engine = RecordingEngine {
            fail_on: Some(Target::Script),
            ..Default::default()
        };

        let result = run_batch(&engine, &configs()).await;

        assert!(matches!(result, Err(BuildError::Bundle { label: "JS", .. })));
        assert_eq!(*engine.submitted.lock().unwrap(), vec![Target::Script]);
    }

    #[tokio::test]
    async fn test_failure_in_the_middle_skips_the_rest() {
        let engine = RecordingEngine {
            fail_on: Some(Target::AppStyles),
            ..Default::default()
        };

        assert!(run_batch(&engine, &configs()).await.is_err());
        assert_eq!(
            *engine.submitted.lock().unwrap(),
            vec![Target::Script, Target::AppStyles]
        );
    }
}
