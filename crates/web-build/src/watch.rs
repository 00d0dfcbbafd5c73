//! Watch mode: one independent session per configuration, all reporting to a single logger.
//!
//! A session is a file watcher feeding a trigger channel, and a rebuild loop draining it. Every
//! build outcome becomes a [`RebuildEvent`] sent to the logger task, so a failing rebuild is just
//! another message and never ends the session.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinSet,
};
use tracing::{debug, error, info};
use watchexec::{Watchexec, filter::Filterer};
use watchexec_events::{
    Tag,
    filekind::{FileEventKind, ModifyKind},
};

use crate::{
    config::{AssetKind, BuildConfig, Target},
    engine::{BuildReport, Engine},
    errors::{BuildError, WatchError},
    logging::TimingThresholds,
};

const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "json"];
const STYLESHEET_EXTENSIONS: &[&str] = &["scss", "sass", "css"];
const IGNORED_DIRS: &[&str] = &["node_modules", "target", ".git"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildKind {
    /// The build every session does right after starting.
    Initial,
    /// A build caused by a file change.
    Rebuild,
}

#[derive(Debug)]
pub struct RebuildEvent {
    pub target: Target,
    pub label: &'static str,
    pub kind: RebuildKind,
    pub outcome: Result<BuildReport, BuildError>,
}

/// Decides which file changes concern a given configuration.
#[derive(Debug, Clone)]
pub struct SessionFilter {
    extensions: &'static [&'static str],
    output_dir: PathBuf,
}

impl SessionFilter {
    pub fn for_config(config: &BuildConfig) -> Self {
        let extensions = match config.kind() {
            AssetKind::Script => SCRIPT_EXTENSIONS,
            AssetKind::Stylesheet => STYLESHEET_EXTENSIONS,
        };

        // Watchers report resolved paths, the configured one usually contains `..`
        let output_dir = config
            .output_dir()
            .canonicalize()
            .unwrap_or_else(|_| config.output_dir().to_path_buf());

        Self {
            extensions,
            output_dir,
        }
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        if path.starts_with(&self.output_dir) {
            return false;
        }

        if path.components().any(|component| {
            IGNORED_DIRS
                .iter()
                .any(|ignored| component.as_os_str() == *ignored)
        }) {
            return false;
        }

        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| self.extensions.contains(&extension))
    }
}

#[derive(Debug)]
struct SessionFilterer(SessionFilter);

impl Filterer for SessionFilterer {
    fn check_event(
        &self,
        event: &watchexec_events::Event,
        _: watchexec_events::Priority,
    ) -> Result<bool, watchexec::error::RuntimeError> {
        if event.tags.iter().any(|tag| {
            matches!(
                tag,
                Tag::FileEventKind(FileEventKind::Modify(ModifyKind::Metadata(_)))
            )
        }) {
            return Ok(false);
        }

        let mut paths = event.paths().peekable();

        // Signals and other non-file events must reach the action handler
        if paths.peek().is_none() {
            return Ok(true);
        }

        Ok(paths.any(|(path, _)| self.0.is_relevant(path)))
    }
}

/// Starts one watch session per configuration and logs every build they report.
///
/// Sessions don't wait for each other and run until the process receives a termination signal.
pub async fn run_watch<E: Engine>(
    engine: Arc<E>,
    configs: Vec<BuildConfig>,
) -> Result<(), WatchError> {
    let (events_sender, events_receiver) = unbounded_channel();
    let logger = tokio::spawn(log_rebuilds(events_receiver));

    let mut sessions = JoinSet::new();
    for config in configs {
        info!(name: "watch", "Watching {} for {} changes…", config.source_dir().display(), config.label);
        sessions.spawn(run_session(engine.clone(), config, events_sender.clone()));
    }
    drop(events_sender);

    let mut result = Ok(());
    while let Some(joined) = sessions.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(name: "watch", "{}", err);
                result = Err(err);
            }
            Err(err) => error!(name: "watch", "Watch session panicked: {}", err),
        }
    }

    if let Err(err) = logger.await {
        error!(name: "watch", "Rebuild logger panicked: {}", err);
    }

    result
}

async fn run_session<E: Engine>(
    engine: Arc<E>,
    config: BuildConfig,
    events: UnboundedSender<RebuildEvent>,
) -> Result<(), WatchError> {
    let (trigger_sender, trigger_receiver) = unbounded_channel();

    // The initial build goes through the same loop as every rebuild
    let _ = trigger_sender.send(Vec::new());
    let builder = tokio::spawn(rebuild_loop(
        engine,
        config.clone(),
        trigger_receiver,
        events,
    ));

    let watched = watch_changes(&config, trigger_sender).await;

    builder.abort();

    watched
}

/// Builds once per trigger, merging triggers that piled up while a build was running.
pub async fn rebuild_loop<E: Engine>(
    engine: Arc<E>,
    config: BuildConfig,
    mut triggers: UnboundedReceiver<Vec<PathBuf>>,
    events: UnboundedSender<RebuildEvent>,
) {
    let mut kind = RebuildKind::Initial;

    while let Some(mut changed) = triggers.recv().await {
        while let Ok(more) = triggers.try_recv() {
            changed.extend(more);
        }

        if kind == RebuildKind::Rebuild {
            for path in &changed {
                debug!(name: "watch", "{} changed", path.display());
            }
        }

        let outcome = engine.build(&config).await;

        let event = RebuildEvent {
            target: config.target,
            label: config.label,
            kind,
            outcome,
        };

        if events.send(event).is_err() {
            break;
        }

        kind = RebuildKind::Rebuild;
    }
}

/// Watches the configuration's source directory and forwards relevant changes as triggers.
async fn watch_changes(
    config: &BuildConfig,
    triggers: UnboundedSender<Vec<PathBuf>>,
) -> Result<(), WatchError> {
    let label = config.label;

    let wx = Watchexec::new_async(move |mut action| {
        Box::new({
            let triggers = triggers.clone();

            async move {
                if action.signals().next().is_some() {
                    action.quit();
                    return action;
                }

                let changed: Vec<PathBuf> = action
                    .events
                    .iter()
                    .flat_map(|event| event.paths().map(|(path, _)| path.to_path_buf()))
                    .collect();

                // The rebuild loop is gone, nothing left to do for this session
                if !changed.is_empty() && triggers.send(changed).is_err() {
                    action.quit();
                }

                action
            }
        })
    })
    .map_err(|err| WatchError::Start {
        label,
        message: err.to_string(),
    })?;

    wx.config.pathset([config.source_dir().to_path_buf()]);
    wx.config.filterer(SessionFilterer(SessionFilter::for_config(config)));

    match wx.main().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(WatchError::Stopped {
            label,
            message: err.to_string(),
        }),
        Err(err) => Err(WatchError::Stopped {
            label,
            message: err.to_string(),
        }),
    }
}

/// Consumes rebuild events until every session is gone.
pub async fn log_rebuilds(mut events: UnboundedReceiver<RebuildEvent>) {
    while let Some(event) = events.recv().await {
        log_rebuild(&event);
    }
}

fn log_rebuild(event: &RebuildEvent) {
    let message = rebuild_message(event);

    match event.outcome {
        Ok(_) => info!(name: "rebuild", "{}", message),
        Err(_) => error!(name: "rebuild", "{}", message),
    }
}

fn rebuild_message(event: &RebuildEvent) -> String {
    let action = match event.kind {
        RebuildKind::Initial => "Build",
        RebuildKind::Rebuild => "Rebuild",
    };

    match &event.outcome {
        Ok(report) => format!(
            "{} succeeded for {} {}",
            action,
            event.label,
            report.describe(TimingThresholds::REBUILD)
        ),
        Err(err) => format!("{} failed for {}\n{}", action, event.label, err),
    }
}
