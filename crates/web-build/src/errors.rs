//! Error types for web-build.
use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use thiserror::Error;

macro_rules! impl_debug_for_error {
    ($($t:ty),*) => {
        $(
            impl Debug for $t {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    // Errors returned from `main` are printed through Debug, but thiserror
                    // only derives Display. This redirects Debug to Display.
                    write!(f, "{}", self)
                }
            }
        )*
    };
}

#[derive(Error)]
pub enum ConfigError {
    #[error("Failed to read tsconfig: {path}")]
    ReadTsConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid tsconfig {path}: {source}")]
    ParseTsConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error)]
pub enum BuildError {
    #[error("Failed to bundle {label} entry {entry}:\n{message}")]
    Bundle {
        label: &'static str,
        entry: PathBuf,
        message: String,
    },
    #[error("Failed to compile {label} stylesheet {entry}:\n{message}")]
    Stylesheet {
        label: &'static str,
        entry: PathBuf,
        message: String,
    },
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error)]
pub enum WatchError {
    #[error("Failed to start watcher for {label}: {message}")]
    Start {
        label: &'static str,
        message: String,
    },
    #[error("Watcher for {label} stopped unexpectedly: {message}")]
    Stopped {
        label: &'static str,
        message: String,
    },
}

impl_debug_for_error!(ConfigError, BuildError, WatchError);
