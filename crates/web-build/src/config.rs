use std::{
    env,
    path::{Path, PathBuf},
};

use crate::mode::Mode;

/// Options describing where the frontend sources live.
///
/// ## Examples
/// ```rust
/// use web_build::{BuildOptions, Mode, configurations};
///
/// let options = BuildOptions {
///     source_dir: "web/js".into(),
/// };
/// let [script, styles, system_styles] = configurations(&options, Mode::Batch);
///
/// assert!(script.outfile.ends_with("static/app.js"));
/// assert!(styles.minify && system_styles.minify);
/// ```
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory holding the entry points and `tsconfig.json`. Defaults to the current directory.
    pub source_dir: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl BuildOptions {
    /// Where every artifact is written: the `static` directory two levels above the sources.
    ///
    /// This is not configurable.
    pub fn output_dir(&self) -> PathBuf {
        self.source_dir.join("..").join("..").join("static")
    }

    pub fn tsconfig_path(&self) -> PathBuf {
        self.source_dir.join("tsconfig.json")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Stylesheet,
}

/// The three bundles the frontend ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Script,
    AppStyles,
    SystemStyles,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Script, Target::AppStyles, Target::SystemStyles];

    pub fn label(self) -> &'static str {
        match self {
            Target::Script => "JS",
            Target::AppStyles | Target::SystemStyles => "CSS",
        }
    }

    pub fn kind(self) -> AssetKind {
        match self {
            Target::Script => AssetKind::Script,
            Target::AppStyles | Target::SystemStyles => AssetKind::Stylesheet,
        }
    }

    pub fn entry_file(self) -> &'static str {
        match self {
            Target::Script => "index.tsx",
            Target::AppStyles => "index.scss",
            Target::SystemStyles => "system.scss",
        }
    }

    pub fn output_file(self) -> &'static str {
        match self {
            Target::Script => "app.js",
            Target::AppStyles => "app.css",
            Target::SystemStyles => "system.css",
        }
    }
}

/// Transformations applied while a bundle is built, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plugin {
    /// Rewrite imports using the `compilerOptions.paths` table of a tsconfig.
    TsPaths { tsconfig: PathBuf },
    /// Compile SCSS/Sass into plain CSS before bundling.
    Sass,
}

/// Everything the engine needs to produce one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub target: Target,
    pub label: &'static str,
    pub entry_point: PathBuf,
    pub outfile: PathBuf,
    /// Always `true`. [`Bundler`](crate::Bundler) inlines every import regardless, so this
    /// flag has no effect on the output.
    pub bundle: bool,
    pub minify: bool,
    pub sourcemap: bool,
    pub plugins: Vec<Plugin>,
}

impl BuildConfig {
    /// Shared template every target goes through, the mode only decides minification.
    pub fn new(target: Target, options: &BuildOptions, mode: Mode) -> Self {
        let plugins = match target.kind() {
            AssetKind::Script => vec![Plugin::TsPaths {
                tsconfig: options.tsconfig_path(),
            }],
            AssetKind::Stylesheet => vec![Plugin::Sass],
        };

        Self {
            target,
            label: target.label(),
            entry_point: options.source_dir.join(target.entry_file()),
            outfile: options.output_dir().join(target.output_file()),
            bundle: true,
            minify: mode.minify(),
            sourcemap: true,
            plugins,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.target.kind()
    }

    pub fn sourcemap_file(&self) -> PathBuf {
        let mut path = self.outfile.clone().into_os_string();
        path.push(".map");
        PathBuf::from(path)
    }

    /// Directory the entry point lives in, which is what watch mode observes.
    pub fn source_dir(&self) -> &Path {
        self.entry_point.parent().unwrap_or(Path::new("."))
    }

    pub fn output_dir(&self) -> &Path {
        self.outfile.parent().unwrap_or(Path::new("."))
    }

    /// Name of the bundle without extension, e.g. `app` for `app.js`.
    pub fn output_name(&self) -> String {
        self.outfile
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| self.target.output_file().to_string())
    }

    pub fn tsconfig(&self) -> Option<&Path> {
        self.plugins.iter().find_map(|plugin| match plugin {
            Plugin::TsPaths { tsconfig } => Some(tsconfig.as_path()),
            Plugin::Sass => None,
        })
    }

    pub fn uses_sass(&self) -> bool {
        self.plugins.contains(&Plugin::Sass)
    }
}

/// Builds the configurations for a run, in the order they are submitted in batch mode.
pub fn configurations(options: &BuildOptions, mode: Mode) -> [BuildConfig; 3] {
    Target::ALL.map(|target| BuildConfig::new(target, options, mode))
}
