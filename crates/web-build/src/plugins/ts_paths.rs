use std::{
    fs,
    path::{Path, PathBuf},
};

use rolldown::plugin::{
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use crate::errors::ConfigError;

/// Extensions tried, in order, when an alias target has none.
const RESOLVE_EXTENSIONS: [&str; 6] = [".ts", ".tsx", ".js", ".jsx", ".mjs", ".json"];

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: FxHashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct Alias {
    prefix: String,
    /// `None` for exact patterns, the part after `*` otherwise.
    suffix: Option<String>,
    targets: Vec<String>,
}

impl Alias {
    fn new(pattern: &str, targets: Vec<String>) -> Self {
        match pattern.split_once('*') {
            Some((prefix, suffix)) => Self {
                prefix: prefix.to_string(),
                suffix: Some(suffix.to_string()),
                targets,
            },
            None => Self {
                prefix: pattern.to_string(),
                suffix: None,
                targets,
            },
        }
    }

    /// Returns what `*` stands for if the specifier matches this alias.
    fn capture<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        match &self.suffix {
            None => (specifier == self.prefix).then_some(""),
            Some(suffix) => specifier
                .strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str())),
        }
    }
}

/// Import alias table read from a tsconfig's `compilerOptions.paths`.
#[derive(Debug, Clone, Default)]
pub struct TsPaths {
    base_dir: PathBuf,
    aliases: Vec<Alias>,
}

impl TsPaths {
    pub fn from_tsconfig(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadTsConfig {
            path: path.to_path_buf(),
            source,
        })?;

        let tsconfig: TsConfig = serde_json::from_str(&strip_jsonc(&content)).map_err(|source| {
            ConfigError::ParseTsConfig {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let tsconfig_dir = path.parent().unwrap_or(Path::new("."));
        let base_dir = match &tsconfig.compiler_options.base_url {
            Some(base_url) => tsconfig_dir.join(base_url),
            None => tsconfig_dir.to_path_buf(),
        };

        Ok(Self::new(base_dir, tsconfig.compiler_options.paths))
    }

    pub fn new(base_dir: PathBuf, paths: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut aliases: Vec<Alias> = paths
            .into_iter()
            .map(|(pattern, targets)| Alias::new(&pattern, targets))
            .collect();

        // Longest prefix wins, exact patterns before wildcards of the same length
        aliases.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.suffix.is_some().cmp(&b.suffix.is_some()))
        });

        Self { base_dir, aliases }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Resolves an import specifier to an existing file, if an alias applies to it.
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        let (alias, captured) = self
            .aliases
            .iter()
            .find_map(|alias| alias.capture(specifier).map(|captured| (alias, captured)))?;

        alias.targets.iter().find_map(|target| {
            let candidate = self.base_dir.join(target.replacen('*', captured, 1));
            probe(&candidate)
        })
    }
}

/// tsconfig files are JSONC. Comments are blanked out so parse errors keep their position,
/// and commas right before `}` or `]` are dropped.
fn strip_jsonc(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    // Byte offset in `out` of the last comma, until something other than whitespace follows it
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '/' if chars.peek() == Some(&'/') => {
                out.push(' ');
                while chars.next_if(|next| *next != '\n').is_some() {
                    out.push(' ');
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                let mut previous = '\0';
                for next in chars.by_ref() {
                    out.push(if next == '\n' { '\n' } else { ' ' });
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            ',' => {
                pending_comma = Some(out.len());
                out.push(c);
            }
            '}' | ']' => {
                if let Some(offset) = pending_comma.take() {
                    out.replace_range(offset..offset + 1, " ");
                }
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                in_string = c == '"';
                pending_comma = None;
                out.push(c);
            }
        }
    }

    out
}

fn probe(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(canonical(candidate));
    }

    for extension in RESOLVE_EXTENSIONS {
        let mut with_extension = candidate.to_path_buf().into_os_string();
        with_extension.push(extension);
        let with_extension = PathBuf::from(with_extension);
        if with_extension.is_file() {
            return Some(canonical(&with_extension));
        }
    }

    if candidate.is_dir() {
        for extension in RESOLVE_EXTENSIONS {
            let index = candidate.join(format!("index{}", extension));
            if index.is_file() {
                return Some(canonical(&index));
            }
        }
    }

    None
}

// Module ids need to match what the bundler's own resolver produces for the same file
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Rolldown plugin rewriting aliased imports (e.g. `@/components/button`) to files on disk.
#[derive(Debug)]
pub struct TsPathsPlugin {
    paths: TsPaths,
}

impl TsPathsPlugin {
    pub fn new(paths: TsPaths) -> Self {
        Self { paths }
    }
}

impl Plugin for TsPathsPlugin {
    fn name(&self) -> std::borrow::Cow<'static, str> {
        "web-build:ts-paths".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    async fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> HookResolveIdReturn {
        let Some(resolved) = self.paths.resolve(args.specifier) else {
            return Ok(None);
        };

        debug!(name: "ts-paths", "{} -> {}", args.specifier, resolved.display());

        Ok(Some(HookResolveIdOutput {
            id: resolved.to_string_lossy().to_string().into(),
            ..Default::default()
        }))
    }
}
