use std::fs;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use parcel_sourcemap::SourceMap;
use tracing::debug;

use super::write_file;
use crate::{config::BuildConfig, errors::BuildError, plugins::sass};

/// Builds a stylesheet entry point: SASS first (when configured), then lightningcss.
pub(super) fn bundle(config: &BuildConfig) -> Result<(), BuildError> {
    let source = if config.uses_sass() {
        sass::compile(
            config.label,
            &config.entry_point,
            &sass::default_load_paths(config.source_dir()),
        )?
    } else {
        fs::read_to_string(&config.entry_point).map_err(|source| BuildError::Read {
            path: config.entry_point.clone(),
            source,
        })?
    };

    let source_name = config
        .entry_point
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| config.target.entry_file().to_string());

    let (mut code, map) = print(config, &source_name, &source)?;

    if let Some(map) = map {
        let map_path = config.sourcemap_file();
        let map_name = map_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        write_file(&map_path, map.as_bytes())?;
        code.push_str(&format!("\n/*# sourceMappingURL={} */\n", map_name));
    }

    write_file(&config.outfile, code.as_bytes())?;

    debug!(name: "build", "{} -> {}", config.entry_point.display(), config.outfile.display());

    Ok(())
}

/// Parses plain CSS and prints it back, minified and with a source map when asked to.
fn print(
    config: &BuildConfig,
    source_name: &str,
    source: &str,
) -> Result<(String, Option<String>), BuildError> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: source_name.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| stylesheet_error(config, e.to_string()))?;

    if config.minify {
        stylesheet
            .minify(MinifyOptions::default())
            .map_err(|e| stylesheet_error(config, e.to_string()))?;
    }

    let mut source_map = if config.sourcemap {
        let mut map = SourceMap::new("/");
        map.add_source(source_name);
        map.set_source_content(0, source)
            .map_err(|e| stylesheet_error(config, format!("{:?}", e)))?;
        Some(map)
    } else {
        None
    };

    let output = stylesheet
        .to_css(PrinterOptions {
            minify: config.minify,
            source_map: source_map.as_mut(),
            ..PrinterOptions::default()
        })
        .map_err(|e| stylesheet_error(config, e.to_string()))?;

    let map = match source_map.as_mut() {
        Some(map) => Some(
            map.to_json(None)
                .map_err(|e| stylesheet_error(config, format!("{:?}", e)))?,
        ),
        None => None,
    };

    Ok((output.code, map))
}

fn stylesheet_error(config: &BuildConfig, message: String) -> BuildError {
    BuildError::Stylesheet {
        label: config.label,
        entry: config.entry_point.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{BuildOptions, Plugin, Target},
        mode::Mode,
    };
    use tempfile::TempDir;

    fn setup(mode: Mode) -> (TempDir, BuildConfig) {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = temp_dir.path().join("web").join("js");
        fs::create_dir_all(&source_dir).unwrap();
        fs::create_dir_all(temp_dir.path().join("static")).unwrap();
        fs::write(
            source_dir.join("index.scss"),
            "$gap: 4px;\n.layout {\n  margin: $gap;\n  .sidebar { padding: $gap * 2; }\n}\n",
        )
        .unwrap();

        let options = BuildOptions { source_dir };
        let config = BuildConfig::new(Target::AppStyles, &options, mode);
        (temp_dir, config)
    }

    #[test]
    fn test_minified_stylesheet_with_source_map() {
        let (_temp_dir, config) = setup(Mode::Batch);

        bundle(&config).unwrap();

        let css = fs::read_to_string(&config.outfile).unwrap();
        assert!(css.starts_with(".layout{margin:4px}.layout .sidebar{padding:8px}"));
        assert!(css.ends_with("/*# sourceMappingURL=app.css.map */\n"));

        let map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.sourcemap_file()).unwrap()).unwrap();
        assert_eq!(map["version"], 3);
        assert!(!map["mappings"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_unminified_in_watch_mode() {
        let (_temp_dir, config) = setup(Mode::Watch);

        bundle(&config).unwrap();

        let css = fs::read_to_string(&config.outfile).unwrap();
        assert!(css.contains(".layout .sidebar {\n"));
        assert!(css.contains("padding: 8px;"));
    }

    #[test]
    fn test_plain_css_without_sass() {
        let (_temp_dir, config) = setup(Mode::Batch);
        let entry = config.source_dir().join("plain.css");
        fs::write(&entry, "a { color: #ffffff; }").unwrap();
        let config = BuildConfig {
            entry_point: entry,
            plugins: vec![],
            ..config
        };
        assert!(!config.plugins.contains(&Plugin::Sass));

        bundle(&config).unwrap();

        let css = fs::read_to_string(&config.outfile).unwrap();
        assert!(css.starts_with("a{color:#fff}"));
    }

    #[test]
    fn test_invalid_css_fails() {
        let (_temp_dir, config) = setup(Mode::Batch);
        let entry = config.source_dir().join("broken.css");
        fs::write(&entry, "a..b { color: red; }").unwrap();
        let config = BuildConfig {
            entry_point: entry,
            plugins: vec![],
            ..config
        };

        assert!(matches!(
            bundle(&config),
            Err(BuildError::Stylesheet { .. })
        ));
    }
}
