use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use web_build::{
    BuildOptions, Bundler, Mode, Target, configurations, errors::BuildError, run_batch,
};

/// Lays out `<root>/web/js` like the real frontend, with `<root>/static` as the output.
fn setup_project() -> (TempDir, BuildOptions) {
    let temp_dir = TempDir::new().unwrap();
    let source_dir = temp_dir.path().join("web").join("js");

    write(
        &source_dir,
        "tsconfig.json",
        r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["./*"] } } }"#,
    );
    write(
        &source_dir,
        "lib/greet.ts",
        "export function greet(name: string): string {\n  return `Hello, ${name}!`;\n}\n",
    );
    write(
        &source_dir,
        "index.tsx",
        "import { greet } from \"@/lib/greet\";\n\nconst message: string = greet(\"wiki\");\ndocument.title = message;\n",
    );
    write(&source_dir, "styles/_vars.scss", "$accent: #3366ff;\n$gap: 8px;\n");
    write(
        &source_dir,
        "index.scss",
        "@import 'styles/vars';\n.page {\n  color: $accent;\n  .header { margin: $gap; }\n}\n",
    );
    write(
        &source_dir,
        "system.scss",
        "@import 'styles/vars';\n.system-notice { border: 1px solid $accent; }\n",
    );

    (temp_dir, BuildOptions { source_dir })
}

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn artifacts(options: &BuildOptions) -> Vec<PathBuf> {
    configurations(options, Mode::Batch)
        .iter()
        .flat_map(|config| [config.outfile.clone(), config.sourcemap_file()])
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_writes_all_bundles() {
    let (temp_dir, options) = setup_project();
    let configs = configurations(&options, Mode::Batch);

    let reports = run_batch(&Bundler, &configs).await.unwrap();

    assert_eq!(reports.len(), 3);
    for artifact in artifacts(&options) {
        let size = fs::metadata(&artifact)
            .unwrap_or_else(|e| panic!("{} is missing: {}", artifact.display(), e))
            .len();
        assert!(size > 0, "{} is empty", artifact.display());
    }

    let static_dir = temp_dir.path().join("static");
    let js = fs::read_to_string(static_dir.join("app.js")).unwrap();
    assert!(js.contains("Hello, "));
    assert!(js.contains("sourceMappingURL=app.js.map"));

    let css = fs::read_to_string(static_dir.join("app.css")).unwrap();
    assert!(css.contains(".page .header{margin:8px}"));
    assert!(!css.contains("$accent"));

    let system_css = fs::read_to_string(static_dir.join("system.css")).unwrap();
    assert!(system_css.contains(".system-notice{"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_mode_configs_are_not_minified() {
    let (temp_dir, options) = setup_project();
    let configs = configurations(&options, Mode::Watch);

    run_batch(&Bundler, &configs).await.unwrap();

    let css = fs::read_to_string(temp_dir.path().join("static").join("app.css")).unwrap();
    assert!(css.contains(".page .header {\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_syntax_error_stops_the_batch() {
    let (temp_dir, options) = setup_project();
    write(&options.source_dir, "index.tsx", "const = ;\n");
    let configs = configurations(&options, Mode::Batch);

    let err = run_batch(&Bundler, &configs).await.unwrap_err();

    assert!(matches!(err, BuildError::Bundle { label: "JS", .. }));

    // The stylesheets come after the script and are never built
    let static_dir = temp_dir.path().join("static");
    assert!(!static_dir.join("app.css").exists());
    assert!(!static_dir.join("system.css").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_stylesheet_fails_after_script() {
    let (temp_dir, options) = setup_project();
    fs::remove_file(options.source_dir.join("system.scss")).unwrap();
    let configs = configurations(&options, Mode::Batch);

    let err = run_batch(&Bundler, &configs).await.unwrap_err();

    assert!(matches!(err, BuildError::Stylesheet { label: "CSS", .. }));
    assert!(temp_dir.path().join("static").join("app.js").exists());
    assert!(temp_dir.path().join("static").join("app.css").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_batch_is_deterministic() {
    let (_temp_dir, options) = setup_project();
    let configs = configurations(&options, Mode::Batch);

    run_batch(&Bundler, &configs).await.unwrap();
    let first: Vec<Vec<u8>> = artifacts(&options)
        .iter()
        .map(|artifact| fs::read(artifact).unwrap())
        .collect();

    run_batch(&Bundler, &configs).await.unwrap();
    let second: Vec<Vec<u8>> = artifacts(&options)
        .iter()
        .map(|artifact| fs::read(artifact).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_configurations_cover_every_target() {
    let (_temp_dir, options) = setup_project();

    let targets: Vec<Target> = configurations(&options, Mode::Batch)
        .iter()
        .map(|config| config.target)
        .collect();

    assert_eq!(targets, Target::ALL.to_vec());
}
