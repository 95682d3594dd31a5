use chrono::NaiveDate;
use pystarter::config::{default_config, resolve};
use pystarter::error::{Error, Result};
use pystarter::materializer::{ensure_target_available, write_manifest, Materializer};
use pystarter::manifest::Manifest;
use pystarter::renderer::{MiniJinjaRenderer, TemplateRenderer};
use pystarter::validation::ProjectName;
use serde_json::json;
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn name(s: &str) -> ProjectName {
    ProjectName::parse(s).unwrap()
}

/// Renders normally for the first `fail_after` templates, then fails.
struct FailingRenderer {
    inner: MiniJinjaRenderer,
    fail_after: usize,
    calls: Cell<usize>,
}

impl FailingRenderer {
    fn new(fail_after: usize) -> Self {
        Self { inner: MiniJinjaRenderer::new(), fail_after, calls: Cell::new(0) }
    }
}

impl TemplateRenderer for FailingRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call >= self.fail_after {
            return Err(Error::TemplateError("forced failure".to_string()));
        }
        self.inner.render(template, context)
    }
}

fn files_on_disk(root: &Path) -> BTreeSet<String> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

#[test]
fn test_default_manifest_layout() {
    let renderer = MiniJinjaRenderer::new();
    let manifest =
        Materializer::new(&renderer, today()).build_manifest(&name("mylib"), &default_config()).unwrap();

    let paths: BTreeSet<&str> = manifest.paths().collect();
    let expected: BTreeSet<&str> = [
        "pyproject.toml",
        "setup.cfg",
        "README.md",
        "CHANGELOG.md",
        ".gitignore",
        "LICENSE",
        "src/mylib/__init__.py",
        "src/mylib/core.py",
        "src/mylib/utils.py",
        "src/mylib/exceptions.py",
        "tests/__init__.py",
        "tests/test_core.py",
        "tests/test_utils.py",
        "docs/api.md",
        "docs/getting_started.md",
        "docs/examples.md",
    ]
    .into_iter()
    .collect();
    assert_eq!(paths, expected);
}

#[test]
fn test_manifest_uses_one_name_token() {
    let renderer = MiniJinjaRenderer::new();
    let manifest =
        Materializer::new(&renderer, today()).build_manifest(&name("mylib"), &default_config()).unwrap();
    let content = |path: &str| manifest.get(path).unwrap().content.as_str();

    assert!(content("src/mylib/__init__.py").contains("mylib - Internal library"));
    assert!(content("pyproject.toml").contains("name = \"mylib\""));
    assert!(content("pyproject.toml").contains("packages = [\"src/mylib\"]"));
    assert!(content("pyproject.toml").contains("known_first_party = [\"mylib\"]"));
    assert!(content("setup.cfg").contains("name = mylib\n"));
    assert!(content("README.md").starts_with("# mylib\n"));
    assert!(content("tests/test_core.py").contains("from mylib.core import CoreFeature"));
    assert!(content("tests/test_utils.py").contains("from mylib.utils import"));
    assert!(content("docs/getting_started.md").contains("from mylib import CoreFeature"));

    for (path, entry) in manifest.iter() {
        assert!(!entry.content.contains("{{"), "unrendered expression in {path}");
        assert!(!entry.content.contains("{%"), "unrendered block in {path}");
    }
}

#[test]
fn test_manifest_is_deterministic() {
    let renderer = MiniJinjaRenderer::new();
    let materializer = Materializer::new(&renderer, today());
    let config = default_config();

    assert_eq!(
        materializer.build_manifest(&name("mylib"), &config).unwrap(),
        materializer.build_manifest(&name("mylib"), &config).unwrap()
    );
}

#[test]
fn test_manifest_optional_families() {
    let renderer = MiniJinjaRenderer::new();
    let config = resolve(&json!({
        "git_config": {"create_gitignore": false},
        "conda_config": {"create_meta": true},
    }))
    .unwrap();
    let manifest = Materializer::new(&renderer, today()).build_manifest(&name("mylib"), &config).unwrap();

    assert!(!manifest.contains(".gitignore"));
    assert!(manifest.contains("conda.recipe/meta.yaml"));
}

#[test]
fn test_manifest_follows_configured_directories() {
    let renderer = MiniJinjaRenderer::new();
    let config = resolve(&json!({
        "test_config": {"test_dir": "unit_tests"},
        "doc_config": {"doc_dir": "documentation", "sections": ["getting_started"]},
        "required_source_files": ["core.py"],
    }))
    .unwrap();
    let manifest = Materializer::new(&renderer, today()).build_manifest(&name("mylib"), &config).unwrap();

    assert!(manifest.contains("unit_tests/test_core.py"));
    assert!(manifest.contains("documentation/getting_started.md"));
    assert!(!manifest.contains("documentation/api.md"));
    assert!(manifest.contains("src/mylib/__init__.py"));
    assert!(manifest.contains("src/mylib/core.py"));
    assert!(!manifest.contains("src/mylib/utils.py"));
    assert!(!manifest.paths().any(|path| path.starts_with("tests/") || path.starts_with("docs/")));
}

#[test]
fn test_materialize_demo_lib() {
    let temp_dir = TempDir::new().unwrap();
    let renderer = MiniJinjaRenderer::new();
    let materializer = Materializer::new(&renderer, today());

    let project_dir = materializer
        .materialize(&name("demo_lib"), Some(temp_dir.path()), &default_config())
        .unwrap();

    assert_eq!(project_dir, temp_dir.path().join("demo_lib"));
    let pyproject = fs::read_to_string(project_dir.join("pyproject.toml")).unwrap();
    assert!(pyproject.contains("name = \"demo_lib\""));
    let init = fs::read_to_string(project_dir.join("src/demo_lib/__init__.py")).unwrap();
    assert!(init.contains("demo_lib - Internal library"));
}

#[test]
fn test_materialize_writes_exactly_the_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let renderer = MiniJinjaRenderer::new();
    let materializer = Materializer::new(&renderer, today());
    let config = default_config();

    let project_dir =
        materializer.materialize(&name("mylib"), Some(temp_dir.path()), &config).unwrap();
    let manifest = materializer.build_manifest(&name("mylib"), &config).unwrap();

    let expected: BTreeSet<String> = manifest.paths().map(String::from).collect();
    assert_eq!(files_on_disk(&project_dir), expected);
    for (path, entry) in manifest.iter() {
        assert_eq!(fs::read_to_string(project_dir.join(path)).unwrap(), entry.content, "{path}");
    }
}

#[cfg(unix)]
#[test]
fn test_materialize_sets_modes() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let renderer = MiniJinjaRenderer::new();
    let project_dir = Materializer::new(&renderer, today())
        .materialize(&name("mylib"), Some(temp_dir.path()), &default_config())
        .unwrap();

    let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&project_dir.join("README.md")), 0o644);
    assert_eq!(mode(&project_dir.join("src/mylib/core.py")), 0o644);
    assert_eq!(mode(&project_dir.join("src/mylib")), 0o755);
    assert_eq!(mode(&project_dir), 0o755);
}

#[test]
fn test_materialize_conflict_leaves_directory_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let project_dir = temp_dir.path().join("mylib");
    fs::create_dir(&project_dir).unwrap();
    fs::write(project_dir.join("notes.txt"), b"keep me\n").unwrap();

    let renderer = MiniJinjaRenderer::new();
    let result = Materializer::new(&renderer, today()).materialize(
        &name("mylib"),
        Some(temp_dir.path()),
        &default_config(),
    );

    match result {
        Err(Error::PathConflictError { path }) => assert_eq!(path, project_dir),
        other => panic!("expected PathConflictError, got {other:?}"),
    }
    assert_eq!(files_on_disk(&project_dir), BTreeSet::from(["notes.txt".to_string()]));
    assert_eq!(fs::read(project_dir.join("notes.txt")).unwrap(), b"keep me\n");
}

#[test]
fn test_materialize_conflict_with_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("mylib"), "a file").unwrap();

    let renderer = MiniJinjaRenderer::new();
    let result = Materializer::new(&renderer, today()).materialize(
        &name("mylib"),
        Some(temp_dir.path()),
        &default_config(),
    );
    assert!(matches!(result, Err(Error::PathConflictError { .. })));
    assert_eq!(fs::read_to_string(temp_dir.path().join("mylib")).unwrap(), "a file");
}

#[test]
fn test_materialize_reuses_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("mylib")).unwrap();

    let renderer = MiniJinjaRenderer::new();
    let project_dir = Materializer::new(&renderer, today())
        .materialize(&name("mylib"), Some(temp_dir.path()), &default_config())
        .unwrap();
    assert!(project_dir.join("pyproject.toml").is_file());
}

#[test_log::test]
fn test_materialize_rolls_back_on_render_failure() {
    let temp_dir = TempDir::new().unwrap();
    let renderer = FailingRenderer::new(5);

    let result = Materializer::new(&renderer, today()).materialize(
        &name("mylib"),
        Some(temp_dir.path()),
        &default_config(),
    );

    match result {
        Err(Error::ProjectCreationError { project_dir, source }) => {
            assert_eq!(project_dir, temp_dir.path().join("mylib"));
            assert!(matches!(*source, Error::TemplateError(_)));
        }
        other => panic!("expected ProjectCreationError, got {other:?}"),
    }
    assert!(!temp_dir.path().join("mylib").exists());
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_materialize_rollback_removes_created_base_path() {
    let temp_dir = TempDir::new().unwrap();
    let base_path = temp_dir.path().join("out").join("nested");
    let renderer = FailingRenderer::new(0);

    let result = Materializer::new(&renderer, today()).materialize(
        &name("mylib"),
        Some(&base_path),
        &default_config(),
    );

    assert!(matches!(result, Err(Error::ProjectCreationError { .. })));
    assert!(!temp_dir.path().join("out").exists());
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_materialize_creates_missing_base_path() {
    let temp_dir = TempDir::new().unwrap();
    let base_path = temp_dir.path().join("out").join("nested");
    let renderer = MiniJinjaRenderer::new();

    let project_dir = Materializer::new(&renderer, today())
        .materialize(&name("mylib"), Some(&base_path), &default_config())
        .unwrap();
    assert_eq!(project_dir, base_path.join("mylib"));
    assert!(project_dir.join("pyproject.toml").is_file());
}

#[test]
fn test_materialize_returns_absolute_path_for_relative_base() {
    // a relative path into a scratch directory under the working directory
    let scratch = tempfile::Builder::new().prefix("materialize-rel").tempdir_in(".").unwrap();
    let relative_base = Path::new(".").join(scratch.path().file_name().unwrap());
    let renderer = MiniJinjaRenderer::new();

    let project_dir = Materializer::new(&renderer, today())
        .materialize(&name("mylib"), Some(&relative_base), &default_config())
        .unwrap();

    assert!(project_dir.is_absolute());
    assert_eq!(
        project_dir,
        std::path::absolute(relative_base.join("mylib")).unwrap()
    );
    assert!(project_dir.join("src/mylib/__init__.py").is_file());
}

#[test]
fn test_materialize_rollback_empties_existing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let project_dir = temp_dir.path().join("mylib");
    fs::create_dir(&project_dir).unwrap();
    let renderer = FailingRenderer::new(0);

    let result = Materializer::new(&renderer, today()).materialize(
        &name("mylib"),
        Some(temp_dir.path()),
        &default_config(),
    );

    assert!(matches!(result, Err(Error::ProjectCreationError { .. })));
    assert!(project_dir.is_dir());
    assert_eq!(fs::read_dir(&project_dir).unwrap().count(), 0);
}

#[test]
fn test_invalid_name_creates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(ProjectName::parse("123bad"), Err(Error::InvalidNameError { .. })));
    assert!(matches!(ProjectName::parse("class"), Err(Error::InvalidNameError { .. })));
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_ensure_target_available() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ensure_target_available(&temp_dir.path().join("absent")).is_ok());

    let empty = temp_dir.path().join("empty");
    fs::create_dir(&empty).unwrap();
    assert!(ensure_target_available(&empty).is_ok());

    fs::write(empty.join("file"), "").unwrap();
    assert!(matches!(ensure_target_available(&empty), Err(Error::PathConflictError { .. })));
}

#[test]
fn test_write_manifest_reports_failed_path() {
    let temp_dir = TempDir::new().unwrap();
    // a plain file where the manifest needs a directory
    fs::write(temp_dir.path().join("src"), "blocker").unwrap();

    let mut manifest = Manifest::new();
    manifest.insert("src/mylib/core.py", "pass\n").unwrap();

    match write_manifest(temp_dir.path(), &manifest) {
        Err(Error::FileOperationError { path, .. }) => assert!(path.ends_with("src")),
        other => panic!("expected FileOperationError, got {other:?}"),
    }
}
