//! Template providers for every generated artifact family.
//!
//! Each provider turns the shared [`TemplateContext`] into file contents. They
//! never touch the filesystem and never fail on a missing option: the context
//! is built once from the resolved configuration and carries the fallback
//! for every value a template reads.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::renderer::TemplateRenderer;
use crate::validation::ProjectName;
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_AUTHOR: &str = "Your Name";
pub const DEFAULT_AUTHOR_EMAIL: &str = "your.email@company.com";
pub const DEFAULT_GITHUB_USERNAME: &str = "your-github-username";
pub const DEFAULT_LICENSE: &str = "MIT";
pub const DEFAULT_MIN_PYTHON: &str = "3.8";
pub const DEFAULT_LINE_LENGTH: u64 = 88;
pub const DEFAULT_VENV_DIR: &str = "venv";

const PYPROJECT: &str = include_str!("../templates/pyproject.toml.j2");
const SETUP_CFG: &str = include_str!("../templates/setup.cfg.j2");
const README: &str = include_str!("../templates/README.md.j2");
const LICENSE: &str = include_str!("../templates/LICENSE.j2");
const CHANGELOG: &str = include_str!("../templates/CHANGELOG.md.j2");
const GITIGNORE: &str = include_str!("../templates/gitignore.j2");
const CONDA_META: &str = include_str!("../templates/meta.yaml.j2");

const SOURCE_FILES: [(&str, &str); 4] = [
    ("__init__.py", include_str!("../templates/src/__init__.py.j2")),
    ("core.py", include_str!("../templates/src/core.py.j2")),
    ("utils.py", include_str!("../templates/src/utils.py.j2")),
    ("exceptions.py", include_str!("../templates/src/exceptions.py.j2")),
];

const TEST_FILES: [(&str, &str); 3] = [
    ("__init__.py", include_str!("../templates/tests/__init__.py.j2")),
    ("test_core.py", include_str!("../templates/tests/test_core.py.j2")),
    ("test_utils.py", include_str!("../templates/tests/test_utils.py.j2")),
];

const DOC_PAGES: [(&str, &str); 3] = [
    ("api", include_str!("../templates/docs/api.md.j2")),
    ("getting_started", include_str!("../templates/docs/getting_started.md.j2")),
    ("examples", include_str!("../templates/docs/examples.md.j2")),
];

/// The package marker is emitted whatever `required_source_files` lists.
const PACKAGE_INIT: &str = "__init__.py";

/// A package requirement such as `pytest>=7.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    pub spec: String,
}

/// A named group of optional requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureGroup {
    pub name: String,
    pub packages: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectUrl {
    pub label: String,
    pub url: String,
}

/// Everything the templates can refer to.
///
/// `project_name` is the one canonical token every template substitutes.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub project_name: String,
    pub author: String,
    pub author_email: String,
    pub github_username: String,
    pub license: String,
    pub homepage: String,
    pub min_python: String,
    pub python_target: String,
    pub line_length: u64,
    pub isort_profile: String,
    pub keywords: Vec<String>,
    pub classifiers: Vec<String>,
    pub dev_dependencies: Vec<Requirement>,
    pub optional_features: Vec<FeatureGroup>,
    pub project_urls: Vec<ProjectUrl>,
    pub build_backend: String,
    pub build_requires: Vec<String>,
    pub test_dir: String,
    pub doc_dir: String,
    pub source_files: Vec<String>,
    pub doc_sections: Vec<String>,
    pub pytest_options: Vec<String>,
    pub coverage_source: Vec<String>,
    pub coverage_omit: Vec<String>,
    pub min_coverage: u64,
    pub log_level: String,
    pub log_format: String,
    pub log_date_format: String,
    pub initial_branch: String,
    pub venv_dir: String,
    pub readme_full: bool,
    pub include_license: bool,
    pub include_contributing: bool,
    pub include_fixtures: bool,
    pub include_api_docs: bool,
    pub include_examples: bool,
    pub create_gitignore: bool,
    pub create_conda_meta: bool,
    pub conda_recipe_dir: String,
    pub today: String,
    pub year: i32,
}

fn requirements(map: Option<&serde_json::Map<String, Value>>) -> Vec<Requirement> {
    map.map(|map| {
        map.iter()
            .map(|(name, spec)| Requirement {
                name: name.clone(),
                spec: spec.as_str().unwrap_or_default().to_string(),
            })
            .collect()
    })
    .unwrap_or_default()
}

/// The strings listed at `path`, or `defaults` when the option is absent.
fn names_or(config: &Config, path: &[&str], defaults: &[&str]) -> Vec<String> {
    match config.get(path) {
        Some(Value::Array(_)) => config.get_str_list(path),
        _ => defaults.iter().map(|name| name.to_string()).collect(),
    }
}

impl TemplateContext {
    /// Builds the context from the validated name, the resolved configuration
    /// and the date the project is created on.
    pub fn new(project_name: &ProjectName, config: &Config, today: NaiveDate) -> Self {
        let name = project_name.as_str();
        let github_username =
            config.get_str(&["metadata", "github_username"], DEFAULT_GITHUB_USERNAME).to_string();
        let homepage = format!("https://github.com/{github_username}/{name}");
        let min_python =
            config.get_str(&["python_version", "min_version"], DEFAULT_MIN_PYTHON).to_string();
        let initial_branch = config.get_str(&["git_config", "initial_branch"], "main").to_string();

        let optional_features = config
            .get_map(&["optional_features"])
            .map(|groups| {
                groups
                    .iter()
                    .map(|(group, packages)| FeatureGroup {
                        name: group.clone(),
                        packages: requirements(packages.as_object()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut project_urls = vec![ProjectUrl { label: "Homepage".to_string(), url: homepage.clone() }];
        if let Some(urls) = config.get_map(&["project_urls"]) {
            for (label, url) in urls {
                let url = match url.as_str() {
                    Some(url) if !url.is_empty() => url.to_string(),
                    _ => match label.as_str() {
                        "Bug Tracker" => format!("{homepage}/issues"),
                        "Documentation" => format!("{homepage}/tree/{initial_branch}/docs"),
                        _ => homepage.clone(),
                    },
                };
                project_urls.push(ProjectUrl { label: label.clone(), url });
            }
        }

        let mut build_requires = config.get_str_list(&["build_config", "requires"]);
        if build_requires.is_empty() {
            build_requires.push("hatchling".to_string());
        }

        Self {
            project_name: name.to_string(),
            author: config.get_str(&["metadata", "author"], DEFAULT_AUTHOR).to_string(),
            author_email: config
                .get_str(&["metadata", "author_email"], DEFAULT_AUTHOR_EMAIL)
                .to_string(),
            github_username,
            license: config.get_str(&["metadata", "license"], DEFAULT_LICENSE).to_string(),
            homepage,
            python_target: format!("py{}", min_python.replace('.', "")),
            min_python,
            line_length: config.get_u64(&["code_style", "line_length"], DEFAULT_LINE_LENGTH),
            isort_profile: config.get_str(&["code_style", "isort_profile"], "black").to_string(),
            keywords: config.get_str_list(&["metadata", "keywords"]),
            classifiers: config.get_str_list(&["metadata", "classifiers"]),
            dev_dependencies: requirements(config.get_map(&["dev_dependencies"])),
            optional_features,
            project_urls,
            build_backend: config.get_str(&["build_config", "build_backend"], "hatchling").to_string(),
            build_requires,
            test_dir: config.get_str(&["test_config", "test_dir"], "tests").to_string(),
            doc_dir: config.get_str(&["doc_config", "doc_dir"], "docs").to_string(),
            source_files: names_or(
                config,
                &["required_source_files"],
                &SOURCE_FILES.map(|(file_name, _)| file_name),
            ),
            doc_sections: names_or(
                config,
                &["doc_config", "sections"],
                &DOC_PAGES.map(|(section, _)| section),
            ),
            pytest_options: config.get_str_list(&["test_config", "pytest_options"]),
            coverage_source: config.get_str_list(&["test_config", "coverage_options", "source"]),
            coverage_omit: config.get_str_list(&["test_config", "coverage_options", "omit"]),
            min_coverage: config.get_u64(&["test_config", "coverage_options", "min_coverage"], 0),
            log_level: config.get_str(&["log_config", "default_level"], "INFO").to_string(),
            log_format: config
                .get_str(
                    &["log_config", "format"],
                    "%(asctime)s - %(name)s - %(levelname)s - %(message)s",
                )
                .to_string(),
            log_date_format: config
                .get_str(&["log_config", "date_format"], "%Y-%m-%d %H:%M:%S")
                .to_string(),
            initial_branch,
            venv_dir: config.get_str(&["venv_config", "dir_name"], DEFAULT_VENV_DIR).to_string(),
            readme_full: config.get_str(&["template_config", "readme", "default_style"], "minimal")
                == "full",
            include_license: config.get_bool(&["template_config", "readme", "include_license"], true),
            include_contributing: config
                .get_bool(&["template_config", "readme", "include_contributing"], true),
            include_fixtures: config.get_bool(&["template_config", "tests", "include_fixtures"], false),
            include_api_docs: config.get_bool(&["template_config", "docs", "include_api_docs"], true),
            include_examples: config.get_bool(&["template_config", "docs", "include_examples"], true),
            create_gitignore: config.get_bool(&["git_config", "create_gitignore"], true),
            create_conda_meta: config.get_bool(&["conda_config", "create_meta"], false),
            conda_recipe_dir: config
                .get_str(&["conda_config", "recipe_dir"], "conda.recipe")
                .to_string(),
            today: today.format("%Y-%m-%d").to_string(),
            year: today.year(),
        }
    }

    fn render(&self, renderer: &dyn TemplateRenderer, template: &str) -> Result<String> {
        let context = serde_json::to_value(self)
            .map_err(|e| Error::TemplateError(format!("cannot build template context: {e}")))?;
        renderer.render(template, &context)
    }

    fn render_files(
        &self,
        renderer: &dyn TemplateRenderer,
        files: &[(&str, &str)],
    ) -> Result<IndexMap<String, String>> {
        files
            .iter()
            .map(|(file_name, template)| -> Result<(String, String)> {
                Ok((file_name.to_string(), self.render(renderer, template)?))
            })
            .collect()
    }
}

pub fn pyproject_template(renderer: &dyn TemplateRenderer, ctx: &TemplateContext) -> Result<String> {
    ctx.render(renderer, PYPROJECT)
}

pub fn setup_cfg_template(renderer: &dyn TemplateRenderer, ctx: &TemplateContext) -> Result<String> {
    ctx.render(renderer, SETUP_CFG)
}

/// Minimal or full README depending on `template_config.readme.default_style`.
pub fn readme_template(renderer: &dyn TemplateRenderer, ctx: &TemplateContext) -> Result<String> {
    ctx.render(renderer, README)
}

pub fn license_template(renderer: &dyn TemplateRenderer, ctx: &TemplateContext) -> Result<String> {
    ctx.render(renderer, LICENSE)
}

pub fn changelog_template(renderer: &dyn TemplateRenderer, ctx: &TemplateContext) -> Result<String> {
    ctx.render(renderer, CHANGELOG)
}

pub fn gitignore_template(renderer: &dyn TemplateRenderer, ctx: &TemplateContext) -> Result<String> {
    ctx.render(renderer, GITIGNORE)
}

/// Conda recipe for environment managers.
pub fn conda_meta_template(renderer: &dyn TemplateRenderer, ctx: &TemplateContext) -> Result<String> {
    ctx.render(renderer, CONDA_META)
}

/// Package modules, keyed by file name inside `src/<project_name>/`.
///
/// Only the modules named in `required_source_files` are emitted, plus
/// `__init__.py`. Names without a template are skipped.
pub fn core_templates(
    renderer: &dyn TemplateRenderer,
    ctx: &TemplateContext,
) -> Result<IndexMap<String, String>> {
    let files: Vec<(&str, &str)> = SOURCE_FILES
        .into_iter()
        .filter(|(file_name, _)| {
            *file_name == PACKAGE_INIT || ctx.source_files.iter().any(|f| f == file_name)
        })
        .collect();
    ctx.render_files(renderer, &files)
}

/// Test modules, keyed by file name inside `tests/`.
pub fn test_templates(
    renderer: &dyn TemplateRenderer,
    ctx: &TemplateContext,
) -> Result<IndexMap<String, String>> {
    ctx.render_files(renderer, &TEST_FILES)
}

/// Documentation pages, keyed by file name inside the doc directory.
///
/// A page is emitted when its section is listed in `doc_config.sections`;
/// `api` and `examples` are further gated by their `template_config.docs` flags.
pub fn doc_templates(
    renderer: &dyn TemplateRenderer,
    ctx: &TemplateContext,
) -> Result<IndexMap<String, String>> {
    let file_names: Vec<(String, &str)> = DOC_PAGES
        .into_iter()
        .filter(|(section, _)| ctx.doc_sections.iter().any(|s| s == section))
        .filter(|(section, _)| match *section {
            "api" => ctx.include_api_docs,
            "examples" => ctx.include_examples,
            _ => true,
        })
        .map(|(section, template)| (format!("{section}.md"), template))
        .collect();
    let files: Vec<(&str, &str)> =
        file_names.iter().map(|(file_name, template)| (file_name.as_str(), *template)).collect();
    ctx.render_files(renderer, &files)
}
