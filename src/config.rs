//! Configuration handling for pystarter.
//! This module builds the default configuration, deep-merges user overrides
//! into it and validates that the sections every template relies on are present.

use crate::error::{Error, Result};
use log::debug;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Top-level sections that must survive resolution.
///
/// `python_version` and `dev_dependencies` feed the templates. `directories`
/// and `required_files` are checked for presence only: the generated layout
/// follows the template families, `required_source_files` and `doc_config`.
pub const REQUIRED_KEYS: [&str; 4] =
    ["directories", "python_version", "dev_dependencies", "required_files"];

/// Resolved project configuration.
///
/// A nested, ordered mapping of section name to options. Once resolved it is
/// only ever read; providers look options up through the typed accessors,
/// which fall back to the supplied default when an option is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Config(Value);

/// Returns a freshly built default configuration.
pub fn default_config() -> Config {
    let min_version = "3.9";

    Config(json!({
        "directories": ["src", "tests", "docs"],
        "python_version": {
            "min_version": min_version,
            "max_version": null,
        },
        "dev_dependencies": {
            "pytest": ">=7.0.0",
            "black": ">=22.0.0",
            "isort": ">=5.0.0",
            "mypy": ">=0.950",
        },
        "optional_features": {
            "http": { "requests": ">=2.28.0" },
            "yaml": { "pyyaml": ">=6.0" },
            "data": { "pandas": ">=1.3.0", "numpy": ">=1.20.0" },
        },
        "template_config": {
            "readme": {
                "default_style": "minimal",
                "include_license": true,
                "include_contributing": true,
            },
            "docs": {
                "format": "markdown",
                "include_api_docs": true,
                "include_examples": true,
            },
            "tests": {
                "framework": "pytest",
                "include_fixtures": true,
            },
        },
        "metadata": {
            "author": "Your Name",
            "author_email": "your.email@company.com",
            "license": "MIT",
            "keywords": [],
            "classifiers": [
                "Development Status :: 3 - Alpha",
                "Intended Audience :: Developers",
                "Programming Language :: Python :: 3",
                format!("Programming Language :: Python :: {min_version}"),
                "Operating System :: OS Independent",
            ],
        },
        "code_style": {
            "line_length": 88,
            "target_python_version": min_version,
            "isort_profile": "black",
        },
        "test_config": {
            "test_dir": "tests",
            "pytest_options": ["-v", "--tb=short", "--strict-markers"],
            "coverage_options": {
                "source": ["src"],
                "omit": ["tests/*", "setup.py"],
                "min_coverage": 80,
            },
        },
        "doc_config": {
            "doc_dir": "docs",
            "doc_format": "markdown",
            "sections": ["api", "getting_started", "examples"],
        },
        "git_config": {
            "init_git": true,
            "create_gitignore": true,
            "initial_branch": "main",
            "git_hooks": {
                "pre-commit": ["black .", "isort .", "mypy src", "pytest"],
            },
        },
        "venv_config": {
            "create_venv": true,
            "dir_name": "venv",
        },
        "conda_config": {
            "create_meta": false,
            "recipe_dir": "conda.recipe",
        },
        "log_config": {
            "default_level": "INFO",
            "format": "%(asctime)s - %(name)s - %(levelname)s - %(message)s",
            "date_format": "%Y-%m-%d %H:%M:%S",
        },
        "build_config": {
            "build_backend": "hatchling",
            "requires": ["hatchling"],
            "include_package_data": true,
            "zip_safe": false,
        },
        "required_files": ["pyproject.toml", "setup.cfg", "README.md", ".gitignore", "CHANGELOG.md"],
        "required_source_files": ["__init__.py", "core.py", "utils.py", "exceptions.py"],
        "project_urls": {
            "Bug Tracker": "",
            "Documentation": "",
            "Source Code": "",
        },
    }))
}

/// Recursively merges `overrides` into `target`.
///
/// Mappings present on both sides are merged key by key; any other value
/// (scalars, sequences, or a mapping replacing a non-mapping) replaces the
/// existing one wholesale.
pub fn deep_merge(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => {
            for (key, value) in overrides {
                let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
                if nested {
                    if let Some(existing) = target.get_mut(key) {
                        deep_merge(existing, value);
                    }
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        (target, overrides) => *target = overrides.clone(),
    }
}

/// Builds the configuration for one invocation from the defaults and `overrides`.
///
/// # Errors
/// * `Error::ConfigError` if `overrides` is neither a mapping nor null
/// * `Error::MissingConfigKeyError` if a required section is missing afterwards
pub fn resolve(overrides: &Value) -> Result<Config> {
    let mut config = default_config();
    match overrides {
        Value::Null => {}
        Value::Object(_) => deep_merge(&mut config.0, overrides),
        other => {
            return Err(Error::ConfigError(format!(
                "overrides must be a mapping, got {other}"
            )))
        }
    }
    validate_config(&config)?;
    Ok(config)
}

/// Checks that every section listed in [`REQUIRED_KEYS`] is present and not null.
pub fn validate_config(config: &Config) -> Result<()> {
    for key in REQUIRED_KEYS {
        if config.0.get(key).map_or(true, Value::is_null) {
            return Err(Error::MissingConfigKeyError { key: key.to_string() });
        }
    }
    Ok(())
}

/// Reads an override document from disk.
/// JSON is tried first, YAML second. An empty document yields no overrides.
pub fn load_overrides<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    debug!("Loading configuration overrides from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!("cannot read '{}': {}", path.display(), e))
    })?;

    let value: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(_) => serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}")))?,
    };

    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        _ => Err(Error::ConfigError(format!(
            "'{}' must contain a mapping of sections",
            path.display()
        ))),
    }
}

impl Config {
    /// Wraps an already merged value without touching the defaults.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Looks up a nested option by key path.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.0, |value, key| value.get(key))
    }

    pub fn get_str<'a>(&'a self, path: &[&str], default: &'a str) -> &'a str {
        self.get(path).and_then(Value::as_str).unwrap_or(default)
    }

    pub fn get_bool(&self, path: &[&str], default: bool) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_u64(&self, path: &[&str], default: u64) -> u64 {
        self.get(path).and_then(Value::as_u64).unwrap_or(default)
    }

    /// String items of a sequence option; non-string items are skipped.
    pub fn get_str_list(&self, path: &[&str]) -> Vec<String> {
        self.get(path)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn get_map(&self, path: &[&str]) -> Option<&Map<String, Value>> {
        self.get(path).and_then(Value::as_object)
    }
}
