//! Post-create hooks.
//!
//! Both hooks run only after the project has been fully materialized. They are
//! best effort: a failing hook is reported back to the caller and never
//! removes the generated files.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manifest::{is_valid_relative_path, EXECUTABLE_FILE_MODE};
use crate::materializer::write_file;
use crate::templates::DEFAULT_VENV_DIR;
use git2::{IndexAddOption, Repository, RepositoryInitOptions};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Message of the commit created right after initialization
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Outcome of the post-create hooks.
#[derive(Debug, Default)]
pub struct HookReport {
    pub git_initialized: bool,
    pub venv_created: bool,
    pub failures: Vec<Error>,
}

/// Runs every enabled hook against a freshly materialized project.
pub fn run_post_create_hooks(project_dir: &Path, config: &Config) -> HookReport {
    let mut report = HookReport::default();

    if config.get_bool(&["git_config", "init_git"], true) {
        match initialize_git(project_dir, config) {
            Ok(()) => report.git_initialized = true,
            Err(e) => report.failures.push(e),
        }
    } else {
        info!("Skipping git initialization as per configuration");
    }

    if config.get_bool(&["venv_config", "create_venv"], true) {
        match setup_virtual_environment(project_dir, config) {
            Ok(_) => report.venv_created = true,
            Err(e) => report.failures.push(e),
        }
    } else {
        info!("Skipping virtual environment creation as per configuration");
    }

    report
}

/// Initializes a repository, commits every generated file and installs the
/// configured git hooks.
///
/// The author identity is stored in the repository config when the metadata
/// carries both a name and an email.
pub fn initialize_git(project_dir: &Path, config: &Config) -> Result<()> {
    let branch = config.get_str(&["git_config", "initial_branch"], "main");
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(branch);
    let repo = Repository::init_opts(project_dir, &opts)?;
    info!("Initialized git repository on branch '{branch}'");

    let author = config.get_str(&["metadata", "author"], "");
    let author_email = config.get_str(&["metadata", "author_email"], "");
    if !author.is_empty() && !author_email.is_empty() {
        let mut repo_config = repo.config()?;
        repo_config.set_str("user.name", author)?;
        repo_config.set_str("user.email", author_email)?;
    }

    let mut index = repo.index()?;
    index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let signature = repo.signature()?;
    repo.commit(Some("HEAD"), &signature, &signature, INITIAL_COMMIT_MESSAGE, &tree, &[])?;
    info!("Git repository initialized with initial commit");

    let hooks_dir = repo.path().join("hooks");
    write_git_hooks(&hooks_dir, config)?;
    Ok(())
}

/// Writes each `git_config.git_hooks` entry as an executable shell script.
pub fn write_git_hooks(hooks_dir: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let Some(hooks) = config.get_map(&["git_config", "git_hooks"]) else {
        return Ok(Vec::new());
    };
    std::fs::create_dir_all(hooks_dir)
        .map_err(|source| Error::FileOperationError { path: hooks_dir.to_path_buf(), source })?;

    let mut written = Vec::with_capacity(hooks.len());
    for (hook_name, commands) in hooks {
        if !is_valid_relative_path(hook_name) || hook_name.contains('/') {
            return Err(Error::HookError(format!("invalid git hook name '{hook_name}'")));
        }
        let commands: Vec<&str> = commands
            .as_array()
            .map(|items| items.iter().filter_map(|c| c.as_str()).collect())
            .unwrap_or_default();

        let hook_path = hooks_dir.join(hook_name);
        write_file(&hook_path, &hook_script(&commands), EXECUTABLE_FILE_MODE)?;
        debug!("Created git hook: {hook_name}");
        written.push(hook_path);
    }
    Ok(written)
}

/// `#!/bin/sh` script that stops at the first failing command.
pub fn hook_script(commands: &[&str]) -> String {
    let mut script = String::from("#!/bin/sh\nset -e\n\n");
    for command in commands {
        script.push_str(command);
        script.push('\n');
    }
    script
}

/// Interpreters to try, most specific first.
pub fn python_candidates(min_version: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(3);
    if !min_version.is_empty() {
        candidates.push(format!("python{min_version}"));
    }
    candidates.push("python3".to_string());
    candidates.push("python".to_string());
    candidates
}

/// Creates the project's virtual environment with `<python> -m venv`.
///
/// # Returns
/// * `Result<PathBuf>` - Path to the environment directory
///
/// # Errors
/// * `Error::HookError` if no interpreter is found or venv creation fails
pub fn setup_virtual_environment(project_dir: &Path, config: &Config) -> Result<PathBuf> {
    let min_version = config.get_str(&["python_version", "min_version"], "");
    let venv_dir = config.get_str(&["venv_config", "dir_name"], DEFAULT_VENV_DIR);

    let candidates = python_candidates(min_version);
    let python = candidates
        .iter()
        .find_map(|candidate| which::which(candidate).ok())
        .ok_or_else(|| {
            Error::HookError(format!("no Python interpreter found (tried: {})", candidates.join(", ")))
        })?;
    if !min_version.is_empty()
        && python.file_name().and_then(|n| n.to_str()) != Some(candidates[0].as_str())
    {
        warn!("python{min_version} not found, using {}", python.display());
    }

    debug!("Creating virtual environment with {}", python.display());
    let status = Command::new(&python)
        .args(["-m", "venv", venv_dir])
        .current_dir(project_dir)
        .status()
        .map_err(|e| Error::HookError(format!("failed to run {}: {}", python.display(), e)))?;

    if !status.success() {
        return Err(Error::HookError(format!(
            "virtual environment creation failed with status: {status}"
        )));
    }

    info!("Created virtual environment");
    Ok(project_dir.join(venv_dir))
}
