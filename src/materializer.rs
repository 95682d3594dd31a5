//! Project materialization.
//!
//! Building the manifest is pure: every template provider is invoked with the
//! same [`TemplateContext`] and the results are merged into one [`Manifest`].
//! Writing it is all-or-nothing: once the project directory exists it is owned
//! by a [`ProjectDirGuard`], which removes everything that was written unless
//! the whole manifest made it to disk.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manifest::{Manifest, DEFAULT_DIR_MODE};
use crate::renderer::TemplateRenderer;
use crate::templates::{
    changelog_template, conda_meta_template, core_templates, doc_templates, gitignore_template,
    license_template, pyproject_template, readme_template, setup_cfg_template, test_templates,
    TemplateContext,
};
use crate::validation::ProjectName;
use chrono::NaiveDate;
use log::{debug, error, info};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Creates projects from the embedded templates.
pub struct Materializer<'a> {
    renderer: &'a dyn TemplateRenderer,
    today: NaiveDate,
}

impl<'a> Materializer<'a> {
    /// # Arguments
    /// * `renderer` - Engine used by every template provider
    /// * `today` - Creation date recorded in dated templates
    pub fn new(renderer: &'a dyn TemplateRenderer, today: NaiveDate) -> Self {
        Self { renderer, today }
    }

    /// Renders every template family into one manifest rooted at the project directory.
    ///
    /// Root files sit at the top level, package modules under `src/<project_name>/`,
    /// tests under `test_config.test_dir` and documentation under `doc_config.doc_dir`.
    pub fn build_manifest(&self, project_name: &ProjectName, config: &Config) -> Result<Manifest> {
        let ctx = TemplateContext::new(project_name, config, self.today);
        let renderer = self.renderer;
        let mut manifest = Manifest::new();

        manifest.insert("pyproject.toml", pyproject_template(renderer, &ctx)?)?;
        manifest.insert("setup.cfg", setup_cfg_template(renderer, &ctx)?)?;
        manifest.insert("README.md", readme_template(renderer, &ctx)?)?;
        manifest.insert("CHANGELOG.md", changelog_template(renderer, &ctx)?)?;
        if ctx.create_gitignore {
            manifest.insert(".gitignore", gitignore_template(renderer, &ctx)?)?;
        }
        manifest.insert("LICENSE", license_template(renderer, &ctx)?)?;

        manifest.extend_under(&format!("src/{project_name}"), core_templates(renderer, &ctx)?)?;
        manifest.extend_under(&ctx.test_dir, test_templates(renderer, &ctx)?)?;
        manifest.extend_under(&ctx.doc_dir, doc_templates(renderer, &ctx)?)?;

        if ctx.create_conda_meta {
            manifest.insert(
                format!("{}/meta.yaml", ctx.conda_recipe_dir.trim_end_matches('/')),
                conda_meta_template(renderer, &ctx)?,
            )?;
        }

        debug!("Manifest for '{}' holds {} files", project_name, manifest.len());
        Ok(manifest)
    }

    /// Creates `<base_path>/<project_name>` and writes the full manifest into it.
    ///
    /// # Arguments
    /// * `project_name` - Validated project name
    /// * `base_path` - Parent directory, the current directory when `None`
    /// * `config` - Resolved configuration
    ///
    /// # Returns
    /// * `Result<PathBuf>` - The absolute project directory
    ///
    /// # Errors
    /// * `Error::PathConflictError` if the project directory exists and is not
    ///   empty; nothing is written in that case
    /// * `Error::ProjectCreationError` wrapping the cause of any later failure,
    ///   after the partially written project has been removed
    pub fn materialize(
        &self,
        project_name: &ProjectName,
        base_path: Option<&Path>,
        config: &Config,
    ) -> Result<PathBuf> {
        let base_path = match base_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let project_dir = base_path.join(project_name.as_str());
        let project_dir = std::path::absolute(&project_dir).map_err(file_error(&project_dir))?;
        ensure_target_available(&project_dir)?;

        info!("Creating project structure at: {}", project_dir.display());

        let guard = ProjectDirGuard::acquire(&project_dir).map_err(|source| {
            Error::ProjectCreationError {
                project_dir: project_dir.clone(),
                source: Box::new(source),
            }
        })?;

        let result = self
            .build_manifest(project_name, config)
            .and_then(|manifest| write_manifest(&project_dir, &manifest));

        match result {
            Ok(()) => {
                guard.commit();
                info!("Successfully created project structure for {project_name}");
                Ok(project_dir)
            }
            Err(source) => {
                error!("Failed to create project structure: {source}");
                drop(guard);
                Err(Error::ProjectCreationError { project_dir, source: Box::new(source) })
            }
        }
    }
}

/// Fails unless `project_dir` is absent or an empty directory.
pub fn ensure_target_available(project_dir: &Path) -> Result<()> {
    match fs::symlink_metadata(project_dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::FileOperationError { path: project_dir.to_path_buf(), source: e }),
        Ok(meta) if meta.is_dir() => {
            let mut entries = fs::read_dir(project_dir).map_err(file_error(project_dir))?;
            if entries.next().is_some() {
                Err(Error::PathConflictError { path: project_dir.to_path_buf() })
            } else {
                Ok(())
            }
        }
        Ok(_) => Err(Error::PathConflictError { path: project_dir.to_path_buf() }),
    }
}

/// Ownership of a project directory while it is being populated.
///
/// Dropping the guard without calling [`ProjectDirGuard::commit`] rolls the
/// directory back. If the guard had to create it, the topmost directory it
/// created is removed, so missing parents of the base path go too. A directory
/// that already existed is emptied instead.
struct ProjectDirGuard<'p> {
    path: &'p Path,
    created_root: Option<PathBuf>,
    armed: bool,
}

impl<'p> ProjectDirGuard<'p> {
    fn acquire(path: &'p Path) -> Result<Self> {
        let created_root = path.ancestors().take_while(|dir| !dir.exists()).last();
        let guard = Self { path, created_root: created_root.map(Path::to_path_buf), armed: true };
        if guard.created_root.is_some() {
            fs::create_dir_all(path).map_err(file_error(path))?;
            set_mode(path, DEFAULT_DIR_MODE)?;
            debug!("Created directory: {}", path.display());
        }
        Ok(guard)
    }

    fn commit(mut self) {
        self.armed = false;
    }

    fn rollback(&self) -> io::Result<()> {
        if let Some(root) = &self.created_root {
            return match fs::remove_dir_all(root) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                result => result,
            };
        }
        for entry in fs::read_dir(self.path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

impl Drop for ProjectDirGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.rollback() {
            Ok(()) => debug!("Rolled back directory: {}", self.path.display()),
            Err(e) => error!("Failed to clean up directory {}: {}", self.path.display(), e),
        }
    }
}

/// Writes every manifest entry below `project_dir`, creating directories first.
pub fn write_manifest(project_dir: &Path, manifest: &Manifest) -> Result<()> {
    for dir in manifest.directories() {
        let path = native_path(project_dir, &dir);
        fs::create_dir_all(&path).map_err(file_error(&path))?;
        set_mode(&path, DEFAULT_DIR_MODE)?;
        debug!("Created directory: {}", path.display());
    }
    for (relative, entry) in manifest.iter() {
        write_file(&native_path(project_dir, relative), &entry.content, entry.mode)?;
    }
    Ok(())
}

/// Writes `content` to `path` and applies `mode`.
///
/// The handle is flushed to disk and closed before the permissions are set,
/// on success and on error alike.
pub fn write_file(path: &Path, content: &str, mode: u32) -> Result<()> {
    {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        let mut file = options.open(path).map_err(file_error(path))?;
        file.write_all(content.as_bytes()).map_err(file_error(path))?;
        file.sync_all().map_err(file_error(path))?;
    }
    set_mode(path, mode)?;
    debug!("Written file: {}", path.display());
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(file_error(path))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn file_error(path: &Path) -> impl Fn(io::Error) -> Error + '_ {
    move |source| Error::FileOperationError { path: path.to_path_buf(), source }
}

/// Joins a `/`-separated manifest path onto `root` segment by segment.
fn native_path(root: &Path, relative: &str) -> PathBuf {
    relative.split('/').fold(root.to_path_buf(), |path, segment| path.join(segment))
}
