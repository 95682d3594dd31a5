//! Error handling for pystarter.
//! Defines the error taxonomy and the result alias used throughout the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur while scaffolding a project.
///
/// Name and input errors are raised before anything touches the disk.
/// Everything that fails while files are being produced is wrapped into
/// [`Error::ProjectCreationError`] after the partial project has been removed.
#[derive(Error, Debug)]
pub enum Error {
    /// The project name failed pre-flight validation
    #[error("Invalid project name '{name}': {reason}.")]
    InvalidNameError { name: String, reason: String },

    /// Interactive input was rejected or cancelled
    #[error("User input error: {0}.")]
    UserInputError(String),

    /// A required top-level section is absent after configuration resolution
    #[error("Missing required configuration key: '{key}'.")]
    MissingConfigKeyError { key: String },

    /// The target project directory already has contents
    #[error("Directory '{path}' already exists and is not empty.")]
    PathConflictError { path: PathBuf },

    /// Creating a directory, writing a file or changing its permissions failed
    #[error("Failed to write '{path}': {source}.")]
    FileOperationError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Materialization failed and the partial project was rolled back
    #[error("Failed to create project at '{project_dir}': {source}")]
    ProjectCreationError {
        project_dir: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The configuration override document could not be parsed
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// A template produced an unusable manifest or could not be rendered
    #[error("Template error: {0}.")]
    TemplateError(String),

    /// A template failed to parse or render
    #[error("Template rendering error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// A post-create hook failed
    #[error("Hook execution error: {0}.")]
    HookError(String),

    /// A git repository operation failed
    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),

    /// An I/O operation outside a known path failed
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),
}

/// Convenience type alias for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// Prints a one-line diagnostic to stderr and exits with status code 1.
pub fn default_error_handler(err: Error) {
    eprintln!("Error: {err}");
    std::process::exit(1);
}
