//! pystarter scaffolds new Python library projects.
//! It validates the project name, resolves a layered configuration, renders
//! every project file from embedded templates and writes them to disk as a
//! single all-or-nothing operation, optionally followed by git and virtual
//! environment setup.

/// Command-line interface module for the pystarter application
pub mod cli;

/// Default configuration, deep-merge of user overrides and required-key checks
pub mod config;

/// Error types and handling for the pystarter application
pub mod error;

/// Git repository and virtual environment setup run after creation
pub mod hooks;

/// Ordered path to content mapping of the files to generate
pub mod manifest;

/// Turns a manifest into files on disk with rollback on failure
pub mod materializer;

/// User input and interaction handling
pub mod prompt;

/// Template rendering engines
pub mod renderer;

/// Template providers for every generated artifact family
pub mod templates;

/// Project name and author identity validation
pub mod validation;
