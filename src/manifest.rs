//! The file manifest: every path the materializer will write, and its content.
//!
//! Paths are relative to the project root and use `/` as separator. The
//! manifest refuses entries that would escape the project root or that would
//! need the same path to be both a file and a directory.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Mode of regular generated files
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode of generated directories
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Mode of hook scripts
pub const EXECUTABLE_FILE_MODE: u32 = 0o755;

/// Content and permission bits of one generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub content: String,
    pub mode: u32,
}

/// Ordered mapping of relative path to generated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: IndexMap<String, ManifestEntry>,
}

/// Checks that a manifest path is relative, `/`-separated and stays inside the root.
pub fn is_valid_relative_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path.split('/').all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a regular file with [`DEFAULT_FILE_MODE`].
    pub fn insert<P: Into<String>, C: Into<String>>(&mut self, path: P, content: C) -> Result<()> {
        self.insert_with_mode(path, content, DEFAULT_FILE_MODE)
    }

    /// Adds a file with explicit permission bits.
    ///
    /// # Errors
    /// * `Error::TemplateError` if the path is malformed, already present, or
    ///   collides with the file/directory shape of an existing entry
    pub fn insert_with_mode<P: Into<String>, C: Into<String>>(
        &mut self,
        path: P,
        content: C,
        mode: u32,
    ) -> Result<()> {
        let path = path.into();
        if !is_valid_relative_path(&path) {
            return Err(Error::TemplateError(format!("invalid manifest path '{path}'")));
        }
        if self.entries.contains_key(&path) {
            return Err(Error::TemplateError(format!("duplicate manifest path '{path}'")));
        }
        if let Some(existing) = self.entries.keys().find(|existing| {
            existing.starts_with(&format!("{path}/")) || path.starts_with(&format!("{existing}/"))
        }) {
            return Err(Error::TemplateError(format!(
                "manifest path '{path}' collides with '{existing}'"
            )));
        }

        self.entries.insert(path, ManifestEntry { content: content.into(), mode });
        Ok(())
    }

    /// Adds every file of a provider family below `prefix`.
    pub fn extend_under<I>(&mut self, prefix: &str, files: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = prefix.trim_end_matches('/');
        for (file_name, content) in files {
            let path =
                if prefix.is_empty() { file_name } else { format!("{prefix}/{file_name}") };
            self.insert(path, content)?;
        }
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every directory implied by the manifest, parents before children.
    pub fn directories(&self) -> Vec<String> {
        let mut dirs = BTreeSet::new();
        for path in self.entries.keys() {
            let mut end = 0;
            while let Some(pos) = path[end..].find('/') {
                end += pos;
                dirs.insert(path[..end].to_string());
                end += 1;
            }
        }
        // a prefix sorts before its extensions, so BTreeSet order is parents-first
        dirs.into_iter().collect()
    }
}
