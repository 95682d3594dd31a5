//! Pre-flight validation of the project name and of the author identity.
//! Nothing in this module touches the filesystem.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Minimum project name length
pub const MIN_NAME_LEN: usize = 2;

/// Maximum project name length
pub const MAX_NAME_LEN: usize = 50;

/// Reserved words of the language the generated package is imported into.
pub const RESERVED_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

static PACKAGE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid package name regex"));

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9 ]{2,}$").expect("valid username regex"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Checks the project name against the identifier, keyword and length rules.
///
/// # Errors
/// * `Error::InvalidNameError` describing the first rule the name breaks
pub fn validate_project_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidNameError {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if !PACKAGE_NAME_PATTERN.is_match(name) {
        return Err(invalid(
            "must start with a letter and contain only letters, numbers, and underscores",
        ));
    }
    if RESERVED_KEYWORDS.contains(&name) {
        return Err(invalid("it is a reserved keyword"));
    }
    if name.len() < MIN_NAME_LEN {
        return Err(invalid(&format!("must be at least {MIN_NAME_LEN} characters long")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(&format!("must not exceed {MAX_NAME_LEN} characters")));
    }
    Ok(())
}

/// A validated project name.
///
/// The same token is used as the directory name, the package identifier and
/// inside every generated file, so it can only be obtained through [`ProjectName::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn parse<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        validate_project_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Letters, digits and spaces, at least two characters.
pub fn validate_username(username: &str) -> bool {
    USERNAME_PATTERN.is_match(username)
}

/// Standard `local@domain.tld` shape.
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
