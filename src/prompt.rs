//! User input and interaction handling.
//! Collects the author identity that ends up in the generated metadata.

use crate::error::{Error, Result};
use crate::validation::{validate_email, validate_username};
use dialoguer::{Confirm, Input};
use log::debug;

/// Source of answers for interactive questions.
pub trait Prompter {
    /// Asks a free-text question and returns the trimmed answer.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Asks a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Terminal prompter backed by dialoguer.
#[derive(Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn input(&self, prompt: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::UserInputError(e.to_string()))?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| Error::UserInputError(e.to_string()))
    }
}

/// Author identity written into the generated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
}

/// Collects and validates the author name and email.
///
/// Values supplied up front are not asked for again but are validated all the
/// same. The confirmation step is skipped only when `skip_confirm` is set.
///
/// # Errors
/// * `Error::UserInputError` if a value is malformed or the user declines
pub fn get_user_info(
    prompter: &dyn Prompter,
    preset_name: Option<String>,
    preset_email: Option<String>,
    skip_confirm: bool,
) -> Result<UserInfo> {
    let name = match preset_name {
        Some(name) => name.trim().to_string(),
        None => prompter.input("Enter your name")?,
    };
    if !validate_username(&name) {
        return Err(Error::UserInputError(
            "invalid name, it must be at least 2 characters long and contain only letters, \
             numbers, and spaces"
                .to_string(),
        ));
    }

    let email = match preset_email {
        Some(email) => email.trim().to_string(),
        None => prompter.input("Enter your email")?,
    };
    if !validate_email(&email) {
        return Err(Error::UserInputError(format!("invalid email address '{email}'")));
    }

    if !skip_confirm {
        println!("\nPlease confirm your information:");
        println!("Name:  {name}");
        println!("Email: {email}\n");
        if !prompter.confirm("Is this correct?", false)? {
            return Err(Error::UserInputError(
                "user cancelled information confirmation".to_string(),
            ));
        }
    }

    debug!("Using author identity '{name} <{email}>'");
    Ok(UserInfo { name, email })
}
