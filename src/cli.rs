//! Command-line interface implementation for pystarter.
//! Provides argument parsing and help text formatting using clap.

use crate::prompt::UserInfo;
use clap::{error::ErrorKind, CommandFactory, Parser};
use serde_json::json;
use std::path::PathBuf;

/// Command-line arguments structure for pystarter.
#[derive(Parser, Debug)]
#[command(author, version, about = "pystarter: create a new Python library project", long_about = None)]
pub struct Args {
    /// Name of the project (use underscores for spaces)
    #[arg(value_name = "PROJECT_NAME")]
    pub project_name: String,

    /// Base path for project creation (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Generate a comprehensive README instead of the minimal version
    #[arg(long)]
    pub full_readme: bool,

    /// JSON or YAML file with configuration overrides
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Author name, asked interactively when omitted
    #[arg(long, value_name = "NAME")]
    pub author: Option<String>,

    /// Author email, asked interactively when omitted
    #[arg(long, value_name = "EMAIL")]
    pub email: Option<String>,

    /// Skip the confirmation of the author information.
    /// Only honoured when both --author and --email are given.
    #[arg(short, long)]
    pub yes: bool,

    /// Do not initialize a git repository
    #[arg(long)]
    pub no_git: bool,

    /// Do not create a virtual environment
    #[arg(long)]
    pub no_venv: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

/// Configuration overrides derived from the command line and the author identity.
///
/// Only options the user actually asked for are set, so a `--config` file
/// keeps control of everything else.
pub fn cli_overrides(args: &Args, user: &UserInfo) -> serde_json::Value {
    let mut overrides = json!({
        "metadata": {
            "author": user.name,
            "author_email": user.email,
        },
    });
    if args.full_readme {
        overrides["template_config"] = json!({ "readme": { "default_style": "full" } });
    }
    if args.no_git {
        overrides["git_config"] = json!({ "init_git": false });
    }
    if args.no_venv {
        overrides["venv_config"] = json!({ "create_venv": false });
    }
    overrides
}
