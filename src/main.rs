//! pystarter's main application entry point and orchestration logic.
//! Handles command-line argument parsing and runs the creation pipeline:
//! validate, prompt, resolve, materialize, hooks.

use pystarter::{
    cli::{cli_overrides, get_args, Args},
    config::{deep_merge, load_overrides, resolve},
    error::{default_error_handler, Result},
    hooks::run_post_create_hooks,
    materializer::Materializer,
    prompt::{get_user_info, DialoguerPrompter},
    renderer::MiniJinjaRenderer,
    validation::ProjectName,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Validates the project name before anything else
/// 2. Collects the author identity
/// 3. Resolves the configuration from defaults, `--config` and flags
/// 4. Materializes the project
/// 5. Runs the post-create hooks, reporting their failures as warnings
fn run(args: Args) -> Result<()> {
    let project_name = ProjectName::parse(args.project_name.as_str())?;

    println!("\nWelcome to the Python Library Setup Tool!");
    println!("Please provide some information about yourself.\n");

    let prompter = DialoguerPrompter::new();
    let skip_confirm = args.yes && args.author.is_some() && args.email.is_some();
    let user = get_user_info(&prompter, args.author.clone(), args.email.clone(), skip_confirm)?;

    let mut overrides = match &args.config {
        Some(path) => load_overrides(path)?,
        None => serde_json::json!({}),
    };
    deep_merge(&mut overrides, &cli_overrides(&args, &user));
    let config = resolve(&overrides)?;

    println!("\nCreating project '{project_name}'...");

    let renderer = MiniJinjaRenderer::new();
    let today = chrono::Local::now().date_naive();
    let materializer = Materializer::new(&renderer, today);
    let project_dir = materializer.materialize(&project_name, args.path.as_deref(), &config)?;

    let report = run_post_create_hooks(&project_dir, &config);
    for failure in &report.failures {
        log::warn!("{failure}");
    }

    let venv_dir = config.get_str(&["venv_config", "dir_name"], "venv");
    let python = format!("python{}", config.get_str(&["python_version", "min_version"], "3"));

    println!("\nSuccessfully created project structure for {project_name}");
    println!("\nNext steps:");
    let mut step = 1;
    let mut next = |text: String| {
        println!("{step}. {text}");
        step += 1;
    };
    next(format!("cd {}", project_dir.display()));
    if !report.venv_created {
        next(format!("{python} -m venv {venv_dir}"));
    }
    next(format!("source {venv_dir}/bin/activate  # On Windows: {venv_dir}\\Scripts\\activate"));
    next("pip install -e \".[dev]\"".to_string());
    println!("\nHappy coding!");

    Ok(())
}
