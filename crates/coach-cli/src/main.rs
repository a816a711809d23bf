//! Coach CLI
//!
//! Author tooling for guidance scripts: validate a script, inspect it, and
//! replay learner activity against it from the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use coach_engine::{CoachingEngine, Config, ExecutionResult, ScriptLoader, SessionTracker};
use coach_trigger::{Trigger, TriggerContext};
use tracing_subscriber::EnvFilter;

/// Upper bound on `--attempts`; each attempt is replayed into the session.
const MAX_ATTEMPTS: i64 = 10_000;

/// Coach - trigger-driven guidance for coding problems
#[derive(Parser, Debug)]
#[command(name = "coach")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: coach.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a guidance script and report every problem found
    Validate {
        /// Script path or problem id
        script: String,
    },

    /// Print script metadata as JSON
    Info {
        /// Script path or problem id
        script: String,
    },

    /// Print a rendered untriggered step
    Show {
        /// Script path or problem id
        script: String,

        /// Which step to show
        #[arg(value_enum)]
        step: ShowStep,
    },

    /// Print the first hint whose trigger holds
    Hint {
        /// Script path or problem id
        script: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Answer a question from the script's on_request steps
    Ask {
        /// Script path or problem id
        script: String,

        /// Free-text question
        query: String,
    },

    /// Record an execution and print the matching on_run guidance
    Run {
        /// Script path or problem id
        script: String,

        #[command(flatten)]
        context: ContextArgs,

        /// Exit code of the execution
        #[arg(long, default_value_t = 0)]
        exit_code: i32,
    },

    /// Evaluate a single trigger expression
    Eval {
        /// Trigger expression
        trigger: String,

        #[command(flatten)]
        context: ContextArgs,

        /// Print why a trigger evaluated to false
        #[arg(long)]
        explain: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ShowStep {
    Intro,
    PrePrompt,
    Success,
}

/// Learner state to evaluate against.
#[derive(clap::Args, Debug)]
struct ContextArgs {
    /// File containing the learner's code
    #[arg(long, value_name = "FILE")]
    code: Option<PathBuf>,

    /// Standard output of the last run
    #[arg(long, default_value = "")]
    stdout: String,

    /// Standard error of the last run
    #[arg(long, default_value = "")]
    stderr: String,

    /// Mark the learner as having passed
    #[arg(long)]
    passed: bool,

    /// Attempts already made
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=MAX_ATTEMPTS))]
    attempts: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let loader = ScriptLoader::new(config);

    match args.command {
        Command::Validate { script } => run_validate(&loader, &script).await,
        Command::Info { script } => {
            let Some(engine) = open_engine(loader, &script).await? else {
                return Ok(missing_script(&script));
            };
            let info = engine.script_info();
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { script, step } => {
            let Some(engine) = open_engine(loader, &script).await? else {
                return Ok(missing_script(&script));
            };
            let content = match step {
                ShowStep::Intro => engine.introduction(),
                ShowStep::PrePrompt => engine.pre_prompt(),
                ShowStep::Success => engine.success_message(),
            };
            Ok(print_guidance(content, "No such step in this script."))
        }
        Command::Hint { script, context } => {
            let Some(mut engine) = open_engine(loader, &script).await? else {
                return Ok(missing_script(&script));
            };
            let code = read_code(context.code.as_deref()).await?;
            replay_session(engine.session_mut(), &code, &context);
            let hint = engine.hint(&code);
            Ok(print_guidance(hint, "No hint applies yet."))
        }
        Command::Ask { script, query } => {
            let Some(engine) = open_engine(loader, &script).await? else {
                return Ok(missing_script(&script));
            };
            Ok(print_guidance(
                engine.handle_request(&query),
                "No guidance matches that question.",
            ))
        }
        Command::Run {
            script,
            context,
            exit_code,
        } => {
            let Some(mut engine) = open_engine(loader, &script).await? else {
                return Ok(missing_script(&script));
            };
            run_execution(&mut engine, &context, exit_code).await
        }
        Command::Eval {
            trigger,
            context,
            explain,
        } => run_eval(&trigger, &context, explain).await,
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Loads a script into a fresh engine. `None` if the script does not exist.
async fn open_engine(
    loader: ScriptLoader,
    reference: &str,
) -> anyhow::Result<Option<CoachingEngine>> {
    let path = loader.resolve(reference);
    tracing::debug!(path = %path.display(), "Resolved script");

    let Some(script) = loader.load_async(&path).await? else {
        return Ok(None);
    };

    let mut engine =
        CoachingEngine::new(SessionTracker::new(script.id.clone())).with_loader(loader);
    engine.load(script)?;
    Ok(Some(engine))
}

fn missing_script(reference: &str) -> ExitCode {
    eprintln!("No guidance script found for '{reference}'");
    ExitCode::from(1)
}

fn print_guidance(content: Option<String>, fallback: &str) -> ExitCode {
    match content {
        Some(content) => println!("{content}"),
        None => eprintln!("{fallback}"),
    }
    ExitCode::SUCCESS
}

async fn run_validate(loader: &ScriptLoader, reference: &str) -> anyhow::Result<ExitCode> {
    let path = loader.resolve(reference);
    let Some(value) = loader.read_value_async(&path).await? else {
        return Ok(missing_script(reference));
    };

    let result = loader.validator().validate(&value);
    for error in &result.errors {
        println!("error: {error}");
    }
    for warning in &result.warnings {
        println!("warning: {warning}");
    }

    if result.valid {
        println!(
            "{} is valid ({} warning(s))",
            path.display(),
            result.warnings.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} is invalid ({} error(s), {} warning(s))",
            path.display(),
            result.errors.len(),
            result.warnings.len()
        );
        Ok(ExitCode::from(1))
    }
}

async fn run_execution(
    engine: &mut CoachingEngine,
    context: &ContextArgs,
    exit_code: i32,
) -> anyhow::Result<ExitCode> {
    let code = read_code(context.code.as_deref()).await?;

    for _ in 0..context.attempts {
        engine.session_mut().record_attempt(code.clone());
    }

    let result = ExecutionResult::new(context.stdout.clone(), context.stderr.clone())
        .with_passed(context.passed)
        .with_exit_code(exit_code);

    if let Some(guidance) = engine.process_execution(&code, &result) {
        println!("{guidance}");
    }
    if engine.session().passed() {
        if let Some(message) = engine.success_message() {
            println!("{message}");
        }
    }

    tracing::debug!(attempts = engine.session().attempts(), "Execution recorded");
    Ok(ExitCode::SUCCESS)
}

async fn run_eval(
    trigger: &str,
    context: &ContextArgs,
    explain: bool,
) -> anyhow::Result<ExitCode> {
    let code = read_code(context.code.as_deref()).await?;
    let ctx = TriggerContext::new(code)
        .with_stdout(context.stdout.clone())
        .with_stderr(context.stderr.clone())
        .with_passed(context.passed)
        .with_attempts(context.attempts);

    if !explain {
        println!("{}", coach_trigger::evaluate(trigger, &ctx));
        return Ok(ExitCode::SUCCESS);
    }

    match Trigger::compile(trigger).and_then(|t| t.evaluate(&ctx)) {
        Ok(result) => println!("{result}"),
        Err(e) => println!("false ({} error: {e})", e.kind()),
    }
    Ok(ExitCode::SUCCESS)
}

/// Replays prior attempts and the last execution so the session matches the
/// given context flags.
fn replay_session(session: &mut SessionTracker, code: &str, context: &ContextArgs) {
    for _ in 0..context.attempts {
        session.record_attempt(code);
    }
    let result = ExecutionResult::new(context.stdout.clone(), context.stderr.clone())
        .with_passed(context.passed);
    session.record_execution(&result);
}

async fn read_code(path: Option<&Path>) -> anyhow::Result<String> {
    let Some(path) = path else {
        return Ok(String::new());
    };
    tokio::fs::read_to_string(path).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to read code file '{}': {e}\n\nSuggestion: Check the --code path",
            path.display()
        )
    })
}
