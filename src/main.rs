//! Rustible — task execution core, thin CLI front end.
//!
//! Drives a small YAML or JSON playbook shape through the execution core
//! end to end, against the in-process `DebugTaskExecutor`. A real CLI would
//! plug in a connection-backed task executor, inventory resolution, and
//! templating; none of that lives here.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rustible::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "rustible", version = VERSION, about = "Task execution core CLI")]
struct Cli {
    /// Path to a config file; falls back to the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a playbook file to completion.
    Run {
        /// Path to a YAML or JSON playbook file.
        playbook: PathBuf,

        /// Number of worker tasks.
        #[arg(long)]
        forks: Option<usize>,

        /// Run without making changes (passed through to the task executor as a hint).
        #[arg(long)]
        check: bool,

        /// Use the minimal (CI-style) callback instead of the default console one.
        #[arg(long)]
        minimal: bool,
    },
}

/// The CLI-level playbook shape: just enough serde structure to drive the
/// core end to end. Full YAML dialect support (conditionals, includes,
/// Jinja2 templating) is not implemented here.
#[derive(Debug, Deserialize)]
struct PlaybookFile {
    plays: Vec<PlaySpec>,
}

#[derive(Debug, Deserialize)]
struct PlaySpec {
    name: String,
    hosts: Vec<String>,
    #[serde(default)]
    gather_facts: bool,
    #[serde(default)]
    serial: Option<usize>,
    #[serde(default)]
    tasks: Vec<BlockSpec>,
    #[serde(default)]
    handlers: Vec<Task>,
    #[serde(default)]
    vars: serde_json::Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_ref()).unwrap_or_else(|e| {
        if cli.verbose >= 1 {
            eprintln!("warning: failed to load config: {e}");
        }
        Config::default()
    });

    match cli.command {
        Commands::Run {
            playbook,
            forks,
            check,
            minimal,
        } => run_playbook(&playbook, config, forks, check, minimal).await,
    }
}

async fn run_playbook(
    path: &PathBuf,
    mut config: Config,
    forks: Option<usize>,
    check: bool,
    minimal: bool,
) -> anyhow::Result<()> {
    if let Some(forks) = forks {
        config.defaults.forks = forks;
    }
    if check {
        config.defaults.check_mode = true;
    }

    let content = std::fs::read_to_string(path)?;
    let file: PlaybookFile = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    let callback: BoxedCallback = if minimal {
        Arc::new(MinimalCallback::new())
    } else {
        Arc::new(DefaultCallback::new())
    };

    let plays: Vec<Arc<Play>> = file
        .plays
        .into_iter()
        .map(|spec| {
            let mut roles = Vec::new();
            let (tasks, blocks) = compile(spec.tasks, &mut roles);
            let handlers: Vec<Handler> = spec.handlers.into_iter().map(Handler::new).collect();
            Arc::new(Play {
                name: spec.name,
                hosts: spec.hosts,
                gather_facts: spec.gather_facts || config.defaults.gather_facts,
                serial: spec.serial.map(Serial::Count),
                tasks: tasks.into(),
                blocks: blocks.into(),
                roles: roles.into(),
                handlers: Arc::from(handlers),
            })
        })
        .collect();

    let manager = TaskQueueManager::new(
        &config.defaults,
        Arc::new(DebugTaskExecutor),
        Arc::new(StaticVariableManager::default()),
        callback,
    );

    let result = manager.run_playbook(plays).await;
    manager.shutdown().await;
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
