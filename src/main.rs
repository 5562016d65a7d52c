use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

use ctx_core::git::DiffScope;
use ctx_core::workspace::find_workspace_root;
use ctx_core::{ContextService, CtxError, CtxResult};

#[derive(Parser)]
#[command(name = "ctx")]
#[command(about = "Manage context repositories: explore, save, integrate and discard lines of thought")]
#[command(version)]
struct Cli {
    /// Workspace root (defaults to the nearest directory holding ctx.config)
    #[arg(short, long, global = true, env = "CTX_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a context repository in the workspace and make it active
    New { name: String },

    /// Show branch, cleanliness and pending changes of the active repository
    Status,

    /// List registered repositories
    List,

    /// Make another registered repository active
    Switch { name: String },

    /// Register an existing marked repository
    Register { path: PathBuf },

    /// Forget a repository (its directory is left alone)
    Deregister { name: String },

    /// Register every marked repository found in the workspace
    Scan,

    /// Start a new exploration branch from the current one
    Explore { topic: String },

    /// Check out an existing branch
    Checkout { branch: String },

    /// Commit every change as one snapshot
    Save {
        #[arg(short, long)]
        message: String,
    },

    /// Merge an exploration into the current branch
    Integrate {
        branch: String,

        /// Only report what the merge would do
        #[arg(long)]
        preview: bool,
    },

    /// Throw away uncommitted changes
    Discard {
        /// Also delete untracked files and directories
        #[arg(long)]
        force: bool,
    },

    /// List changes: uncommitted by default, or against one branch, or between two
    Diff {
        /// Only changes in the index
        #[arg(long)]
        staged: bool,

        /// One branch to compare with, or two to compare (`base...head`)
        #[arg(num_args = 0..=2)]
        branches: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let root = match cli.workspace {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            find_workspace_root(&cwd)
        }
    };

    let service = ContextService::open(&root);
    let level = match (&service, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(service), false) => service.config().log.level.clone(),
        (Err(_), false) => "warn".to_string(),
    };
    ctx_core::util::init_logging(&level);

    let service = match service {
        Ok(service) => service,
        Err(e) => return report::<()>(Err(e)),
    };

    match cli.command {
        Commands::New { name } => report(service.new_repository(&name).await),
        Commands::Status => report(service.status().await),
        Commands::List => report(service.list().await),
        Commands::Switch { name } => report(service.switch(&name).await),
        Commands::Register { path } => report(service.register(path).await),
        Commands::Deregister { name } => report(
            service
                .deregister(&name)
                .await
                .map(|_| json!({ "deregistered": name })),
        ),
        Commands::Scan => report(service.reconcile().await),
        Commands::Explore { topic } => report(service.explore(&topic).await),
        Commands::Checkout { branch } => report(service.checkout(&branch).await),
        Commands::Save { message } => report(service.save(&message).await),
        Commands::Integrate { branch, preview } => {
            report(service.integrate(&branch, preview).await)
        }
        Commands::Discard { force } => report(service.discard(force).await),
        Commands::Diff { staged, branches } => match DiffScope::from_args(staged, &branches) {
            Some(scope) => report(service.diff(scope).await),
            None => report::<()>(Err(CtxError::TooManyBranches(branches.len()))),
        },
    }
}

/// Print the structured result on stdout; errors exit with status 1
fn report<T: Serialize>(result: CtxResult<T>) -> Result<ExitCode> {
    let (body, code) = match result {
        Ok(data) => (json!({ "ok": true, "data": data }), ExitCode::SUCCESS),
        Err(e) => (json!({ "ok": false, "error": e.to_json() }), ExitCode::FAILURE),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&body).context("Failed to serialize result")?
    );
    Ok(code)
}
