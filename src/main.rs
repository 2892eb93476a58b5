use std::process::ExitCode;

use clap::{Parser, Subcommand};

use moai_checkpoint::commands;
use moai_checkpoint::commands::checkpoint::{CleanupArgs, CreateArgs, RestoreArgs};
use moai_checkpoint::commands::hooks::HooksCommand;
use moai_checkpoint::commands::init::InitArgs;
use moai_checkpoint::commands::list::{ListArgs, LogArgs};
use moai_checkpoint::{error, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "moai-checkpoint",
    version,
    about = "Git checkpoints before risky operations, with safe restore"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a checkpoint if the described change is risky
    Create(CreateArgs),
    /// Restore a checkpoint, saving the current state first
    Restore(RestoreArgs),
    /// List checkpoint branches
    List(ListArgs),
    /// Show the checkpoint audit log
    Log(LogArgs),
    /// Delete the oldest checkpoints beyond the limit
    Cleanup(CleanupArgs),
    /// Manage Claude Code hooks (install, audit, run)
    Hooks {
        #[command(subcommand)]
        command: HooksCommand,
    },
    /// Write a default .moai/checkpoint.toml
    Init(InitArgs),
    /// Print the JSON Schema for .moai/checkpoint.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Restore(_) => "restore",
            Self::List(_) => "list",
            Self::Log(_) => "log",
            Self::Cleanup(_) => "cleanup",
            Self::Hooks { .. } => "hooks",
            Self::Init(_) => "init",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Create(args) => args.execute(),
        Commands::Restore(args) => args.execute(),
        Commands::List(args) => args.execute(),
        Commands::Log(args) => args.execute(),
        Commands::Cleanup(args) => args.execute(),
        Commands::Hooks { command } => command.execute(),
        Commands::Init(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else if let Some(cp_err) = e.downcast_ref::<error::CheckpointError>() {
                eprintln!("error: {cp_err}");
                cp_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
