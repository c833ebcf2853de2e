use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod sync;

use commands::{
    AddCommand, AreaCommand, ChecklistCommand, ConfigCommand, ListCommand, ShowCommand,
    SyncCommand, TagCommand, TaskAction, TaskActionCommand,
};
use config::Config;
use sync::Session;

#[derive(Parser)]
#[command(name = "things")]
#[command(version)]
#[command(about = "Command-line client for Things Cloud", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull remote changes and push local ones
    Sync(SyncCommand),

    /// List tasks, tags or areas
    List(ListCommand),

    /// Show an entity's details
    Show(ShowCommand),

    /// Create a new task
    Add(AddCommand),

    /// Mark a task as completed
    Complete(TaskActionCommand),

    /// Mark a task as cancelled
    Cancel(TaskActionCommand),

    /// Mark a completed or cancelled task as to-do again
    Reopen(TaskActionCommand),

    /// Move a task to the trash
    Trash(TaskActionCommand),

    /// Take a task out of the trash
    Restore(TaskActionCommand),

    /// Manage tags
    Tag(TagCommand),

    /// Manage areas
    Area(AreaCommand),

    /// Manage checklist items
    Checklist(ChecklistCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "things_sync=info,things_sync_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    if let Commands::Sync(cmd) = &command {
        cmd.prepare(&config)?;
    }
    let mut session = Session::open(&config).await?;
    match command {
        Commands::Sync(cmd) => return cmd.run(session).await,
        Commands::List(cmd) => cmd.run(session.client().store())?,
        Commands::Show(cmd) => cmd.run(session.client().store())?,
        Commands::Add(cmd) => {
            cmd.run(session.client_mut())?;
        }
        Commands::Complete(cmd) => cmd.run(TaskAction::Complete, session.client_mut().store_mut())?,
        Commands::Cancel(cmd) => cmd.run(TaskAction::Cancel, session.client_mut().store_mut())?,
        Commands::Reopen(cmd) => cmd.run(TaskAction::Reopen, session.client_mut().store_mut())?,
        Commands::Trash(cmd) => cmd.run(TaskAction::Trash, session.client_mut().store_mut())?,
        Commands::Restore(cmd) => cmd.run(TaskAction::Restore, session.client_mut().store_mut())?,
        Commands::Tag(cmd) => {
            cmd.run(session.client_mut())?;
        }
        Commands::Area(cmd) => {
            cmd.run(session.client_mut())?;
        }
        Commands::Checklist(cmd) => cmd.run(session.client_mut())?,
        Commands::Config(cmd) => return cmd.run(&config),
    }
    session.finish().await?;

    Ok(())
}
