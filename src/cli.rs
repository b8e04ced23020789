use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leakwarden")]
#[command(about = "Maintenance for the bounded heap snapshot store")]
#[command(version)]
pub struct Cli {
    /// Path to a config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the storage directory from config
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List stored snapshots with sizes and ages
    Status(StatusArgs),

    /// Delete snapshots older than the retention window
    Sweep,

    /// Delete the entire snapshot directory
    Clear(ClearArgs),
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Output as JSON instead of table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ClearArgs {
    /// Skip confirmation and delete
    #[arg(long, default_value_t = false)]
    pub yes: bool,
}
