use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "metafleet-server", version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Serve,
    /// Print a fresh password cipher key for the config file.
    GenerateKey,
    /// Encrypt a plaintext password with the configured cipher key.
    EncryptPassword {
        #[arg(long)]
        password: String,
    },
}
