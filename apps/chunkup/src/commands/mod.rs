//! CLI command definitions and handlers.

use std::path::PathBuf;

use chunkup_transfer::DEFAULT_CHUNK_SIZE;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;

pub mod hash;
pub mod upload;

/// chunkup - content-addressed chunked uploads
#[derive(Parser)]
#[command(name = "chunkup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a file, skipping the transfer if the server already has it
    Upload(UploadArgs),

    /// Print a file's hash and chunk plan without contacting a server
    Hash(HashArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload
    pub file: PathBuf,

    /// Upload server URL (overrides config)
    #[arg(long, env = "CHUNKUP_SERVER")]
    pub server: Option<String>,

    /// Chunk size in bytes
    #[arg(long)]
    pub chunk_size: Option<u64>,

    /// Maximum chunk uploads in flight (0 = unlimited)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Extra attempts per chunk after a network failure
    #[arg(long)]
    pub retries: Option<u32>,

    /// Path to an alternate config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl UploadArgs {
    /// Applies command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.server_url.clone_from(server);
        }
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(n) = self.retries {
            config.chunk_retries = n;
        }
    }
}

#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash
    pub file: PathBuf,

    /// Chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,

    /// Print the result as a JSON `complete` message
    #[arg(long)]
    pub json: bool,
}
