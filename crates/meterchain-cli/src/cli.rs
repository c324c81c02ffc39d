use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "meterchain",
    about = "Proof-of-work ledger for smart-meter readings",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the proof-of-work difficulty
    #[arg(short, long, global = true)]
    pub difficulty: Option<u32>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Mine records into a fresh in-memory ledger
    Mine(MineArgs),
    /// Verify an exported chain
    Verify(VerifyArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    /// Export mined records to this JSON-lines file
    #[arg(long)]
    pub sink: Option<PathBuf>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("payload").required(true).args(["source_id", "data"])))]
pub struct MineArgs {
    /// Meter identifier; mines a reading
    #[arg(long, requires = "quantity", conflicts_with = "data")]
    pub source_id: Option<String>,
    #[arg(long, requires = "source_id", allow_negative_numbers = true)]
    pub quantity: Option<f64>,
    /// Opaque payload
    #[arg(long)]
    pub data: Option<String>,
    /// How many records to mine
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,
    /// Write the resulting chain as a JSON array
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// JSON array, `{"chain": [...]}` object, or JSON-lines file
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {}
