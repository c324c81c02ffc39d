use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use meterchain_ledger::{Ledger, LedgerConfig, Payload, Record};
use meterchain_server::{MeterchainServer, ServerConfig, SinkConfig};
use serde::Deserialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        difficulty,
        format,
        ..
    } = cli;
    let config = resolve_config(config.as_deref(), difficulty)?;
    match command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Mine(args) => cmd_mine(&config, args, &format),
        Command::Verify(args) => cmd_verify(&config, args, &format),
        Command::Config(_) => cmd_config(&config, &format),
    }
}

/// File config (or defaults plus environment), then command-line overrides.
/// An invalid difficulty stops the process here.
fn resolve_config(path: Option<&Path>, difficulty: Option<u32>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ServerConfig {
            ledger: LedgerConfig::from_env()?,
            ..ServerConfig::default()
        },
    };
    if let Some(d) = difficulty {
        config.ledger.difficulty = d;
    }
    config.ledger.difficulty()?;
    Ok(config)
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }
    if let Some(path) = args.sink {
        config.sink = SinkConfig::JsonLines { path };
    }
    println!(
        "meterchain server on {} (difficulty {})",
        config.bind_addr.to_string().bold(),
        config.ledger.difficulty.to_string().yellow()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let server = MeterchainServer::from_config(config).await?;
        server.serve().await?;
        Ok::<(), anyhow::Error>(())
    })
}

fn mine_payload(args: &MineArgs) -> anyhow::Result<Payload> {
    match (&args.source_id, args.quantity, &args.data) {
        (Some(source_id), Some(quantity), None) => Ok(Payload::reading(source_id.clone(), quantity)?),
        (None, None, Some(data)) => Ok(Payload::opaque(data.clone())),
        _ => bail!("pass either --source-id with --quantity, or --data"),
    }
}

fn cmd_mine(config: &ServerConfig, args: MineArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let payload = mine_payload(&args)?;
    let mut ledger = Ledger::new(&config.ledger)?;

    for _ in 0..args.count {
        let record = ledger.mine(payload.clone())?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&record)?),
            OutputFormat::Text => println!(
                "{} #{} proof {} link {}",
                "✓ mined".green().bold(),
                record.position().to_string().yellow(),
                record.proof().to_string().cyan(),
                short(record.link_hash()).dimmed()
            ),
        }
    }

    if let Some(out) = &args.out {
        let text = serde_json::to_string_pretty(ledger.records())?;
        std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
        if matches!(format, OutputFormat::Text) {
            println!("  Chain written to {}", out.display().to_string().bold());
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChainFile {
    Records(Vec<Record>),
    Wrapped { chain: Vec<Record> },
}

/// Accepts a JSON array, a `{"chain": [...]}` listing, or JSON lines.
pub(crate) fn parse_chain(text: &str) -> anyhow::Result<Vec<Record>> {
    if let Ok(file) = serde_json::from_str::<ChainFile>(text) {
        return Ok(match file {
            ChainFile::Records(records) | ChainFile::Wrapped { chain: records } => records,
        });
    }
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}: not a record", n + 1))
        })
        .collect()
}

fn cmd_verify(config: &ServerConfig, args: VerifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let records = parse_chain(&text)?;
    let ledger = Ledger::from_records(records, config.ledger.difficulty()?)?;
    let outcome = ledger.verify();

    match format {
        OutputFormat::Json => {
            let report = match &outcome {
                Ok(()) => serde_json::json!({"valid": true, "length": ledger.len()}),
                Err(e) => serde_json::json!({
                    "valid": false,
                    "length": ledger.len(),
                    "position": e.position,
                    "reason": e.kind.code(),
                }),
            };
            println!("{report}");
        }
        OutputFormat::Text => match &outcome {
            Ok(()) => {
                println!("{} Chain integrity verified", "✓".green().bold());
                println!("  Records: {}", ledger.len().to_string().bold());
                println!("  Links: {}", "valid".green());
                println!("  Proofs: {}", "valid".green());
            }
            Err(e) => println!("{} {}", "✗ Chain invalid:".red().bold(), e),
        },
    }

    if let Err(e) = outcome {
        bail!("chain failed validation at position {}", e.position);
    }
    Ok(())
}

fn cmd_config(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", toml::to_string_pretty(config)?),
    }
    Ok(())
}

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
