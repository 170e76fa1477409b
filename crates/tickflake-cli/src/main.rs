#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, Command, DecodeConfig, MintConfig};
use std::io::{self, BufWriter, Write};
use telemetry::init_telemetry;
use tickflake::Generator;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    init_telemetry()?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match args.command {
        Command::Mint(args) => mint(&MintConfig::try_from(args)?, &mut out)?,
        Command::Decode(args) => decode(&DecodeConfig::try_from(args)?, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn mint(config: &MintConfig, out: &mut impl Write) -> anyhow::Result<()> {
    if cfg!(debug_assertions) {
        tracing::info!("Minting {} IDs with full config: {:#?}", config.count, config);
    } else {
        tracing::debug!(
            count = config.count,
            node_id = config.generator.node_id,
            "Minting IDs"
        );
    }

    let generator = Generator::from_config(&config.generator)?;
    for _ in 0..config.count {
        writeln!(out, "{}", generator.next_id())?;
    }
    Ok(())
}

fn decode(config: &DecodeConfig, out: &mut impl Write) -> anyhow::Result<()> {
    for &id in &config.ids {
        let parts = config.layout.decode(id);
        let unix_ms = config.epoch_ms.saturating_add(parts.timestamp);
        writeln!(
            out,
            "{id}\ttimestamp={} node_id={} sequence={} unix_ms={unix_ms}",
            parts.timestamp, parts.node_id, parts.sequence
        )?;
    }
    Ok(())
}
