//! Decode command implementation

use anyhow::{Context, Result};
use clap::Args;
use openflags_shared::flags::{decode_flags, AccessMode, DecodedFlags};
use openflags_shared::utils::parse_flags_value;
use serde::Serialize;
use tracing::debug;

use crate::output;

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Flag values (e.g., "577", "0x241", "0o1101", "0b11", "-1").
    /// Negative values must be decimal; use "0xffffffff" for raw bit patterns.
    #[arg(required = true, allow_negative_numbers = true)]
    pub values: Vec<String>,

    /// Print one JSON object per value
    #[arg(long)]
    pub json: bool,
}

/// One decoded value, as printed with `--json`
#[derive(Debug, Serialize)]
pub struct DecodeRecord {
    pub value: i32,
    pub octal: String,
    pub access_mode: Option<AccessMode>,
    pub flags: DecodedFlags,
    pub decoded: String,
}

impl DecodeRecord {
    pub fn new(value: i32) -> Self {
        let flags = decode_flags(value);
        Self {
            value,
            octal: format!("{:#o}", value as u32),
            access_mode: AccessMode::from_flags(value),
            decoded: flags.joined(),
            flags,
        }
    }
}

/// Parse every input up front so a typo fails before anything is printed
fn parse_values(values: &[String]) -> Result<Vec<i32>> {
    values
        .iter()
        .map(|v| parse_flags_value(v).with_context(|| format!("Failed to parse '{}'", v)))
        .collect()
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let values = parse_values(&args.values)?;
    debug!("decoding {} value(s)", values.len());

    for value in values {
        let record = DecodeRecord::new(value);
        if args.json {
            let line = serde_json::to_string(&record).context("Failed to serialize record")?;
            println!("{}", line);
        } else {
            println!("{}\t{}", record.octal, output::decoded(&record.decoded));
        }
    }

    Ok(())
}
