use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use txt2bin::{FileType, convert, merge_chunks, write_chunks};

/// Convert Intel HEX or Motorola S-record files into a binary image.
#[derive(Debug, Parser)]
#[command(name = "txt2bin", version)]
struct Cli {
    /// Offset subtracted from every record address before writing; accepts
    /// decimal or 0x-prefixed hex.
    #[arg(short, long, default_value = "0", value_parser = parse_offset)]
    base: u32,

    /// Existing binary to copy into OUTPUT before the records are applied.
    #[arg(short, long, value_name = "EXISTING_BINARY")]
    merge_with: Option<PathBuf>,

    /// Input file type.
    #[arg(short = 't', long = "type", value_enum, default_value = "auto")]
    filetype: FileType,

    /// Input record file.
    input: PathBuf,

    /// Output binary file.
    output: PathBuf,
}

fn parse_offset(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }
}

fn run(cli: &Cli) -> Result<(), txt2bin::Error> {
    let chunks = convert(&cli.input, cli.filetype)?;
    match &cli.merge_with {
        Some(existing) => merge_chunks(&cli.output, existing, &chunks, cli.base),
        None => write_chunks(&cli.output, &chunks, cli.base),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "txt2bin=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
