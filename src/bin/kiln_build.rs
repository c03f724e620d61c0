//! kiln-build: Create a content type and its fields from a JSON object
//!
//! The input document maps field labels to either a bare type string or
//! a definition map with optional type, label and target_type keys.
//!
//! Usage:
//!   # Read field definitions from a file
//!   kiln-build article fields.json --store ./content
//!
//!   # Read from stdin
//!   echo '{"title": "string", "body": "text"}' | kiln-build article --store ./content
//!
//!   # Re-running is a no-op for existing pieces
//!   kiln-build article fields.json --store ./content

use anyhow::{Context, Result};
use clap::Parser;
use kiln::report::TracingMessenger;
use kiln::store::{DirFileLoader, FileLoader, FsStore};
use kiln::FieldStatus;
use std::io::Read;

#[derive(Parser, Debug)]
#[command(name = "kiln-build")]
#[command(about = "Create a content type from a JSON field document", long_about = None)]
struct Args {
    /// Machine name of the content type
    type_name: String,

    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Content type description
    #[arg(long, default_value = "")]
    description: String,

    /// Store root directory
    #[arg(long, short = 's', env = "KILN_STORE", default_value = "./kiln_store")]
    store: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let raw = if let Some(file_id) = &args.input {
        let bytes = DirFileLoader::new(".")
            .load(file_id)
            .with_context(|| format!("failed to load {file_id}"))?;
        String::from_utf8(bytes).context("input file is not UTF-8")?
    } else {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        buffer
    };

    let mut store = FsStore::open(&args.store)
        .with_context(|| format!("failed to open store at {}", args.store))?;
    let messenger = TracingMessenger;

    let report = kiln::build_content_type(
        &mut store,
        &messenger,
        &args.type_name,
        &args.description,
        &raw,
    )?;

    println!(
        "{}: {} fields created, {} already existed, {} skipped",
        args.type_name,
        report.count(FieldStatus::Created),
        report.count(FieldStatus::AlreadyExisted),
        report.count(FieldStatus::SkippedError),
    );

    Ok(())
}
