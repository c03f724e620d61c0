//! kiln-load: Bulk-create records for a content type from a JSON array
//!
//! Usage:
//!   # Create records from a file
//!   kiln-load article records.json --store ./content
//!
//!   # Read from stdin
//!   echo '[{"title": "Hello"}]' | kiln-load article --store ./content
//!
//!   # Show what would be created without touching the store
//!   kiln-load article records.json --store ./content --preview

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use kiln::report::TracingMessenger;
use kiln::schema::DEFAULT_ENTITY_KIND;
use kiln::store::{DirFileLoader, FileLoader, FsStore};
use kiln::RecordLoader;
use serde_json::Value;
use std::io::Read;

#[derive(Parser, Debug)]
#[command(name = "kiln-load")]
#[command(about = "Bulk-create records from a JSON array", long_about = None)]
struct Args {
    /// Machine name of the target content type
    type_name: String,

    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Store root directory
    #[arg(long, short = 's', env = "KILN_STORE", default_value = "./kiln_store")]
    store: String,

    /// Print a preview table instead of creating anything
    #[arg(long)]
    preview: bool,
}

/// Parse the batch using SIMD-accelerated parsing when possible.
///
/// The fast path covers the happy case only; everything else falls back
/// to the library decoder, which produces the canonical error messages.
fn read_items(raw: &str) -> Result<Vec<Value>> {
    let mut bytes = raw.trim().as_bytes().to_vec();
    match simd_json::to_owned_value(&mut bytes) {
        Ok(simd_json::OwnedValue::Array(items)) if !items.is_empty() => {
            // Convert simd_json values to serde_json::Value
            let json_str = simd_json::to_string(&items)?;
            Ok(serde_json::from_str(&json_str)?)
        }
        _ => Ok(kiln::decode_array(raw)?),
    }
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

    let items = read_items(&raw)?;

    if args.preview {
        println!("{:>4}  {:<30}  {}", "#", "Title", "Fields");
        for row in kiln::preview_records(&items) {
            println!("{:>4}  {:<30}  {}", row.position, row.title, row.fields);
        }
        return Ok(());
    }

    let mut store = FsStore::open(&args.store)
        .with_context(|| format!("failed to open store at {}", args.store))?;
    let schema = store
        .load_schema(DEFAULT_ENTITY_KIND, &args.type_name)
        .with_context(|| format!("unknown content type {}", args.type_name))?;
    let messenger = TracingMessenger;

    let records = kiln::build_records(&schema, &items)?;
    let created =
        RecordLoader::new(&mut store, &messenger).create_records(&schema.type_name, &records)?;

    println!("Created {created} records of type {}", args.type_name);

    Ok(())
}
