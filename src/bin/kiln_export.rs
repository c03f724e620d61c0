//! kiln-export: Export a content type's records as flattened JSON
//!
//! Single-valued fields collapse to bare scalars, so a round trip
//! through kiln-load reproduces the original input. Only published
//! records are exported.
//!
//! Usage:
//!   # Write <type>_export_<timestamp>.json into the current directory
//!   kiln-export article --store ./content
//!
//!   # Print to stdout instead
//!   kiln-export article --store ./content --stdout
//!
//!   # Compact output (no pretty-printing)
//!   kiln-export article --store ./content --stdout --compact

use anyhow::{Context, Result};
use clap::Parser;
use kiln::store::FsStore;

#[derive(Parser, Debug)]
#[command(name = "kiln-export")]
#[command(about = "Export records as flattened JSON", long_about = None)]
struct Args {
    /// Machine name of the content type to export
    type_name: String,

    /// Store root directory
    #[arg(long, short = 's', env = "KILN_STORE", default_value = "./kiln_store")]
    store: String,

    /// Directory the export file is written to
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: String,

    /// Print to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
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

    let store = FsStore::open(&args.store)
        .with_context(|| format!("failed to open store at {}", args.store))?;

    let export = kiln::export_content(&store, &args.type_name)?;

    let output = if args.compact {
        serde_json::to_string(&export.body)?
    } else {
        export.to_pretty_json()?
    };

    if args.stdout {
        println!("{output}");
    } else {
        let path = std::path::Path::new(&args.output_dir).join(&export.filename);
        std::fs::write(&path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
