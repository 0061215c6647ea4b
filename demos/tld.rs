//! Example: building a DAFSA from a gperf TLD file.
//!
//! Reads the keyword section of a gperf file (`domain, N` lines between
//! `%%` markers), appends every entry in file order and reports the size of
//! the graph against a minimal one.
//!
//! Run with: cargo run --example tld -- effective_tld_names.gperf --words
//!
//! Set `RUST_LOG=debug` to see every append.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use incremental_dafsa::dafsa::tld::read_gperf_file;
use incremental_dafsa::Dafsa;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(about = "Build a DAFSA from a gperf TLD file")]
struct Args {
    /// gperf file holding `domain, N` entries
    input: PathBuf,

    /// Sort the entries before appending them
    #[arg(long, default_value_t = false)]
    sorted: bool,

    /// Print every recognised entry
    #[arg(long, short = 'w')]
    words: bool,

    /// Check the graph invariants after building
    #[arg(long)]
    verify: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut entries = match read_gperf_file(&args.input) {
        Ok(entries) => entries,
        Err(e) => {
            error!("failed to read {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };
    if args.sorted {
        entries.sort_unstable();
    }
    info!("read {} entries from {}", entries.len(), args.input.display());

    let dafsa = match Dafsa::from_tld_data(&entries) {
        Ok(dafsa) => dafsa,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if args.verify {
        if let Err(e) = dafsa.verify() {
            error!("graph is inconsistent: {e}");
            return ExitCode::FAILURE;
        }
    }

    println!("entries: {}", entries.len());
    println!("nodes:   {}", dafsa.node_count());
    println!("minimal: {}", dafsa.minimal_node_count());

    if args.words {
        for word in dafsa.words() {
            let (code, domain) = word.split_last().expect("TLD words are never empty");
            println!("{}, {code}", String::from_utf8_lossy(domain));
        }
    }
    ExitCode::SUCCESS
}
