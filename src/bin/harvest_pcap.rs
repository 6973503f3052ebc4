//! Harvest signalling payloads from packet captures.
//!
//! Usage:
//!   harvest_pcap [OPTIONS] <CAPTURE-FILE-OR-DIR>
//!
//! Prints one hex payload per line, in capture order (name order across a
//! directory). Pipe the output into a sample list for module generation.
//!
//! Options:
//!   --count, -c   Print only the number of harvested payloads

use std::path::PathBuf;

use tlvgen::{harvest_dir, harvest_file};

fn main() -> anyhow::Result<()> {
    let mut raw_args: Vec<String> = std::env::args().skip(1).collect();
    let count_only = if let Some(pos) = raw_args.iter().position(|a| a == "--count" || a == "-c") {
        raw_args.remove(pos);
        true
    } else {
        false
    };
    let path: PathBuf = raw_args
        .first()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: harvest_pcap [--count] <capture-file-or-dir>"))?;

    let payloads = if path.is_dir() {
        harvest_dir(&path)?
    } else {
        harvest_file(&path)?
    };

    if count_only {
        println!("{}", payloads.len());
    } else {
        for hex in &payloads {
            println!("{}", hex);
        }
    }
    Ok(())
}
