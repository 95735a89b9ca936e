use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about = "A tool to read and summarize block coverage dumps.", long_about = None)]
struct Args {
    /// Path to the coverage dump
    #[arg(required = true)]
    file: PathBuf,

    /// Print every covered block
    #[arg(short, long)]
    detailed: bool,

    /// Report whether the block at this address (hex with 0x, or decimal) was covered
    #[arg(short, long, value_parser = parse_address)]
    address: Vec<u64>,
}

fn parse_address(s: &str) -> Result<u64, String> {
    bbcov::reader::parse_address(s).ok_or_else(|| format!("invalid address '{s}'"))
}

fn main() {
    let args = Args::parse();

    let dump = match bbcov::from_file(&args.file) {
        Ok(dump) => dump,
        Err(e) => {
            eprintln!(
                "Error: Failed to parse coverage dump '{}': {}",
                args.file.display(),
                e
            );
            process::exit(1);
        }
    };

    println!("=== Coverage Dump Analysis ===");
    println!("File: {}", args.file.display());
    println!("Covered Blocks: {}", dump.len());
    match dump.address_range() {
        Some((low, high)) => println!("Address Range: 0x{low:x} - 0x{high:x}"),
        None => println!("Address Range: (empty)"),
    }
    if dump.has_counts() {
        println!("Total Instructions: {}", dump.total_instructions());
    }
    println!();

    if args.detailed {
        println!("=== Covered Blocks ===");
        println!("{:<20} Instructions", "Address");
        println!("{}", "-".repeat(40));
        for entry in &dump.entries {
            let count = entry
                .instruction_count
                .map_or_else(|| "-".to_string(), |c| c.to_string());
            println!("0x{:<18x} {}", entry.address, count);
        }
        println!();
    }

    if !args.address.is_empty() {
        println!("=== Address Queries ===");
        for address in &args.address {
            let status = if dump.contains(*address) {
                "covered"
            } else {
                "not covered"
            };
            println!("0x{address:x}: {status}");
        }
    }
}
