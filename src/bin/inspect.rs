//! pit-inspect
//!
//! Loads a saved table file and prints its header and live records.

use std::path::PathBuf;

use clap::Parser;
use pitdb::{RecordLayout, Table, TableHeader};
use tracing_subscriber::{fmt, EnvFilter};

/// Inspect a pitdb table file
#[derive(Parser, Debug)]
#[command(name = "pit-inspect")]
#[command(about = "Print the header and records of a saved pitdb table")]
#[command(version)]
struct Args {
    /// Table file written by `Table::save`
    file: PathBuf,

    /// Print every live record (identity, timestamps, hex bytes)
    #[arg(short, long)]
    records: bool,

    /// Print only the record with this identity
    #[arg(short, long)]
    id: Option<u64>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pitdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("pit-inspect v{}", pitdb::VERSION);
    tracing::info!("Table file: {}", args.file.display());

    let table = match Table::load_from_path(&args.file) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to load table: {}", e);
            std::process::exit(1);
        }
    };

    let header = TableHeader::from_table(&table);
    println!("capabilities   {:?}", table.capabilities());
    println!("record_size    {}", header.record_size);
    println!("slot_capacity  {}", header.slot_capacity);
    println!("live_count     {}", header.live_count);
    println!("next_id        {}", header.next_id);

    if let Some(id) = args.id {
        match table.find(id) {
            Some(record) => print_record(&table, id, record),
            None => {
                println!("{} not found", id);
                std::process::exit(2);
            }
        }
        return;
    }

    let ids: Vec<String> = table.iter().map(|(id, _)| id.to_string()).collect();
    println!("identities     [{}]", ids.join(", "));

    if args.records {
        for (id, record) in &table {
            print_record(&table, id, record);
        }
    }
}

fn print_record<L: RecordLayout>(table: &Table<L>, id: u64, record: &[u8]) {
    let layout = table.layout();
    let mut line = format!("#{:<8}", id);
    if let Some(ts) = layout.read_created_at(record) {
        line.push_str(&format!(" created_at={}", ts));
    }
    if let Some(ts) = layout.read_updated_at(record) {
        line.push_str(&format!(" updated_at={}", ts));
    }
    println!("{}", line);
    println!("    {}", hex(record));
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
