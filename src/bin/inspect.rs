//! devicedb Inspection Tool
//!
//! Opens a data file, prints header metadata and per-section layout, and
//! optionally warms the caches with a scan to show hit/miss behavior.

use clap::Parser;
use devicedb::list::SectionList;
use devicedb::{Config, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// devicedb data file inspector
#[derive(Parser, Debug)]
#[command(name = "devicedb-inspect")]
#[command(about = "Inspect a devicedb binary data file")]
#[command(version)]
struct Args {
    /// Path to the data file
    path: String,

    /// Entries to read from each cached section as a cache warm-up
    #[arg(short, long, default_value = "0")]
    warm: u32,

    /// Cache capacity (entries) applied to every cached section
    #[arg(short, long, default_value = "1000")]
    cache_size: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,devicedb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .string_cache_size(args.cache_size)
        .value_cache_size(args.cache_size)
        .profile_cache_size(args.cache_size)
        .signature_cache_size(args.cache_size)
        .node_cache_size(args.cache_size)
        .index_cache_size(args.cache_size)
        .build();

    let store = match Store::open_with_config(&args.path, config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open data file: {}", e);
            std::process::exit(1);
        }
    };

    println!("devicedb-inspect v{}", devicedb::VERSION);
    println!();
    println!("File:          {}", args.path);
    println!("Format:        V{}", store.format_version().marker());
    println!("Published:     {} (unix)", store.published());
    println!("Source length: {} bytes", store.source_len());
    println!();

    println!("{:<32} {:>12} {:>10}", "section", "entries", "resident");
    print_section(store.components().count(), "components", true);
    print_section(store.maps().count(), "maps", true);
    print_section(store.properties().count(), "properties", true);
    print_section(store.root_nodes().count(), "root_nodes", true);
    print_section(store.profile_offsets().count(), "profile_offsets", true);
    print_section(store.strings().count(), "strings", false);
    print_section(store.values().count(), "values", false);
    print_section(store.profiles().count(), "profiles", false);
    print_section(store.signatures().count(), "signatures", false);
    print_section(store.ranked_signature_indexes().count(), "ranked_signature_indexes", false);
    print_section(store.nodes().count(), "nodes", false);
    if let Some(list) = store.signature_node_offsets() {
        print_section(list.count(), "signature_node_offsets", false);
    }
    if let Some(list) = store.node_ranked_signature_indexes() {
        print_section(list.count(), "node_ranked_signature_indexes", false);
    }

    if args.warm > 0 {
        warm(&store, args.warm);
        println!();
        println!(
            "{:<32} {:>10} {:>10} {:>8} {:>10}",
            "cache", "requests", "misses", "miss%", "occupancy"
        );
        print_cache_stats("values", store.values());
        print_cache_stats("signatures", store.signatures());
        print_cache_stats("ranked_signature_indexes", store.ranked_signature_indexes());
    }

    println!();
    println!("Readers created: {}", store.readers_created());
}

fn print_section(count: u32, name: &str, resident: bool) {
    println!(
        "{:<32} {:>12} {:>10}",
        name,
        count,
        if resident { "eager" } else { "lazy" }
    );
}

fn print_cache_stats<T: devicedb::entity::Entity>(name: &str, list: &devicedb::list::CachedList<T>) {
    println!(
        "{:<32} {:>10} {:>10} {:>7.1}% {:>10}",
        name,
        list.requests(),
        list.misses(),
        list.percentage_misses() * 100.0,
        list.occupancy()
    );
}

/// Read the first `n` entries of each fixed cached section
fn warm(store: &Store, n: u32) {
    let values = store.values();
    for i in 0..n.min(values.count()) {
        if let Err(e) = values.get(i) {
            tracing::warn!("value {} unreadable: {}", i, e);
            break;
        }
    }
    let signatures = store.signatures();
    for i in 0..n.min(signatures.count()) {
        if let Err(e) = signatures.get(i) {
            tracing::warn!("signature {} unreadable: {}", i, e);
            break;
        }
    }
    let ranked = store.ranked_signature_indexes();
    for i in 0..n.min(ranked.count()) {
        if let Err(e) = ranked.get(i) {
            tracing::warn!("ranked signature index {} unreadable: {}", i, e);
            break;
        }
    }
}
