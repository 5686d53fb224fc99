use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use chain_hash::ChainTable;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'k', long = "keys", default_value_t = 1000)]
    keys: u64,

    #[arg(short = 'c', long = "initial_capacity", default_value_t = 10)]
    initial_capacity: usize,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating ChainTable with initial capacity: {}",
        args.initial_capacity
    );

    let mut table: ChainTable<(u64, u64)> = ChainTable::with_capacity(args.initial_capacity);

    println!("Inserting {} keys...", args.keys);

    let mut growth_events = Vec::new();
    for i in 0..args.keys {
        let before = table.capacity();
        table.upsert_tail(hash_u64(i), (i, i * 2), |a, b| a.0 == b.0);
        let after = table.capacity();
        if after != before {
            growth_events.push((i, before, after));
        }
    }

    println!("Inserted {} entries", table.len());
    for (key_number, before, after) in &growth_events {
        println!(
            "Insert #{} doubled the bucket array: {} -> {}",
            key_number, before, after
        );
    }
    println!(
        "Final load factor: {:.2}%",
        table.load_factor() * 100.0
    );

    table.stats().print();
}
