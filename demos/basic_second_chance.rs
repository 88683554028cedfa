//! Demonstrates the second-chance eviction policy and its eviction listener.
//!
//! Reads only mark a key as spared; the scan queue is reordered when a full
//! cache needs room. Set `RUST_LOG=sparecache=trace` to watch the scan.
//!
//! Run with: cargo run --example basic_second_chance

use std::sync::mpsc;

use sparecache::builder::SecondChanceBuilder;
use sparecache::policy::second_chance::SecondChanceCache;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Second-Chance Cache Example ===\n");

    let (tx, rx) = mpsc::channel();
    let mut cache = SecondChanceBuilder::new(3)
        .on_evict(move |key: &'static str, value: i32| {
            let _ = tx.send((key, value));
        })
        .build();

    println!("Created cache: capacity={}\n", cache.capacity());

    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    print_queue("after inserting a, b, c", &cache);

    println!("\nget(a) = {:?}  (a is now spared)", cache.get(&"a"));
    print_queue("queue order is unchanged", &cache);

    println!("\nInserting d into a full cache...");
    cache.set("d", 4);
    for (key, value) in rx.try_iter() {
        println!("  evicted {key}={value}");
    }
    print_queue("a survived and moved to the head", &cache);

    println!("\nhas(c, bump_up=true) = {}", cache.has(&"c", true));
    for _ in 0..5 {
        cache.set("a", 99);
    }
    println!("after five overwrites, a = {:?}", cache.peek(&"a"));
    println!("next victim: {:?}", cache.peek_victim());

    println!("\nInserting e and f...");
    cache.set("e", 5);
    cache.set("f", 6);
    for (key, value) in rx.try_iter() {
        println!("  evicted {key}={value}");
    }
    print_queue("final", &cache);
}

fn print_queue(label: &str, cache: &SecondChanceCache<&'static str, i32>) {
    let order: Vec<String> = cache
        .scan_order()
        .map(|key| {
            if cache.is_spared(key) {
                format!("{key}*")
            } else {
                key.to_string()
            }
        })
        .collect();
    println!("  {label}: head [{}] tail", order.join(", "));
}
