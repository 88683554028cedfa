#![no_main]

use std::sync::mpsc;

use libfuzzer_sys::fuzz_target;
use sparecache::policy::second_chance::SecondChanceCache;

// Fuzz eviction patterns with spared keys
//
// Varies which resident keys are touched before each insert into a full
// cache, and checks that the key peek_victim predicts is the one evicted.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let capacity = (data[0] as usize % 20).max(1);
    let (tx, rx) = mpsc::channel();
    let mut cache = SecondChanceCache::with_listener(capacity, move |k: u32, v: u32| {
        let _ = tx.send((k, v));
    });

    for i in 0..capacity {
        cache.set(i as u32, i as u32);
    }

    let mut idx = 1;
    while idx + 1 < data.len() {
        let key = data[idx] as u32 % (capacity as u32 * 2);
        if data[idx + 1] % 2 == 0 {
            let _ = cache.get(&key);
        }

        let predicted = cache.peek_victim().copied();
        let new_key = 1_000 + idx as u32;
        cache.set(new_key, new_key);

        let evicted: Vec<_> = rx.try_iter().collect();
        assert_eq!(evicted.len(), 1);
        assert_eq!(Some(evicted[0].0), predicted);
        assert!(cache.spared_len() <= cache.len());
        cache.check_invariants().unwrap();

        idx += 2;
    }
});
