#![no_main]

use libfuzzer_sys::fuzz_target;
use sparecache::policy::second_chance::SecondChanceCache;

// Fuzz arbitrary operation sequences on SecondChanceCache
//
// Random sequences of set, get, has (with and without bump), peek and
// peek_victim, checking the structural invariants after every step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = (data[0] as usize % 50).max(1);
    let mut cache = SecondChanceCache::new(capacity);

    let mut idx = 1;
    while idx + 2 < data.len() {
        let op = data[idx] % 6;
        let key = data[idx + 1] as u32;
        let value = data[idx + 2] as u32;

        match op {
            0 => {
                cache.set(key, value);
                assert_eq!(cache.peek(&key), Some(&value));
            }
            1 => {
                let _ = cache.get(&key);
            }
            2 => {
                cache.has(&key, false);
            }
            3 => {
                cache.has(&key, true);
            }
            4 => {
                let _ = cache.peek(&key);
            }
            5 => {
                let _ = cache.peek_victim();
            }
            _ => unreachable!(),
        }

        assert!(cache.len() <= cache.capacity());
        cache.check_invariants().unwrap();

        idx += 3;
    }
});
