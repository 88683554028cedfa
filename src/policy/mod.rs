//! Eviction policies.

pub mod second_chance;

pub use second_chance::SecondChanceCache;
