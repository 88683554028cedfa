pub use crate::builder::SecondChanceBuilder;
pub use crate::error::{ConfigError, InvariantError};
pub use crate::listener::EvictionListener;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::SecondChanceMetricsSnapshot;
pub use crate::policy::second_chance::SecondChanceCache;
#[cfg(feature = "concurrency")]
pub use crate::shared::SharedSecondChanceCache;
pub use crate::traits::{CoreCache, ReadOnlyCache};
