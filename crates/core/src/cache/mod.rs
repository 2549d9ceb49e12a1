//! File-backed catalog cache.
//!
//! Every cached entity is one pretty-printed JSON file under the data
//! directory, and its freshness is the file's modification time. The module
//! is split into three layers:
//!
//! - [`key`]: maps an entity kind and id onto a path inside the data directory
//! - [`store`]: the freshness gate, the atomic writer and the reader
//! - [`layer`]: the cache-aside state machine with per-key in-flight dedup

pub mod key;
pub mod layer;
pub mod store;

pub use key::{CacheKey, EntityKind};
pub use layer::{CacheLayer, CacheResult, CacheSource};
pub use store::{CachedEntry, FileStore, Freshness};
