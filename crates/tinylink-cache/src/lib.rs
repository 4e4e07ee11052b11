//! Resolution cache backends.

pub mod disabled;
pub mod moka;
pub mod redis;

pub use disabled::DisabledCache;
pub use self::moka::{CacheConfig, MokaUrlCache};
pub use self::redis::RedisUrlCache;
pub use tinylink_core::{CacheError, UrlCache};
