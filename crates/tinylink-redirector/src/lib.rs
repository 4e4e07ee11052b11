//! Redirector service library.
//!
//! [`RedirectorService`] resolves short codes to their original URLs,
//! reading through a [`UrlCache`](tinylink_core::UrlCache) and falling back
//! to the mapping store on a miss.
//!
//! ```rust
//! use tinylink_cache::MokaUrlCache;
//! use tinylink_core::ShortCode;
//! use tinylink_redirector::{Redirector, RedirectorConfig, RedirectorService};
//! use tinylink_storage::InMemoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedirectorService::new(
//!     InMemoryRepository::new(),
//!     MokaUrlCache::new(),
//!     RedirectorConfig::default(),
//! );
//!
//! let code = ShortCode::new("b")?;
//! match service.resolve(&code).await {
//!     Ok(resolved) => println!("Redirect to: {}", resolved.original_url),
//!     Err(e) => println!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod redirector;
pub mod service;

pub use error::RedirectorError;
pub use redirector::{Redirector, Resolved, ResolvedFrom};
pub use service::{RedirectorConfig, RedirectorService};
