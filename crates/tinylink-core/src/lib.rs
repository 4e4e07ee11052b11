//! Core types and traits for the Tinylink URL shortener.
//!
//! This crate provides shared types and traits used by both the
//! shortener service and the redirector service: the base62 code encoder,
//! the mapping record, and the store and cache contracts.

pub mod base62;
pub mod cache;
pub mod counter;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use cache::{CacheWrite, UrlCache};
pub use counter::Counter;
pub use error::{CacheError, CoreError, ShortenerError, StorageError};
pub use repository::{ReadRepository, Repository, UrlMapping};
pub use shortcode::ShortCode;
pub use shortener::{Shortened, Shortener};
