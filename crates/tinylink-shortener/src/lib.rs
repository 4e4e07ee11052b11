//! URL shortener service implementation.
//!
//! This crate provides the shortening service and the counter sequencer it
//! allocates from. Core types are re-exported from `tinylink_core`.

pub mod sequencer;
pub mod service;

pub use sequencer::{Sequencer, StoreSequencer};
pub use service::{ShortenerConfig, ShortenerService};
pub use tinylink_core::{CacheWrite, Shortened, Shortener, ShortenerError};
