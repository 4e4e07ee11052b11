//! Mapping store backends.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use tinylink_core::error::StorageError;
pub use tinylink_core::repository::{ReadRepository, Repository, UrlMapping};
