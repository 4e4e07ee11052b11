//! Disposable backing services for integration tests.

pub mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};

use testcontainers::{ContainerAsync, GenericImage};

/// Host the container's mapped ports are reachable on.
///
/// `localhost` is pinned to IPv4; the mapped ports are IPv4 only.
async fn host_of(container: &ContainerAsync<GenericImage>) -> Result<String> {
    let host = container.get_host().await?.to_string();
    Ok(match host.as_str() {
        "localhost" => String::from("127.0.0.1"),
        _ => host,
    })
}
