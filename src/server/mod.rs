//! Demo TCP front end built on the inspector.
//!
//! [`serve`] accepts connections, peeks each client's SNI hostname on the
//! blocking pool and, when an upstream is configured, forwards the
//! connection there with the captured bytes replayed first. Connection
//! tasks are tracked so shutdown waits for them to finish.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use log::info;
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::inspect::Inspector;

mod accept;
mod backoff;
mod connection;
mod error;

pub use backoff::BackoffConfig;
pub use error::ServerError;

/// Settings for [`serve`].
///
/// # Default Values
/// - `upstream`: `None`, so connections are closed after inspection
/// - `read_timeout`: 10 seconds
/// - `inspector`: [`Inspector::default`]
/// - `backoff`: [`BackoffConfig::default`]
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Where to forward connections once the hostname is known.
    pub upstream: Option<SocketAddr>,
    /// Socket read timeout applied while the hello is being read.
    pub read_timeout: Option<Duration>,
    /// Inspector used for every connection.
    pub inspector: Inspector,
    /// Accept-loop retry policy.
    pub backoff: BackoffConfig,
}

impl ServerConfig {
    /// Default read timeout while inspecting.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upstream: None,
            read_timeout: Some(Self::DEFAULT_READ_TIMEOUT),
            inspector: Inspector::default(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Serve connections from `listener` until `shutdown` resolves.
///
/// After `shutdown` resolves no new connections are accepted; in-flight
/// forwarding is cancelled and the call returns once every connection task
/// has finished.
///
/// # Errors
///
/// Returns an error if the listener's local address cannot be read.
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send,
{
    let local_addr = listener.local_addr()?;
    info!(
        "listening: local_addr={local_addr}, upstream={:?}",
        config.upstream
    );
    let token = CancellationToken::new();
    let tracker = TaskTracker::new();
    tracker.spawn(accept::accept_loop(
        listener,
        Arc::new(config),
        token.clone(),
        tracker.clone(),
    ));

    shutdown.await;
    token.cancel();
    tracker.close();
    tracker.wait().await;
    info!("server stopped: local_addr={local_addr}");
    Ok(())
}
