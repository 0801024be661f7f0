//! Per-connection handling: inspect the `ClientHello`, then forward.

use std::{any::Any, net::SocketAddr, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use log::{debug, error, warn};
use tokio::{
    io::copy_bidirectional,
    net::TcpStream,
    select,
    task::spawn_blocking,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{ServerConfig, ServerError};
use crate::{buffer::Replay, metrics, rewind_stream::RewindStream};

/// Spawn a tracked task serving one client, logging and discarding panics.
pub(super) fn spawn_connection_task(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<ServerConfig>,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
) {
    let shutdown = shutdown.clone();
    tracker.spawn(async move {
        metrics::inc_connections();
        let fut = AssertUnwindSafe(process_stream(stream, peer_addr, &config, &shutdown))
            .catch_unwind();
        match fut.await {
            Ok(Ok(())) => {}
            Ok(Err(ServerError::Inspect(e))) if e.is_eof() => {
                debug!("client closed before hello: peer_addr={peer_addr}");
            }
            Ok(Err(e)) => warn!("connection task error: peer_addr={peer_addr}, error={e}"),
            Err(panic) => {
                let panic_msg = panic_message(panic.as_ref());
                // Emit via both `log` and `tracing` for tests that capture either.
                error!("connection task panicked: panic={panic_msg}, peer_addr={peer_addr}");
                tracing::error!(panic = %panic_msg, %peer_addr, "connection task panicked");
            }
        }
        metrics::dec_connections();
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else {
        format!("{payload:?}")
    }
}

async fn process_stream(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: &ServerConfig,
    shutdown: &CancellationToken,
) -> Result<(), ServerError> {
    let (client, hostname, replay) = inspect(stream, config).await?;
    tracing::info!(
        %peer_addr,
        %hostname,
        consumed = replay.len(),
        "client hello inspected"
    );
    debug!("captured bytes: hex={}", hex::encode(replay.as_bytes()));

    let Some(upstream_addr) = config.upstream else {
        return Ok(());
    };
    let mut upstream = TcpStream::connect(upstream_addr).await?;
    let mut client = RewindStream::new(replay, client);
    forward(&mut client, &mut upstream, shutdown).await?;
    debug!("connection finished: peer_addr={peer_addr}, upstream={upstream_addr}");
    Ok(())
}

/// Run the blocking inspector against `stream` on the blocking pool.
///
/// The socket is switched to blocking mode for the duration of the peek and
/// handed back in non-blocking mode afterwards.
async fn inspect(
    stream: TcpStream,
    config: &ServerConfig,
) -> Result<(TcpStream, String, Replay), ServerError> {
    let std_stream = stream.into_std()?;
    std_stream.set_nonblocking(false)?;
    std_stream.set_read_timeout(config.read_timeout)?;
    let inspector = config.inspector.clone();
    let (std_stream, outcome) = spawn_blocking(move || {
        let mut std_stream = std_stream;
        let outcome = inspector.read_hostname(&mut std_stream);
        (std_stream, outcome)
    })
    .await?;
    let (hostname, replay) = outcome?;
    std_stream.set_read_timeout(None)?;
    std_stream.set_nonblocking(true)?;
    Ok((TcpStream::from_std(std_stream)?, hostname, replay))
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn forward(
    client: &mut RewindStream<TcpStream>,
    upstream: &mut TcpStream,
    shutdown: &CancellationToken,
) -> Result<(), ServerError> {
    select! {
        biased;

        () = shutdown.cancelled() => Ok(()),
        res = copy_bidirectional(client, upstream) => {
            let (to_upstream, to_client) = res?;
            debug!("forwarding done: to_upstream={to_upstream}, to_client={to_client}");
            Ok(())
        }
    }
}
