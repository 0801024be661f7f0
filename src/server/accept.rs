//! Accept loop for the demo server.

use std::{sync::Arc, time::Duration};

use log::warn;
use tokio::{net::TcpListener, select, time::sleep};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{ServerConfig, backoff::BackoffConfig, connection::spawn_connection_task};

/// Accept connections until `shutdown` is cancelled.
///
/// Each connection is handed to its own tracked task. Accept failures are
/// retried after an exponentially growing delay.
pub(super) async fn accept_loop(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
) {
    let backoff = config.backoff.normalized();
    let mut delay = backoff.initial_delay;
    loop {
        let next = accept_iteration(&listener, &config, &shutdown, &tracker, &backoff, delay);
        match next.await {
            Some(next_delay) => delay = next_delay,
            None => break,
        }
    }
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn accept_iteration(
    listener: &TcpListener,
    config: &Arc<ServerConfig>,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
    backoff: &BackoffConfig,
    delay: Duration,
) -> Option<Duration> {
    select! {
        biased;

        () = shutdown.cancelled() => None,
        res = listener.accept() => Some(match res {
            Ok((stream, peer_addr)) => {
                spawn_connection_task(stream, peer_addr, Arc::clone(config), shutdown, tracker);
                backoff.initial_delay
            }
            Err(e) => {
                let local_addr = listener.local_addr().ok();
                warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                sleep(delay).await;
                backoff.next_delay(delay)
            }
        }),
    }
}
