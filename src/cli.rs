//! Command line interface for the `sni-peek` demo server.
//!
//! Kept free of crate-internal imports so the build script can include it to
//! render the manual page.

use std::net::SocketAddr;

use clap::Parser;

/// Command line arguments for the `sni-peek` binary.
#[derive(Debug, Parser)]
#[command(
    name = "sni-peek",
    version,
    about = "Log the SNI hostname of incoming TLS connections and optionally forward them"
)]
pub struct Cli {
    /// Address to accept TLS connections on.
    #[arg(short, long, default_value = "127.0.0.1:8443")]
    pub listen: SocketAddr,

    /// Forward each connection here after inspection, replaying the bytes read.
    #[arg(short, long)]
    pub upstream: Option<SocketAddr>,

    /// Reject SSL record versions and apply the stricter length checks.
    #[arg(long)]
    pub strict: bool,

    /// Always use the general record-by-record parser.
    #[arg(long)]
    pub no_fast_path: bool,

    /// Read timeout while waiting for the hello, in milliseconds. Zero disables it.
    #[arg(long, default_value_t = 10_000)]
    pub read_timeout_ms: u64,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_listen: Option<SocketAddr>,
}
