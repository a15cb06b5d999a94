//! Blocking echo server wiring.
//!
//! The admission loop owns the listener and the percentile tracker: it
//! drains pending connections in bounded batches, samples the live
//! connection depth on every admit, and hands each connection to its own
//! thread for blocking framed echo exchange.

use crate::codec::LengthPrefixCodec;
use crate::config::Config;
use crate::net::{
    accept_pending, bind_listener, recv_msg, send_msg, set_nonblocking, set_rw_timeout,
    ListenError, ReuseMode,
};
use crate::percentile::PercentileTracker;
use std::io;
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Metric key for live-connection depth samples.
const CONN_DEPTH_KEY: &str = "conn_depth";

/// Idle sleep between acceptor passes when nothing was pending.
const IDLE_ACCEPT_WAIT: Duration = Duration::from_millis(1);

/// Admissions between depth-percentile reports.
const REPORT_EVERY: u64 = 1024;

/// Server instance
pub struct Server {
    config: Config,
    live_connections: Arc<AtomicUsize>,
    depth_stats: PercentileTracker,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        let window = config.stat_window;
        Server {
            config,
            live_connections: Arc::new(AtomicUsize::new(0)),
            depth_stats: PercentileTracker::new(window),
        }
    }

    /// Bind the listener and run the admission loop. Does not return on
    /// success; listener setup failure is fatal.
    pub fn run(&mut self) -> Result<(), ListenError> {
        let reuse = if self.config.reuse_port {
            ReuseMode::Port
        } else {
            ReuseMode::Address
        };
        let listener = bind_listener(&self.config.host, self.config.port, reuse)?;
        set_nonblocking(&listener);

        info!(
            host = %self.config.host,
            port = self.config.port,
            reuse = ?reuse,
            accept_batch = self.config.accept_batch,
            "Server listening"
        );

        let accept_batch = self.config.accept_batch;
        let timeout = (self.config.timeout_secs, self.config.timeout_usecs);
        let mut since_report: u64 = 0;

        loop {
            let live = &self.live_connections;
            let stats = &mut self.depth_stats;

            let accepted = accept_pending(&listener, accept_batch, |stream, peer| {
                let depth = live.fetch_add(1, Ordering::Relaxed) + 1;
                stats.record(CONN_DEPTH_KEY, depth as i64);
                debug!(peer = %peer, depth, "New connection");

                let live = Arc::clone(live);
                thread::spawn(move || {
                    if let Err(e) = serve_connection(stream, timeout.0, timeout.1) {
                        debug!(error = %e, "Connection ended");
                    }
                    live.fetch_sub(1, Ordering::Relaxed);
                });
            });

            if accepted == 0 {
                thread::sleep(IDLE_ACCEPT_WAIT);
                continue;
            }

            since_report += accepted as u64;
            if since_report >= REPORT_EVERY {
                since_report = 0;
                // Available once the sample window has filled
                if let Some(p99) = self.depth_stats.percentile(CONN_DEPTH_KEY, 0.99) {
                    info!(p99, "Connection depth percentile");
                }
            }
        }
    }
}

/// Serve one connection: echo every framed message back until the peer
/// closes or an exchange fails.
fn serve_connection(stream: TcpStream, timeout_secs: u64, timeout_usecs: u32) -> io::Result<()> {
    // Accepted sockets can inherit the listener's non-blocking flag on some
    // platforms; the transport requires blocking mode.
    stream.set_nonblocking(false)?;
    set_rw_timeout(&stream, timeout_secs, timeout_usecs);

    let mut stream = stream;
    let mut codec = LengthPrefixCodec::new();
    loop {
        let message = recv_msg(&mut stream, &mut codec)?;
        send_msg(&mut stream, &codec, &message)?;
    }
}
