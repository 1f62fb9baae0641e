//! Line-delimited JSON socket server.
//!
//! Serves match queries over TCP or a Unix domain socket. Each connection
//! gets its own handler thread and its own [`MatchContext`]; all handlers
//! share one frozen [`PhraseIndex`] behind an `Arc`. Batch requests fan out
//! over the rayon pool with per-thread contexts.
//!
//! Framing is brace-balanced (see [`protocol`]): the server consumes one
//! complete top-level JSON object at a time and answers each with a
//! newline-terminated JSON response.
//!
//! Shutdown is cooperative: [`Server::stop`] (or a signal handler storing
//! into [`Server::shutdown_handle`]) flips a shared flag, the accept loop
//! notices within one poll interval, in-flight connections drain, and a
//! bound Unix socket file is unlinked before the serve call returns.

pub mod protocol;

use crate::config::EngineOptions;
use crate::error::{PhraseError, Result};
use crate::index::PhraseIndex;
use crate::matcher::MatchContext;
use protocol::{BatchEntry, FrameScan, MatchOutput, Request};
use rayon::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Maximum concurrent connections; excess connections are closed on accept.
pub const MAX_CONNECTIONS: usize = 50;

/// Per-connection receive timeout.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(300);

/// How often the accept loop re-checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// How long [`Server::stop`]-initiated shutdown waits for in-flight
/// connections to drain before giving up on them.
const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 8192;

/// The query server. Cheap to clone handles onto connection threads.
#[derive(Clone)]
pub struct Server {
    index: Arc<PhraseIndex>,
    options: EngineOptions,
    connections: Arc<AtomicUsize>,
    shutdown: Arc<AtomicBool>,
}

/// Decrements the connection count when a handler exits.
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Server {
    /// Create a server over a frozen index.
    ///
    /// Server responses always carry matching substrings, so the substring
    /// option is forced on regardless of the caller's batch settings.
    pub fn new(index: Arc<PhraseIndex>, options: EngineOptions) -> Self {
        Self {
            index,
            options: options.with_matching_substring(true),
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request a graceful shutdown.
    ///
    /// Safe to call from any thread, including a signal handler that holds
    /// the flag from [`shutdown_handle`](Self::shutdown_handle). The accept
    /// loop notices within one poll interval, stops taking connections,
    /// waits briefly for in-flight handlers to drain, and removes the Unix
    /// socket file if one was bound.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// The shared shutdown flag; storing `true` is equivalent to [`stop`](Self::stop).
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Wait for in-flight connection handlers to finish, bounded by
    /// [`DRAIN_DEADLINE`].
    fn drain_connections(&self) {
        let deadline = Instant::now() + DRAIN_DEADLINE;
        while self.connections.load(Ordering::SeqCst) > 0 {
            if Instant::now() >= deadline {
                warn!(
                    "Shutdown proceeding with {} connections still open",
                    self.connections.load(Ordering::SeqCst)
                );
                return;
            }
            std::thread::sleep(ACCEPT_POLL);
        }
    }

    /// Bind a TCP listener and serve until [`stop`](Self::stop) is called.
    pub fn run_tcp(&self, port: u16) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .map_err(|e| PhraseError::ServerError(format!("cannot bind TCP port {port}: {e}")))?;
        info!("Server listening on TCP port {port}");
        self.serve_tcp(listener)
    }

    /// Serve connections from an already-bound TCP listener.
    ///
    /// Exposed separately so tests can bind port 0 and learn the address.
    /// Returns once [`stop`](Self::stop) has been observed and in-flight
    /// connections have drained.
    pub fn serve_tcp(&self, listener: TcpListener) -> Result<()> {
        listener
            .set_nonblocking(true)
            .map_err(|e| PhraseError::ServerError(format!("cannot poll listener: {e}")))?;
        info!("Ready to receive queries");
        while !self.stopping() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if stream.set_nonblocking(false).is_err()
                        || stream.set_read_timeout(Some(RECV_TIMEOUT)).is_err()
                    {
                        warn!("Cannot configure connection from {peer}");
                        continue;
                    }
                    self.dispatch(stream, peer.to_string());
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    warn!("Accept error: {e}");
                }
            }
        }
        info!("Shutting down server");
        self.drain_connections();
        Ok(())
    }

    /// Bind a Unix socket listener and serve until [`stop`](Self::stop) is
    /// called.
    ///
    /// An existing socket file at `path` is removed before binding, and the
    /// socket file is removed again on shutdown.
    #[cfg(unix)]
    pub fn run_unix(&self, path: &std::path::Path) -> Result<()> {
        use std::os::unix::net::UnixListener;

        let _ = std::fs::remove_file(path);
        let listener = UnixListener::bind(path).map_err(|e| {
            PhraseError::ServerError(format!("cannot bind Unix socket {}: {e}", path.display()))
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|e| PhraseError::ServerError(format!("cannot poll listener: {e}")))?;
        info!("Server listening on Unix socket {}", path.display());
        info!("Ready to receive queries");
        while !self.stopping() {
            match listener.accept() {
                Ok((stream, _)) => {
                    if stream.set_nonblocking(false).is_err()
                        || stream.set_read_timeout(Some(RECV_TIMEOUT)).is_err()
                    {
                        warn!("Cannot configure Unix connection");
                        continue;
                    }
                    self.dispatch(stream, "unix".to_string());
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    warn!("Accept error: {e}");
                }
            }
        }
        info!("Shutting down server");
        self.drain_connections();
        let _ = std::fs::remove_file(path);
        Ok(())
    }

    fn dispatch<S: Read + Write + Send + 'static>(&self, stream: S, peer: String) {
        let active = self.connections.fetch_add(1, Ordering::SeqCst) + 1;
        if active > MAX_CONNECTIONS {
            warn!("Connection limit reached, rejecting {peer}");
            self.connections.fetch_sub(1, Ordering::SeqCst);
            drop(stream);
            return;
        }

        let index = Arc::clone(&self.index);
        let options = self.options;
        let shutdown = Arc::clone(&self.shutdown);
        let guard = ConnectionGuard(Arc::clone(&self.connections));
        std::thread::spawn(move || {
            let _guard = guard;
            handle_connection(&index, &options, &shutdown, stream);
        });
    }
}

/// Read frames off one connection until it closes, times out, or the
/// server begins shutting down.
fn handle_connection<S: Read + Write>(
    index: &PhraseIndex,
    options: &EngineOptions,
    shutdown: &AtomicBool,
    mut stream: S,
) {
    let mut ctx = MatchContext::new();
    ctx.ensure_capacity(index.pattern_count());

    let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    while !shutdown.load(Ordering::SeqCst) {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);

        loop {
            match protocol::scan_frame(&buffer) {
                FrameScan::Complete { start, end } => {
                    let response = match std::str::from_utf8(&buffer[start..end]) {
                        Ok(json) => process_request(index, options, &mut ctx, json),
                        Err(_) => protocol::build_error_response("", 400, "Invalid UTF-8"),
                    };
                    let Ok(mut response) = response else { return };
                    response.push('\n');
                    if stream.write_all(response.as_bytes()).is_err() {
                        return;
                    }
                    buffer.drain(..end);
                }
                FrameScan::Partial { start } => {
                    buffer.drain(..start);
                    break;
                }
                FrameScan::Empty => {
                    buffer.clear();
                    break;
                }
            }
        }
    }
}

/// Answer one framed request.
pub fn process_request(
    index: &PhraseIndex,
    options: &EngineOptions,
    ctx: &mut MatchContext,
    json: &str,
) -> Result<String> {
    let request: Request = match serde_json::from_str(json) {
        Ok(request) => request,
        Err(e) => return protocol::build_error_response("", 400, &e.to_string()),
    };

    let id = match &request.id {
        Some(id) => id.clone(),
        None => return protocol::build_error_response("", 400, "Missing 'id' field"),
    };
    if !request.has_query_field() {
        return protocol::build_error_response(&id, 400, "Missing 'query' or 'queries' field");
    }
    let queries = request.queries();
    if queries.is_empty() {
        return protocol::build_error_response(&id, 400, "No queries provided");
    }

    if queries.len() > 1 {
        let entries: Vec<BatchEntry> = queries
            .par_iter()
            .enumerate()
            .map_init(
                || {
                    let mut local = MatchContext::new();
                    local.ensure_capacity(index.pattern_count());
                    local
                },
                |local, (i, query)| BatchEntry {
                    index: i,
                    matches: index
                        .match_str(query, options, local)
                        .iter()
                        .map(MatchOutput::from_result)
                        .collect(),
                },
            )
            .collect();

        let any_matches = entries.iter().any(|entry| !entry.matches.is_empty());
        let status = if any_matches { 200 } else { 404 };
        protocol::build_batch_response(&id, status, &entries)
    } else {
        let matches: Vec<MatchOutput> = index
            .match_str(&queries[0], options, ctx)
            .iter()
            .map(MatchOutput::from_result)
            .collect();
        let status = if matches.is_empty() { 404 } else { 200 };
        protocol::build_response(&id, status, &matches)
    }
}
