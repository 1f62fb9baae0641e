//! phrase-engine command line front-end.
//!
//! Batch mode matches a string file against the pattern catalog and prints
//! one TSV line per match. Server mode answers JSON queries over TCP or a
//! Unix domain socket.

use clap::Parser;
use phrase_engine::server::Server;
use phrase_engine::{batch, EngineOptions, PhraseIndex};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
#[cfg(unix)]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(unix)]
use std::sync::OnceLock;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Shutdown flag shared with the signal handler. Signal handlers cannot
/// carry state, so the server's flag is parked here once at startup.
#[cfg(unix)]
static SHUTDOWN: OnceLock<Arc<AtomicBool>> = OnceLock::new();

#[cfg(unix)]
extern "C" fn on_shutdown_signal(_signal: libc::c_int) {
    // Only async-signal-safe work is allowed here: a single atomic store.
    if let Some(flag) = SHUTDOWN.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

#[cfg(unix)]
fn install_signal_handlers(flag: Arc<AtomicBool>) {
    let _ = SHUTDOWN.set(flag);
    let handler = on_shutdown_signal as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}

/// Match multi-word phrase patterns against input strings
#[derive(Parser, Debug)]
#[command(name = "phrase-engine")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Pattern file, one `pattern<TAB>xref` per line (gzip supported)
    #[arg(short = 'p', long)]
    patterns: PathBuf,

    /// String file to match in batch mode (gzip supported)
    #[arg(short = 's', long)]
    strings: Option<PathBuf>,

    /// Comma-delimited stopword file
    #[arg(short = 'w', long)]
    stopwords: Option<PathBuf>,

    /// Worker threads (default: all cores)
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Start a TCP server on this port
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Start a Unix socket server on this path
    #[arg(short = 'S', long)]
    unix_socket: Option<PathBuf>,

    /// Extract the matching substring for each match
    #[arg(short = 'm', long)]
    matching: bool,

    /// Enable LCSS (out-of-order tolerant) matching
    #[arg(short = 'L', long)]
    lcss: bool,

    /// Remove stopwords from patterns
    #[arg(short = 'W', long)]
    remove_stopwords: bool,

    /// Replace invalid pattern characters with spaces instead of rejecting
    #[arg(short = 'a', long)]
    address_mode: bool,

    /// Log pattern file processing (normalization changes and rejections)
    #[arg(short = 'l', long)]
    log_patterns: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Pattern-processing chatter sits at debug level and stays silent
    // unless explicitly requested with -l.
    let default_level = if args.quiet {
        "warn"
    } else if args.log_patterns {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.port.is_some() && args.unix_socket.is_some() {
        error!("Cannot specify both a TCP port and a Unix socket");
        return ExitCode::FAILURE;
    }

    if args.threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
        {
            error!("Cannot configure thread pool: {e}");
            return ExitCode::FAILURE;
        }
    }

    let options = EngineOptions::new()
        .with_matching_substring(args.matching)
        .with_lcss_match(args.lcss)
        .with_remove_stopwords(args.remove_stopwords)
        .with_address_mode(args.address_mode);

    let mut index = PhraseIndex::new();

    if let Some(stopword_file) = &args.stopwords {
        if let Err(e) = index.read_stopwords(stopword_file) {
            warn!("{e}");
        }
    }

    if let Err(e) = index.load_pattern_file(&args.patterns, &options) {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = index.prepare_for_matching() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!(
        "Index ready: {} patterns, {} blocks, ~{} KB",
        index.pattern_count(),
        index.block_count(),
        index.memory_usage() / 1024
    );
    info!("Using {} threads", rayon::current_num_threads());

    if args.port.is_some() || args.unix_socket.is_some() {
        let server = Server::new(Arc::new(index), options);

        // SIGINT/SIGTERM request a graceful stop: the accept loop exits,
        // connections drain, and a bound Unix socket file is removed.
        #[cfg(unix)]
        install_signal_handlers(server.shutdown_handle());

        let result = if let Some(port) = args.port {
            server.run_tcp(port)
        } else if let Some(path) = &args.unix_socket {
            #[cfg(unix)]
            {
                server.run_unix(path)
            }
            #[cfg(not(unix))]
            {
                let _ = path;
                Err(phrase_engine::PhraseError::ServerError(
                    "Unix sockets are not supported on this platform".to_string(),
                ))
            }
        } else {
            unreachable!()
        };
        if let Err(e) = result {
            error!("{e}");
            return ExitCode::FAILURE;
        }
        info!("Server stopped");
        return ExitCode::SUCCESS;
    }

    if let Some(string_file) = &args.strings {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        match batch::run_batch_file(&index, &options, string_file, &mut out) {
            Ok(stats) => {
                if out.flush().is_err() {
                    return ExitCode::FAILURE;
                }
                info!("Total matches: {}", stats.matches);
            }
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!("No string file or server mode specified; pattern file loaded successfully");
    }

    ExitCode::SUCCESS
}
