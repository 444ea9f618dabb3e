//! Tracing setup.
//!
//! The terminal belongs to the UI, so events never go to stdout/stderr.
//! Logging stays off unless `SEKOLAH_BERITA_LOG` names a file; the filter
//! defaults to `info` and honours `RUST_LOG`.

use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_PATH_ENV: &str = "SEKOLAH_BERITA_LOG";

/// Initialise the global subscriber if a log file is configured.
///
/// Returns the path actually written to.  Each run gets its own file
/// (`{path}.{pid}`) so concurrent instances do not interleave.
pub fn init_tracing() -> Option<String> {
    let log_path = std::env::var(LOG_PATH_ENV).ok()?;
    let unique_path = unique_log_path(&log_path, std::process::id());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match std::fs::File::create(Path::new(&unique_path)) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: failed to create log file {unique_path}: {e}");
            return None;
        }
    };

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Some(unique_path)
}

fn unique_log_path(base: &str, pid: u32) -> String {
    format!("{base}.{pid}")
}
