// ── Logging ───────────────────────────────────────────────────────────────────
//
// Console output respects RUST_LOG (default `info`):
//   RUST_LOG=ledge::dock=debug      – shell negotiation details
//   RUST_LOG=ledge::router=trace    – every appbar callback
//
// Release builds have no console, so a daily-rolling file under
// `%APPDATA%\Ledge\logs\ledge.log` always records debug-level output.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::settings;

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes the file
/// writer.  Failing to set up the file layer is reported on stderr and is
/// otherwise ignored.
pub(crate) fn init() -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_filter(console_filter);

    let (file_layer, guard) = match settings::data_dir().map(|d| d.join("logs")) {
        Some(logs_dir) => match std::fs::create_dir_all(&logs_dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(logs_dir, "ledge.log");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug"));
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Warning: could not create log directory: {e}");
                (None, None)
            }
        },
        None => (None, None),
    };

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}
