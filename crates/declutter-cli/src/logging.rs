use std::env;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a two-layer subscriber: pretty output on stdout plus a plain
/// file log. `DECLUTTER_LOG` sets the filter, `DECLUTTER_LOG_FILE` the
/// file path. The returned guard flushes the file writer on drop.
pub fn init_logger() -> impl Drop {
    let filter_layer =
        EnvFilter::new(env::var("DECLUTTER_LOG").unwrap_or_else(|_| "info".to_string()));

    let log_file =
        env::var("DECLUTTER_LOG_FILE").unwrap_or_else(|_| "./logs/declutter.log".to_string());
    let file_appender = tracing_appender::rolling::never("./", log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    debug!("logging initialized (stdout + file)");

    guard
}
