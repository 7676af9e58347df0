//! Provides logging utilities, used by the library and the binary.

use std::io;

use chrono::Local;
use slog::{
    o, Discard, Drain, Duplicate, FnValue, Level, Logger, PushFnValue, Record,
};
use slog_async::Async;
use slog_json::Json;

/// Re-exports common definitions for logging.
///
/// Use this module as following:
/// ```rust
/// use medea_progressive::log::prelude::*;
/// ```
pub mod prelude {
    pub use slog::{slog_debug, slog_error, slog_info, slog_trace, slog_warn};
    pub use slog_scope::{debug, error, info, trace, warn};
}

/// Builds JSON [`Logger`] which prints all its log records of `level` and
/// higher to the `w` writer. `None` level disables logging at all.
///
/// Created [`Logger`] produces log records with `fqn`, `lvl`, `time` and `msg`
/// fields by default.
pub fn new_logger<W>(w: W, level: Option<Level>) -> Logger
where
    W: io::Write + Send + 'static,
{
    let level = match level {
        Some(level) => level,
        None => return Logger::root(Discard, o!()),
    };
    let drain = Json::new(w).build().filter_level(level).ignore_res();
    let drain = Async::new(drain).chan_size(2048).build().fuse();
    add_default_keys(&Logger::root(drain, o!()))
}

/// Builds JSON [`Logger`] which prints all its log records of `level` and
/// higher to the `w_out` writer, but WARN level (and higher) to the `w_err`
/// writer. `None` level disables logging at all.
///
/// [`Logger`] uses [`Async`] drain with channel size of 2048 entries.
pub fn new_dual_logger<W1, W2>(
    w_out: W1,
    w_err: W2,
    level: Option<Level>,
) -> Logger
where
    W1: io::Write + Send + 'static,
    W2: io::Write + Send + 'static,
{
    let level = match level {
        Some(level) => level,
        None => return Logger::root(Discard, o!()),
    };
    let drain_out = Json::new(w_out).build();
    let drain_err = Json::new(w_err).build();
    let drain = Duplicate(
        drain_out.filter(|r| !r.level().is_at_least(Level::Warning)),
        drain_err.filter_level(Level::Warning),
    )
    .filter_level(level)
    .ignore_res();
    let drain = Async::new(drain).chan_size(2048).build().fuse();
    add_default_keys(&Logger::root(drain, o!()))
}

/// Adds default log record data (key-value pairs) to specified [`Logger`]:
/// - `msg`: log record message.
/// - `fqn`: path to code line that called log function.
/// - `time`: creation date and time of log record in [RFC 3339] format.
/// - `lvl`: logging level of log record.
///
/// [RFC 3339]: https://www.ietf.org/rfc/rfc3339.txt
fn add_default_keys(logger: &Logger) -> Logger {
    logger.new(o!(
        "msg" => PushFnValue(move |record : &Record, ser| {
            ser.emit(record.msg())
        }),
        "fqn" => PushFnValue(move |record : &Record, ser| {
             ser.emit(format_args!("{}:{}", record.module(), record.line()))
        }),
        "time" => PushFnValue(move |_ : &Record, ser| {
            ser.emit(Local::now().to_rfc3339())
        }),
        "lvl" => FnValue(move |rinfo : &Record| {
            rinfo.level().as_str()
        }),
    ))
}
