//! `medea-progressive` binary writing the lines of stdin to stdout, keeping
//! only the first occurrence of each line unless configured otherwise.

use std::{
    cell::RefCell,
    error::Error as StdError,
    io::{self, BufRead as _, BufWriter, Write as _},
    rc::Rc,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use medea_progressive::{
    conf::{Conf, Pipeline},
    log::{self, prelude::*},
    observer, Progressor, ProgressorExt as _, ProgressiveList,
    ProgressiveSet,
};

fn main() -> Result<(), Box<dyn StdError>> {
    let config = Conf::parse()?;

    let logger = log::new_logger(io::stderr(), config.log.level());
    let _log_guard = slog_scope::set_global_logger(logger);

    info!("Starting with {:?}", config.pipeline);

    let read_failure = Rc::new(RefCell::new(None));
    let lines = stdin_lines(Rc::clone(&read_failure));

    let read = Arc::new(AtomicUsize::new(0));
    let _ = {
        let read = Arc::clone(&read);
        lines.subscribe(observer::from_fn(move |_: &String| {
            let _ = read.fetch_add(1, Ordering::Relaxed);
        }))
    };

    let lines = if config.pipeline.skip_empty {
        lines.filter(|line| !line.is_empty())
    } else {
        lines
    };

    let emitted = write_lines(lines, &config.pipeline)?;
    info!(
        "Emitted {} of {} read lines",
        emitted,
        read.load(Ordering::Relaxed)
    );

    let failure = read_failure.borrow_mut().take();
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Creates [`Progressor`] pulling the lines of stdin.
///
/// A read error ends the input and is stored into the provided `failure`
/// slot.
fn stdin_lines(failure: Rc<RefCell<Option<io::Error>>>) -> Progressor<String> {
    let mut lines = io::BufReader::new(io::stdin()).lines();
    Progressor::from_fn(move || match lines.next()? {
        Ok(line) => Some(line),
        Err(e) => {
            error!("Failed to read stdin: {}", e);
            *failure.borrow_mut() = Some(e);
            None
        }
    })
}

/// Writes the pulled lines to stdout according to the provided [`Pipeline`]
/// settings.
///
/// Returns count of the written lines.
fn write_lines(
    lines: Progressor<String>,
    pipeline: &Pipeline,
) -> io::Result<usize> {
    let limit = pipeline.limit.unwrap_or(usize::MAX);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let written = if pipeline.distinct {
        let set = ProgressiveSet::from_progressor(lines);
        write_all(&mut out, set.iter().take(limit))?
    } else {
        let list = ProgressiveList::from_progressor(lines);
        write_all(&mut out, list.iter().take(limit))?
    };
    out.flush()?;

    Ok(written)
}

/// Writes every line of the provided iterator to the `out` writer.
///
/// Returns count of the written lines.
fn write_all<W, I>(out: &mut W, lines: I) -> io::Result<usize>
where
    W: io::Write,
    I: Iterator<Item = String>,
{
    let mut written = 0;
    for line in lines {
        writeln!(out, "{}", line)?;
        written += 1;
    }
    debug!("Written {} lines", written);
    Ok(written)
}
