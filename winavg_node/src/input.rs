//! Line-oriented input for the node.
//!
//! Each line has the form `<topic> <payload>`. Lines are read on a
//! dedicated thread, because a blocking read cannot be cancelled and
//! would otherwise keep the runtime from shutting down.

use crate::bus::Bus;
use eyre::{Result, WrapErr, eyre};
use std::{
    io::{self, BufRead, BufReader},
    thread,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Lines read from an input source, in order.
pub type Lines = mpsc::UnboundedReceiver<io::Result<String>>;

/// Read lines from stdin on a background thread.
pub fn stdin_lines() -> Result<Lines> {
    read_lines(BufReader::new(io::stdin()))
}

/// Read lines from `reader` on a background thread. The returned
/// receiver closes when the reader reaches EOF or fails.
pub fn read_lines<R>(reader: R) -> Result<Lines>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    thread::Builder::new()
        .name("input-reader".into())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
            debug!("Input reader finished");
        })
        .wrap_err("Failed to spawn input reader thread")?;

    Ok(rx)
}

/// Split a line into topic and payload. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Result<(&str, &str)>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parsed = line
        .split_once(char::is_whitespace)
        .map(|(topic, payload)| (topic, payload.trim()))
        .ok_or_else(|| eyre!("Expected \"<topic> <payload>\", got \"{}\"", line));
    Some(parsed)
}

/// Publish every line on the bus until the input ends. Returns the number
/// of messages published.
pub async fn feed(bus: &Bus, mut lines: Lines) -> Result<usize> {
    let mut published = 0;

    while let Some(line) = lines.recv().await {
        let line = line.wrap_err("Failed to read input")?;
        match parse_line(&line) {
            Some(Ok((topic, payload))) => {
                bus.publish(topic, payload);
                published += 1;
            }
            Some(Err(err)) => warn!(error = %err, "Skipping input line"),
            None => {}
        }
    }

    Ok(published)
}
