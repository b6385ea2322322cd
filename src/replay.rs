//! NDJSON replay source for recorded AG-UI event streams.
//!
//! The `run` command feeds the engine from a newline-delimited JSON file or
//! stdin. Lines that are not valid JSON are reported and skipped so one bad
//! line never aborts a replay; semantic validation of well-formed objects
//! happens later, at the ingress boundary.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use async_stream::try_stream;
use futures_util::Stream;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// One item read from a replay stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayItem {
    /// A well-formed JSON object or value, ready for the ingress boundary.
    Event(Value),
    /// A line that was not valid JSON; skipped, replay continues.
    Unparsable { line_no: usize, error: String },
}

/// Open the replay input: a file when a path is given, stdin otherwise.
pub async fn open_input(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("failed to open input file: {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Stream newline-delimited JSON values from a reader.
///
/// Blank lines are skipped. An I/O error terminates the stream; a parse
/// error does not.
pub fn ndjson_events<R>(reader: R) -> impl Stream<Item = io::Result<ReplayItem>>
where
    R: AsyncBufRead + Unpin,
{
    try_stream! {
        let mut lines = reader.lines();
        let mut line_no = 0usize;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => yield ReplayItem::Event(value),
                Err(err) => yield ReplayItem::Unparsable {
                    line_no,
                    error: err.to_string(),
                },
            }
        }
    }
}

// === Unit Tests ===
