//! Newline-delimited JSON bus records from any async reader

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::{debug, warn};

use super::{BusRecord, EventSource, RawEvent};

/// Reads `{"stream": ..., "packet": ...}` lines, one record per line
///
/// Lines are decoded lossily, so invalid UTF-8 is skipped like any other
/// malformed record instead of ending the source.
pub struct JsonLinesSource<R> {
    reader: R,
    buf: Vec<u8>,
    streams: Vec<String>,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R, streams: &[&str]) -> Self {
        debug!(?streams, "JsonLinesSource::new: called");
        Self {
            reader,
            buf: Vec::new(),
            streams: streams.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl JsonLinesSource<BufReader<Stdin>> {
    /// Source reading from the process's standard input
    pub fn stdin(streams: &[&str]) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), streams)
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for JsonLinesSource<R> {
    async fn next_event(&mut self) -> Option<RawEvent> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => {
                    debug!("JsonLinesSource::next_event: end of input");
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "JsonLinesSource::next_event: read failed, closing source");
                    return None;
                }
            }

            let line = String::from_utf8_lossy(&self.buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record: BusRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "JsonLinesSource::next_event: malformed record, skipping");
                    continue;
                }
            };

            if !self.streams.iter().any(|s| *s == record.stream) {
                continue;
            }

            if let Some(event) = RawEvent::from_bus(&record.stream, record.packet) {
                return Some(event);
            }
        }
    }
}
