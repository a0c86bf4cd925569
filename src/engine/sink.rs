//! Corpus output: one append-only destination shared by all workers, plus the frame codec.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::ExtractedRecord;
use crate::utils::config::FrameMarkers;

/// Serialize one record: `<start>summary---->body<stop>\n`.
pub fn encode_frame(record: &ExtractedRecord) -> String {
    format!(
        "{}{}{}{}{}{}",
        FrameMarkers::START,
        record.summary,
        FrameMarkers::SEPARATOR,
        record.body,
        FrameMarkers::STOP,
        FrameMarkers::TERMINATOR
    )
}

/// True when `record` can be framed and read back unchanged: the summary holds no separator and
/// neither field holds a start marker or a stop marker followed by the terminator.
pub fn is_frame_safe(record: &ExtractedRecord) -> bool {
    let end_marker = format!("{}{}", FrameMarkers::STOP, FrameMarkers::TERMINATOR);
    let clean = |field: &str| !field.contains(FrameMarkers::START) && !field.contains(&end_marker);
    clean(&record.summary)
        && clean(&record.body)
        && !record.summary.contains(FrameMarkers::SEPARATOR)
}

/// Read a corpus back into records. Fails on any partial, interleaved or unterminated frame.
///
/// Frames split at the first separator, so a summary containing `---->` would be read back
/// with part of it moved into the body. Workers never write such records (see
/// [`is_frame_safe`]).
pub fn parse_frames(corpus: &str) -> Result<Vec<ExtractedRecord>> {
    let mut records = Vec::new();
    let mut rest = corpus;
    while !rest.is_empty() {
        let Some(after_start) = rest.strip_prefix(FrameMarkers::START) else {
            bail!("frame {} does not begin with {}", records.len(), FrameMarkers::START);
        };
        let end_marker = format!("{}{}", FrameMarkers::STOP, FrameMarkers::TERMINATOR);
        let Some(end) = after_start.find(&end_marker) else {
            bail!("frame {} is not terminated", records.len());
        };
        let frame = &after_start[..end];
        if frame.contains(FrameMarkers::START) {
            bail!("frame {} contains a nested {}", records.len(), FrameMarkers::START);
        }
        let Some((summary, body)) = frame.split_once(FrameMarkers::SEPARATOR) else {
            bail!("frame {} has no {} separator", records.len(), FrameMarkers::SEPARATOR);
        };
        records.push(ExtractedRecord {
            summary: summary.to_string(),
            body: body.to_string(),
        });
        rest = &after_start[end + end_marker.len()..];
    }
    Ok(records)
}

struct SinkState {
    writer: Box<dyn Write + Send>,
    /// Set after a failed write; the destination may hold a partial frame.
    failed: bool,
    records: usize,
}

/// Single output destination. Every record is encoded, appended and flushed inside one
/// critical section, so frames from different workers never interleave.
pub struct OutputSink {
    state: Mutex<SinkState>,
}

impl OutputSink {
    /// Create (truncate) the corpus file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("open output file {}", path.display()))?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            state: Mutex::new(SinkState {
                writer: Box::new(writer),
                failed: false,
                records: 0,
            }),
        }
    }

    /// Append one record. An error here is fatal for the run; the sink refuses further writes.
    pub fn write_record(&self, record: &ExtractedRecord) -> Result<()> {
        let frame = encode_frame(record);
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("output sink lock poisoned"))?;
        if state.failed {
            bail!("output sink is unusable after an earlier write failure");
        }
        let written = state
            .writer
            .write_all(frame.as_bytes())
            .and_then(|()| state.writer.flush());
        match written {
            Ok(()) => {
                state.records += 1;
                Ok(())
            }
            Err(e) => {
                state.failed = true;
                Err(e).context("write record to output sink")
            }
        }
    }

    pub fn records_written(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
    }

    /// Flush and release the destination. Takes `self`, so it runs exactly once and only after
    /// every shared handle is gone. Returns the number of records written.
    /// After a failed write the buffered partial frame is dropped without another flush; the
    /// write error itself was already reported to the caller of [`Self::write_record`].
    pub fn close(self) -> Result<usize> {
        let mut state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        if !state.failed {
            state.writer.flush().context("flush output sink")?;
        }
        Ok(state.records)
    }
}
