//! Batch report output in JSON or JSON Lines format.
//!
//! JSON Lines reports are streamed: each image is written as soon as it
//! finishes, and a summary line closes the file. JSON reports are buffered
//! and written as a single document when the batch ends.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{AnnotationRecord, BatchSummary};

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// One JSON document with `images` and `summary`
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

/// A single JSON Lines entry.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReportLine<'a> {
    Image(&'a AnnotationRecord),
    Summary(&'a BatchSummary),
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    images: &'a [AnnotationRecord],
    summary: &'a BatchSummary,
}

/// Writes per-image records and the closing batch summary.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    buffered: Vec<AnnotationRecord>,
    records_written: usize,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self {
            writer,
            format,
            buffered: Vec::new(),
            records_written: 0,
        }
    }

    /// Add one image record. JSON Lines output is written and flushed immediately.
    pub fn push(&mut self, record: AnnotationRecord) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => self.buffered.push(record),
            ReportFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &ReportLine::Image(&record))
                    .map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.writer.flush()?;
            }
        }
        self.records_written += 1;
        Ok(())
    }

    /// Number of records pushed so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Write the summary (and, for JSON, the buffered records) and return the
    /// underlying writer.
    pub fn finish(mut self, summary: &BatchSummary) -> io::Result<W> {
        match self.format {
            ReportFormat::Json => {
                let document = ReportDocument {
                    images: &self.buffered,
                    summary,
                };
                serde_json::to_writer_pretty(&mut self.writer, &document)
                    .map_err(io::Error::other)?;
            }
            ReportFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &ReportLine::Summary(summary))
                    .map_err(io::Error::other)?;
            }
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
