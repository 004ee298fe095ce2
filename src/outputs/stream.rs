//! JSON Lines record stream.

use crate::error::Result;
use crate::models::{ArticleReport, CategoryLink};
use serde::Serialize;
use std::io::Write;

/// Writes one compact JSON object per line.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write_article(&mut self, report: &ArticleReport) -> Result<()> {
        self.write_record(report)
    }

    pub fn write_category(&mut self, link: &CategoryLink) -> Result<()> {
        self.write_record(link)
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }
}
