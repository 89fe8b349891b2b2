//! Batch reporter - output formatting
//!
//! Supports multiple output formats:
//! - Text (human-readable)
//! - JSON (one object per entry, pixel grid included)
//! - CSV (one row per entry)

use std::io::{self, Write};

use serde::Serialize;

use crate::config::OutputFormat;
use crate::dataset::{Dataset, SampleEntry};

/// One reported entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryRecord {
    pub batch: u64,
    pub position: usize,
    pub index: u64,
    pub label: u8,
    pub mean_intensity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels: Option<Vec<Vec<f32>>>,
}

impl EntryRecord {
    pub fn new(batch: u64, position: usize, entry: &SampleEntry, with_pixels: bool) -> Self {
        let pixels = with_pixels.then(|| {
            entry
                .pixels
                .outer_iter()
                .map(|row| row.to_vec())
                .collect()
        });
        Self {
            batch,
            position,
            index: entry.index,
            label: entry.label,
            mean_intensity: entry.mean_intensity(),
            pixels,
        }
    }

    pub fn csv_header() -> &'static str {
        "batch,position,index,label,mean_intensity"
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{:.6}",
            self.batch, self.position, self.index, self.label, self.mean_intensity
        )
    }
}

/// Batch reporter
pub struct BatchReporter<W: Write> {
    format: OutputFormat,
    out: W,
    header_written: bool,
}

impl BatchReporter<io::Stdout> {
    /// Reporter writing to stdout
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write> BatchReporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out,
            header_written: false,
        }
    }

    /// Report dataset geometry (text only)
    pub fn report_dataset(&mut self, dataset: &Dataset) -> io::Result<()> {
        if self.format == OutputFormat::Text {
            writeln!(self.out, "{}", dataset.summary())?;
        }
        Ok(())
    }

    /// Report one batch
    pub fn report_batch(&mut self, batch: u64, entries: &[SampleEntry]) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => self.report_text(batch, entries),
            OutputFormat::Json => self.report_json(batch, entries),
            OutputFormat::Csv => self.report_csv(batch, entries),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn report_text(&mut self, batch: u64, entries: &[SampleEntry]) -> io::Result<()> {
        writeln!(self.out, "\n=== Batch {} ({} entries) ===", batch, entries.len())?;
        writeln!(self.out, "{:>8} {:>10} {:>6} {:>10}", "Pos", "Index", "Label", "Mean")?;
        for (position, entry) in entries.iter().enumerate() {
            writeln!(
                self.out,
                "{:>8} {:>10} {:>6} {:>10.4}",
                position,
                entry.index,
                entry.label,
                entry.mean_intensity()
            )?;
        }
        Ok(())
    }

    fn report_json(&mut self, batch: u64, entries: &[SampleEntry]) -> io::Result<()> {
        for (position, entry) in entries.iter().enumerate() {
            let record = EntryRecord::new(batch, position, entry, true);
            serde_json::to_writer(&mut self.out, &record)?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn report_csv(&mut self, batch: u64, entries: &[SampleEntry]) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.out, "{}", EntryRecord::csv_header())?;
            self.header_written = true;
        }
        for (position, entry) in entries.iter().enumerate() {
            let record = EntryRecord::new(batch, position, entry, false);
            writeln!(self.out, "{}", record.to_csv_row())?;
        }
        Ok(())
    }
}
