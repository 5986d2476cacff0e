//! Console report for each tick.
//!
//! [`ReportRenderer`] is the engine's [`TickCallback`]. In text mode it
//! prints the week header, the room temperature, and one status block per
//! egg, followed by the time to first pip once an egg has pipped and a
//! marker sized by the egg's size class (a hatchling glyph once hatched).
//! In JSON mode it prints one object per tick.

use std::io::{self, Write};

use clutch_core::config::ReportFormat;
use clutch_core::runner::TickCallback;
use clutch_core::tick::TickSummary;
use clutch_types::{ClusterSummary, EggId, EggSnapshot, FirstPipRecord};
use serde::Serialize;
use tracing::warn;

/// Widest marker drawn, in characters between the delimiters.
const MAX_MARKER_WIDTH: usize = 40;

/// Writes a report for every tick to `out`.
pub struct ReportRenderer<W> {
    out: W,
    format: ReportFormat,
}

/// One JSON report line.
#[derive(Serialize)]
struct JsonReport<'a> {
    iteration: u64,
    temperature: f64,
    summary: &'a ClusterSummary,
    eggs: &'a [EggSnapshot],
    pip_onsets: &'a [EggId],
    first_pips: &'a [FirstPipRecord],
}

impl<W: Write> ReportRenderer<W> {
    /// Create a renderer writing `format` reports to `out`.
    pub const fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }

    /// Return the underlying writer.
    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_tick(&mut self, tick: &TickSummary) -> io::Result<()> {
        match self.format {
            ReportFormat::Text => self.write_text(tick),
            ReportFormat::Json => self.write_json(tick),
        }
    }

    fn write_text(&mut self, tick: &TickSummary) -> io::Result<()> {
        writeln!(self.out, "{} Report:", tick.summary)?;
        writeln!(
            self.out,
            "Room Temperature: {}\u{b0}C",
            tick.summary.room_temperature
        )?;
        for snapshot in &tick.snapshots {
            write!(self.out, "{snapshot}")?;
            if let Some(record) = tick.first_pips.iter().find(|r| r.egg == snapshot.id) {
                writeln!(
                    self.out,
                    "Hatching Real-time Period: {:.3}",
                    record.elapsed_seconds
                )?;
            }
            writeln!(self.out, "{}", marker(snapshot))?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn write_json(&mut self, tick: &TickSummary) -> io::Result<()> {
        let report = JsonReport {
            iteration: tick.iteration,
            temperature: tick.temperature,
            summary: &tick.summary,
            eggs: &tick.snapshots,
            pip_onsets: &tick.pip_onsets,
            first_pips: &tick.first_pips,
        };
        serde_json::to_writer(&mut self.out, &report)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> TickCallback for ReportRenderer<W> {
    fn on_tick(&mut self, summary: &TickSummary) {
        if let Err(e) = self.write_tick(summary) {
            warn!(error = %e, iteration = summary.iteration, "failed to write tick report");
        }
    }
}

/// Draw an egg as `(` + padding + `)`, one column wider than its size
/// class. Hatched eggs become a hatchling of the same width.
fn marker(snapshot: &EggSnapshot) -> String {
    let width = usize::try_from(snapshot.size_class)
        .unwrap_or(MAX_MARKER_WIDTH)
        .saturating_add(1)
        .min(MAX_MARKER_WIDTH);
    if snapshot.phase.is_terminal() {
        format!("{}  <{}@", snapshot.id.label(), "=".repeat(width))
    } else {
        format!("{}  ({})", snapshot.id.label(), " ".repeat(width))
    }
}
