// report.rs — Rendering unit reports and the failure summary
//
// Preconditions: hazards are already sorted and their positions resolved.
// Postconditions: a clean unit writes nothing in either format.
// Failure modes: I/O errors from the sink.
// Side effects: writes to the given sink only.

use std::io::{self, Write};

use serde::Serialize;

use crate::detect::HazardKind;
use crate::error::AggregateError;
use crate::source::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// `[Overwrite]` blocks, one tab-indented position per line
    #[default]
    Text,
    /// One pretty-printed JSON document per unit with hazards
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedHazard {
    pub kind: HazardKind,
    pub symbol: String,
    pub positions: Vec<Position>,
}

/// Everything reported for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub fingerprint: String,
    pub hazards: Vec<ReportedHazard>,
}

impl UnitReport {
    pub fn is_clean(&self) -> bool {
        self.hazards.is_empty()
    }
}

pub fn write_report(sink: &mut dyn Write, report: &UnitReport, format: ReportFormat) -> io::Result<()> {
    if report.is_clean() {
        return Ok(());
    }
    match format {
        ReportFormat::Text => {
            for hazard in &report.hazards {
                writeln!(sink, "[{}]", hazard.kind.label())?;
                for pos in &hazard.positions {
                    writeln!(sink, "\t {pos}")?;
                }
            }
        }
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *sink, report)?;
            writeln!(sink)?;
        }
    }
    Ok(())
}

pub fn write_errors(sink: &mut dyn Write, errors: &AggregateError) -> io::Result<()> {
    writeln!(sink, "{errors}")
}
