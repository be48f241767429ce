use std::io::{self, Write};

use serde::Serialize;
use services::{CohortRow, TrackOutcome, UnitDetails};
use tracker_core::model::{LastPosition, UnitCategory, UnitSummary};

/// Writes command results to stdout, as text or JSON.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce(&mut dyn Write) -> io::Result<()>,
    ) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if self.json {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)
        } else {
            text(&mut out)
        }
    }

    pub fn track(&self, outcome: &TrackOutcome) -> io::Result<()> {
        self.emit(outcome, |out| {
            if outcome.duplicate {
                return writeln!(out, "duplicate: ignored");
            }
            let id = outcome.activity_id.unwrap_or_default();
            match &outcome.progress {
                Some(progress) => writeln!(
                    out,
                    "accepted #{id}: {} {}%{}",
                    progress.section_id,
                    progress.display_percentage(),
                    if outcome.newly_completed { " (completed)" } else { "" }
                ),
                None => writeln!(out, "accepted #{id}"),
            }
        })
    }

    pub fn summary(&self, summary: &UnitSummary) -> io::Result<()> {
        self.emit(summary, |out| write_summary(out, summary))
    }

    pub fn course(&self, summaries: &[UnitSummary]) -> io::Result<()> {
        self.emit(&summaries, |out| {
            if summaries.is_empty() {
                return writeln!(out, "no activity yet");
            }
            for summary in summaries {
                writeln!(
                    out,
                    "unit {}: {}% ({:?})",
                    summary.unit_id,
                    summary.overall_percentage,
                    summary.level()
                )?;
            }
            Ok(())
        })
    }

    pub fn cohort(&self, rows: &[CohortRow]) -> io::Result<()> {
        self.emit(&rows, |out| {
            let Some(first) = rows.first() else {
                return writeln!(out, "no activity yet");
            };
            write!(out, "{:<10}", "user")?;
            for summary in &first.units {
                write!(out, " {:>8}", format!("unit {}", summary.unit_id))?;
            }
            writeln!(out)?;
            for row in rows {
                write!(out, "{:<10}", row.user_id.to_string())?;
                for summary in &row.units {
                    write!(out, " {:>7}%", summary.overall_percentage)?;
                }
                writeln!(out)?;
            }
            Ok(())
        })
    }

    pub fn details(&self, details: &UnitDetails) -> io::Result<()> {
        self.emit(details, |out| {
            write_summary(out, &details.summary)?;
            for section in &details.sections {
                let last = section
                    .activities
                    .first()
                    .map(|a| format!(", last {} at {}", a.activity_type, a.created_at.to_rfc3339()))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "  {:<28} {:>3}% {:?} [{}]{}",
                    section.progress.section_id.as_str(),
                    section.progress.display_percentage(),
                    section.state,
                    section.progress.category,
                    last
                )?;
            }
            Ok(())
        })
    }

    pub fn position(&self, position: Option<&LastPosition>) -> io::Result<()> {
        self.emit(&position, |out| match position {
            Some(p) => writeln!(
                out,
                "unit {} section {} (since {})",
                p.unit_id,
                p.section_id,
                p.updated_at.to_rfc3339()
            ),
            None => writeln!(out, "no position saved"),
        })
    }
}

fn write_summary(out: &mut dyn Write, summary: &UnitSummary) -> io::Result<()> {
    writeln!(
        out,
        "unit {}: {}% ({:?})",
        summary.unit_id,
        summary.overall_percentage,
        summary.level()
    )?;
    for category in UnitCategory::ALL {
        writeln!(
            out,
            "  {:<10} {:>3}%",
            category.as_str(),
            tracker_core::model::display_percentage(summary.category_percentage(category))
        )?;
    }
    Ok(())
}
