//! Report generation
//!
//! Text reports for people, JSON reports for tools. Both are rendered into a
//! `String`; writing them out is the caller's job.

use anyhow::{Context, Result};
use ecu_extract_core::compare::{ChangeCounts, Comparable};
use ecu_extract_core::{ComparisonResult, EntityDiff, ParsedDocument};
use serde::Serialize;
use std::fmt;
use std::path::Path;

const RULE: &str = "═══════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────";

/// Header placed in front of every JSON payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    pub tool_version: String,
    pub library_version: String,
    /// RFC 3339, UTC
    pub generated_at: String,
    pub inputs: Vec<String>,
}

impl ReportHeader {
    pub fn new(inputs: &[&Path]) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            library_version: ecu_extract_core::VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            inputs: inputs.iter().map(|path| display_name(path)).collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a, T> {
    header: &'a ReportHeader,
    payload: &'a T,
}

/// File name of an input, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Wrap a payload with its header and serialize it
pub fn render_json<T: Serialize>(header: &ReportHeader, payload: &T, pretty: bool) -> Result<String> {
    let report = JsonReport { header, payload };
    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    json.context("Failed to serialize JSON report")
}

/// Text summary of one parsed extract
pub struct ParseReport<'a> {
    pub input: &'a str,
    pub doc: &'a ParsedDocument,
}

impl fmt::Display for ParseReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.doc.stats();

        writeln!(f, "{}", RULE)?;
        writeln!(f, "  ECU Extract: {}", self.input)?;
        writeln!(f, "{}\n", RULE)?;

        writeln!(f, "  Messages:       {}", stats.num_messages)?;
        for (kind, count) in &stats.messages_per_kind {
            writeln!(f, "    {:<22} {}", kind.tag(), count)?;
        }
        writeln!(f, "  Signals:        {}", stats.num_signals)?;
        writeln!(f, "  Signal groups:  {}", stats.num_signal_groups)?;
        writeln!(f, "  Message groups: {}", stats.num_message_groups)?;

        if !self.doc.messages.is_empty() {
            writeln!(f, "\nMessages")?;
            writeln!(f, "{}", THIN_RULE)?;
            for message in &self.doc.messages {
                let cycle = message
                    .cycle_time
                    .map(|ms| format!("{} ms", ms))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    f,
                    "  {:<24} {:<16} {:<8} {:<12} {}",
                    message.name,
                    message.pdu_type.tag(),
                    message.can_id_hex.as_deref().unwrap_or("-"),
                    message.transmission_type.as_str(),
                    cycle
                )?;
            }
        }

        if !self.doc.signals.is_empty() {
            writeln!(f, "\nSignals")?;
            writeln!(f, "{}", THIN_RULE)?;
            for signal in &self.doc.signals {
                let pdu = if signal.pdu_name.is_empty() {
                    "-"
                } else {
                    signal.pdu_name.as_str()
                };
                writeln!(
                    f,
                    "  {:<24} {:<24} @{:<4} {:>3} bit  {}",
                    signal.name, pdu, signal.start_position, signal.length, signal.byte_order
                )?;
            }
        }

        Ok(())
    }
}

/// Text change report for a comparison
pub struct CompareReport<'a> {
    pub base: &'a str,
    pub new: &'a str,
    pub result: &'a ComparisonResult,
}

impl fmt::Display for CompareReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.result.summary();

        writeln!(f, "{}", RULE)?;
        writeln!(f, "  ECU Extract Comparison")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "  Base: {}", self.base)?;
        writeln!(f, "  New:  {}\n", self.new)?;

        writeln!(f, "Summary")?;
        writeln!(f, "{}", THIN_RULE)?;
        write_counts(f, "Messages", &summary.messages)?;
        write_counts(f, "Signals", &summary.signals)?;
        write_counts(f, "Signal groups", &summary.signal_groups)?;
        write_counts(f, "Message groups", &summary.message_groups)?;
        write_counts(f, "Total", &summary.total)?;

        if self.result.is_empty() {
            return writeln!(f, "\nNo differences found.");
        }

        write_section(f, "Messages", &self.result.messages)?;
        write_section(f, "Signals", &self.result.signals)?;
        write_section(f, "Signal groups", &self.result.signal_groups)?;
        write_section(f, "Message groups", &self.result.message_groups)
    }
}

pub fn render_parse_txt(input: &str, doc: &ParsedDocument) -> String {
    ParseReport { input, doc }.to_string()
}

pub fn render_compare_txt(base: &str, new: &str, result: &ComparisonResult) -> String {
    CompareReport { base, new, result }.to_string()
}

fn write_counts(f: &mut fmt::Formatter<'_>, label: &str, counts: &ChangeCounts) -> fmt::Result {
    writeln!(
        f,
        "  {:<16} +{:<4} -{:<4} ~{}",
        label, counts.added, counts.deleted, counts.modified
    )
}

fn write_section<T: Comparable>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    diff: &EntityDiff<T>,
) -> fmt::Result {
    if diff.is_empty() {
        return Ok(());
    }

    writeln!(f, "\n{}", title)?;
    writeln!(f, "{}", THIN_RULE)?;

    for item in &diff.added {
        writeln!(f, "  + {}", item.name())?;
    }
    for item in &diff.deleted {
        writeln!(f, "  - {}", item.name())?;
    }
    for entry in &diff.modified {
        writeln!(f, "  ~ {} ({})", entry.new.name(), entry.changed_fields.join(", "))?;
        for change in entry.changes() {
            writeln!(f, "      {}: {} → {}", change.field, change.old, change.new)?;
        }
    }

    Ok(())
}
