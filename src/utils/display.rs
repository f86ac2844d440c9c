//! Display and output formatting utilities

use crate::cff::{Block, Probe, Verdict};
use crate::sat::EncodingStatistics;
use crate::store::{OutcomeRecord, Status};
use anyhow::{Context, Result};
use std::path::Path;

/// Format search results for display
pub struct RecordFormatter;

impl RecordFormatter {
    /// Blocks on one line, each in brackets
    pub fn format_blocks(blocks: &[Block]) -> String {
        let mut output = String::from("blocks:\n");
        let rendered: Vec<String> = blocks
            .iter()
            .map(|block| {
                let elements: Vec<String> = block.iter().map(|e| e.to_string()).collect();
                format!("[{}]", elements.join(" "))
            })
            .collect();
        output.push_str(&rendered.join(" "));
        output.push('\n');
        output
    }

    /// The t x n incidence matrix of a family, one row per universe element
    pub fn format_matrix(blocks: &[Block], t: usize) -> String {
        let mut output = String::new();
        for element in 1..=t {
            output.push_str(&format!("{:3} ", element));
            for block in blocks {
                output.push(if block.contains(&element) { '█' } else { '·' });
            }
            output.push('\n');
        }
        output
    }

    /// Full description of one stored record
    pub fn format_record(record: &OutcomeRecord, show_matrix: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== d={}, t={}, n={} ===\n", record.d, record.t, record.n));
        output.push_str(&format!("Status: {}\n", Self::colored_status(record.status)));
        if let Some(clauses) = record.clauses {
            output.push_str(&format!("Clauses: {}\n", clauses));
        }
        if let Some(time) = record.time {
            output.push_str(&format!("Time: {:.3}s\n", time));
        }
        if let Some(ref detail) = record.detail {
            output.push_str(&format!("Detail: {}\n", detail));
        }

        if record.status == Status::Sat {
            output.push_str(&Self::format_blocks(&record.solution));
            if show_matrix {
                output.push_str(&Self::format_matrix(&record.solution, record.t));
            }
        }

        output
    }

    /// One line per probe
    pub fn format_probe(probe: &Probe) -> String {
        let record = probe.record();
        let source = if probe.is_cached() { "cached" } else { "solved" };
        format!(
            "d={:<3} t={:<4} n={:<4} {:<8} ({})",
            record.d,
            record.t,
            record.n,
            Self::colored_status(record.status),
            source
        )
    }

    /// Records as a summary table
    pub fn format_summary(records: &[OutcomeRecord]) -> String {
        let mut output = String::new();

        output.push_str("d   | t    | n    | Status  | Clauses    | Time(s)\n");
        output.push_str("----|------|------|---------|------------|--------\n");

        for record in records {
            output.push_str(&format!(
                "{:3} | {:4} | {:4} | {:7} | {:>10} | {:>7}\n",
                record.d,
                record.t,
                record.n,
                record.status.as_str(),
                record
                    .clauses
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                record
                    .time
                    .map(|t| format!("{:.2}", t))
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }

        output
    }

    /// Best known n per t as LaTeX table rows
    pub fn format_best_known(rows: &[(usize, usize)]) -> String {
        let mut output = String::from("\tt   &   n\n");
        for &(t, n) in rows {
            output.push_str(&format!("\t{:<4}&{:4}  \\\\\n", t, n));
        }
        output
    }

    /// Human-readable verifier verdict
    pub fn format_verdict(verdict: &Verdict, d: usize) -> String {
        match verdict {
            Verdict::CoverFree => ColorOutput::success(&format!("Family is {}-cover-free", d)),
            Verdict::Covered { block, by } => ColorOutput::error(&format!(
                "Block {} is covered by the union of blocks {:?}",
                block, by
            )),
        }
    }

    /// Encoding size summary with a rough difficulty hint
    pub fn format_estimate(stats: &EncodingStatistics) -> String {
        let mut output = stats.to_string();
        let hint = match stats.clauses {
            0..=100_000 => "Should solve quickly",
            100_001..=5_000_000 => "May need most of the time budget",
            _ => "Likely to time out; consider a longer budget",
        };
        output.push_str(&format!("  Recommendation: {}\n", hint));
        output
    }

    /// Write the best-known table next to other output
    pub fn save_best_known<P: AsRef<Path>>(rows: &[(usize, usize)], path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, Self::format_best_known(rows))
            .with_context(|| format!("Failed to write table: {}", path.display()))
    }

    fn colored_status(status: Status) -> String {
        match status {
            Status::Sat => ColorOutput::success(status.as_str()),
            Status::Unsat => ColorOutput::info(status.as_str()),
            Status::Timeout => ColorOutput::warning(status.as_str()),
            Status::Error => ColorOutput::error(status.as_str()),
        }
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color
    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").unwrap_or_default() != "dumb"
    }

    /// Format success message
    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    /// Format error message
    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    /// Format warning message
    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    /// Format info message
    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cff::CffParams;
    use tempfile::tempdir;

    fn sat_record() -> OutcomeRecord {
        OutcomeRecord::new(
            CffParams::new(1, 3, 3),
            Status::Sat,
            vec![vec![1], vec![2], vec![3]],
        )
    }

    #[test]
    fn test_block_formatting() {
        let blocks = vec![vec![1, 2, 6], vec![1, 4, 5]];
        assert_eq!(
            RecordFormatter::format_blocks(&blocks),
            "blocks:\n[1 2 6] [1 4 5]\n"
        );
    }

    #[test]
    fn test_matrix_formatting() {
        let matrix = RecordFormatter::format_matrix(&sat_record().solution, 3);
        let rows: Vec<&str> = matrix.lines().collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].ends_with("█··"));
        assert!(rows[2].ends_with("··█"));
    }

    #[test]
    fn test_record_formatting() {
        let output = RecordFormatter::format_record(&sat_record(), true);
        assert!(output.contains("d=1, t=3, n=3"));
        assert!(output.contains("SAT"));
        assert!(output.contains("[1] [2] [3]"));

        let mut error = OutcomeRecord::new(CffParams::new(2, 3, 2), Status::Error, vec![]);
        error.detail = Some("d must be smaller than n".to_string());
        let output = RecordFormatter::format_record(&error, false);
        assert!(output.contains("Detail: d must be smaller than n"));
        assert!(!output.contains("blocks:"));
    }

    #[test]
    fn test_best_known_rows() {
        let table = RecordFormatter::format_best_known(&[(9, 12), (13, 26)]);
        assert_eq!(table, "\tt   &   n\n\t9   &  12  \\\\\n\t13  &  26  \\\\\n");
    }

    #[test]
    fn test_save_best_known() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tables/d_2.overleaf");

        RecordFormatter::save_best_known(&[(3, 3)], &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("3   &   3"));
    }

    #[test]
    fn test_summary_table() {
        let summary = RecordFormatter::format_summary(&[sat_record()]);
        assert!(summary.lines().count() == 3);
        assert!(summary.contains("SAT"));
    }

    #[test]
    fn test_color_output() {
        let colored = ColorOutput::colored("test", Color::Red);
        // Should either be colored or plain text
        assert!(colored.contains("test"));

        let success = ColorOutput::success("OK");
        assert!(success.contains("OK"));
    }
}
