//! Report generation for a mutation pass
//!
//! This module formats and displays the mutations generated for one file.

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::OperatorTiming;
use crate::mutation::Mutation;

/// Summary of one generation pass
#[derive(Debug)]
pub struct GenerationReport {
    pub file: PathBuf,
    pub mutations: Vec<Mutation>,
    pub timings: Vec<OperatorTiming>,
    pub total_duration: Duration,
}

/// Machine-readable form of the report
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    file: &'a PathBuf,
    total: usize,
    per_operator: Vec<JsonOperator<'a>>,
    mutations: &'a [Mutation],
}

#[derive(Debug, Serialize)]
struct JsonOperator<'a> {
    id: &'a str,
    emitted: usize,
    kept: usize,
    elapsed_ms: f64,
}

impl GenerationReport {
    /// Create a new report from the result of a pass
    pub fn new(file: impl Into<PathBuf>, mutations: Vec<Mutation>, timings: Vec<OperatorTiming>) -> Self {
        let total_duration = timings.iter().map(|t| t.elapsed).sum();
        Self {
            file: file.into(),
            mutations,
            timings,
            total_duration,
        }
    }

    /// Total number of mutations after deduplication
    pub fn total(&self) -> usize {
        self.mutations.len()
    }

    /// Mutations kept for operator `id`
    pub fn kept(&self, id: &str) -> usize {
        self.mutations.iter().filter(|m| m.operator_id == id).count()
    }

    /// Mutations emitted but dropped as duplicates
    pub fn duplicates(&self) -> usize {
        let emitted: usize = self.timings.iter().map(|t| t.count).sum();
        emitted.saturating_sub(self.total())
    }

    /// Report as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        let per_operator = self
            .timings
            .iter()
            .map(|t| JsonOperator {
                id: t.id,
                emitted: t.count,
                kept: self.kept(t.id),
                elapsed_ms: t.elapsed.as_secs_f64() * 1000.0,
            })
            .collect();
        serde_json::to_string_pretty(&JsonReport {
            file: &self.file,
            total: self.total(),
            per_operator,
            mutations: &self.mutations,
        })
    }

    /// Report as colored text
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push('\n');
        out.push_str(&format!("{}\n", "Mutation Generation Report".bold()));
        out.push_str(&format!("{}\n\n", "=".repeat(60)));

        for m in &self.mutations {
            let location = if m.start_line == m.end_line {
                format!("{}:{}", m.file.display(), m.start_line)
            } else {
                format!("{}:{}-{}", m.file.display(), m.start_line, m.end_line)
            };
            out.push_str(&format!(
                "{} {} {} -> {}\n",
                format!("[{}]", m.operator_id).cyan().bold(),
                location.dimmed(),
                one_line(&m.original_text).yellow(),
                one_line(&m.replacement_text).green()
            ));
        }

        out.push('\n');
        out.push_str(&format!("{}\n", "Per operator".bold()));
        out.push_str(&format!("{}\n", "-".repeat(40)));
        for t in self.timings.iter().filter(|t| t.count > 0) {
            out.push_str(&format!(
                "{:<6} {:>5} kept {:>5} emitted  {}\n",
                t.id,
                self.kept(t.id),
                t.count,
                format_duration(t.elapsed).dimmed()
            ));
        }

        out.push('\n');
        out.push_str(&format!("{}\n", "Summary".bold()));
        out.push_str(&format!("{}\n", "-".repeat(40)));
        out.push_str(&format!("File:              {}\n", self.file.display()));
        out.push_str(&format!("Total mutations:   {}\n", self.total()));
        if self.duplicates() > 0 {
            out.push_str(&format!(
                "Duplicates:        {} {}\n",
                self.duplicates(),
                "(dropped)".dimmed()
            ));
        }
        let silent = self.timings.iter().filter(|t| t.count == 0).count();
        if silent > 0 {
            out.push_str(&format!("Operators silent:  {}\n", silent));
        }
        out.push_str(&format!(
            "Duration:          {}\n",
            format_duration(self.total_duration)
        ));
        out
    }

    /// Print the report to stdout
    pub fn print(&self) {
        print!("{}", self.render());
    }
}

/// Collapse a multi-line snippet for single-line display
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format duration in a human-readable way
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{}µs", d.as_micros())
    } else if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}
