//! Output formatters for match reports

use crate::config::OutputFormat;
use crate::error::{Result, SkillMatcherError};
use crate::output::report::MatchReportDocument;
use colored::{Color, Colorize};
use std::path::Path;

pub trait OutputFormatter {
    fn format_report(&self, report: &MatchReportDocument) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Human-readable console output
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON for scripts and API integration
pub struct JsonFormatter {
    pretty: bool,
}

pub fn formatter_for(format: OutputFormat, use_colors: bool, detailed: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors, detailed)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

pub fn parse_output_format(format: &str) -> Result<OutputFormat> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        _ => Err(SkillMatcherError::InvalidInput(format!(
            "Invalid output format: {}. Supported: console, json",
            format
        ))),
    }
}

pub fn save_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)
        .map_err(|e| SkillMatcherError::OutputFormatting(format!("Failed to write {}: {}", path.display(), e)))
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "▓".blue().bold(), title.blue().bold())
        } else {
            format!("\n▓ {}\n", title)
        }
    }

    fn format_coverage_badge(&self, coverage: f32) -> String {
        let (badge, color) = match coverage {
            c if c >= 90.0 => ("EXCELLENT", Color::Green),
            c if c >= 70.0 => ("GOOD", Color::Yellow),
            c if c >= 50.0 => ("FAIR", Color::BrightYellow),
            _ => ("POOR", Color::Red),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_score(score: Option<f32>) -> String {
        score.map_or_else(|| "-".to_string(), |s| format!("{:.3}", s))
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &MatchReportDocument) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("SKILL MATCH"));
        output.push_str(&format!(
            "Generated: {} | Model: {} | Threshold: {:.2} | {}ms\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.embedding_model,
            report.metadata.threshold,
            report.metadata.processing_time_ms
        ));
        output.push_str(&format!(
            "Coverage: {:.1}% ({}/{}) {}\n",
            report.summary.coverage_percentage,
            report.summary.matched_count,
            report.summary.required_count,
            self.format_coverage_badge(report.summary.coverage_percentage)
        ));

        output.push_str(&self.format_header("Matched"));
        if report.matched.is_empty() {
            output.push_str("  (none)\n");
        }
        for skill in &report.matched {
            output.push_str(&format!("  {} {}\n", self.colorize("✔", Color::Green), skill));
        }

        output.push_str(&self.format_header("Missing"));
        if report.missing.is_empty() {
            output.push_str("  (none)\n");
        }
        for skill in &report.missing {
            output.push_str(&format!("  {} {}\n", self.colorize("✘", Color::Red), skill));
        }

        if self.detailed && !report.scores.is_empty() {
            output.push_str(&self.format_header("Scores"));
            for score in &report.scores {
                let status = if score.matched {
                    self.colorize("match", Color::Green)
                } else {
                    self.colorize("miss ", Color::Red)
                };
                output.push_str(&format!(
                    "  {} {:<30} {:>6}  ~ {}\n",
                    status,
                    score.skill,
                    Self::format_score(score.similarity),
                    score.best_match.as_deref().unwrap_or("-")
                ));
            }
            if let Some(dim) = report.metadata.embedding_dim {
                output.push_str(&format!("  embedding dimension: {}\n", dim));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &MatchReportDocument) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}
