//! Output formatters for classification reports

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::ClassificationReport;
use crate::processing::classifier::GateOutcome;
use colored::{Color, Colorize};

/// Trait for formatting classification reports
pub trait OutputFormatter {
    fn format_report(&self, report: &ClassificationReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for scripting and API integration
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    detailed: bool,
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

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn share_bar(percentage: f64) -> String {
        let filled = ((percentage / 5.0).round() as usize).min(20);
        format!("{}{}", "■".repeat(filled), "·".repeat(20 - filled))
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &ClassificationReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("ROLE CLASSIFICATION", 1));
        output.push_str(&format!(
            "Generated: {} | Matcher: {} | {} characters\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.matcher,
            report.metadata.text_length
        ));

        output.push_str(&self.format_header("Selected Role", 2));
        output.push_str(&format!(
            "{} ({})\n",
            self.colorize(&report.display_name, Color::Cyan),
            report.role
        ));
        output.push_str(&format!("Reason: {}\n", report.outcome_summary()));

        if !report.is_renderable() {
            output.push_str(&format!(
                "{}\n",
                self.colorize("No CV template could be resolved for any role", Color::Red)
            ));
        }

        output.push_str(&self.format_header("Templates", 3));
        output.push_str(&format!(
            "  • CV: {}\n",
            report.templates.cv.as_deref().unwrap_or("missing")
        ));
        output.push_str(&format!(
            "  • Cover letter: {}\n",
            report.templates.cover_letter.as_deref().unwrap_or("missing")
        ));

        output.push_str(&self.format_header("Role Breakdown", 3));
        if report.breakdown.entries.is_empty() {
            output.push_str(&format!("  No role above {:.1}%\n", report.breakdown.threshold));
        }
        for entry in &report.breakdown.entries {
            output.push_str(&format!(
                "  {:<22} {} {:>5.1}%\n",
                entry.role,
                Self::share_bar(entry.percentage),
                entry.percentage
            ));
        }
        if report.breakdown.mixed_role {
            output.push_str(&format!(
                "  {}\n",
                self.colorize("Mixed role: no category holds a majority", Color::Yellow)
            ));
        }

        if self.detailed {
            let keywords = report.selected_keywords();
            if !keywords.is_empty() {
                output.push_str(&self.format_header("Matched Keywords", 3));
                for (keyword, count) in keywords {
                    output.push_str(&format!("  • {} (x{})\n", keyword, count));
                }
            }

            if !report.selection.candidates.is_empty() {
                output.push_str(&self.format_header("Candidates", 3));
                for candidate in &report.selection.candidates {
                    let verdict = match &candidate.gate {
                        GateOutcome::Accepted => self.colorize("accepted", Color::Green),
                        GateOutcome::TemplateMissing { path } => {
                            self.colorize(&format!("template missing ({})", path), Color::Red)
                        }
                        GateOutcome::Misaligned { distinct_hits, required } => self.colorize(
                            &format!(
                                "misaligned ({}/{} distinguishing keywords)",
                                distinct_hits, required
                            ),
                            Color::Yellow,
                        ),
                        GateOutcome::BelowShare { percentage, min_share } => self.colorize(
                            &format!("share {:.1}% below {:.1}%", percentage, min_share),
                            Color::Yellow,
                        ),
                    };
                    output.push_str(&format!(
                        "  • {} score {:.1} ({:.1}%): {}\n",
                        candidate.role, candidate.score, candidate.percentage, verdict
                    ));
                }
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
    fn format_report(&self, report: &ClassificationReport) -> Result<String> {
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

impl MarkdownFormatter {
    pub fn new(detailed: bool) -> Self {
        Self { detailed }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &ClassificationReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# Role Classification\n\n");
        output.push_str(&format!(
            "**Selected role:** {} (`{}`)\n\n",
            report.display_name, report.role
        ));
        output.push_str(&format!("**Reason:** {}\n\n", report.outcome_summary()));

        output.push_str("## Templates\n\n");
        output.push_str(&format!(
            "- CV: `{}`\n- Cover letter: `{}`\n\n",
            report.templates.cv.as_deref().unwrap_or("missing"),
            report.templates.cover_letter.as_deref().unwrap_or("missing")
        ));

        output.push_str("## Breakdown\n\n| Role | Share |\n|------|------:|\n");
        for entry in &report.breakdown.entries {
            output.push_str(&format!("| {} | {:.1}% |\n", entry.role, entry.percentage));
        }
        if report.breakdown.mixed_role {
            output.push_str("\n> Mixed role: no category holds a majority.\n");
        }

        if self.detailed && !report.selection.candidates.is_empty() {
            output.push_str("\n## Candidates\n\n");
            for candidate in &report.selection.candidates {
                output.push_str(&format!(
                    "- `{}`: {:.1}% ({})\n",
                    candidate.role,
                    candidate.percentage,
                    if candidate.gate.is_accepted() { "accepted" } else { "skipped" }
                ));
            }
        }

        output.push_str(&format!(
            "\n---\n*Generated {}*\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

/// Formatter for the requested output format
pub fn formatter_for(
    format: OutputFormat,
    use_colors: bool,
    detailed: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors, detailed)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter::new(detailed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::catalog::RoleCatalog;
    use crate::processing::classifier::RoleClassifier;
    use crate::processing::templates::MemoryTemplateStore;
    use std::sync::Arc;

    fn report(text: &str) -> ClassificationReport {
        let catalog = Arc::new(RoleCatalog::builtin());
        let store = Arc::new(MemoryTemplateStore::for_catalog(&catalog));
        ClassificationReport::build(&RoleClassifier::new(catalog, store), text, 5.0)
    }

    #[test]
    fn test_console_output_without_colors() {
        let formatter = ConsoleFormatter::new(false, true);
        let output = formatter
            .format_report(&report("Android Kotlin. React Vue."))
            .unwrap();

        assert!(output.contains("Android Developer (android_developer)"));
        assert!(output.contains("Mixed role"));
        assert!(output.contains("Candidates"));
        assert!(!output.contains("\u{1b}["));
    }

    #[test]
    fn test_json_output_parses() {
        let output = JsonFormatter::new(false)
            .format_report(&report("Kubernetes Terraform Helm"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["role"], "devops_cloud");
        assert_eq!(value["selection"]["outcome"]["kind"], "redirected");
        assert_eq!(value["selection"]["outcome"]["from"], "devops_fintech");
    }

    #[test]
    fn test_markdown_table() {
        let output = MarkdownFormatter::new(false)
            .format_report(&report("Spark Airflow dbt"))
            .unwrap();
        assert!(output.contains("| data_engineer | 100.0% |"));
        assert!(output.starts_with("# Role Classification"));
    }

    #[test]
    fn test_formatter_for_matches_format() {
        for format in [OutputFormat::Console, OutputFormat::Json, OutputFormat::Markdown] {
            assert_eq!(formatter_for(format, false, false).supports_format(), format);
        }
    }
}
