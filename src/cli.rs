//! CLI interface for the role selector

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cv-role-selector")]
#[command(about = "Classify a job description and pick the matching CV template")]
#[command(long_about = "Score a job description against configured role categories, \
    verify template availability and keyword alignment, and report the CV and cover letter templates to use")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a job description
    Classify {
        /// Path to job description file (TXT, MD, PDF)
        #[arg(short, long, conflicts_with = "text")]
        job: Option<PathBuf>,

        /// Job description passed inline
        #[arg(short, long)]
        text: Option<String>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Minimum percentage shown in the breakdown
        #[arg(long)]
        threshold: Option<f64>,

        /// Template directory, overriding the configured one
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Show matched keywords and the candidate trace
        #[arg(short, long)]
        detailed: bool,
    },

    /// Role category commands
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum RoleAction {
    /// List configured role categories
    List {
        /// Include each role's keywords
        #[arg(long)]
        keywords: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Reset configuration to defaults
    Reset,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

/// Validate a percentage argument
pub fn validate_threshold(threshold: f64) -> Result<f64, String> {
    if (0.0..=100.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("Threshold {} must be between 0 and 100", threshold))
    }
}
