//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MedAware - track medications and symptoms, review health insights
///
/// Talks to the MedAware health API. Credentials usually come from
/// MEDAWARE_USER_ID and MEDAWARE_TOKEN.
///
/// Examples:
///   medaware insights
///   medaware insights --format json --output insights.json
///   medaware log-symptom --description "Dizzy after lunch" --intensity 4
///   medaware log-medication --name Sertraline --dosage 50mg --frequency daily
///   medaware assistant "sharp headache and blurry vision"
///   medaware init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .medaware.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Health API base URL
    #[arg(long, value_name = "URL", env = "MEDAWARE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Signed-in user id
    #[arg(long, value_name = "ID", env = "MEDAWARE_USER_ID", global = true)]
    pub user: Option<String>,

    /// Bearer token from the identity provider
    #[arg(long, value_name = "TOKEN", env = "MEDAWARE_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch records and render the insights report
    Insights {
        /// Output format (markdown, json)
        #[arg(long, value_name = "FORMAT")]
        format: Option<OutputFormat>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List medications
    Medications,

    /// Log a symptom
    LogSymptom {
        /// What you are experiencing
        #[arg(short, long)]
        description: String,

        /// Intensity from 1 (mild) to 10 (severe)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=10))]
        intensity: u8,

        /// Tag (repeatable), e.g. --tag headache --tag nausea
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Medication taken around the time (repeatable)
        #[arg(long = "med-context", value_name = "NAME")]
        med_context: Vec<String>,
    },

    /// Add a medication
    LogMedication {
        #[arg(short, long)]
        name: String,

        #[arg(long, default_value = "")]
        dosage: String,

        #[arg(long, default_value = "")]
        frequency: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        start_date: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Update fields of an existing medication
    UpdateMedication {
        /// Medication id
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(long)]
        dosage: Option<String>,

        #[arg(long)]
        frequency: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Describe symptoms and get AI suggestions
    Assistant {
        /// Free-text description
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Generate a default .medaware.toml configuration file
    InitConfig,
}

/// Output format for the insights report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match &self.command {
            Command::LogSymptom { description, .. } if description.trim().is_empty() => {
                Err("Description must not be empty".to_string())
            }
            Command::LogMedication {
                name, start_date, ..
            } => {
                if name.trim().is_empty() {
                    return Err("Medication name must not be empty".to_string());
                }
                validate_date(start_date)
            }
            Command::UpdateMedication { start_date, .. } => {
                start_date.as_deref().map_or(Ok(()), validate_date)
            }
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn validate_date(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}
