//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Diligent - multi-agent LLM due-diligence analyzer
///
/// Run specialized reasoning agents (consistency, greenwashing, compliance,
/// math, risk synthesis) over an extracted document text and produce
/// structured findings plus an aggregate risk summary.
///
/// Examples:
///   diligent --input document.txt
///   diligent --input document.txt --agents consistency,math,risk
///   diligent --input document.txt --document-id doc-42 --format json
///   diligent --list-agents
///   diligent --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the extracted document text to analyze
    ///
    /// Not required when using --init-config or --list-agents.
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["init_config", "list_agents"]
    )]
    pub input: Option<PathBuf>,

    /// Agents to run, in order (comma-separated)
    ///
    /// Example: --agents consistency,math,risk
    /// Defaults to the full canonical sequence.
    #[arg(short, long, value_name = "IDS", value_delimiter = ',')]
    pub agents: Option<Vec<String>>,

    /// Document id for telemetry persistence
    ///
    /// When omitted, no execution records or findings are persisted.
    #[arg(short, long, value_name = "ID")]
    pub document_id: Option<String>,

    /// Ollama model to use for analysis
    ///
    /// Can also be set via DILIGENT_MODEL env var or .diligent.toml config.
    #[arg(short, long, env = "DILIGENT_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    ///
    /// Lower values produce more consistent/deterministic output
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output file path for the report
    #[arg(
        short,
        long,
        default_value = "diligence_report.md",
        value_name = "FILE"
    )]
    pub output: PathBuf,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Base URL of the persistence store (enables persistence)
    #[arg(long, value_name = "URL", env = "DILIGENT_STORE_URL")]
    pub store_url: Option<String>,

    /// API key for the persistence store
    #[arg(long, value_name = "KEY", env = "DILIGENT_STORE_KEY")]
    pub store_api_key: Option<String>,

    /// Fail if findings at or above this severity are reported
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is exceeded.
    /// Values: critical, high, medium, low
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .diligent.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .diligent.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// List the registered agents and exit
    #[arg(long)]
    pub list_agents: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Severity level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for modes that never run the pipeline
        if self.init_config || self.list_agents {
            return Ok(());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref agents) = self.agents {
            if agents.iter().all(|a| a.trim().is_empty()) {
                return Err("At least one agent must be specified".to_string());
            }
        }

        if let Some(ref store_url) = self.store_url {
            if !store_url.starts_with("http://") && !store_url.starts_with("https://") {
                return Err("Store URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: None,
            agents: None,
            document_id: None,
            model: None,
            ollama_url: None,
            temperature: None,
            timeout: None,
            output: PathBuf::from("report.md"),
            format: OutputFormat::Markdown,
            store_url: None,
            store_api_key: None,
            fail_on: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
            list_agents: true,
        }
    }

    #[test]
    fn test_validation_skipped_for_list_agents() {
        let args = make_args();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_ollama_url() {
        let mut args = make_args();
        args.list_agents = false;
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_temperature_range() {
        let mut args = make_args();
        args.list_agents = false;
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        args.temperature = Some(0.3);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.list_agents = false;
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_agent_list() {
        let mut args = make_args();
        args.list_agents = false;
        args.agents = Some(vec!["".to_string()]);
        assert!(args.validate().is_err());

        args.agents = Some(vec!["consistency".to_string()]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_fail_on_ordering() {
        assert!(FailOnLevel::Low < FailOnLevel::Medium);
        assert!(FailOnLevel::High < FailOnLevel::Critical);
    }
}
