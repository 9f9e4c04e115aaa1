//! Diligent - multi-agent LLM due-diligence analyzer
//!
//! A CLI tool that runs a sequence of specialized reasoning agents over
//! an extracted document text and produces structured findings plus an
//! aggregate risk summary.
//!
//! Exit codes:
//!   0 - Success (no findings above threshold, or no --fail-on set)
//!   1 - Runtime error (validation, connection, config failure, etc.)
//!   2 - Findings found above --fail-on threshold

mod agents;
mod analysis;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod store;

use agents::{AgentRegistry, OllamaClient};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, FailOnLevel, OutputFormat};
use config::Config;
use models::{AnalysisRequest, Severity};
use pipeline::Pipeline;
use std::sync::Arc;
use std::time::Instant;
use store::{ExecutionStore, RestStore, RestStoreConfig};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Handle --list-agents early
    if args.list_agents {
        return handle_list_agents();
    }

    // Initialize logging
    init_logging(&args);

    info!("Diligent v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .diligent.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".diligent.toml");

    if path.exists() {
        eprintln!("⚠️  .diligent.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .diligent.toml")?;

    println!("✅ Created .diligent.toml with default settings.");
    println!("   Edit it to customize model, store, and output options.");
    Ok(())
}

/// Handle --list-agents: print the registered agents and exit.
fn handle_list_agents() -> Result<()> {
    let registry = AgentRegistry::standard();

    println!("Registered agents (canonical order):\n");
    for spec in registry.specs() {
        let marker = if spec.requires_prior_findings {
            " (synthesis: receives prior findings)"
        } else {
            ""
        };
        println!("  {:<14} {}{}", spec.id, spec.display_name, marker);
    }

    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
async fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Read the document text
    let input_path = args
        .input
        .as_ref()
        .context("No input file specified")?;
    let text = std::fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read input file: {}", input_path.display()))?;
    info!("Read {} bytes from {}", text.len(), input_path.display());

    // Step 2: Resolve the agents to run
    let registry = AgentRegistry::standard();
    let run_agents: Vec<String> = match args.agents {
        Some(ref agents) => agents
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        None => registry.ids().iter().map(|s| s.to_string()).collect(),
    };

    // Step 3: Build the reasoning client
    println!("🤖 Initializing analysis pipeline...");
    println!("   Model: {}", config.model.name);
    println!("   Ollama: {}", config.model.ollama_url);
    println!("   Agents: {}", run_agents.join(", "));
    println!("   Timeout: {}s", config.model.timeout_seconds);

    let client = OllamaClient::new(agents::invoker::OllamaConfig {
        url: config.model.ollama_url.clone(),
        model: config.model.name.clone(),
        temperature: config.model.temperature,
        max_tokens: config.model.max_tokens,
        timeout_seconds: config.model.timeout_seconds,
    })
    .context("Failed to create reasoning client")?;

    // Step 4: Build the execution store, if configured
    let store = build_store(&config)?;
    if store.is_some() {
        if args.document_id.is_some() {
            println!("   Persistence: enabled");
        } else {
            warn!("Store configured but no --document-id given; nothing will be persisted");
        }
    }

    // Step 5: Run the pipeline
    println!("\n🔬 Running multi-agent analysis...\n");

    let pipeline = Pipeline::new(registry, Arc::new(client), store);
    let request = AnalysisRequest {
        document_id: args.document_id.clone(),
        text,
        run_agents,
    };

    let response = pipeline
        .analyze(&request)
        .await
        .context("Analysis request rejected")?;

    // Step 6: Generate and save the report
    println!("📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let metadata = report::ReportMetadata {
        document_id: args.document_id.clone(),
        analysis_date: Utc::now(),
        model_used: config.model.name.clone(),
        duration_seconds: duration,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&response)?,
        OutputFormat::Markdown => report::generate_markdown_report(&metadata, &response),
    };

    std::fs::write(&args.output, &output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    // Print summary
    let summary = &response.summary;
    println!("\n📊 Analysis Summary:");
    println!("   Agents run: {}", response.results.len());
    println!("   Total findings: {}", summary.total_findings);
    println!(
        "   - 🔴 Critical: {} | 🟠 High: {} | 🟡 Medium: {} | 🟢 Low: {}",
        summary.critical, summary.high, summary.medium, summary.low
    );

    let degraded = response.results.iter().filter(|r| r.degraded).count();
    if degraded > 0 {
        println!("   ⚠️  Degraded agents: {}", degraded);
    }

    if let Some(verdict) = response
        .results
        .iter()
        .find_map(|r| r.recommendation.map(|rec| (r, rec)))
    {
        let (result, recommendation) = verdict;
        match result.risk_score {
            Some(score) => println!("   Verdict: {} (risk score {:.0}/100)", recommendation, score),
            None => println!("   Verdict: {}", recommendation),
        }
    }

    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        args.output.display()
    );

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        let threshold_severity = fail_on_to_severity(fail_level);
        if analysis::has_findings_at_or_above(&response.results, threshold_severity) {
            eprintln!(
                "\n⛔ Findings at or above {:?} severity. Failing (exit code 2).",
                fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Build the REST store when persistence is enabled and configured.
fn build_store(config: &Config) -> Result<Option<Arc<dyn ExecutionStore>>> {
    if !config.store.enabled {
        return Ok(None);
    }

    if config.store.url.is_empty() {
        warn!("Store enabled but no URL configured; persistence disabled");
        return Ok(None);
    }

    let store = RestStore::new(RestStoreConfig {
        url: config.store.url.clone(),
        api_key: config.store.api_key.clone(),
    })
    .context("Failed to create store client")?;

    Ok(Some(Arc::new(store)))
}

/// Convert FailOnLevel to Severity for comparison.
fn fail_on_to_severity(level: FailOnLevel) -> Severity {
    match level {
        FailOnLevel::Low => Severity::Low,
        FailOnLevel::Medium => Severity::Medium,
        FailOnLevel::High => Severity::High,
        FailOnLevel::Critical => Severity::Critical,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .diligent.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
