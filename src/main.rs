//! MedAware - medication and symptom tracking client
//!
//! A CLI for the MedAware health API: log symptoms and medications,
//! chat with the symptom assistant, and export health insights
//! (weekly symptom trends, side-effect distribution, advice history).
//!
//! Exit codes:
//!   0 - Success (including insights rendered from placeholder data)
//!   1 - Runtime error (bad arguments, config, request failure, etc.)

mod api;
mod assistant;
mod auth;
mod cli;
mod config;
mod insights;
mod models;
mod report;

use anyhow::{bail, Context, Result};
use api::{ApiError, HealthApiClient};
use auth::{AuthProvider, StaticAuth};
use chrono::Utc;
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{InsightsReport, MedicationUpdate, NewMedication, NewSymptom, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Duration;
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

    // Initialize logging
    init_logging(&args);

    info!("MedAware v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", args.command);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_auth) {
                eprintln!("   Your session may have expired. Refresh MEDAWARE_TOKEN and retry.");
            }
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .medaware.toml in `dir`.
///
/// An existing file is never overwritten; that case exits with 1.
fn handle_init_config(dir: &Path) -> Result<i32> {
    let path = dir.join(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        return Ok(1);
    }

    let content = Config::default_toml();
    std::fs::write(&path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Set MEDAWARE_USER_ID and MEDAWARE_TOKEN to sign in.");
    Ok(0)
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the selected command. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = HealthApiClient::new(config.api_config()).context("Failed to create HTTP client")?;
    let auth = StaticAuth::new(config.auth.user_id.clone(), config.auth.token.clone());

    match args.command {
        Command::Insights { format, output } => {
            run_insights(&client, &auth, &config, format, output, args.quiet).await
        }
        Command::Medications => list_medications(&client, &auth).await,
        Command::LogSymptom {
            description,
            intensity,
            tags,
            med_context,
        } => {
            let (user_id, token) = credentials(&auth)?;
            let symptom = NewSymptom {
                user_id,
                description,
                intensity,
                tags,
                med_context,
            };
            let id = client.add_symptom(&token, &symptom).await?;
            println!("✅ Symptom logged (id: {})", id);
            Ok(0)
        }
        Command::LogMedication {
            name,
            dosage,
            frequency,
            start_date,
            notes,
        } => {
            let (user_id, token) = credentials(&auth)?;
            let medication = NewMedication {
                user_id,
                medication_name: name,
                dosage,
                frequency,
                start_date,
                notes,
            };
            let id = client.add_medication(&token, &medication).await?;
            println!("✅ Medication added (id: {})", id);
            Ok(0)
        }
        Command::UpdateMedication {
            id,
            name,
            dosage,
            frequency,
            start_date,
            notes,
        } => {
            let (_, token) = credentials(&auth)?;
            let update = MedicationUpdate {
                medication_name: name,
                dosage,
                frequency,
                start_date,
                notes,
            };
            let message = client.update_medication(&token, &id, &update).await?;
            println!("✅ {}", if message.is_empty() { "Medication updated" } else { &message });
            Ok(0)
        }
        Command::Assistant { text } => {
            let text = text.join(" ");
            let user_id = auth.current_user();
            let reply = assistant::consult(&client, &text, user_id.as_deref()).await?;

            println!("🧠 {}", reply.suggestions);
            println!("   Overall risk: {}", reply.overall_risk);
            if let Some(message) = reply.agent_message {
                println!("\n💬 {}", message);
            }
            Ok(0)
        }
        Command::InitConfig => handle_init_config(Path::new(".")),
    }
}

/// Fetch all sources, aggregate, and emit the insights report.
async fn run_insights(
    client: &HealthApiClient,
    auth: &StaticAuth,
    config: &Config,
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<i32> {
    let spinner = fetch_spinner(quiet);
    let page = insights::fetch_page_data(client, auth).await;
    spinner.finish_and_clear();

    let now = Utc::now();
    let symptoms = page.symptoms.data();
    let medications = page.medications.data();
    let predictions = page.predictions.data();

    let report = InsightsReport {
        metadata: ReportMetadata {
            user_id: auth.current_user().unwrap_or_default(),
            generated_at: now,
            api_url: client.base_url().to_string(),
            degraded_sources: page.degraded_sources(),
        },
        stats: insights::summary_stats(symptoms, medications, predictions, now),
        insights: insights::aggregate(symptoms, predictions, now),
    };

    let rendered = match format.unwrap_or(config.insights.format) {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output = output.or_else(|| config.insights.output.as_ref().map(PathBuf::from));
    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("✅ Insights report saved to: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    if page.fully_degraded() {
        warn!("No data could be loaded; the report shows placeholders only");
    }

    Ok(0)
}

async fn list_medications(client: &HealthApiClient, auth: &StaticAuth) -> Result<i32> {
    let (user_id, token) = credentials(auth)?;
    let medications = client.get_medications(&token, &user_id).await?;

    if medications.is_empty() {
        println!("No medications logged yet.");
        return Ok(0);
    }

    println!("💊 {} medications:\n", medications.len());
    for med in &medications {
        println!(
            "   {} {} - {} (since {})",
            med.medication_name,
            med.dosage,
            if med.frequency.is_empty() { "as needed" } else { &med.frequency },
            if med.start_date.is_empty() { "unknown" } else { &med.start_date },
        );
        if let Some(ref id) = med.id {
            println!("     id: {}", id);
        }
    }
    Ok(0)
}

/// User id and token, or a helpful error.
fn credentials(auth: &dyn AuthProvider) -> Result<(String, String)> {
    let Some(user_id) = auth.current_user() else {
        bail!("Not signed in: set MEDAWARE_USER_ID or pass --user");
    };
    let Some(token) = auth.auth_token() else {
        bail!("No auth token: set MEDAWARE_TOKEN or pass --token");
    };
    Ok((user_id, token))
}

fn fetch_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Fetching symptoms, medications and predictions...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
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
            info!("Loaded default config from {}", CONFIG_FILE);
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
