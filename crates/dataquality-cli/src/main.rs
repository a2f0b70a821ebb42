use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dataquality_catalog::{JsonDefinitionProvider, StandardRegistry, YamlRuleStore};
use dataquality_core::{
    config::CONFIG_FILE_NAME, Category, EngineConfig, JsonObject, NotificationSink, Report,
    Severity, TracingSink, ValidationResult,
};
use dataquality_engine::{BatchOutcome, Orchestrator, ValidationRun};

/// DataQuality - attribute constraint validation for data objects
#[derive(Parser)]
#[command(name = "dataquality")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: dataquality.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate objects from a JSON file
    Validate {
        /// JSON array of objects
        objects: PathBuf,

        /// Output file for report.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of parallel workers
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,
    },

    /// Show the classified attributes of a class
    Classify {
        /// Class name
        class: String,
    },

    /// Inspect or edit the rule store
    Rules {
        #[command(subcommand)]
        action: RulesCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List configured rules
    List {
        /// Only this class
        class: Option<String>,
    },

    /// Configure an attribute without rules
    AddAttribute { class: String, attribute: String },

    /// Remove an attribute and its rules
    RemoveAttribute { class: String, attribute: String },

    /// Add or replace a constraint
    SetConstraint {
        class: String,
        attribute: String,
        constraint: String,

        /// Parameters as JSON, or a plain string
        params: Option<String>,
    },

    /// Remove a constraint
    DeleteConstraint {
        class: String,
        attribute: String,
        constraint: String,
    },

    /// Set the note of an attribute
    SetNote {
        class: String,
        attribute: String,
        note: String,
    },

    /// Clear the note of an attribute
    DeleteNote { class: String, attribute: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    tracing::debug!(
        rules = %config.rules_path().display(),
        definitions = %config.definitions_path().display(),
        "Configuration loaded"
    );
    let sink: Arc<dyn NotificationSink> = Arc::new(TracingSink);

    match cli.command {
        Commands::Validate {
            objects,
            output,
            jobs,
        } => validate_command(&config, sink, &objects, output.as_deref(), jobs, cli.verbose).await,
        Commands::Classify { class } => classify_command(&config, &class),
        Commands::Rules { action } => rules_command(&config, sink, action),
    }
}

/// Config from `--config`, `DATAQUALITY_CONFIG`, `./dataquality.toml`, or defaults
fn load_config(explicit: Option<&Path>, verbose: bool) -> Result<EngineConfig> {
    let from_env = std::env::var_os("DATAQUALITY_CONFIG").map(PathBuf::from);
    let path = explicit
        .map(Path::to_path_buf)
        .or(from_env)
        .or_else(|| Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.exists()));

    match path {
        Some(path) => {
            if verbose {
                eprintln!("{} {}", "Using config:".cyan(), path.display());
            }
            EngineConfig::from_file(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => {
            if verbose {
                eprintln!("{}", "No config file found, using defaults".yellow());
            }
            Ok(EngineConfig::default())
        }
    }
}

fn build_orchestrator(config: &EngineConfig, sink: Arc<dyn NotificationSink>) -> Orchestrator {
    let provider = JsonDefinitionProvider::new(config.definitions_path());
    let store = YamlRuleStore::new(config.rules_path(), Arc::clone(&sink));
    Orchestrator::new(
        Arc::new(provider),
        Arc::new(StandardRegistry::with_defaults()),
        Arc::new(store),
        sink,
    )
    .with_severity(config.severity.clone())
}

/// Validate command - validate objects in parallel on the blocking pool
async fn validate_command(
    config: &EngineConfig,
    sink: Arc<dyn NotificationSink>,
    objects_path: &Path,
    output: Option<&Path>,
    jobs: usize,
    verbose: bool,
) -> Result<()> {
    let contents = std::fs::read_to_string(objects_path)
        .with_context(|| format!("Failed to read {}", objects_path.display()))?;
    let objects: Vec<JsonObject> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse objects from {}", objects_path.display()))?;

    let run = ValidationRun::from_config(config);
    if !run.enabled {
        println!("{}", "Validation is disabled in the configuration".yellow());
        return Ok(());
    }

    if verbose {
        eprintln!("{} {} objects", "Validating".cyan(), objects.len());
    }

    let orchestrator = Arc::new(build_orchestrator(config, sink));
    let chunk_size = objects.len().div_ceil(jobs.max(1)).max(1);

    let mut handles = Vec::new();
    for chunk in objects.chunks(chunk_size) {
        let chunk = chunk.to_vec();
        let orchestrator = Arc::clone(&orchestrator);
        let run = run.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            orchestrator.validate_batch(&chunk, &run)
        }));
    }

    let mut outcomes = Vec::with_capacity(objects.len());
    for handle in handles {
        outcomes.extend(handle.await.context("Validation worker panicked")?);
    }

    let skipped = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, BatchOutcome::Skipped { .. }))
        .count();
    let report = BatchOutcome::into_report(outcomes);

    if let Some(output) = output {
        report.save_to_file(output)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), output.display());
        }
    }

    print_report(&report, skipped);

    let below = config
        .min_score
        .map(|min| report.below(min).len())
        .unwrap_or(0);
    if below > 0 {
        eprintln!(
            "{}",
            format!("{} objects scored below the minimum score", below).red().bold()
        );
    }
    if below > 0 || report.summary.objects_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Classify command - print every attribute path of a class
fn classify_command(config: &EngineConfig, class: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config, Arc::new(TracingSink));
    let info = orchestrator.classifier().classify(class)?;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{} {}", "Class".bold().bright_blue(), info.name().bold());
    println!("{}", "=".repeat(60).bright_blue());

    for category in Category::ALL {
        let paths = info.attributes(category);
        if paths.is_empty() {
            continue;
        }
        println!();
        println!("{}", category.as_str().bold());
        for path in paths {
            println!("  {} {}", path.green(), format!("({})", info.attribute_label(path)).dimmed());
        }
    }

    for diagnostic in info.diagnostics() {
        println!("  [{}] {}: {}", diagnostic.severity, diagnostic.code, diagnostic.message);
    }
    Ok(())
}

/// Rules command - inspect or edit the rule store
fn rules_command(
    config: &EngineConfig,
    sink: Arc<dyn NotificationSink>,
    action: RulesCommand,
) -> Result<()> {
    let store = YamlRuleStore::new(config.rules_path(), sink);

    match action {
        RulesCommand::List { class } => {
            let classes = match class {
                Some(class) => vec![class],
                None => store.configured_classes(),
            };
            if classes.is_empty() {
                println!("{}", "No rules configured".yellow());
            }
            for class in classes {
                println!("{}", class.bold());
                for attribute in store.configured_attributes(&class) {
                    let Some(attribute_config) = store.attribute_config(&class, &attribute) else {
                        continue;
                    };
                    match &attribute_config.note {
                        Some(note) => println!("  {} {}", attribute.green(), format!("# {}", note).dimmed()),
                        None => println!("  {}", attribute.green()),
                    }
                    for (constraint, params) in &attribute_config.rules {
                        if params.is_null() {
                            println!("    {}", constraint);
                        } else {
                            println!("    {} {}", constraint, params);
                        }
                    }
                }
            }
            return Ok(());
        }
        RulesCommand::AddAttribute { class, attribute } => {
            store.add_class_attribute(&class, &attribute)?;
        }
        RulesCommand::RemoveAttribute { class, attribute } => {
            store.remove_class_attribute(&class, &attribute)?;
        }
        RulesCommand::SetConstraint {
            class,
            attribute,
            constraint,
            params,
        } => {
            store.add_or_modify_constraint(&class, &attribute, &constraint, params.as_deref())?;
        }
        RulesCommand::DeleteConstraint {
            class,
            attribute,
            constraint,
        } => {
            store.delete_constraint(&class, &attribute, &constraint)?;
        }
        RulesCommand::SetNote {
            class,
            attribute,
            note,
        } => {
            store.add_or_modify_note(&class, &attribute, Some(&note))?;
        }
        RulesCommand::DeleteNote { class, attribute } => {
            store.delete_note(&class, &attribute)?;
        }
    }

    println!("{} {}", "✓ Updated".green(), store.path().display());
    Ok(())
}

fn print_report(report: &Report, skipped: usize) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Data Quality Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    for result in &report.results {
        print_result(result);
    }

    for failure in &report.failures {
        println!(
            "{} {} {}: {}",
            "✗".red().bold(),
            failure.class_name,
            failure.object_id,
            failure.error.red()
        );
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  Validated:       {}", report.summary.objects_validated);
    println!("  Fully compliant: {}", report.summary.fully_compliant);
    println!("  Violations:      {}", report.summary.violations);
    if report.summary.objects_failed > 0 {
        println!("  Failed:          {}", report.summary.objects_failed.to_string().red().bold());
    }
    if skipped > 0 {
        println!("  Skipped:         {}", skipped);
    }
    if let Some(mean) = report.summary.mean_score {
        println!("  Mean score:      {:.1}%", mean * 100.0);
    }
    if report.summary.errors > 0 {
        println!("  Errors:          {}", report.summary.errors.to_string().red().bold());
    }
    if report.summary.warnings > 0 {
        println!("  Warnings:        {}", report.summary.warnings.to_string().yellow());
    }
}

fn print_result(result: &ValidationResult) {
    let percent = format!("{:.1}%", result.score.ratio() * 100.0);
    let score = format!("{} ({})", result.score, percent);
    let score = if result.score.is_perfect() {
        score.green()
    } else {
        score.yellow()
    };
    println!("{} {}  {}", result.class_name.bold(), result.object_id, score);

    for violation in result.violations_by_path.values().flatten() {
        let position = violation
            .value_index
            .map(|index| format!("[{}]", index))
            .unwrap_or_default();
        println!(
            "  {}{} {}: {}",
            violation.attribute_path,
            position,
            violation.constraint_name.red(),
            violation.reason
        );
    }

    for diagnostic in &result.diagnostics {
        let severity = match diagnostic.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN".yellow().bold(),
            Severity::Info => "INFO".cyan(),
        };
        println!("  [{}] {}: {}", severity, diagnostic.code, diagnostic.message);
    }
}
