use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modeldoctor_catalog::{CachingSchemaInspector, SchemaMetadataProvider, SnapshotProvider};
use modeldoctor_core::{Config, ModelRegistry, SchemaSnapshot};
use modeldoctor_engine::{DetectorRegistry, Runner};

const DEFAULT_CONFIG: &str = "modeldoctor.toml";

/// ModelDoctor - find disagreements between database constraints and model validations
#[derive(Parser)]
#[command(name = "modeldoctor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: modeldoctor.toml)
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
    /// Run detectors and print one line per problem
    Check {
        /// Model snapshot (models.json)
        #[arg(short, long)]
        models: PathBuf,

        /// Schema snapshot (schema.json); takes precedence over --database-url
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Inspect a live PostgreSQL database instead of a snapshot
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: Option<String>,

        /// Run only these detectors (repeatable)
        #[arg(short, long = "detector", value_name = "ID")]
        detectors: Vec<String>,

        /// Also write a JSON report
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List available detectors and their options
    List,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = DetectorRegistry::builtin();
    let config = load_config(cli.config.as_deref(), cli.verbose)?
        .prepare(&registry.schemas())
        .context("Invalid configuration")?;

    match cli.command {
        Commands::Check {
            models,
            schema,
            database_url,
            detectors,
            report,
        } => {
            let success = check_command(
                &registry,
                &config,
                &models,
                schema.as_deref(),
                database_url.as_deref(),
                detectors,
                report.as_deref(),
                cli.verbose,
            )?;

            // Exit with error code if any detector failed
            if !success {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::List => {
            list_command(&registry);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        return Config::from_file(default)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

/// Check command - run detectors, returning overall success
#[allow(clippy::too_many_arguments)]
fn check_command(
    registry: &DetectorRegistry,
    config: &Config,
    models_path: &Path,
    schema_path: Option<&Path>,
    database_url: Option<&str>,
    detectors: Vec<String>,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<bool> {
    if let Some(unknown) = detectors.iter().find(|id| !registry.contains(id)) {
        anyhow::bail!(
            "Unknown detector '{}'. Run 'modeldoctor list' to see available detectors.",
            unknown
        );
    }

    if verbose {
        eprintln!("{} {}", "Loading models from:".cyan(), models_path.display());
    }
    let models = ModelRegistry::from_file(models_path)
        .with_context(|| format!("Failed to load models from {}", models_path.display()))?;

    let provider = open_provider(schema_path, database_url, verbose)?;
    let inspector = CachingSchemaInspector::new(provider.as_ref());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = Runner::new(registry, config)
        .only(detectors)
        .run(&inspector, &models, &mut out)?;

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    if verbose {
        let summary = &report.summary;
        let status = if report.is_success() {
            "✓ No problems found".green()
        } else {
            format!("✗ {} problems", summary.problems).red()
        };
        eprintln!(
            "{} ({} detectors run, {} failed)",
            status, summary.detectors_run, summary.detectors_failed
        );
    }

    Ok(report.is_success())
}

fn open_provider(
    schema_path: Option<&Path>,
    database_url: Option<&str>,
    verbose: bool,
) -> Result<Box<dyn SchemaMetadataProvider>> {
    if let Some(path) = schema_path {
        if verbose {
            eprintln!("{} {}", "Loading schema from:".cyan(), path.display());
        }
        let snapshot = SchemaSnapshot::from_file(path)
            .with_context(|| format!("Failed to load schema from {}", path.display()))?;
        return Ok(Box::new(SnapshotProvider::from_snapshot(snapshot)));
    }

    match database_url {
        Some(url) => connect(url, verbose),
        None => anyhow::bail!("Either --schema or --database-url (or DATABASE_URL) is required"),
    }
}

#[cfg(feature = "postgres")]
fn connect(url: &str, verbose: bool) -> Result<Box<dyn SchemaMetadataProvider>> {
    if verbose {
        eprintln!("{}", "Connecting to PostgreSQL...".cyan());
    }
    let provider = modeldoctor_catalog::PostgresProvider::connect(url)
        .context("Failed to connect to database")?;
    Ok(Box::new(provider))
}

#[cfg(not(feature = "postgres"))]
fn connect(_url: &str, _verbose: bool) -> Result<Box<dyn SchemaMetadataProvider>> {
    anyhow::bail!("PostgreSQL support not enabled. Rebuild with --features postgres")
}

/// List command - print every detector with its options
fn list_command(registry: &DetectorRegistry) {
    for (_, detector) in registry.detectors() {
        let info = detector.info();
        println!("{} - {}", info.identifier.bold(), info.description);

        for option in info.schema.options() {
            let scope = if option.global { " (global)" } else { "" };
            println!("  {}{}: {}", option.name.cyan(), scope, option.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_check_command() {
        let cli = Cli::try_parse_from([
            "modeldoctor",
            "-v",
            "check",
            "--models",
            "models.json",
            "--schema",
            "schema.json",
            "-d",
            "incorrect_length_validation",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Check {
                models,
                schema,
                detectors,
                report,
                ..
            } => {
                assert_eq!(models, PathBuf::from("models.json"));
                assert_eq!(schema, Some(PathBuf::from("schema.json")));
                assert_eq!(detectors, vec!["incorrect_length_validation"]);
                assert_eq!(report, None);
            }
            Commands::List => panic!("expected check"),
        }
    }

    #[test]
    fn unknown_detector_is_rejected() {
        let registry = DetectorRegistry::builtin();
        let config = Config::default().prepare(&registry.schemas()).unwrap();

        let err = check_command(
            &registry,
            &config,
            Path::new("models.json"),
            None,
            None,
            vec!["missing_foreign_keys".to_string()],
            None,
            false,
        )
        .unwrap_err();

        assert!(err.to_string().contains("missing_foreign_keys"));
    }
}
