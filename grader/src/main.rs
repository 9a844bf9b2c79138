use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use code_runner::NextestRunner;
use grader::artifacts;
use grader::cohort_run::run_cohort;
use grader::discovery::{self, IdentityRule};
use marker::cohort::CohortAggregator;
use marker::inventory::TestInventory;
use marker::types::Submission;
use tracing::{info, warn};
use tracing_appender::rolling;
use util::config::AppConfig;
use util::grading_config::GradingConfig;
use util::paths;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Folder holding one directory per submission (overrides SUBMISSIONS_ROOT)
    #[arg(long, global = true)]
    submissions: Option<String>,
    /// Submission folder prefix (overrides SUBMISSION_PREFIX)
    #[arg(long, global = true)]
    prefix: Option<String>,
    /// Where the cohort tables are written (overrides OUTPUT_DIR)
    #[arg(long, global = true)]
    output: Option<String>,
    /// Workspace the test runner is invoked from (overrides RUNNER_WORKDIR)
    #[arg(long, global = true)]
    workdir: Option<String>,
    /// Grading policy JSON (overrides GRADING_CONFIG)
    #[arg(long, global = true)]
    config: Option<String>,
    /// Log filter directive (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Only log to the log file
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grade every submission and write the cohort tables
    Grade {
        /// Only grade submissions whose identity or folder contains this text
        #[arg(long)]
        only: Option<String>,
    },
    /// Remove generated reports and runner output from submissions
    Clean {
        #[arg(long)]
        only: Option<String>,
    },
    /// Print the number of tests and tolerated failures per subgroup
    Inventory,
    /// Write the default grading policy to the config path
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn apply_overrides(cli: &Cli) {
    if let Some(v) = &cli.submissions {
        AppConfig::set_submissions_root(v.as_str());
    }
    if let Some(v) = &cli.prefix {
        AppConfig::set_submission_prefix(v.as_str());
    }
    if let Some(v) = &cli.output {
        AppConfig::set_output_dir(v.as_str());
    }
    if let Some(v) = &cli.workdir {
        AppConfig::set_runner_workdir(v.as_str());
    }
    if let Some(v) = &cli.config {
        AppConfig::set_grading_config(v.as_str());
    }
    if let Some(v) = &cli.log_level {
        AppConfig::set_log_level(v.as_str());
    }
    if cli.quiet {
        AppConfig::set_log_to_stdout(false);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    apply_overrides(&cli);

    let (log_file, log_level, log_to_stdout) = {
        let config = AppConfig::global();
        (config.log_file.clone(), config.log_level.clone(), config.log_to_stdout)
    };
    let _log_guard = init_logging(&log_file, &log_level, log_to_stdout);

    let config_path = paths::grading_config_path();
    if let Command::InitConfig { force } = cli.command {
        if config_path.exists() && !force {
            anyhow::bail!("{} already exists, use --force to replace it", config_path.display());
        }
        GradingConfig::default_config()
            .save(&config_path)
            .map_err(anyhow::Error::msg)?;
        info!("wrote default grading config to {}", config_path.display());
        return Ok(());
    }

    let config = GradingConfig::load(&config_path).map_err(anyhow::Error::msg)?;
    let runner = NextestRunner::new(config.runner.clone(), paths::runner_workdir());

    match cli.command {
        Command::Grade { only } => grade(&config, &runner, only).await,
        Command::Clean { only } => clean(&config, only),
        Command::Inventory => {
            let inventory = TestInventory::build(&runner, &config.policy)
                .await
                .context("Failed to build the test inventory")?;
            inventory.log_summary();
            Ok(())
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

fn discover(config: &GradingConfig) -> Result<Vec<Submission>> {
    let root = paths::submissions_root();
    let rule = IdentityRule::new(AppConfig::global().submission_prefix.clone());
    discovery::discover_submissions(&root, &rule, &config.runner.artifact_file_name)
        .with_context(|| format!("Failed to list submissions in {}", root.display()))
}

async fn grade(config: &GradingConfig, runner: &NextestRunner, only: Option<String>) -> Result<()> {
    let timestamp = paths::run_timestamp(Local::now());

    let inventory = TestInventory::build(runner, &config.policy)
        .await
        .context("Failed to build the test inventory")?;
    inventory.log_summary();

    let submissions = discover(config)?;
    info!("found {} submissions", submissions.len());
    discovery::find_duplicate_artifacts(&submissions);

    let mut aggregator = CohortAggregator::new();
    let summary = run_cohort(
        &submissions,
        discovery::selection(only),
        &inventory,
        runner,
        &mut aggregator,
    )
    .await;

    let (results, tests) = artifacts::write_cohort_tables(
        &paths::output_dir(),
        &timestamp,
        &aggregator.finalize(),
        &inventory,
    )
    .context("Failed to write the cohort tables")?;

    info!(
        "graded {}, failed {}, skipped {}",
        summary.graded.len(),
        summary.failed.len(),
        summary.skipped
    );
    for (identity, reason) in &summary.failed {
        warn!("not graded: {identity}: {reason}");
    }
    info!("wrote {} and {}", results.display(), tests.display());

    Ok(())
}

fn clean(config: &GradingConfig, only: Option<String>) -> Result<()> {
    let select = discovery::selection(only);
    for submission in discover(config)?.iter().filter(|s| select(s)) {
        artifacts::clear_submission_artifacts(&submission.dir)
            .with_context(|| format!("Failed to clean {}", submission.dir.display()))?;
        info!("cleaned {}", submission.identity);
    }
    Ok(())
}

fn init_logging(
    log_file: &str,
    log_level: &str,
    log_to_stdout: bool,
) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false);

    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("grader=info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if log_to_stdout {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
