// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod notify;
pub mod provision;
pub mod release;
pub mod remote;
pub mod shared;
pub mod types;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use is_terminal::IsTerminal;
use tracing::{debug, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{DeployConfig, load_and_validate};
use crate::engine::{Cleaner, DeployReport, Deployer};
use crate::errors::{Result, RolloutError};
use crate::notify::{DeployEvent, LogNotifier, Notifier, deliver, notifier_for};
use crate::provision::{ProvisionStep, StepOutcome};
use crate::release::{CleanupReport, Layout, RetentionPlan};
use crate::remote::{RemoteShell, shell_for};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + environment)
/// - confirmation prompt
/// - the remote shell for the target
/// - deploy / cleanup / releases
/// - the terminal notification for deploys
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.as_ref().map(PathBuf::from);
    let mut config = load_and_validate(config_path.as_deref(), |k| std::env::var(k).ok())?;

    match args.command {
        Command::Deploy {
            branch,
            yes,
            dry_run,
        } => {
            if let Some(branch) = branch.filter(|b| !b.trim().is_empty()) {
                config.repository.branch = branch;
            }

            if dry_run {
                print_dry_run(&config);
                return Ok(());
            }

            if !yes && !confirm_deploy(&config)? {
                println!("Aborted.");
                return Ok(());
            }

            let notifier: Box<dyn Notifier> = match notifier_for(&config) {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "notifier unavailable; falling back to log output");
                    Box::new(LogNotifier)
                }
            };

            let report = run_deploy(
                shell_for(&config.target),
                &config,
                notifier.as_ref(),
                Utc::now(),
            )
            .await?;
            print_deploy_report(&report);
            Ok(())
        }

        Command::Cleanup { keep, dry_run } => {
            let keep = keep.unwrap_or(config.retention.keep);
            if keep == 0 {
                return Err(RolloutError::Configuration(
                    "--keep must be >= 1 (got 0)".to_string(),
                ));
            }
            let layout = Layout::new(&config.target.dir);
            let mut cleaner = Cleaner::new(shell_for(&config.target), layout, keep);

            if dry_run {
                let plan = cleaner.plan().await?;
                print_retention_plan(&plan);
                return Ok(());
            }

            let report = cleaner.run().await?;
            print_cleanup_report(&report, keep);
            Ok(())
        }

        Command::Releases => {
            let layout = Layout::new(&config.target.dir);
            let mut cleaner = Cleaner::new(shell_for(&config.target), layout, config.retention.keep);
            let inventory = cleaner.inventory().await?;
            if inventory.releases.is_empty() {
                println!("no releases in {}", config.target.dir);
            }
            for release in inventory.states() {
                println!("{}  {}", release.id, release.state);
            }
            Ok(())
        }
    }
}

/// Run a deploy and send exactly one terminal notification for it.
pub async fn run_deploy<S: RemoteShell>(
    shell: S,
    config: &DeployConfig,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<DeployReport> {
    let result = Deployer::new(shell, config).deploy(now).await;

    let event = match &result {
        Ok(report) => DeployEvent::Succeeded {
            app: config.app.name.clone(),
            host: config.target.server.clone(),
            release: report.release.id.to_string(),
        },
        Err(e) => DeployEvent::Failed {
            app: config.app.name.clone(),
            host: config.target.server.clone(),
            phase: e.phase(),
            error: e.to_string(),
        },
    };
    deliver(notifier, &event).await;

    result
}

fn confirm_deploy(config: &DeployConfig) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Err(RolloutError::Configuration(
            "deploy needs confirmation but stdin is not a terminal; pass --yes".to_string(),
        ));
    }

    use dialoguer::Confirm;
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Deploy {} (branch '{}') to {}:{}?",
            config.app.name,
            config.repository.branch,
            config.target.destination(),
            config.target.dir
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn mask(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "********" }
}

/// Dry-run output: resolved configuration and the fixed step plan.
fn print_dry_run(config: &DeployConfig) {
    println!("rollout dry-run");
    println!("  target     = {}:{}", config.target.destination(), config.target.dir);
    if let Some(port) = config.target.port {
        println!("  port       = {port}");
    }
    println!(
        "  repository = {} (branch {})",
        config.repository.url, config.repository.branch
    );
    println!("  app        = {} [{}] {}", config.app.name, config.app.env, config.app.url);
    println!(
        "  database   = {}@{}/{} password={}",
        config.database.username,
        config.database.host,
        config.database.database,
        mask(&config.database.password)
    );
    println!(
        "  notify     = {}",
        if config.notify.slack_webhook_url.is_some() {
            "slack"
        } else {
            "log only"
        }
    );
    println!("  keep       = {}", config.retention.keep);
    println!();

    println!("steps:");
    println!("  - stage: clone into {}/<release>", config.target.dir);
    println!("  - reconcile: shared .env and storage/");
    println!("  - activate: point current at the new release");
    for step in ProvisionStep::ALL {
        match (step, &config.provision.seed) {
            (ProvisionStep::Seed, None) => println!("  - provision: {step} (not configured)"),
            (ProvisionStep::Seed, Some(seed)) => {
                println!("  - provision: {step} ({} when {} is empty)", seed.seeder, seed.table)
            }
            _ => println!("  - provision: {step}"),
        }
    }

    debug!("dry-run complete (no remote commands)");
}

fn print_deploy_report(report: &DeployReport) {
    println!("release {} is live", report.release.id);
    if let Some(previous) = &report.previous {
        println!("previous release {} is {}", previous.id, previous.state);
    }
    for (step, outcome) in &report.provision.steps {
        match outcome {
            StepOutcome::Ran => println!("  {step}: done"),
            StepOutcome::Skipped(reason) => println!("  {step}: skipped ({reason})"),
        }
    }
}

fn print_retention_plan(plan: &RetentionPlan) {
    for id in &plan.keep {
        let marker = if plan.active.as_ref() == Some(id) { " (active)" } else { "" };
        println!("keep    {id}{marker}");
    }
    for id in &plan.remove {
        println!("remove  {id}");
    }
}

fn print_cleanup_report(report: &CleanupReport, keep: usize) {
    println!(
        "Cleaned up all but the last {keep} releases: {} removed, {} kept.",
        report.removed.len(),
        report.plan.keep.len()
    );
    for (id, err) in &report.failed {
        println!("  could not remove {id}: {err}");
    }
}
