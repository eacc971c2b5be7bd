use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use strata_sdk::{
    EntryId, EntryState, EntryStatus, Project, ProjectConfig, RunOutcome, SdkError, ValidationResult,
};

use crate::cli::*;
use crate::runner::ProcessInvoker;

/// Run one command. `Ok(false)` means the command ran but the outcome is a
/// failure (violations, or an entry that failed).
pub async fn run_command(cli: Cli) -> anyhow::Result<bool> {
    let format = cli.format;
    match &cli.command {
        Command::Validate(args) => cmd_validate(&cli, args, format),
        Command::Check(_) => cmd_check(&cli, format),
        Command::Status(_) => cmd_status(&cli, format),
        Command::Plan(_) => cmd_plan(&cli, format),
        Command::Show(args) => cmd_show(&cli, args, format),
        Command::Apply(args) => cmd_apply(&cli, args, format).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ProjectConfig> {
    let mut config = ProjectConfig::load(&cli.root)?;
    if let Some(ledger) = &cli.ledger {
        config.ledger = ledger.clone();
    }
    Ok(config)
}

fn open(cli: &Cli) -> anyhow::Result<Project> {
    Ok(Project::open_with_config(&cli.root, load_config(cli)?))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_violations(result: &ValidationResult) {
    eprintln!(
        "{} {} violation(s)",
        "✗".red().bold(),
        result.len().to_string().bold()
    );
    for violation in result {
        eprintln!("  {}", violation.to_string().red());
    }
}

/// Report a validation failure in the requested format.
fn report_invalid(result: &ValidationResult, format: OutputFormat) -> anyhow::Result<bool> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Text => print_violations(result),
    }
    Ok(false)
}

fn cmd_validate(cli: &Cli, args: &ValidateArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let mut config = load_config(cli)?;
    if args.no_assets {
        config.check_assets = false;
    }
    let project = Project::open_with_config(&cli.root, config);
    let (ledger, _) = project.load()?;
    let result = project.validate()?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text if result.is_valid() => println!(
            "{} {} entries, no violations",
            "✓".green().bold(),
            ledger.len().to_string().bold()
        ),
        OutputFormat::Text => print_violations(&result),
    }
    Ok(result.is_valid())
}

fn cmd_check(cli: &Cli, format: OutputFormat) -> anyhow::Result<bool> {
    let result = open(cli)?.validate()?;
    if result.is_valid() {
        return Ok(true);
    }
    report_invalid(&result, format)
}

fn cmd_status(cli: &Cli, format: OutputFormat) -> anyhow::Result<bool> {
    let status = open(cli)?.status()?;
    if format == OutputFormat::Json {
        print_json(&status)?;
        return Ok(status.validation.is_valid());
    }

    match status.last_applied_at {
        Some(at) => println!(
            "Applied ({}), last at {}",
            status.applied.len().to_string().bold(),
            at.to_rfc3339().dimmed()
        ),
        None => println!("Applied ({})", status.applied.len().to_string().bold()),
    }
    for id in &status.applied {
        println!("  {} {}", "✓".green(), id);
    }

    println!("Pending ({})", status.pending.len().to_string().bold());
    for id in &status.pending {
        println!("  {} {}", "•".yellow(), id.to_string().yellow());
    }

    println!("Tags ({})", status.tags.len().to_string().bold());
    for (name, record) in &status.tags {
        match &record.removed_by {
            Some(remover) => println!(
                "  {} {} {}",
                name.to_string().dimmed().strikethrough(),
                format!("from {}", record.produced_by).dimmed(),
                format!("removed by {remover}").red()
            ),
            None => println!(
                "  {} {}",
                name.to_string().cyan(),
                format!("from {}", record.produced_by).dimmed()
            ),
        }
    }

    if !status.validation.is_valid() {
        print_violations(&status.validation);
    }
    Ok(status.validation.is_valid())
}

fn cmd_plan(cli: &Cli, format: OutputFormat) -> anyhow::Result<bool> {
    let plan = match open(cli)?.plan() {
        Ok(plan) => plan,
        Err(SdkError::Invalid(result)) => return report_invalid(&result, format),
        Err(e) => return Err(e.into()),
    };
    print_plan(&plan, format)?;
    Ok(true)
}

fn print_plan(plan: &[EntryId], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&plan)?,
        OutputFormat::Text if plan.is_empty() => println!("{} Nothing to apply.", "✓".green()),
        OutputFormat::Text => {
            for (step, id) in plan.iter().enumerate() {
                println!("{:>4}. {}", step + 1, id.to_string().yellow());
            }
        }
    }
    Ok(())
}

fn cmd_show(cli: &Cli, args: &ShowArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let id = EntryId::new(args.id.as_str())?;
    let report = open(cli)?.show(&id)?;
    if format == OutputFormat::Json {
        print_json(&report)?;
        return Ok(true);
    }

    let entry = &report.entry;
    let state = match report.status {
        EntryStatus::Applied => "applied".green(),
        EntryStatus::Pending => "pending".yellow(),
    };
    println!("{} ({}, {})", entry.id().to_string().bold(), entry.kind(), state);
    if !entry.description().is_empty() {
        println!("  {}", entry.description());
    }
    println!("  Source: {}", entry.source().blue());
    let list = |tags: Vec<String>| if tags.is_empty() { "-".to_string() } else { tags.join(", ") };
    println!("  Emits: {}", list(entry.emits().iter().map(|t| t.to_string()).collect()));
    println!("  Depends:");
    for tag in entry.depends() {
        match report.producers.get(tag) {
            Some(producer) => println!("    {} {}", tag.to_string().cyan(), format!("from {producer}").dimmed()),
            None => println!("    {} {}", tag.to_string().cyan(), "unresolved".red()),
        }
    }
    if !entry.removes().is_empty() {
        println!("  Removes: {}", list(entry.removes().iter().map(|t| t.to_string()).collect()));
    }
    println!(
        "  Dependents: {}",
        list(report.dependents.iter().map(|d| d.to_string()).collect())
    );
    println!("  Fingerprint: {}", report.fingerprint.dimmed());
    Ok(true)
}

fn runner_path(runner: &Path) -> anyhow::Result<PathBuf> {
    // Relative paths with a directory part resolve against the caller's
    // directory; bare names go through PATH.
    if runner.is_relative() && runner.components().count() > 1 {
        let cwd = std::env::current_dir().context("cannot read current directory")?;
        return Ok(cwd.join(runner));
    }
    Ok(runner.to_path_buf())
}

async fn cmd_apply(cli: &Cli, args: &ApplyArgs, format: OutputFormat) -> anyhow::Result<bool> {
    if args.dry_run {
        return cmd_plan(cli, format);
    }

    let mut project = open(cli)?;
    if args.timeout.is_some() {
        project.set_entry_timeout(args.timeout);
    }

    let invoker = ProcessInvoker::new(runner_path(&args.runner)?, &cli.root);
    let summary = match project.migrate(&invoker).await {
        Ok(summary) => summary,
        Err(SdkError::Invalid(result)) => return report_invalid(&result, format),
        Err(e) => return Err(e.into()),
    };

    if format == OutputFormat::Json {
        let states: Vec<_> = summary
            .states
            .iter()
            .map(|(id, state)| json!({ "entry": id, "state": state }))
            .collect();
        print_json(&json!({
            "applied": summary.applied,
            "states": states,
            "outcome": summary.outcome,
        }))?;
        return Ok(summary.is_success());
    }

    if summary.is_noop() {
        println!("{} Nothing to apply.", "✓".green());
        return Ok(true);
    }
    for (id, state) in &summary.states {
        let mark = match state {
            EntryState::Applied => "✓".green(),
            EntryState::Failed => "✗".red(),
            EntryState::Pending | EntryState::Applying => "•".dimmed(),
        };
        println!("  {mark} {id}");
    }
    match &summary.outcome {
        RunOutcome::Completed => {
            println!(
                "{} Applied {} entries.",
                "✓".green().bold(),
                summary.applied.len().to_string().bold()
            );
        }
        RunOutcome::Failed { entry, cause } => {
            eprintln!("{} {} failed: {}", "✗".red().bold(), entry.to_string().bold(), cause);
        }
    }
    Ok(summary.is_success())
}
