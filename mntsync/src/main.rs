use anyhow::Context;
use clap::Parser;
use mntsync_core::cli::{Cli, Command, ShowCommand};
use mntsync_core::config::{self, FileConfig, DEFAULT_CONFIG_PATH};
use mntsync_core::manifest::Manifest;
use mntsync_core::mountpoint::{CommandLiveState, Grammar};
use mntsync_core::mounttab::MountTable;
use mntsync_core::{apply, logging, Outcome, PlatformConfig};
use mntsync_hal::LinuxHal;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let file = FileConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if cli.config.is_some() && file.is_none() {
        anyhow::bail!("config file {} does not exist", config_path.display());
    }

    let config = config::resolve(cli.platform.as_deref(), file.as_ref(), &LinuxHal::new())?;
    let hal = LinuxHal::with_timeout(config.command_timeout);

    if cli.dry_run {
        log::info!("DRY RUN: no commands will run and no files will be written");
    }

    match &cli.command {
        Command::Mountpoint(args) => {
            let outcome = apply::apply_mountpoint(&hal, &config, &args.to_spec(), cli.dry_run)?;
            print_outcomes(&[outcome], cli.json)?;
        }
        Command::Mounttab(args) => {
            let outcome = apply::apply_mounttab(&config, &args.to_spec(), cli.dry_run)?;
            print_outcomes(&[outcome], cli.json)?;
        }
        Command::Apply { manifest } => {
            let manifest = Manifest::load(manifest)?;
            let outcomes = apply::apply_manifest(&hal, &config, &manifest, cli.dry_run)?;
            print_outcomes(&outcomes, cli.json)?;
        }
        Command::Show { what } => match what {
            ShowCommand::Live => show_live(&hal, &config, cli.json)?,
            ShowCommand::Table { target } => {
                let path = target.as_deref().unwrap_or(config.table_path.as_path());
                show_table(path, &config, cli.json)?;
            }
        },
    }
    Ok(())
}

fn print_outcomes(outcomes: &[Outcome], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcomes)?);
        return Ok(());
    }
    for outcome in outcomes {
        println!("{}", outcome);
    }
    let changed = outcomes.iter().filter(|o| o.is_change()).count();
    println!("{} of {} resources changed", changed, outcomes.len());
    Ok(())
}

fn show_live(hal: &LinuxHal, config: &PlatformConfig, json: bool) -> anyhow::Result<()> {
    let grammar = Grammar::for_platform(&config.platform)?;
    let index = CommandLiveState::new(hal, grammar, &config.mount_program).snapshot()?;
    let entries = index.sorted();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in entries {
        println!(
            "{} on {} type {} ({})",
            entry.device,
            entry.mount_point,
            entry.fstype.as_deref().unwrap_or("-"),
            entry.options.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn show_table(path: &Path, config: &PlatformConfig, json: bool) -> anyhow::Result<()> {
    let table = MountTable::load(path, &config.schema)?;
    if json {
        let entries: Vec<serde_json::Map<String, serde_json::Value>> = table
            .entries()
            .map(|record| {
                record
                    .values()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
                    .collect()
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for record in table.entries() {
        let fields: Vec<String> = config
            .schema
            .fields()
            .iter()
            .filter_map(|f| record.get(f).map(|v| format!("{}={}", f, v)))
            .collect();
        println!("{}", fields.join(" "));
    }
    Ok(())
}
