use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use gallerystore::cli::{Cli, Command};
use gallerystore::{GalleryRecord, GalleryStore};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn source_label(record: &GalleryRecord) -> ColoredString {
    if record.is_remote() { "remote".green() } else { "local".yellow() }
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let store_path = cli.store.unwrap_or_else(gallerystore::default_store_path);
    let store = GalleryStore::open(&store_path).context(format!("Failed to open store at {}", store_path.display()))?;

    info!("gallerystore opened at {}", store_path.display());

    match cli.command {
        Command::List { domain } => {
            let mut records = store.snapshot()?;
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            let records: Vec<_> = records
                .into_iter()
                .filter(|r| domain.as_ref().is_none_or(|d| &r.domain == d))
                .collect();

            if records.is_empty() {
                println!("No infographics found");
            } else {
                for r in records {
                    println!(
                        "{} {} {} {} [{}]",
                        format_timestamp(r.timestamp).dimmed(),
                        r.id.yellow(),
                        r.domain.cyan(),
                        r.title,
                        source_label(&r)
                    );
                }
            }
        }
        Command::Show { id } => {
            let record = store
                .get(&id)?
                .ok_or_else(|| eyre::eyre!("Record not found: {}", id))?;
            println!("{} {}", "Title:".bold(), record.title);
            println!("{} {}", "Domain:".bold(), record.domain.cyan());
            println!("{} {}", "Created:".bold(), format_timestamp(record.timestamp));
            println!("{} {}", "Image:".bold(), source_label(&record));
            if record.is_remote() {
                println!("  {}", record.image_url);
            } else {
                println!("  inline, {} bytes", record.image_url.len());
            }
            println!();
            println!("{}", record.text);
            println!();
            println!("{}", "Plan:".bold());
            println!("{}", record.plan);
        }
        Command::Domains => {
            let domains: BTreeSet<String> = store.snapshot()?.into_iter().map(|r| r.domain).collect();
            for d in domains {
                println!("{}", d);
            }
        }
        Command::Compact => {
            let stats = store.compact()?;
            println!(
                "{} Compacted {} entries into {} records",
                "✓".green(),
                stats.entries_before,
                stats.records
            );
        }
    }

    Ok(())
}
