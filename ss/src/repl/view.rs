//! Terminal rendering of pipeline views

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use eyre::{Context, Result};

use crate::domain::{Fact, GalleryItem, ImageRef, RenderedImage};
use crate::gallery::GalleryView;
use crate::pipeline::CompletedRun;

const PLAN_PREVIEW_CHARS: usize = 240;

/// Local time, minute precision
pub fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// First `max` characters, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

fn source_label(image_ref: &ImageRef) -> ColoredString {
    if image_ref.is_remote() { "remote".green() } else { "local".yellow() }
}

/// Write the decoded image bytes to `path`
pub fn write_image(image: &RenderedImage, path: &Path) -> Result<()> {
    let bytes = image.decode().context("Image payload is not valid base64")?;
    fs::write(path, bytes).context(format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn print_facts(query: &str, facts: &[Fact]) {
    println!();
    println!("{} {}", "Facts about".bright_cyan(), query.bright_cyan().bold());
    for (i, fact) in facts.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("{:>2}.", i + 1).yellow(),
            fact.title.bold(),
            format!("[{}]", fact.domain).dimmed()
        );
        println!("      {}", preview(&fact.text, 160));
    }
    println!();
    println!("Type a number or {} to render a fact", "/pick N".yellow());
    println!();
}

pub fn print_run(run: &CompletedRun, image_path: Option<&Path>) {
    println!();
    println!("{} {}", run.fact.title.bright_cyan().bold(), format!("[{}]", run.fact.domain).dimmed());
    println!("{}", run.fact.text);
    println!();
    println!("{}", "Plan:".bright_cyan());
    println!("{}", preview(run.plan.as_str(), PLAN_PREVIEW_CHARS).dimmed());
    println!();
    if let Some(path) = image_path {
        println!("{} {}", "Image:".bright_cyan(), path.display());
    }
    println!();
}

pub fn print_gallery(view: &GalleryView) {
    println!();
    let visible = view.visible();
    println!(
        "{} {} {}",
        "Gallery".bright_cyan().bold(),
        format!("({} of {})", visible.len(), view.len()).dimmed(),
        format!("filter: {}", view.filter()).dimmed()
    );
    if visible.is_empty() {
        println!("{}", "Nothing saved here yet.".dimmed());
    }
    for item in visible {
        println!(
            "  {}  {}  {}  {}",
            format_timestamp(item.created_at).dimmed(),
            item.fact.title.bold(),
            format!("[{}]", item.fact.domain).dimmed(),
            source_label(&item.image_ref)
        );
        println!("      {}", item.id.dimmed());
    }
    println!("{} {}", "Domains:".dimmed(), view.filter_options().join(", ").dimmed());
    println!();
}

pub fn print_item(item: &GalleryItem) {
    println!();
    println!("{} {}", item.fact.title.bright_cyan().bold(), format!("[{}]", item.fact.domain).dimmed());
    println!("{} {}", "Saved:".dimmed(), format_timestamp(item.created_at));
    println!("{}", item.fact.text);
    println!();
    match &item.image_ref {
        ImageRef::Remote { url } => println!("{} {}", "Image:".bright_cyan(), url),
        ImageRef::Local { data_url } => println!(
            "{} embedded ({} bytes)",
            "Image:".bright_cyan(),
            data_url.len()
        ),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("  Tides  ", 10), "Tides");
    }

    #[test]
    fn test_preview_cuts_on_chars() {
        assert_eq!(preview("éléphant de mer", 8), "éléphant...");
    }

    #[test]
    fn test_format_timestamp_invalid() {
        assert_eq!(format_timestamp(i64::MAX), "-");
    }

    #[test]
    fn test_write_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");

        write_image(&RenderedImage::new("image/png", "SU1HMQ=="), &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"IMG1");
    }

    #[test]
    fn test_write_image_rejects_bad_payload() {
        let dir = TempDir::new().unwrap();
        let result = write_image(&RenderedImage::new("image/png", "not base64!"), &dir.path().join("x.png"));
        assert!(result.is_err());
    }
}
