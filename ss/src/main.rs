//! ScienceSnap - science facts rendered as infographics
//!
//! CLI entry point: interactive session or one-shot generate/gallery/edit.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use gallerystore::GalleryStore;
use sciencesnap::cli::{Cli, Command, PrefArgs};
use sciencesnap::config::Config;
use sciencesnap::domain::{Preferences, SearchMode};
use sciencesnap::gallery::{DomainFilter, GalleryBackend, GalleryView, MemoryGallery};
use sciencesnap::generation::LlmGenerator;
use sciencesnap::llm::{create_client, create_image_client};
use sciencesnap::pipeline::{PipelineController, PipelineError, ViewState};
use sciencesnap::prompts::PromptLoader;
use sciencesnap::repl::{self, view};
use sciencesnap::upload::StorageGateway;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sciencesnap")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("sciencesnap.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Wire the model clients, image host and gallery into a controller
fn build_controller(config: &Config, ephemeral: bool) -> Result<PipelineController> {
    debug!(ephemeral, "build_controller: called");
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let images = create_image_client(&config.image).context("Failed to create image client")?;
    let prompts = Arc::new(PromptLoader::new(std::env::current_dir()?));
    let generator = Arc::new(LlmGenerator::new(
        llm,
        images,
        prompts,
        config.image.clone(),
        config.llm.max_tokens,
    ));

    let gateway = StorageGateway::from_config(&config.upload);
    let store = open_store(config, ephemeral)?;

    Ok(PipelineController::new(generator, gateway, store))
}

fn open_store(config: &Config, ephemeral: bool) -> Result<Arc<dyn GalleryBackend>> {
    if ephemeral {
        info!("Using an in-memory gallery");
        return Ok(Arc::new(MemoryGallery::new()));
    }
    let path = &config.storage.gallery_dir;
    let store = GalleryStore::open(path).context(format!("Failed to open gallery at {}", path))?;
    Ok(Arc::new(store))
}

/// Turn a failed operation into an error carrying the user-facing notice
fn pipeline_error(controller: &PipelineController, err: PipelineError) -> eyre::Report {
    match controller.snapshot().notice {
        Some(notice) if !err.is_rejection() => eyre::eyre!("{}", notice),
        _ => eyre::eyre!(err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        upload = %config.upload.provider,
        "ScienceSnap loaded config"
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Repl) => {
            let controller = build_controller(&config, cli.ephemeral)?;
            repl::run_interactive(controller, config.preferences).await
        }
        Some(Command::Generate {
            query,
            concept,
            pick,
            save,
            output,
            prefs,
        }) => {
            let mut controller = build_controller(&config, cli.ephemeral)?;
            let prefs = prefs.apply(config.preferences);
            cmd_generate(&mut controller, &query, concept, pick, save, output, prefs).await
        }
        Some(Command::Gallery { domain }) => {
            // Listing needs no model clients
            let store = open_store(&config, cli.ephemeral)?;
            cmd_gallery(store.as_ref(), domain.as_deref()).await
        }
        Some(Command::Edit { id, instruction, prefs }) => {
            let mut controller = build_controller(&config, cli.ephemeral)?;
            cmd_edit(&mut controller, &id, &instruction, &prefs, config.preferences).await
        }
    }
}

async fn cmd_generate(
    controller: &mut PipelineController,
    query: &str,
    concept: bool,
    pick: usize,
    save: bool,
    output: Option<PathBuf>,
    prefs: Preferences,
) -> Result<()> {
    debug!(%query, concept, pick, save, "cmd_generate: called");
    let mode = if concept { SearchMode::Concept } else { SearchMode::Domain };

    controller
        .submit_query(query, mode, prefs)
        .await
        .map_err(|e| pipeline_error(controller, e))?;

    if let ViewState::Selection { query, facts } = controller.snapshot().state {
        view::print_facts(&query, &facts);
        let index = pick.checked_sub(1).ok_or_else(|| eyre::eyre!("Facts are numbered from 1"))?;
        println!("Rendering fact {}...", pick);
        controller
            .select_fact(index, prefs)
            .await
            .map_err(|e| pipeline_error(controller, e))?;
    }

    let ViewState::Result(run) = controller.snapshot().state else {
        return Err(eyre::eyre!("Generation did not produce an infographic"));
    };

    if let Some(path) = &output {
        view::write_image(&run.image, path)?;
    }
    view::print_run(&run, output.as_deref());

    if save {
        let item = controller.save().await.map_err(|e| pipeline_error(controller, e))?;
        let location = if item.image_ref.is_remote() { item.image_ref.as_str() } else { "embedded image" };
        println!("{} Saved {} ({})", "✓".green(), item.id, location);
    }
    Ok(())
}

async fn cmd_gallery(store: &dyn GalleryBackend, domain: Option<&str>) -> Result<()> {
    debug!(?domain, "cmd_gallery: called");
    let records = store.snapshot().await.context("Failed to read the gallery")?;
    let mut gallery = GalleryView::new();
    gallery.refresh(records);
    if let Some(domain) = domain {
        gallery.set_filter(DomainFilter::from_label(domain));
    }
    view::print_gallery(&gallery);
    Ok(())
}

async fn cmd_edit(
    controller: &mut PipelineController,
    id: &str,
    instruction: &str,
    prefs: &PrefArgs,
    base: Preferences,
) -> Result<()> {
    debug!(%id, "cmd_edit: called");
    let image_ref = controller
        .edit_item_image(id, instruction, prefs.apply(base))
        .await
        .map_err(|e| pipeline_error(controller, e))?;

    let location = if image_ref.is_remote() { image_ref.as_str() } else { "embedded image" };
    println!("{} Updated {} ({})", "✓".green(), id, location);
    Ok(())
}
