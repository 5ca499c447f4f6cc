//! REPL session management

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::task::JoinHandle;
use tracing::debug;

use super::view;
use crate::domain::{Preferences, SearchMode};
use crate::gallery::DomainFilter;
use crate::pipeline::{NavTarget, PipelineController, PipelineError, Stage, ViewState};

/// Interactive REPL session driving one pipeline controller
pub struct ReplSession {
    controller: PipelineController,
    prefs: Preferences,
    mode: SearchMode,
    preview_dir: PathBuf,
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(controller: PipelineController, prefs: Preferences) -> Self {
        Self {
            controller,
            prefs,
            mode: SearchMode::default(),
            preview_dir: std::env::temp_dir(),
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        let watcher = self.spawn_busy_watcher();

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let stage = self.controller.snapshot().stage();
            let readline = rl.readline(&format!("{} {} ", stage.to_string().dimmed(), ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.handle_text(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    watcher.abort();
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        watcher.abort();
        println!("Goodbye!");
        Ok(())
    }

    /// Print loading messages as the controller publishes them
    fn spawn_busy_watcher(&self) -> JoinHandle<()> {
        let mut rx = self.controller.subscribe();
        tokio::spawn(async move {
            let mut last: Option<String> = None;
            while rx.changed().await.is_ok() {
                let busy = rx.borrow_and_update().busy.clone();
                if busy != last {
                    if let Some(message) = &busy {
                        println!("{}", message.dimmed());
                    }
                    last = busy;
                }
            }
        })
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "ScienceSnap".bright_cyan().bold());
        println!("Type a topic to discover facts, {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        self.print_prefs();
        println!();
    }

    fn print_prefs(&self) {
        println!(
            "{}",
            format!(
                "mode: {}  language: {}  audience: {}  model: {}",
                self.mode, self.prefs.language, self.prefs.audience, self.prefs.image_model
            )
            .dimmed()
        );
    }

    /// Plain input: a fact number in Selection, otherwise a new query
    async fn handle_text(&mut self, input: &str) {
        let snapshot = self.controller.snapshot();
        if snapshot.stage() == Stage::Selection
            && let Ok(number) = input.parse::<usize>()
        {
            self.pick(number).await;
            return;
        }

        if snapshot.stage() != Stage::Input
            && let Err(e) = self.controller.navigate(NavTarget::Input).await
        {
            self.report(e);
            return;
        }

        match self.controller.submit_query(input, self.mode, self.prefs).await {
            Ok(()) => self.show(),
            Err(e) => self.report(e),
        }
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let (cmd, arg) = match input.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (input, ""),
        };
        debug!(%cmd, %arg, "handle_slash_command: called");

        match cmd {
            "/help" | "/h" => self.print_help(),
            "/quit" | "/q" | "/exit" => return SlashResult::Quit,
            "/prefs" => self.print_prefs(),
            "/mode" => set_option("mode", arg, &mut self.mode),
            "/lang" => set_option("language", arg, &mut self.prefs.language),
            "/audience" => set_option("audience", arg, &mut self.prefs.audience),
            "/model" => set_option("model", arg, &mut self.prefs.image_model),
            "/pick" => match arg.parse::<usize>() {
                Ok(number) => self.pick(number).await,
                Err(_) => println!("Usage: {}", "/pick N".yellow()),
            },
            "/regen" => match self.controller.regenerate(self.prefs).await {
                Ok(()) => self.show(),
                Err(e) => self.report(e),
            },
            "/save" => match self.controller.save().await {
                Ok(item) => {
                    println!("{} Saved {}", "✓".green(), item.id.dimmed());
                    self.show();
                }
                Err(e) => self.report(e),
            },
            "/back" => self.back().await,
            "/home" => match self.controller.navigate(NavTarget::Input).await {
                Ok(()) => self.show(),
                Err(e) => self.report(e),
            },
            "/gallery" | "/g" => match self.controller.navigate(NavTarget::Gallery).await {
                Ok(()) => self.show(),
                Err(e) => self.report(e),
            },
            "/filter" => self.filter(arg).await,
            "/show" => self.show_item(arg).await,
            "/edit" => self.edit(arg).await,
            "/new" => match self.controller.create_new() {
                Ok(()) => self.show(),
                Err(e) => self.report(e),
            },
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        SlashResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:22} Show this help", "/help".yellow());
        println!("  {:22} Exit the REPL", "/quit".yellow());
        println!("  {:22} Show current preferences", "/prefs".yellow());
        println!("  {:22} Search a domain or explain one concept", "/mode domain|concept".yellow());
        println!("  {:22} Output language", "/lang en|fr".yellow());
        println!("  {:22} Target audience", "/audience young|adult".yellow());
        println!("  {:22} Image model", "/model flash|pro".yellow());
        println!("  {:22} Render fact number N", "/pick N".yellow());
        println!("  {:22} Plan and render the same fact again", "/regen".yellow());
        println!("  {:22} Save the result to the gallery", "/save".yellow());
        println!("  {:22} Back to the fact list, or to input", "/back".yellow());
        println!("  {:22} Start over", "/home".yellow());
        println!("  {:22} Show the gallery", "/gallery".yellow());
        println!("  {:22} Filter the gallery by domain", "/filter [DOMAIN|All]".yellow());
        println!("  {:22} Show one gallery item", "/show ID".yellow());
        println!("  {:22} Edit a saved image", "/edit ID INSTRUCTION".yellow());
        println!("  {:22} Leave the gallery for a new infographic", "/new".yellow());
        println!();
        println!("Anything else is sent as a {} query.", self.mode);
        println!();
    }

    /// Fact numbers are shown from 1
    async fn pick(&mut self, number: usize) {
        let Some(index) = number.checked_sub(1) else {
            println!("{} Facts are numbered from 1", "!".yellow());
            return;
        };
        match self.controller.select_fact(index, self.prefs).await {
            Ok(()) => self.show(),
            Err(PipelineError::UnknownFact(_)) => {
                println!("{} No fact numbered {}", "!".yellow(), number);
            }
            Err(e) => self.report(e),
        }
    }

    async fn back(&mut self) {
        let target = match self.controller.snapshot().stage() {
            Stage::Result => NavTarget::Selection,
            _ => NavTarget::Input,
        };
        let result = match self.controller.navigate(target).await {
            Err(PipelineError::Unavailable { .. }) if target == NavTarget::Selection => {
                self.controller.navigate(NavTarget::Input).await
            }
            other => other,
        };
        match result {
            Ok(()) => self.show(),
            Err(e) => self.report(e),
        }
    }

    async fn filter(&mut self, arg: &str) {
        if let Err(e) = self.controller.refresh_gallery().await {
            self.report(e);
            return;
        }
        if arg.is_empty() {
            println!("Domains: {}", self.controller.gallery().filter_options().join(", "));
        } else {
            self.controller.set_filter(DomainFilter::from_label(arg));
            view::print_gallery(self.controller.gallery());
        }
    }

    async fn show_item(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("Usage: {}", "/show ID".yellow());
            return;
        }
        if let Err(e) = self.controller.refresh_gallery().await {
            self.report(e);
            return;
        }
        match self.controller.gallery().get(arg) {
            Some(item) => view::print_item(item),
            None => println!("{} No gallery item with id {}", "!".yellow(), arg),
        }
    }

    async fn edit(&mut self, arg: &str) {
        let Some((id, instruction)) = arg.split_once(char::is_whitespace) else {
            println!("Usage: {}", "/edit ID INSTRUCTION".yellow());
            return;
        };
        match self.controller.edit_item_image(id, instruction, self.prefs).await {
            Ok(image_ref) => {
                let location = if image_ref.is_remote() { image_ref.as_str() } else { "embedded image" };
                println!("{} Updated {} ({})", "✓".green(), id, location);
            }
            Err(e) => self.report(e),
        }
    }

    /// Render whatever view the controller is in now
    fn show(&self) {
        let snapshot = self.controller.snapshot();
        match &snapshot.state {
            ViewState::Input => println!("{}", "Type a topic to start.".dimmed()),
            ViewState::Selection { query, facts } => view::print_facts(query, facts),
            ViewState::Result(run) => {
                let path = self
                    .preview_dir
                    .join(format!("sciencesnap-preview.{}", run.image.extension()));
                match view::write_image(&run.image, &path) {
                    Ok(()) => view::print_run(run, Some(&path)),
                    Err(e) => {
                        println!("{} {}", "!".yellow(), e);
                        view::print_run(run, None);
                    }
                }
                println!("{} to keep it, {} for another take", "/save".yellow(), "/regen".yellow());
            }
            ViewState::Gallery => view::print_gallery(self.controller.gallery()),
            ViewState::Planning { .. } | ViewState::Generating { .. } => {}
        }
    }

    /// Rejections are the user's to fix; failures carry the controller's notice
    fn report(&self, err: PipelineError) {
        if err.is_rejection() {
            println!("{} {}", "!".yellow(), err);
            return;
        }
        match self.controller.snapshot().notice {
            Some(notice) => println!("{} {}", "✗".red(), notice),
            None => println!("{} {}", "✗".red(), err),
        }
    }
}

/// Print or update one preference-like option
fn set_option<T>(label: &str, arg: &str, slot: &mut T)
where
    T: FromStr<Err = String> + Display,
{
    if arg.is_empty() {
        println!("{}: {}", label, slot);
        return;
    }
    match arg.parse::<T>() {
        Ok(value) => {
            *slot = value;
            println!("{} {} set to {}", "✓".green(), label, slot);
        }
        Err(e) => println!("{} {}", "!".yellow(), e),
    }
}
