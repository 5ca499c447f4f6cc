//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{Audience, ImageModel, Language, Preferences};

/// ScienceSnap - science facts rendered as infographics
#[derive(Parser)]
#[command(
    name = "ss",
    about = "Turn a science topic into an AI-rendered infographic",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Keep the gallery in memory for this run only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive session (default)
    Repl,

    /// Generate one infographic non-interactively
    Generate {
        /// Topic (or concept with --concept)
        query: String,

        /// Treat the query as one concept and skip fact selection
        #[arg(long)]
        concept: bool,

        /// Fact number to render from the list (1-based)
        #[arg(short, long, default_value_t = 1)]
        pick: usize,

        /// Save the result to the gallery
        #[arg(short, long)]
        save: bool,

        /// Write the rendered image to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        prefs: PrefArgs,
    },

    /// List saved infographics
    Gallery {
        /// Only show this domain
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Edit a saved infographic's image with a text instruction
    Edit {
        /// Gallery item id
        id: String,

        /// What to change
        instruction: String,

        #[command(flatten)]
        prefs: PrefArgs,
    },
}

/// Per-run overrides of the configured preferences
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PrefArgs {
    /// Output language (en, fr)
    #[arg(long)]
    pub language: Option<Language>,

    /// Audience (young, adult)
    #[arg(long)]
    pub audience: Option<Audience>,

    /// Image model (flash, pro)
    #[arg(short, long)]
    pub model: Option<ImageModel>,
}

impl PrefArgs {
    /// Overlay the flags that were given onto the configured preferences
    pub fn apply(&self, base: Preferences) -> Preferences {
        Preferences {
            language: self.language.unwrap_or(base.language),
            audience: self.audience.unwrap_or(base.audience),
            image_model: self.model.unwrap_or(base.image_model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "ss", "generate", "volcanoes", "--pick", "2", "--save", "--language", "fr", "--model", "flash",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Generate {
                query,
                concept,
                pick,
                save,
                prefs,
                ..
            }) => {
                assert_eq!(query, "volcanoes");
                assert!(!concept);
                assert_eq!(pick, 2);
                assert!(save);
                assert_eq!(prefs.language, Some(Language::Fr));
                assert_eq!(prefs.model, Some(ImageModel::Flash));
                assert_eq!(prefs.audience, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_means_repl() {
        let cli = Cli::try_parse_from(["ss", "--ephemeral"]).unwrap();
        assert!(cli.ephemeral);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_pref_args_overlay() {
        let args = PrefArgs {
            audience: Some(Audience::Young),
            ..PrefArgs::default()
        };
        let base = Preferences {
            language: Language::Fr,
            audience: Audience::Adult,
            image_model: ImageModel::Flash,
        };

        let merged = args.apply(base);
        assert_eq!(merged.language, Language::Fr);
        assert_eq!(merged.audience, Audience::Young);
        assert_eq!(merged.image_model, ImageModel::Flash);
    }

    #[test]
    fn test_bad_language_rejected() {
        assert!(Cli::try_parse_from(["ss", "generate", "x", "--language", "de"]).is_err());
    }
}
