//! View states and the snapshot observers see

use std::fmt;

use crate::domain::{Fact, Plan, RenderedImage};

/// Plain stage tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Input,
    Selection,
    Planning,
    Generating,
    Result,
    Gallery,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Selection => "selection",
            Stage::Planning => "planning",
            Stage::Generating => "generating",
            Stage::Result => "result",
            Stage::Gallery => "gallery",
        };
        write!(f, "{}", name)
    }
}

/// A fact with its finished plan and image
///
/// Only ever built once both generation calls succeeded, so holding one is
/// proof that a save has everything it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRun {
    pub fact: Fact,
    pub plan: Plan,
    pub image: RenderedImage,
}

/// What the presentation layer shows, with the data each view needs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Input,
    Selection {
        query: String,
        facts: Vec<Fact>,
    },
    Planning {
        fact: Fact,
    },
    Generating {
        fact: Fact,
    },
    Result(CompletedRun),
    Gallery,
}

impl ViewState {
    pub fn stage(&self) -> Stage {
        match self {
            ViewState::Input => Stage::Input,
            ViewState::Selection { .. } => Stage::Selection,
            ViewState::Planning { .. } => Stage::Planning,
            ViewState::Generating { .. } => Stage::Generating,
            ViewState::Result(_) => Stage::Result,
            ViewState::Gallery => Stage::Gallery,
        }
    }

    /// The fact being worked on, if any
    pub fn fact(&self) -> Option<&Fact> {
        match self {
            ViewState::Planning { fact } | ViewState::Generating { fact } => Some(fact),
            ViewState::Result(run) => Some(&run.fact),
            _ => None,
        }
    }
}

/// Where `navigate` may go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Input,
    Selection,
    Gallery,
}

/// Which operation a notice reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    FactsFailed,
    ConceptFailed,
    ImageFailed,
    SaveFailed,
    EditFailed,
}

/// A user-visible, non-fatal failure message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Everything an observer needs to render the current moment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub state: ViewState,
    /// Loading message while a call is in flight
    pub busy: Option<String>,
    /// Last failure, cleared when the next operation starts
    pub notice: Option<Notice>,
}

impl Snapshot {
    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_input() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.stage(), Stage::Input);
        assert!(!snapshot.is_busy());
        assert!(snapshot.notice.is_none());
    }

    #[test]
    fn test_fact_accessor() {
        let fact = Fact::new("Io", "Astronomy", "Volcanic moon.");
        assert_eq!(ViewState::Planning { fact: fact.clone() }.fact(), Some(&fact));

        let run = CompletedRun {
            fact: fact.clone(),
            plan: Plan::new("PLAN"),
            image: RenderedImage::new("image/png", "AAAA"),
        };
        assert_eq!(ViewState::Result(run).fact(), Some(&fact));
        assert_eq!(ViewState::Gallery.fact(), None);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Generating.to_string(), "generating");
        assert_eq!(
            ViewState::Selection {
                query: "q".to_string(),
                facts: vec![]
            }
            .stage(),
            Stage::Selection
        );
    }
}
