//! Facts and plans

use std::fmt;

use serde::{Deserialize, Serialize};

/// A short scientific fact produced by the generation client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub title: String,
    pub domain: String,
    pub text: String,
}

impl Fact {
    pub fn new(title: impl Into<String>, domain: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            domain: domain.into(),
            text: text.into(),
        }
    }

    /// All three fields carry text
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.domain.trim().is_empty() && !self.text.trim().is_empty()
    }
}

/// Layout description for one infographic
///
/// Opaque to the pipeline: produced by plan generation, consumed by image
/// generation and shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan(String);

impl Plan {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Plan {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
