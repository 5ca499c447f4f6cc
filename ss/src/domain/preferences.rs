//! User preferences that shape every generation call

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output language for facts and plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    /// Short language code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Language name as written into prompts
    pub fn name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Fr => "French",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Language::from_str: called");
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "fr" | "french" | "francais" | "français" => Ok(Self::Fr),
            other => Err(format!("Unknown language '{}'. Supported: en, fr", other)),
        }
    }
}

/// Who the infographic is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Young,
    Adult,
}

impl Audience {
    /// Audience description used in prompts
    pub fn description(&self) -> &'static str {
        match self {
            Self::Young => "curious kids aged 8 to 12, using simple words, playful analogies and a sense of wonder",
            Self::Adult => "curious adults and lifelong learners, using precise terminology and concrete numbers",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Young => write!(f, "young"),
            Self::Adult => write!(f, "adult"),
        }
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "young" | "kids" => Ok(Self::Young),
            "adult" | "adults" => Ok(Self::Adult),
            other => Err(format!("Unknown audience '{}'. Supported: young, adult", other)),
        }
    }
}

/// Image model variant
///
/// The concrete model ids live in the image config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageModel {
    Flash,
    #[default]
    Pro,
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flash => write!(f, "flash"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for ImageModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flash" => Ok(Self::Flash),
            "pro" => Ok(Self::Pro),
            other => Err(format!("Unknown image model '{}'. Supported: flash, pro", other)),
        }
    }
}

/// How a query is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// A broad domain: generate several facts to choose from
    #[default]
    Domain,
    /// A single concept: generate one fact and go straight to rendering
    Concept,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain => write!(f, "domain"),
            Self::Concept => write!(f, "concept"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "domain" => Ok(Self::Domain),
            "concept" => Ok(Self::Concept),
            other => Err(format!("Unknown search mode '{}'. Supported: domain, concept", other)),
        }
    }
}

/// Preferences captured at the start of each pipeline operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub language: Language,
    pub audience: Audience,
    #[serde(rename = "image-model")]
    pub image_model: ImageModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_app_start() {
        let prefs = Preferences::default();
        assert_eq!(prefs.language, Language::En);
        assert_eq!(prefs.audience, Audience::Young);
        assert_eq!(prefs.image_model, ImageModel::Pro);
    }

    #[test]
    fn test_parse_language() {
        assert_eq!("FR".parse::<Language>(), Ok(Language::Fr));
        assert_eq!("english".parse::<Language>(), Ok(Language::En));
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_parse_roundtrips_display() {
        for a in [Audience::Young, Audience::Adult] {
            assert_eq!(a.to_string().parse::<Audience>(), Ok(a));
        }
        for m in [ImageModel::Flash, ImageModel::Pro] {
            assert_eq!(m.to_string().parse::<ImageModel>(), Ok(m));
        }
        for s in [SearchMode::Domain, SearchMode::Concept] {
            assert_eq!(s.to_string().parse::<SearchMode>(), Ok(s));
        }
    }

    #[test]
    fn test_deserialize_preferences() {
        let prefs: Preferences = serde_yaml::from_str("language: fr\nimage-model: flash\n").unwrap();
        assert_eq!(prefs.language, Language::Fr);
        assert_eq!(prefs.audience, Audience::Young);
        assert_eq!(prefs.image_model, ImageModel::Flash);
    }
}
