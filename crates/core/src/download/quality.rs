//! Quality presets and their format selectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quality preset offered to the user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    High,
    Medium,
    Low,
    Audio,
}

/// Returned when parsing an unknown quality name.
#[derive(Debug, Error, PartialEq)]
#[error("Unknown quality '{0}' (expected high, medium, low or audio)")]
pub struct UnknownQuality(pub String);

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::High, Quality::Medium, Quality::Low, Quality::Audio];

    /// Format selector passed to the engine. Fixed lookup, single-file formats
    /// only so no merge step is needed.
    pub fn format_selector(&self) -> &'static str {
        match self {
            Quality::High => "best",
            Quality::Medium => "best[height<=720]",
            Quality::Low => "worst",
            Quality::Audio => "bestaudio",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
            Quality::Audio => "audio",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Quality::High),
            "medium" => Ok(Quality::Medium),
            "low" => Ok(Quality::Low),
            "audio" => Ok(Quality::Audio),
            _ => Err(UnknownQuality(s.to_string())),
        }
    }
}
