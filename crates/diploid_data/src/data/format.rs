use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// On-disk encoding of a persisted sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    /// Validated rkyv archive.
    #[default]
    Rkyv,
    /// Gzip-compressed JSON.
    JsonGz,
}

impl ResultFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ResultFormat::Rkyv => "rkyv",
            ResultFormat::JsonGz => "json.gz",
        }
    }

    /// Guesses the format from a file name.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".json.gz") {
            Some(ResultFormat::JsonGz)
        } else if path.ends_with(".rkyv") {
            Some(ResultFormat::Rkyv)
        } else {
            None
        }
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultFormat::Rkyv => write!(f, "rkyv"),
            ResultFormat::JsonGz => write!(f, "json_gz"),
        }
    }
}

impl FromStr for ResultFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rkyv" => Ok(ResultFormat::Rkyv),
            "json_gz" | "json.gz" | "json" => Ok(ResultFormat::JsonGz),
            other => Err(format!("unknown result format: {other}")),
        }
    }
}
