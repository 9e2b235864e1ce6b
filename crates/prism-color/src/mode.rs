//! Extraction mode selection

use serde::{Deserialize, Serialize};

/// How a representative color is derived from artwork.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Most populated palette cluster
    #[default]
    Prominent,
    /// Mean over all pixels
    Average,
}

impl ColorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Prominent => "prominent",
            ColorMode::Average => "average",
        }
    }

    /// Human-readable name for status output.
    pub fn display_name(&self) -> &'static str {
        match self {
            ColorMode::Prominent => "Most Prominent",
            ColorMode::Average => "Average",
        }
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prominent" | "most prominent" => Ok(ColorMode::Prominent),
            "average" => Ok(ColorMode::Average),
            _ => Err(format!("Unknown color mode: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        assert_eq!("prominent".parse::<ColorMode>().unwrap(), ColorMode::Prominent);
        assert_eq!("Average".parse::<ColorMode>().unwrap(), ColorMode::Average);
        assert_eq!(ColorMode::Average.as_str(), "average");
        assert!("vivid".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_default_is_prominent() {
        assert_eq!(ColorMode::default(), ColorMode::Prominent);
    }
}
