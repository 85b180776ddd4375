use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Output aspect ratios offered for creatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "9:16")]
    Story,
}

#[derive(Debug, Error)]
pub enum AspectRatioParseError {
    #[error("Invalid aspect ratio '{0}': expected one of 1:1, 4:5, 9:16")]
    Unsupported(String),
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "4:5",
            AspectRatio::Story => "9:16",
        }
    }

    /// Nearest ratio accepted by the image generation endpoint. 4:5 is not supported there,
    /// 3:4 is the closest portrait ratio.
    pub fn api_ratio(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Story => "9:16",
        }
    }

    /// Ratio instruction for the image edit endpoint, which takes no structured ratio.
    pub fn edit_instruction(&self) -> &'static str {
        match self {
            AspectRatio::Square => "The resulting image MUST be square (1:1 aspect ratio).",
            AspectRatio::Portrait => {
                "The resulting image MUST have a 3:4 aspect ratio (portrait, taller than wide, similar to the 4:5 Instagram format)."
            }
            AspectRatio::Story => "The resulting image MUST have a 9:16 aspect ratio (story, very tall).",
        }
    }

    /// Logical (1x) canvas size of the preview surface.
    pub fn logical_size(&self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (600, 600),
            AspectRatio::Portrait => (480, 600),
            AspectRatio::Story => (338, 601),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1:1" => Ok(AspectRatio::Square),
            "4:5" => Ok(AspectRatio::Portrait),
            "9:16" => Ok(AspectRatio::Story),
            other => Err(AspectRatioParseError::Unsupported(other.to_string())),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_ratios() {
        assert_eq!("1:1".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!(" 4:5 ".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Story);
    }

    #[test]
    fn rejects_unsupported_ratio() {
        let err = "16:9".parse::<AspectRatio>().unwrap_err();
        assert!(err.to_string().contains("16:9"));
    }

    #[test]
    fn portrait_maps_to_nearest_supported_api_ratio() {
        assert_eq!(AspectRatio::Portrait.api_ratio(), "3:4");
        assert!(AspectRatio::Portrait.edit_instruction().contains("3:4"));
    }

    #[test]
    fn serializes_as_ratio_string() {
        let json = serde_json::to_string(&AspectRatio::Story).unwrap();
        assert_eq!(json, "\"9:16\"");
    }
}
