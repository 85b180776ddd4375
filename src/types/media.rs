use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// A base64 payload plus its MIME type, the shape every inline part of the AI service uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineMedia {
    pub data: String,
    pub mime_type: String,
}

impl InlineMedia {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64_STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ForgeError::validation(format!(
                "File not found: {}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(&bytes, mime_from_path(path)))
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ForgeError::validation("image reference is not a data URL"))?;
        let (meta, data) = rest
            .split_once(',')
            .ok_or_else(|| ForgeError::validation("data URL is missing its payload"))?;
        let mime_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| ForgeError::validation("only base64 data URLs are supported"))?;
        Ok(Self {
            data: data.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64_STANDARD
            .decode(self.data.trim())
            .map_err(|e| ForgeError::validation(format!("invalid base64 payload: {e}")))
    }
}

pub(crate) fn mime_from_path(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}
