use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Output options for the JSON text of container and record blobs.
///
/// Scalar blobs (booleans, numbers, text) are never affected. Changing any
/// option changes the bytes, and therefore the IDs, of every container and
/// record blob, so all writers sharing a store should agree on one setting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Escape `<`, `>` and `&` inside JSON strings as `\u003c`, `\u003e`
    /// and `\u0026`.
    pub escape_html: bool,
    /// Pretty-print JSON blobs using this indent string. Only JSON
    /// whitespace (space, tab, CR, LF) is accepted.
    pub indent: Option<String>,
    /// Terminate every JSON blob with a newline.
    pub trailing_newline: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            escape_html: false,
            indent: None,
            trailing_newline: true,
        }
    }
}

impl CodecConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> CodecResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CodecError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject an indent that would put non-whitespace between JSON tokens.
    pub fn validate(&self) -> CodecResult<()> {
        let Some(indent) = &self.indent else {
            return Ok(());
        };
        if indent.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n')) {
            Ok(())
        } else {
            Err(CodecError::Config(format!(
                "indent {indent:?} must contain only JSON whitespace"
            )))
        }
    }
}
