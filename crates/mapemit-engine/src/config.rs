//! Engine options
//!
//! Options can be built in code or read from a TOML file:
//!
//! ```toml
//! dump_dir = "target/mapemit"
//! type_name_infix = "MappingExtension"
//! warn_on_unavailable_create = true
//! ```

use crate::error::EmitError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default middle segment of synthesized type names
pub const DEFAULT_TYPE_NAME_INFIX: &str = "MappingExtension";

/// Options controlling synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitOptions {
    /// Directory receiving a JSON dump of every descriptor built
    pub dump_dir: Option<PathBuf>,

    /// Synthesized types are named `<original>.<infix>.<short name>`
    pub type_name_infix: String,

    /// Log a warning when a creation operation is unavailable
    pub warn_on_unavailable_create: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            dump_dir: None,
            type_name_infix: DEFAULT_TYPE_NAME_INFIX.to_string(),
            warn_on_unavailable_create: true,
        }
    }
}

impl EmitOptions {
    /// Load options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, EmitError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse options from TOML text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, EmitError> {
        let options: EmitOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), EmitError> {
        if self.type_name_infix.is_empty() {
            return Err(EmitError::Config(
                "type_name_infix must not be empty".to_string(),
            ));
        }
        if self.type_name_infix.chars().any(char::is_whitespace) {
            return Err(EmitError::Config(format!(
                "type_name_infix '{}' must not contain whitespace",
                self.type_name_infix
            )));
        }
        Ok(())
    }
}
