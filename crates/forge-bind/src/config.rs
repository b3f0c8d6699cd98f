//! Generator configuration
//!
//! Loaded from an optional `bindings.toml` next to the descriptors:
//!
//! ```toml
//! glue_path = "forge_bind::glue"
//! indent = 4
//! default_failure_policy = "propagate"
//! emit_header = true
//! verify_syntax = true
//! ```

use crate::error::ConfigError;
use crate::ir::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by every generated interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Path the generated code imports the glue runtime from
    pub glue_path: String,
    /// Indentation width of generated bodies
    pub indent: usize,
    /// Failure policy for special operations that do not declare one
    pub default_failure_policy: Option<FailurePolicy>,
    /// Emit a "generated file" header comment
    pub emit_header: bool,
    /// Parse every generated unit before handing it out
    pub verify_syntax: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            glue_path: "forge_bind::glue".to_string(),
            indent: crate::ir::DEFAULT_INDENT,
            default_failure_policy: None,
            emit_header: true,
            verify_syntax: false,
        }
    }
}

impl GeneratorConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Set the glue import path
    pub fn with_glue_path(mut self, path: impl Into<String>) -> Self {
        self.glue_path = path.into();
        self
    }

    /// Set the indentation width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set the default failure policy
    pub fn with_default_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.default_failure_policy = Some(policy);
        self
    }

    /// Enable or disable the header comment
    pub fn with_header(mut self, emit: bool) -> Self {
        self.emit_header = emit;
        self
    }

    /// Enable or disable syntax verification
    pub fn with_syntax_check(mut self, verify: bool) -> Self {
        self.verify_syntax = verify;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.indent == 0 || self.indent > 16 {
            return Err(ConfigError::Invalid(format!(
                "indent must be between 1 and 16, got {}",
                self.indent
            )));
        }
        let bad_segment = self.glue_path.split("::").enumerate().any(|(i, seg)| {
            let path_root = i == 0 && matches!(seg, "crate" | "self" | "super");
            !path_root && !crate::ir::is_identifier(seg)
        });
        if bad_segment {
            return Err(ConfigError::Invalid(format!(
                "glue_path {:?} is not a module path",
                self.glue_path
            )));
        }
        Ok(())
    }
}
