//! Error types for binding generation and build scripts

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort generation of one interface
///
/// Nothing is emitted for an interface whose generation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// A class was declared without a base
    #[error("class {class} has no base")]
    MissingBase { class: String },

    /// A class was declared with more than one base
    #[error("class {class} has {count} bases, exactly one is supported")]
    MultipleBases { class: String, count: usize },

    /// A constructor listed more than one base initializer
    #[error("constructor of {class} has {count} base initializers, at most one is supported")]
    MultipleBaseInitializers { class: String, count: usize },

    /// A setter/creator pair refers to different operations
    #[error("{interface}: {setter} and {creator} must be the same operation")]
    MismatchedSetterCreator {
        interface: String,
        setter: String,
        creator: String,
    },

    /// A member name cannot be emitted
    #[error("{interface}: malformed member name {name:?}")]
    MalformedMemberName { interface: String, name: String },

    /// A template references a variable without a binding
    #[error("template variable ${{{name}}} is not bound")]
    UnboundTemplateVariable { name: String },

    /// The error escape of a conversion was empty
    #[error("conversion of {ty} has an empty error escape")]
    EmptyErrorEscape { ty: String },

    /// Neither the member nor the configuration specify a failure policy
    #[error("{interface}.{member}: no failure policy given and no default configured")]
    UnspecifiedFailurePolicy { interface: String, member: String },

    /// A type cannot appear in the requested position
    #[error("type {ty} is not supported {position}")]
    UnsupportedType { ty: String, position: String },

    /// A special operation has a signature the traps cannot call
    #[error("{interface}: invalid {operation}: {reason}")]
    InvalidSpecialOperation {
        interface: String,
        operation: String,
        reason: String,
    },

    /// A plain interface without special operations has no bindings
    #[error("{interface} is neither a callback nor declares special operations")]
    NothingToGenerate { interface: String },

    /// Generated source failed to parse
    #[error("generated code for {interface} does not parse: {message}")]
    SyntaxCheck { interface: String, message: String },
}

/// Errors that can occur while loading generator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error
    #[error("invalid generator config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Semantically invalid value
    #[error("invalid generator config: {0}")]
    Invalid(String),
}

/// Errors that can occur while building bindings from build.rs
#[derive(Debug, Error)]
pub enum BuildError {
    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarMissing(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Descriptor JSON could not be parsed
    #[error("invalid descriptor {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Descriptor path does not exist
    #[error("Descriptor not found: {0}")]
    DescriptorNotFound(PathBuf),

    /// Two descriptors share an interface name
    #[error("duplicate interface: {0}")]
    DuplicateInterface(String),

    /// Generation error
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}
