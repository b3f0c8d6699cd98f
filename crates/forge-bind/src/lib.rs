//! Forge-Bind: binding generation for scriptable interfaces
//!
//! This crate turns resolved interface descriptors into native Rust code a
//! scripting runtime calls into, and ships the runtime contract that code
//! is written against.
//!
//! # Architecture
//!
//! - `ir`: descriptors, IDL types and the `CgNode` text tree
//! - `codegen`: class model, conversion templates, callback and proxy generators
//! - `glue`: runtime support imported by generated code
//! - `build`: build script utilities
//! - `config`, `error`: generator configuration and error types
//!
//! # Usage
//!
//! In your crate's `build.rs`:
//!
//! ```rust,ignore
//! use forge_bind::build::BindingsBuilder;
//!
//! fn main() {
//!     BindingsBuilder::new()
//!         .descriptor_dir("idl")
//!         .config_file("bindings.toml")
//!         .build()
//!         .expect("Failed to generate bindings");
//! }
//! ```

pub mod build;
pub mod codegen;
pub mod config;
pub mod error;
pub mod glue;
pub mod ir;

// Re-export commonly used types
pub use build::{BindingsBuilder, BuildOutput};
pub use codegen::{BindingGenerator, CallbackGenerator, GeneratedUnit, ProxyGenerator};
pub use config::GeneratorConfig;
pub use error::{BuildError, ConfigError, GenerationError};
pub use ir::{
    collect_interfaces, Argument, Attribute, CgNode, DescriptorRegistry, FailurePolicy, IdlType,
    InterfaceDescriptor, InterfaceKind, Operation, Signature, SpecialOperation, BIND_INTERFACES,
};

// Re-export linkme for inventory
pub use linkme;
