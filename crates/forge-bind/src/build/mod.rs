//! Build utilities for binding crates
//!
//! This module provides `BindingsBuilder` for use in build.rs scripts:
//! descriptors in, `$OUT_DIR/bindings/*.rs` out.

pub mod builder;

pub use builder::{BindingsBuilder, BuildOutput};
