//! Intermediate representation for binding generation
//!
//! This module provides the input data model (descriptors and IDL types)
//! and the text-producing node tree every generator emits into.

pub mod descriptor;
pub mod inventory;
pub mod naming;
pub mod node;
pub mod types;

pub use descriptor::*;
pub use inventory::*;
pub use naming::*;
pub use node::*;
pub use types::*;
