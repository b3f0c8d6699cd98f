//! Runtime support for generated bindings
//!
//! Generated code imports everything it needs from this module (or from
//! the path configured as `glue_path`):
//!
//! - `value`: script values, property keys and descriptors, `Failure`
//! - `context`: the [`ScriptContext`] trait a runtime implements
//! - `rooting`: scoped [`Rooted`] guards
//! - `callback`: callback base types and [`CallSetup`]
//! - `conversions`: [`FromScriptValue`] / [`ToScriptValue`]
//! - `proxyhandler`: expando and prototype helpers used by proxy traps

pub mod callback;
pub mod context;
pub mod conversions;
pub mod proxyhandler;
pub mod rooting;
pub mod value;

#[cfg(test)]
pub mod mock;

pub use callback::*;
pub use context::*;
pub use conversions::*;
pub use proxyhandler::*;
pub use rooting::*;
pub use value::*;
