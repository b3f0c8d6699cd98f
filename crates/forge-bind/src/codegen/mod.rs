//! Binding code generation
//!
//! This module provides:
//! - `class`: the native class model every generator emits through
//! - `conversion`: script <-> native value conversion templates
//! - `callback`: callback function and callback interface invokers
//! - `proxy`: exotic-object traps for interfaces with special operations
//! - `interface`: the per-interface entry point

pub mod callback;
pub mod class;
pub mod conversion;
pub mod interface;
pub mod proxy;


pub use callback::{CallTarget, CallbackBody, CallbackGenerator, CallbackMember, ThisHandling};
pub use class::{
    ClassMember, ClassSpec, Constructor, ForwardImpl, ForwardMethod, Method, Param, TraitImpl,
};
pub use conversion::{
    conversion_template, instantiate, variadic_conversion, wrap_for_type, ConversionOptions,
    ConversionTemplate, FAILURE_ESCAPE,
};
pub use interface::{BindingGenerator, GeneratedUnit};
pub use proxy::ProxyGenerator;
