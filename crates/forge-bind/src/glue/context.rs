//! The runtime contract generated bindings call into
//!
//! A scripting runtime embeds forge-bind output by implementing
//! [`ScriptContext`]. Every generated function receives the context
//! explicitly as `cx: &dyn ScriptContext`; nothing is looked up from
//! ambient state.

use crate::glue::value::{
    Fallible, ObjectHandle, PropertyDescriptor, PropertyKey, RealmId, RootId, ScriptValue,
};
use std::any::Any;
use std::rc::Rc;

/// What happens to an exception raised while a callback runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionHandling {
    /// Report the exception and do not throw it to the caller
    ReportExceptions,
    /// Rethrow exceptions originating from the caller's content, report
    /// everything else
    RethrowContentExceptions,
    /// Rethrow every exception to the caller
    RethrowExceptions,
}

/// Operations of a scripting runtime used by generated bindings
///
/// All methods take `&self`; runtimes keep their mutable state behind
/// interior mutability. Failures leave detail in the runtime's pending
/// exception and surface as [`Failure`](crate::glue::Failure).
pub trait ScriptContext {
    /// `ToNumber`
    fn to_number(&self, value: &ScriptValue) -> Fallible<f64>;

    /// `ToBoolean`
    fn to_boolean(&self, value: &ScriptValue) -> bool;

    /// `ToString`
    fn to_string(&self, value: &ScriptValue) -> Fallible<String>;

    /// Create a plain object with no prototype
    fn new_object(&self) -> Fallible<ObjectHandle>;

    /// Create an array holding `elements`
    fn new_array(&self, elements: Vec<ScriptValue>) -> Fallible<ObjectHandle>;

    /// `[[Get]]`, walking the prototype chain
    fn get_property(&self, obj: ObjectHandle, key: &PropertyKey) -> Fallible<ScriptValue>;

    /// `[[Set]]`
    fn set_property(&self, obj: ObjectHandle, key: &PropertyKey, value: ScriptValue)
        -> Fallible<()>;

    /// `[[HasProperty]]`, walking the prototype chain
    fn has_property(&self, obj: ObjectHandle, key: &PropertyKey) -> Fallible<bool>;

    /// `[[GetOwnProperty]]`
    fn get_own_property_descriptor(
        &self,
        obj: ObjectHandle,
        key: &PropertyKey,
    ) -> Fallible<Option<PropertyDescriptor>>;

    /// `[[DefineOwnProperty]]`
    fn define_property(
        &self,
        obj: ObjectHandle,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
    ) -> Fallible<bool>;

    /// `[[Delete]]`
    fn delete_property(&self, obj: ObjectHandle, key: &PropertyKey) -> Fallible<bool>;

    /// Whether `obj` has a `[[Call]]` internal method
    fn is_callable(&self, obj: ObjectHandle) -> bool;

    /// Call `callable` with `this` (`undefined` when `None`)
    fn call(
        &self,
        this: Option<ObjectHandle>,
        callable: &ScriptValue,
        args: &[ScriptValue],
    ) -> Fallible<ScriptValue>;

    /// Enter the realm `obj` belongs to
    fn enter_realm(&self, obj: ObjectHandle) -> Fallible<RealmId>;

    /// Leave a realm entered by [`ScriptContext::enter_realm`]
    fn leave_realm(&self, realm: RealmId);

    /// Keep `value` alive and in place until the root is removed
    fn add_root(&self, value: &ScriptValue) -> RootId;

    /// Release a root
    fn remove_root(&self, root: RootId);

    /// Wrap `obj` for use in the currently entered realm
    fn wrap_object(&self, obj: ObjectHandle) -> Fallible<ObjectHandle>;

    /// Prototype of `obj`
    fn prototype_of(&self, obj: ObjectHandle) -> Fallible<Option<ObjectHandle>>;

    /// Contents of the expando slot of a proxy
    fn expando_slot(&self, proxy: ObjectHandle) -> Option<ObjectHandle>;

    /// Store an object in the expando slot of a proxy
    fn set_expando_slot(&self, proxy: ObjectHandle, expando: ObjectHandle);

    /// Native object reflected by `obj`
    fn native_object(&self, obj: ObjectHandle) -> Option<Rc<dyn Any>>;

    /// Raise a failure of a native member as a script exception
    fn report_failure(&self, interface: &str, member: &str);

    /// Report and clear the pending exception, if any
    fn report_pending_exception(&self);
}
