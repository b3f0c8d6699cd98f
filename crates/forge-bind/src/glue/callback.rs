//! Base types of generated callback classes

use crate::glue::context::{ExceptionHandling, ScriptContext};
use crate::glue::value::{Failure, Fallible, ObjectHandle, PropertyKey, RealmId, ScriptValue};

/// A native object with a script-side reflector
pub trait Reflectable {
    /// The script object reflecting this native object
    fn reflector(&self) -> ObjectHandle;
}

/// Access to the script object behind a callback
pub trait CallbackContainer {
    /// The callback object
    fn callback(&self) -> ObjectHandle;

    /// Whether the object must itself be callable
    fn is_function(&self) -> bool {
        false
    }
}

/// A script function held by native code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CallbackFunction {
    callback: ObjectHandle,
}

impl CallbackFunction {
    pub fn new(callback: ObjectHandle) -> Self {
        Self { callback }
    }
}

impl CallbackContainer for CallbackFunction {
    fn callback(&self) -> ObjectHandle {
        self.callback
    }

    fn is_function(&self) -> bool {
        true
    }
}

/// A script object implementing a callback interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CallbackInterface {
    callback: ObjectHandle,
}

impl CallbackInterface {
    pub fn new(callback: ObjectHandle) -> Self {
        Self { callback }
    }

    /// Read `name` from the callback object and require it to be callable
    pub fn get_callable_property(
        &self,
        cx: &dyn ScriptContext,
        name: &str,
    ) -> Fallible<ScriptValue> {
        let callable = cx.get_property(self.callback, &PropertyKey::from(name))?;
        match callable.as_object() {
            Some(obj) if cx.is_callable(obj) => Ok(callable),
            _ => {
                tracing::debug!(callback = %self.callback, property = name, "property is not callable");
                Err(Failure)
            }
        }
    }
}

impl CallbackContainer for CallbackInterface {
    fn callback(&self) -> ObjectHandle {
        self.callback
    }
}

/// Wrap a caller-supplied `this` for use in the current realm
///
/// Called after [`CallSetup::new`], so the object lands in the callback's
/// realm rather than the caller's.
pub fn wrap_call_this_object(
    cx: &dyn ScriptContext,
    this_obj: Option<ObjectHandle>,
) -> Fallible<Option<ObjectHandle>> {
    this_obj.map(|obj| cx.wrap_object(obj)).transpose()
}

/// Realm entry around one callback invocation
///
/// Entering the callback's realm and validating a callable target happen
/// in [`CallSetup::new`]; leaving the realm happens on drop, on every exit
/// path. Under [`ExceptionHandling::ReportExceptions`] the pending
/// exception is reported before the realm is left.
pub struct CallSetup<'a> {
    cx: &'a dyn ScriptContext,
    realm: RealmId,
    handling: ExceptionHandling,
}

impl<'a> CallSetup<'a> {
    pub fn new(
        cx: &'a dyn ScriptContext,
        callback: &dyn CallbackContainer,
        handling: ExceptionHandling,
    ) -> Fallible<Self> {
        let target = callback.callback();
        let realm = cx.enter_realm(target)?;
        let setup = Self {
            cx,
            realm,
            handling,
        };

        if callback.is_function() && !cx.is_callable(target) {
            tracing::debug!(callback = %target, "callback function is not callable");
            return Err(Failure);
        }

        Ok(setup)
    }

    /// The context the call runs in
    pub fn context(&self) -> &'a dyn ScriptContext {
        self.cx
    }

    pub fn handling(&self) -> ExceptionHandling {
        self.handling
    }
}

impl Drop for CallSetup<'_> {
    fn drop(&mut self) {
        if self.handling == ExceptionHandling::ReportExceptions {
            self.cx.report_pending_exception();
        }
        self.cx.leave_realm(self.realm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glue::mock::MockContext;

    #[test]
    fn test_call_setup_leaves_realm() {
        let cx = MockContext::new();
        let func = cx.function(|_, _| Ok(ScriptValue::Undefined));
        {
            let _setup = CallSetup::new(
                &cx,
                &CallbackFunction::new(func),
                ExceptionHandling::RethrowExceptions,
            )
            .unwrap();
            assert_eq!(cx.realm_depth(), 1);
        }
        assert_eq!(cx.realm_depth(), 0);
        assert_eq!(cx.reported_exceptions(), 0);
    }

    #[test]
    fn test_call_setup_rejects_non_callable_function() {
        let cx = MockContext::new();
        let plain = cx.object();
        let result = CallSetup::new(
            &cx,
            &CallbackFunction::new(plain),
            ExceptionHandling::ReportExceptions,
        );
        assert!(result.is_err());
        assert_eq!(cx.realm_depth(), 0);
        assert_eq!(cx.realms_entered(), 1);
        assert_eq!(cx.reported_exceptions(), 1);
    }

    #[test]
    fn test_call_setup_accepts_plain_interface_object() {
        let cx = MockContext::new();
        let plain = cx.object();
        let setup = CallSetup::new(
            &cx,
            &CallbackInterface::new(plain),
            ExceptionHandling::RethrowContentExceptions,
        );
        assert!(setup.is_ok());
    }

    #[test]
    fn test_wrap_call_this_object_inside_setup() {
        let cx = MockContext::new();
        let func = cx.function(|_, _| Ok(ScriptValue::Undefined));
        let this = cx.object();

        let _setup = CallSetup::new(
            &cx,
            &CallbackFunction::new(func),
            ExceptionHandling::RethrowExceptions,
        )
        .unwrap();
        assert_eq!(wrap_call_this_object(&cx, Some(this)), Ok(Some(this)));
        assert_eq!(wrap_call_this_object(&cx, None), Ok(None));
        assert_eq!(cx.wrap_depths(), vec![1]);
    }

    #[test]
    fn test_get_callable_property() {
        let cx = MockContext::new();
        let listener = cx.object();
        let handler = cx.function(|_, _| Ok(ScriptValue::Undefined));
        cx.put(listener, "handleEvent", ScriptValue::Object(handler));
        cx.put(listener, "label", ScriptValue::String("x".into()));

        let iface = CallbackInterface::new(listener);
        assert_eq!(
            iface.get_callable_property(&cx, "handleEvent"),
            Ok(ScriptValue::Object(handler))
        );
        assert_eq!(iface.get_callable_property(&cx, "label"), Err(Failure));
        assert_eq!(iface.get_callable_property(&cx, "missing"), Err(Failure));
    }
}
