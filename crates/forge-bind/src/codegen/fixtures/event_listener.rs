#[allow(unused_imports)]
use super::*;
#[allow(unused_imports)]
use crate::glue::*;
#[allow(unused_imports)]
use std::rc::Rc;

/// Script object implementing `EventListener`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventListener {
    parent: CallbackInterface,
}

impl EventListener {
    pub fn new(callback: ObjectHandle) -> Self {
        Self {
            parent: CallbackInterface::new(callback),
        }
    }

    pub fn handle_event_with_this<T: Reflectable>(&self, cx: &dyn ScriptContext, this_obj: &T, event: ScriptValue, handling: ExceptionHandling) -> Fallible<()> {
        self.handle_event_impl(cx, Some(this_obj.reflector()), event, handling)
    }

    pub fn handle_event(&self, cx: &dyn ScriptContext, event: ScriptValue, handling: ExceptionHandling) -> Fallible<()> {
        self.handle_event_impl(cx, None, event, handling)
    }

    fn handle_event_impl(&self, cx: &dyn ScriptContext, this_obj: Option<ObjectHandle>, event: ScriptValue, handling: ExceptionHandling) -> Fallible<()> {
        let _setup = CallSetup::new(cx, &self.parent, handling)?;
        let this_obj = wrap_call_this_object(cx, this_obj)?;
        let event_arg = Rooted::new(cx, match event.to_script_value(cx) {
            Ok(value) => value,
            Err(_) => return Err(Failure),
        });
        let mut argv: Vec<ScriptValue> = vec![ScriptValue::Undefined; 1];
        argv[0] = event_arg.get().clone();
        let is_callable = cx.is_callable(self.parent.callback());
        let callable = if is_callable {
            ScriptValue::Object(self.parent.callback())
        } else {
            self.parent.get_callable_property(cx, "handleEvent")?
        };
        let this_obj = if is_callable {
            this_obj
        } else {
            Some(self.parent.callback())
        };
        cx.call(this_obj, &callable, &argv)?;
        Ok(())
    }

    pub fn get_label(&self, cx: &dyn ScriptContext, handling: ExceptionHandling) -> Fallible<Option<String>> {
        let _setup = CallSetup::new(cx, &self.parent, handling)?;
        let rval = cx.get_property(self.parent.callback(), &PropertyKey::from("label"))?;
        let rval_decl: Option<String> = match <Option<String> as FromScriptValue>::from_script_value(cx, &rval, StringificationBehavior::Default) {
            Ok(value) => value,
            Err(_) => return Err(Failure),
        };
        Ok(rval_decl)
    }
}

impl CallbackContainer for EventListener {
    fn callback(&self) -> ObjectHandle {
        CallbackContainer::callback(&self.parent)
    }

    fn is_function(&self) -> bool {
        CallbackContainer::is_function(&self.parent)
    }
}

impl ToScriptValue for EventListener {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        ToScriptValue::to_script_value(&self.parent, cx)
    }
}

impl FromScriptValue for EventListener {
    type Config = ();

    fn from_script_value(cx: &dyn ScriptContext, value: &ScriptValue, config: ()) -> Fallible<Self> {
        let parent = <CallbackInterface as FromScriptValue>::from_script_value(cx, value, config)?;
        Ok(Self { parent })
    }
}
