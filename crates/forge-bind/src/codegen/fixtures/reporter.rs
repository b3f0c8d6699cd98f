#[allow(unused_imports)]
use super::*;
#[allow(unused_imports)]
use crate::glue::*;
#[allow(unused_imports)]
use std::rc::Rc;

/// Script callback function `Reporter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reporter {
    parent: CallbackFunction,
}

impl Reporter {
    pub fn new(callback: ObjectHandle) -> Self {
        Self {
            parent: CallbackFunction::new(callback),
        }
    }

    pub fn call_with_this<T: Reflectable>(&self, cx: &dyn ScriptContext, this_obj: &T, code: i32, detail: Option<String>, extra: Vec<ScriptValue>, handling: ExceptionHandling) -> Fallible<()> {
        self.call_impl(cx, Some(this_obj.reflector()), code, detail, extra, handling)
    }

    pub fn call(&self, cx: &dyn ScriptContext, code: i32, detail: Option<String>, extra: Vec<ScriptValue>, handling: ExceptionHandling) -> Fallible<()> {
        self.call_impl(cx, None, code, detail, extra, handling)
    }

    fn call_impl(&self, cx: &dyn ScriptContext, this_obj: Option<ObjectHandle>, code: i32, detail: Option<String>, extra: Vec<ScriptValue>, handling: ExceptionHandling) -> Fallible<()> {
        let _setup = CallSetup::new(cx, &self.parent, handling)?;
        let this_obj = wrap_call_this_object(cx, this_obj)?;
        let code_arg = Rooted::new(cx, match code.to_script_value(cx) {
            Ok(value) => value,
            Err(_) => return Err(Failure),
        });
        let detail_arg = match &detail {
            Some(detail) => Some(Rooted::new(cx, match detail.to_script_value(cx) {
                Ok(value) => value,
                Err(_) => return Err(Failure),
            })),
            None => None,
        };
        let mut extra_args = Vec::with_capacity(extra.len());
        for idx in 0..extra.len() {
            extra_args.push(Rooted::new(cx, match extra[idx].to_script_value(cx) {
                Ok(value) => value,
                Err(_) => return Err(Failure),
            }));
        }
        let mut argv: Vec<ScriptValue> = vec![ScriptValue::Undefined; 2];
        argv[0] = code_arg.get().clone();
        if let Some(root) = &detail_arg {
            argv[1] = root.get().clone();
        }
        let mut argc = 2;
        if extra.is_empty() && detail_arg.is_none() {
            argc = 1;
        }
        argv.truncate(argc);
        for idx in 0..extra_args.len() {
            argv.push(extra_args[idx].get().clone());
        }
        let callable = ScriptValue::Object(self.parent.callback());
        cx.call(this_obj, &callable, &argv)?;
        Ok(())
    }
}

impl CallbackContainer for Reporter {
    fn callback(&self) -> ObjectHandle {
        CallbackContainer::callback(&self.parent)
    }

    fn is_function(&self) -> bool {
        CallbackContainer::is_function(&self.parent)
    }
}

impl ToScriptValue for Reporter {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        ToScriptValue::to_script_value(&self.parent, cx)
    }
}

impl FromScriptValue for Reporter {
    type Config = ();

    fn from_script_value(cx: &dyn ScriptContext, value: &ScriptValue, config: ()) -> Fallible<Self> {
        let parent = <CallbackFunction as FromScriptValue>::from_script_value(cx, value, config)?;
        Ok(Self { parent })
    }
}
