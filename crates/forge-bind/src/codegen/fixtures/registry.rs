#[allow(unused_imports)]
use super::*;
#[allow(unused_imports)]
use crate::glue::*;
#[allow(unused_imports)]
use std::rc::Rc;

/// Special operations of `Registry` implemented by its native type
pub trait RegistrySpecialOperations {
    fn item(&self, index: u32) -> Option<String>;
    fn set_item(&self, index: u32, value: String);
    fn named_item(&self, name: String) -> Fallible<Option<String>>;
    fn set_named_item(&self, name: String, value: String) -> Fallible<()>;
}

/// Proxy object reflecting a native `Registry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryProxy {
    parent: ObjectHandle,
}

impl RegistryProxy {
    pub fn new(proxy: ObjectHandle) -> Self {
        Self {
            parent: proxy,
        }
    }

    pub fn get_own_property_descriptor(&self, cx: &dyn ScriptContext, key: &PropertyKey, set: bool) -> Fallible<Option<PropertyDescriptor>> {
        registry_traps::get_own_property_descriptor(cx, self.parent, key, set)
    }

    pub fn define_property(&self, cx: &dyn ScriptContext, key: &PropertyKey, desc: &PropertyDescriptor) -> Fallible<bool> {
        registry_traps::define_property(cx, self.parent, key, desc)
    }

    pub fn has_own(&self, cx: &dyn ScriptContext, key: &PropertyKey) -> Fallible<bool> {
        registry_traps::has_own(cx, self.parent, key)
    }

    pub fn get(&self, cx: &dyn ScriptContext, key: &PropertyKey) -> Fallible<ScriptValue> {
        registry_traps::get(cx, self.parent, key)
    }

    pub fn delete(&self, cx: &dyn ScriptContext, key: &PropertyKey) -> Fallible<bool> {
        registry_traps::delete(cx, self.parent, key)
    }

    pub fn stringify(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        registry_traps::stringify(cx, self.parent)
    }
}

impl Reflectable for RegistryProxy {
    fn reflector(&self) -> ObjectHandle {
        self.parent
    }
}

pub mod registry_traps {
    use super::*;

    pub fn get_own_property_descriptor(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey, set: bool) -> Fallible<Option<PropertyDescriptor>> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<Registry>(cx, proxy)?;
            let found: Option<String> = native.item(index);
            if let Some(result) = found {
                let value = match result.to_script_value(cx) {
                    Ok(value) => value,
                    Err(_) => return Err(Failure),
                };
                return Ok(Some(fill_property_descriptor(proxy, value, false)));
            }
        }
        if set {
            if key.array_index().is_some() {
                return Ok(Some(fill_property_descriptor(proxy, ScriptValue::Undefined, false)));
            }
            if key.as_name().is_some() {
                return Ok(Some(fill_property_descriptor(proxy, ScriptValue::Undefined, false)));
            }
        }
        if let Some(name) = key.as_name() {
            if !has_property_on_prototype(cx, proxy, key)? {
                let native = unwrap_proxy::<Registry>(cx, proxy)?;
                let found: Option<String> = native.named_item(name.to_string()).ok().flatten();
                if let Some(result) = found {
                    let value = match result.to_script_value(cx) {
                        Ok(value) => value,
                        Err(_) => return Err(Failure),
                    };
                    return Ok(Some(fill_property_descriptor(proxy, value, false)));
                }
            }
        }
        get_expando_descriptor(cx, proxy, key)
    }

    pub fn define_property(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey, desc: &PropertyDescriptor) -> Fallible<bool> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<Registry>(cx, proxy)?;
            let value: String = match <String as FromScriptValue>::from_script_value(cx, &desc.value, StringificationBehavior::Default) {
                Ok(value) => value,
                Err(_) => return Err(Failure),
            };
            native.set_item(index, value);
            return Ok(true);
        }
        if let Some(name) = key.as_name() {
            let native = unwrap_proxy::<Registry>(cx, proxy)?;
            let value: String = match <String as FromScriptValue>::from_script_value(cx, &desc.value, StringificationBehavior::Default) {
                Ok(value) => value,
                Err(_) => return Err(Failure),
            };
            if native.set_named_item(name.to_string(), value).is_err() {
                cx.report_failure("Registry", "setNamedItem");
                return Err(Failure);
            }
            return Ok(true);
        }
        define_property_on_expando(cx, proxy, key, desc)
    }

    pub fn has_own(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey) -> Fallible<bool> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<Registry>(cx, proxy)?;
            let found: Option<String> = native.item(index);
            if found.is_some() {
                return Ok(true);
            }
        }
        if let Some(name) = key.as_name() {
            if !has_property_on_prototype(cx, proxy, key)? {
                let native = unwrap_proxy::<Registry>(cx, proxy)?;
                let found: Option<String> = native.named_item(name.to_string()).ok().flatten();
                if found.is_some() {
                    return Ok(true);
                }
            }
        }
        has_on_expando(cx, proxy, key)
    }

    pub fn get(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey) -> Fallible<ScriptValue> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<Registry>(cx, proxy)?;
            let found: Option<String> = native.item(index);
            if let Some(result) = found {
                let value = match result.to_script_value(cx) {
                    Ok(value) => value,
                    Err(_) => return Err(Failure),
                };
                return Ok(value);
            }
        }
        if let Some(name) = key.as_name() {
            if !has_property_on_prototype(cx, proxy, key)? {
                let native = unwrap_proxy::<Registry>(cx, proxy)?;
                let found: Option<String> = native.named_item(name.to_string()).ok().flatten();
                if let Some(result) = found {
                    let value = match result.to_script_value(cx) {
                        Ok(value) => value,
                        Err(_) => return Err(Failure),
                    };
                    return Ok(value);
                }
            }
        }
        if let Some(value) = get_from_expando(cx, proxy, key)? {
            return Ok(value);
        }
        Ok(get_property_on_prototype(cx, proxy, key)?.unwrap_or_default())
    }

    pub fn delete(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey) -> Fallible<bool> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<Registry>(cx, proxy)?;
            let found: Option<String> = native.item(index);
            if found.is_some() {
                return Ok(false);
            }
        }
        if let Some(name) = key.as_name() {
            if !has_property_on_prototype(cx, proxy, key)? {
                let native = unwrap_proxy::<Registry>(cx, proxy)?;
                let found: Option<String> = native.named_item(name.to_string()).ok().flatten();
                if found.is_some() {
                    return Ok(false);
                }
            }
        }
        delete_from_expando(cx, proxy, key)
    }

    pub fn stringify(_cx: &dyn ScriptContext, _proxy: ObjectHandle) -> Fallible<ScriptValue> {
        Ok(ScriptValue::String(default_stringify("Registry")))
    }

    /// Trap table to install for this interface
    pub fn proxy_traps() -> ProxyTraps {
        ProxyTraps {
            get_own_property_descriptor,
            define_property,
            has_own,
            get,
            delete,
            stringify,
        }
    }
} // mod registry_traps
