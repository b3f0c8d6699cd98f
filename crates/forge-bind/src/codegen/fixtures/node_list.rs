#[allow(unused_imports)]
use super::*;
#[allow(unused_imports)]
use crate::glue::*;
#[allow(unused_imports)]
use std::rc::Rc;

/// Special operations of `NodeList` implemented by its native type
pub trait NodeListSpecialOperations {
    fn item(&self, index: u32) -> Option<Rc<Node>>;
    fn named_item(&self, name: String) -> Fallible<Option<Rc<Node>>>;
}

/// Proxy object reflecting a native `NodeList`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeListProxy {
    parent: ObjectHandle,
}

impl NodeListProxy {
    pub fn new(proxy: ObjectHandle) -> Self {
        Self {
            parent: proxy,
        }
    }

    pub fn get_own_property_descriptor(&self, cx: &dyn ScriptContext, key: &PropertyKey, set: bool) -> Fallible<Option<PropertyDescriptor>> {
        node_list_traps::get_own_property_descriptor(cx, self.parent, key, set)
    }

    pub fn define_property(&self, cx: &dyn ScriptContext, key: &PropertyKey, desc: &PropertyDescriptor) -> Fallible<bool> {
        node_list_traps::define_property(cx, self.parent, key, desc)
    }

    pub fn has_own(&self, cx: &dyn ScriptContext, key: &PropertyKey) -> Fallible<bool> {
        node_list_traps::has_own(cx, self.parent, key)
    }

    pub fn get(&self, cx: &dyn ScriptContext, key: &PropertyKey) -> Fallible<ScriptValue> {
        node_list_traps::get(cx, self.parent, key)
    }

    pub fn delete(&self, cx: &dyn ScriptContext, key: &PropertyKey) -> Fallible<bool> {
        node_list_traps::delete(cx, self.parent, key)
    }

    pub fn stringify(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        node_list_traps::stringify(cx, self.parent)
    }
}

impl Reflectable for NodeListProxy {
    fn reflector(&self) -> ObjectHandle {
        self.parent
    }
}

pub mod node_list_traps {
    use super::*;

    pub fn get_own_property_descriptor(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey, _set: bool) -> Fallible<Option<PropertyDescriptor>> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<NodeList>(cx, proxy)?;
            let found: Option<Rc<Node>> = native.item(index);
            if let Some(result) = found {
                let value = match result.to_script_value(cx) {
                    Ok(value) => value,
                    Err(_) => return Err(Failure),
                };
                return Ok(Some(fill_property_descriptor(proxy, value, true)));
            }
        }
        if let Some(name) = key.as_name() {
            if !has_property_on_prototype(cx, proxy, key)? {
                let native = unwrap_proxy::<NodeList>(cx, proxy)?;
                let found: Option<Rc<Node>> = match native.named_item(name.to_string()) {
                    Ok(found) => found,
                    Err(_) => {
                        cx.report_failure("NodeList", "namedItem");
                        return Err(Failure);
                    }
                };
                if let Some(result) = found {
                    let value = match result.to_script_value(cx) {
                        Ok(value) => value,
                        Err(_) => return Err(Failure),
                    };
                    return Ok(Some(fill_property_descriptor(proxy, value, true)));
                }
            }
        }
        get_expando_descriptor(cx, proxy, key)
    }

    pub fn define_property(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey, desc: &PropertyDescriptor) -> Fallible<bool> {
        if key.array_index().is_some() {
            return Ok(false);
        }
        if let Some(name) = key.as_name() {
            let native = unwrap_proxy::<NodeList>(cx, proxy)?;
            let found: Option<Rc<Node>> = match native.named_item(name.to_string()) {
                Ok(found) => found,
                Err(_) => {
                    cx.report_failure("NodeList", "namedItem");
                    return Err(Failure);
                }
            };
            if found.is_some() {
                return Ok(false);
            }
        }
        define_property_on_expando(cx, proxy, key, desc)
    }

    pub fn has_own(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey) -> Fallible<bool> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<NodeList>(cx, proxy)?;
            let found: Option<Rc<Node>> = native.item(index);
            if found.is_some() {
                return Ok(true);
            }
        }
        if let Some(name) = key.as_name() {
            if !has_property_on_prototype(cx, proxy, key)? {
                let native = unwrap_proxy::<NodeList>(cx, proxy)?;
                let found: Option<Rc<Node>> = match native.named_item(name.to_string()) {
                    Ok(found) => found,
                    Err(_) => {
                        cx.report_failure("NodeList", "namedItem");
                        return Err(Failure);
                    }
                };
                if found.is_some() {
                    return Ok(true);
                }
            }
        }
        has_on_expando(cx, proxy, key)
    }

    pub fn get(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey) -> Fallible<ScriptValue> {
        if let Some(index) = key.array_index() {
            let native = unwrap_proxy::<NodeList>(cx, proxy)?;
            let found: Option<Rc<Node>> = native.item(index);
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
                let native = unwrap_proxy::<NodeList>(cx, proxy)?;
                let found: Option<Rc<Node>> = match native.named_item(name.to_string()) {
                    Ok(found) => found,
                    Err(_) => {
                        cx.report_failure("NodeList", "namedItem");
                        return Err(Failure);
                    }
                };
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
            let native = unwrap_proxy::<NodeList>(cx, proxy)?;
            let found: Option<Rc<Node>> = native.item(index);
            if found.is_some() {
                return Ok(false);
            }
        }
        if let Some(name) = key.as_name() {
            if !has_property_on_prototype(cx, proxy, key)? {
                let native = unwrap_proxy::<NodeList>(cx, proxy)?;
                let found: Option<Rc<Node>> = match native.named_item(name.to_string()) {
                    Ok(found) => found,
                    Err(_) => {
                        cx.report_failure("NodeList", "namedItem");
                        return Err(Failure);
                    }
                };
                if found.is_some() {
                    return Ok(false);
                }
            }
        }
        delete_from_expando(cx, proxy, key)
    }

    pub fn stringify(_cx: &dyn ScriptContext, _proxy: ObjectHandle) -> Fallible<ScriptValue> {
        Ok(ScriptValue::String(default_stringify("NodeList")))
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
} // mod node_list_traps
