//! Helpers shared by generated proxy traps
//!
//! A proxy keeps script-defined properties on a separate expando object
//! stored in one of its slots. The expando is created lazily on the first
//! define and re-owned by the proxy whenever one of its descriptors is
//! reported.

use crate::glue::context::ScriptContext;
use crate::glue::value::{Failure, Fallible, ObjectHandle, PropertyDescriptor, PropertyKey, ScriptValue};
use std::any::Any;
use std::rc::Rc;

/// `[[GetOwnProperty]]` trap; the flag is set for lookups made on behalf
/// of an assignment
pub type GetOwnPropertyDescriptorTrap =
    fn(&dyn ScriptContext, ObjectHandle, &PropertyKey, bool) -> Fallible<Option<PropertyDescriptor>>;

/// `[[DefineOwnProperty]]` trap
pub type DefinePropertyTrap =
    fn(&dyn ScriptContext, ObjectHandle, &PropertyKey, &PropertyDescriptor) -> Fallible<bool>;

/// `hasOwn` trap
pub type HasOwnTrap = fn(&dyn ScriptContext, ObjectHandle, &PropertyKey) -> Fallible<bool>;

/// `[[Get]]` trap
pub type GetTrap = fn(&dyn ScriptContext, ObjectHandle, &PropertyKey) -> Fallible<ScriptValue>;

/// `[[Delete]]` trap
pub type DeleteTrap = fn(&dyn ScriptContext, ObjectHandle, &PropertyKey) -> Fallible<bool>;

/// Stringification of the proxy
pub type StringifyTrap = fn(&dyn ScriptContext, ObjectHandle) -> Fallible<ScriptValue>;

/// Trap table a runtime installs for one proxy class
#[derive(Clone, Copy)]
pub struct ProxyTraps {
    pub get_own_property_descriptor: GetOwnPropertyDescriptorTrap,
    pub define_property: DefinePropertyTrap,
    pub has_own: HasOwnTrap,
    pub get: GetTrap,
    pub delete: DeleteTrap,
    pub stringify: StringifyTrap,
}

impl ProxyTraps {
    /// Own descriptor from the traps, else the prototype chain's
    pub fn get_property_descriptor(
        &self,
        cx: &dyn ScriptContext,
        proxy: ObjectHandle,
        key: &PropertyKey,
    ) -> Fallible<Option<PropertyDescriptor>> {
        if let Some(desc) = (self.get_own_property_descriptor)(cx, proxy, key, false)? {
            return Ok(Some(desc));
        }

        let mut current = cx.prototype_of(proxy)?;
        while let Some(proto) = current {
            if let Some(desc) = cx.get_own_property_descriptor(proto, key)? {
                return Ok(Some(desc));
            }
            current = cx.prototype_of(proto)?;
        }
        Ok(None)
    }
}

impl std::fmt::Debug for ProxyTraps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyTraps").finish_non_exhaustive()
    }
}

/// Native object behind a proxy
pub fn unwrap_proxy<T: Any>(cx: &dyn ScriptContext, proxy: ObjectHandle) -> Fallible<Rc<T>> {
    cx.native_object(proxy)
        .ok_or(Failure)?
        .downcast::<T>()
        .map_err(|_| Failure)
}

/// The expando object of a proxy, if one was created
pub fn get_expando_object(cx: &dyn ScriptContext, proxy: ObjectHandle) -> Option<ObjectHandle> {
    cx.expando_slot(proxy)
}

/// The expando object of a proxy, created on first use
pub fn ensure_expando_object(cx: &dyn ScriptContext, proxy: ObjectHandle) -> Fallible<ObjectHandle> {
    if let Some(expando) = cx.expando_slot(proxy) {
        return Ok(expando);
    }
    let expando = cx.new_object()?;
    cx.set_expando_slot(proxy, expando);
    tracing::trace!(proxy = %proxy, expando = %expando, "created expando");
    Ok(expando)
}

/// Enumerable, configurable data descriptor owned by `owner`
pub fn fill_property_descriptor(
    owner: ObjectHandle,
    value: ScriptValue,
    read_only: bool,
) -> PropertyDescriptor {
    PropertyDescriptor {
        owner,
        value,
        read_only,
        enumerable: true,
        configurable: true,
    }
}

/// Own descriptor of `key` on the expando, reported as owned by the proxy
pub fn get_expando_descriptor(
    cx: &dyn ScriptContext,
    proxy: ObjectHandle,
    key: &PropertyKey,
) -> Fallible<Option<PropertyDescriptor>> {
    let Some(expando) = get_expando_object(cx, proxy) else {
        return Ok(None);
    };
    Ok(cx
        .get_own_property_descriptor(expando, key)?
        .map(|desc| PropertyDescriptor { owner: proxy, ..desc }))
}

/// Whether the expando has `key` as an own property
pub fn has_on_expando(cx: &dyn ScriptContext, proxy: ObjectHandle, key: &PropertyKey) -> Fallible<bool> {
    Ok(get_expando_descriptor(cx, proxy, key)?.is_some())
}

/// Value of `key` on the expando, if present
pub fn get_from_expando(
    cx: &dyn ScriptContext,
    proxy: ObjectHandle,
    key: &PropertyKey,
) -> Fallible<Option<ScriptValue>> {
    Ok(get_expando_descriptor(cx, proxy, key)?.map(|desc| desc.value))
}

/// Whether the proxy's prototype chain has `key`
pub fn has_property_on_prototype(
    cx: &dyn ScriptContext,
    proxy: ObjectHandle,
    key: &PropertyKey,
) -> Fallible<bool> {
    match cx.prototype_of(proxy)? {
        Some(proto) => cx.has_property(proto, key),
        None => Ok(false),
    }
}

/// Value of `key` found on the proxy's prototype chain
pub fn get_property_on_prototype(
    cx: &dyn ScriptContext,
    proxy: ObjectHandle,
    key: &PropertyKey,
) -> Fallible<Option<ScriptValue>> {
    let Some(proto) = cx.prototype_of(proxy)? else {
        return Ok(None);
    };
    if !cx.has_property(proto, key)? {
        return Ok(None);
    }
    cx.get_property(proto, key).map(Some)
}

/// Define `key` on the expando, creating it if needed
pub fn define_property_on_expando(
    cx: &dyn ScriptContext,
    proxy: ObjectHandle,
    key: &PropertyKey,
    desc: &PropertyDescriptor,
) -> Fallible<bool> {
    let expando = ensure_expando_object(cx, proxy)?;
    let desc = PropertyDescriptor {
        owner: expando,
        ..desc.clone()
    };
    cx.define_property(expando, key, &desc)
}

/// Delete `key` from the expando
///
/// Without an expando there is nothing to delete and the delete succeeds.
pub fn delete_from_expando(
    cx: &dyn ScriptContext,
    proxy: ObjectHandle,
    key: &PropertyKey,
) -> Fallible<bool> {
    match get_expando_object(cx, proxy) {
        Some(expando) => cx.delete_property(expando, key),
        None => Ok(true),
    }
}

/// `[object <Interface>]`
pub fn default_stringify(interface: &str) -> String {
    format!("[object {}]", interface)
}
