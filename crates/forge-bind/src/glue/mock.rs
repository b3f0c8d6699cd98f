//! In-memory scripting runtime for exercising the glue and generated code

use crate::glue::context::ScriptContext;
use crate::glue::value::{
    Failure, Fallible, ObjectHandle, PropertyDescriptor, PropertyKey, RealmId, RootId, ScriptValue,
};
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

type NativeFn = Rc<dyn Fn(Option<ObjectHandle>, &[ScriptValue]) -> Fallible<ScriptValue>>;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub this: Option<ObjectHandle>,
    pub callee: ObjectHandle,
    pub args: Vec<ScriptValue>,
}

#[derive(Default)]
struct MockObject {
    props: HashMap<PropertyKey, PropertyDescriptor>,
    proto: Option<ObjectHandle>,
    function: Option<NativeFn>,
    expando: Option<ObjectHandle>,
    native: Option<Rc<dyn Any>>,
    fail_to_number: bool,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    objects: HashMap<ObjectHandle, MockObject>,
    realm_depth: usize,
    realms_entered: usize,
    live_roots: HashSet<RootId>,
    total_roots: usize,
    reported_exceptions: usize,
    failures: Vec<(String, String)>,
    number_conversions: usize,
    calls: Vec<MockCall>,
    wrap_depths: Vec<usize>,
}

impl MockState {
    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A scripting runtime that keeps everything in hash maps and records
/// every realm entry, root and call
#[derive(Default)]
pub struct MockContext {
    state: RefCell<MockState>,
}

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plain object
    pub fn object(&self) -> ObjectHandle {
        let mut state = self.state.borrow_mut();
        let handle = ObjectHandle(state.fresh_id());
        state.objects.insert(handle, MockObject::default());
        handle
    }

    /// Create a callable object backed by `f`
    pub fn function<F>(&self, f: F) -> ObjectHandle
    where
        F: Fn(Option<ObjectHandle>, &[ScriptValue]) -> Fallible<ScriptValue> + 'static,
    {
        let handle = self.object();
        if let Some(obj) = self.state.borrow_mut().objects.get_mut(&handle) {
            obj.function = Some(Rc::new(f));
        }
        handle
    }

    /// Set a writable data property
    pub fn put(&self, obj: ObjectHandle, key: impl Into<PropertyKey>, value: ScriptValue) {
        let key = key.into().normalized();
        if let Some(target) = self.state.borrow_mut().objects.get_mut(&obj) {
            target
                .props
                .insert(key, PropertyDescriptor::data(obj, value));
        }
    }

    pub fn set_prototype(&self, obj: ObjectHandle, proto: ObjectHandle) {
        if let Some(target) = self.state.borrow_mut().objects.get_mut(&obj) {
            target.proto = Some(proto);
        }
    }

    /// Make `obj` reflect a native object
    pub fn attach_native(&self, obj: ObjectHandle, native: Rc<dyn Any>) {
        if let Some(target) = self.state.borrow_mut().objects.get_mut(&obj) {
            target.native = Some(native);
        }
    }

    /// Make `ToNumber` of `obj` throw
    pub fn fail_to_number(&self, obj: ObjectHandle) {
        if let Some(target) = self.state.borrow_mut().objects.get_mut(&obj) {
            target.fail_to_number = true;
        }
    }

    pub fn realm_depth(&self) -> usize {
        self.state.borrow().realm_depth
    }

    pub fn realms_entered(&self) -> usize {
        self.state.borrow().realms_entered
    }

    pub fn live_roots(&self) -> usize {
        self.state.borrow().live_roots.len()
    }

    pub fn total_roots(&self) -> usize {
        self.state.borrow().total_roots
    }

    pub fn reported_exceptions(&self) -> usize {
        self.state.borrow().reported_exceptions
    }

    /// `(interface, member)` pairs passed to `report_failure`
    pub fn failures(&self) -> Vec<(String, String)> {
        self.state.borrow().failures.clone()
    }

    pub fn number_conversions(&self) -> usize {
        self.state.borrow().number_conversions
    }

    /// Realm depth at each `wrap_object`
    pub fn wrap_depths(&self) -> Vec<usize> {
        self.state.borrow().wrap_depths.clone()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    fn own(&self, obj: ObjectHandle, key: &PropertyKey) -> Fallible<Option<PropertyDescriptor>> {
        let state = self.state.borrow();
        let target = state.objects.get(&obj).ok_or(Failure)?;
        Ok(target.props.get(&key.normalized()).cloned())
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else if n.is_nan() {
        "NaN".to_string()
    } else {
        format!("{}", n)
    }
}

impl ScriptContext for MockContext {
    fn to_number(&self, value: &ScriptValue) -> Fallible<f64> {
        let mut state = self.state.borrow_mut();
        state.number_conversions += 1;
        match value {
            ScriptValue::Undefined => Ok(f64::NAN),
            ScriptValue::Null => Ok(0.0),
            ScriptValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            ScriptValue::Number(n) => Ok(*n),
            ScriptValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(0.0)
                } else {
                    Ok(trimmed.parse().unwrap_or(f64::NAN))
                }
            }
            ScriptValue::Object(obj) => match state.objects.get(obj) {
                Some(target) if !target.fail_to_number => Ok(f64::NAN),
                _ => Err(Failure),
            },
        }
    }

    fn to_boolean(&self, value: &ScriptValue) -> bool {
        match value {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Object(_) => true,
        }
    }

    fn to_string(&self, value: &ScriptValue) -> Fallible<String> {
        Ok(match value {
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Number(n) => format_number(*n),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Object(_) => "[object Object]".to_string(),
        })
    }

    fn new_object(&self) -> Fallible<ObjectHandle> {
        Ok(self.object())
    }

    fn new_array(&self, elements: Vec<ScriptValue>) -> Fallible<ObjectHandle> {
        let array = self.object();
        let length = elements.len();
        for (index, element) in elements.into_iter().enumerate() {
            self.put(array, index as u32, element);
        }
        self.put(array, "length", ScriptValue::Number(length as f64));
        Ok(array)
    }

    fn get_property(&self, obj: ObjectHandle, key: &PropertyKey) -> Fallible<ScriptValue> {
        let mut current = Some(obj);
        while let Some(target) = current {
            if let Some(desc) = self.own(target, key)? {
                return Ok(desc.value);
            }
            current = self.prototype_of(target)?;
        }
        Ok(ScriptValue::Undefined)
    }

    fn set_property(&self, obj: ObjectHandle, key: &PropertyKey, value: ScriptValue) -> Fallible<()> {
        if let Some(desc) = self.own(obj, key)? {
            if desc.read_only {
                return Err(Failure);
            }
        }
        self.put(obj, key.clone(), value);
        Ok(())
    }

    fn has_property(&self, obj: ObjectHandle, key: &PropertyKey) -> Fallible<bool> {
        let mut current = Some(obj);
        while let Some(target) = current {
            if self.own(target, key)?.is_some() {
                return Ok(true);
            }
            current = self.prototype_of(target)?;
        }
        Ok(false)
    }

    fn get_own_property_descriptor(
        &self,
        obj: ObjectHandle,
        key: &PropertyKey,
    ) -> Fallible<Option<PropertyDescriptor>> {
        self.own(obj, key)
    }

    fn define_property(
        &self,
        obj: ObjectHandle,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
    ) -> Fallible<bool> {
        let mut state = self.state.borrow_mut();
        let target = state.objects.get_mut(&obj).ok_or(Failure)?;
        let stored = PropertyDescriptor {
            owner: obj,
            ..desc.clone()
        };
        target.props.insert(key.normalized(), stored);
        Ok(true)
    }

    fn delete_property(&self, obj: ObjectHandle, key: &PropertyKey) -> Fallible<bool> {
        let mut state = self.state.borrow_mut();
        let target = state.objects.get_mut(&obj).ok_or(Failure)?;
        target.props.remove(&key.normalized());
        Ok(true)
    }

    fn is_callable(&self, obj: ObjectHandle) -> bool {
        self.state
            .borrow()
            .objects
            .get(&obj)
            .map(|target| target.function.is_some())
            .unwrap_or(false)
    }

    fn call(
        &self,
        this: Option<ObjectHandle>,
        callable: &ScriptValue,
        args: &[ScriptValue],
    ) -> Fallible<ScriptValue> {
        let callee = callable.as_object().ok_or(Failure)?;
        let function = {
            let mut state = self.state.borrow_mut();
            state.calls.push(MockCall {
                this,
                callee,
                args: args.to_vec(),
            });
            state
                .objects
                .get(&callee)
                .and_then(|target| target.function.clone())
                .ok_or(Failure)?
        };
        function(this, args)
    }

    fn enter_realm(&self, obj: ObjectHandle) -> Fallible<RealmId> {
        let mut state = self.state.borrow_mut();
        if !state.objects.contains_key(&obj) {
            return Err(Failure);
        }
        state.realm_depth += 1;
        state.realms_entered += 1;
        Ok(RealmId(state.realms_entered as u64))
    }

    fn leave_realm(&self, _realm: RealmId) {
        let mut state = self.state.borrow_mut();
        state.realm_depth = state.realm_depth.saturating_sub(1);
    }

    fn add_root(&self, _value: &ScriptValue) -> RootId {
        let mut state = self.state.borrow_mut();
        let root = RootId(state.fresh_id());
        state.live_roots.insert(root);
        state.total_roots += 1;
        root
    }

    fn remove_root(&self, root: RootId) {
        self.state.borrow_mut().live_roots.remove(&root);
    }

    fn wrap_object(&self, obj: ObjectHandle) -> Fallible<ObjectHandle> {
        let mut state = self.state.borrow_mut();
        let depth = state.realm_depth;
        state.wrap_depths.push(depth);
        Ok(obj)
    }

    fn prototype_of(&self, obj: ObjectHandle) -> Fallible<Option<ObjectHandle>> {
        let state = self.state.borrow();
        state
            .objects
            .get(&obj)
            .map(|target| target.proto)
            .ok_or(Failure)
    }

    fn expando_slot(&self, proxy: ObjectHandle) -> Option<ObjectHandle> {
        self.state
            .borrow()
            .objects
            .get(&proxy)
            .and_then(|target| target.expando)
    }

    fn set_expando_slot(&self, proxy: ObjectHandle, expando: ObjectHandle) {
        if let Some(target) = self.state.borrow_mut().objects.get_mut(&proxy) {
            target.expando = Some(expando);
        }
    }

    fn native_object(&self, obj: ObjectHandle) -> Option<Rc<dyn Any>> {
        self.state
            .borrow()
            .objects
            .get(&obj)
            .and_then(|target| target.native.clone())
    }

    fn report_failure(&self, interface: &str, member: &str) {
        self.state
            .borrow_mut()
            .failures
            .push((interface.to_string(), member.to_string()));
    }

    fn report_pending_exception(&self) {
        self.state.borrow_mut().reported_exceptions += 1;
    }
}
