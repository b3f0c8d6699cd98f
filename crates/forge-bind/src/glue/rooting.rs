//! Scoped rooting of script values held by native code

use crate::glue::context::ScriptContext;
use crate::glue::value::{RootId, ScriptValue};

/// A script value registered as a root for the lifetime of the guard
///
/// The root is released when the guard goes out of scope, on success and
/// on early return alike.
pub struct Rooted<'a> {
    cx: &'a dyn ScriptContext,
    root: RootId,
    value: ScriptValue,
}

impl<'a> Rooted<'a> {
    /// Register `value` as a root
    pub fn new(cx: &'a dyn ScriptContext, value: ScriptValue) -> Self {
        let root = cx.add_root(&value);
        Self { cx, root, value }
    }

    /// The rooted value
    pub fn get(&self) -> &ScriptValue {
        &self.value
    }
}

impl Drop for Rooted<'_> {
    fn drop(&mut self) {
        self.cx.remove_root(self.root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glue::mock::MockContext;
    use crate::glue::{Failure, Fallible};

    fn convert_rooted(cx: &dyn ScriptContext, value: ScriptValue, fail: bool) -> Fallible<f64> {
        let root = Rooted::new(cx, value);
        if fail {
            return Err(Failure);
        }
        cx.to_number(root.get())
    }

    #[test]
    fn test_root_released_on_success() {
        let cx = MockContext::new();
        assert_eq!(convert_rooted(&cx, ScriptValue::Number(2.0), false), Ok(2.0));
        assert_eq!(cx.live_roots(), 0);
        assert_eq!(cx.total_roots(), 1);
    }

    #[test]
    fn test_root_released_on_error() {
        let cx = MockContext::new();
        assert_eq!(convert_rooted(&cx, ScriptValue::Null, true), Err(Failure));
        assert_eq!(cx.live_roots(), 0);
        assert_eq!(cx.total_roots(), 1);
    }
}
