//! Conversions between script values and native values

use crate::glue::callback::{CallbackContainer, CallbackFunction, CallbackInterface, Reflectable};
use crate::glue::context::ScriptContext;
use crate::glue::value::{Failure, Fallible, ObjectHandle, PropertyKey, ScriptValue};
use std::any::Any;
use std::rc::Rc;

/// How `null` converts to a string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StringificationBehavior {
    /// `null` becomes `"null"`
    #[default]
    Default,
    /// `null` becomes `""`
    Empty,
}

/// Whether floating point conversions accept non-finite values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FloatBehavior {
    #[default]
    Restricted,
    Unrestricted,
}

/// Conversion from a script value
pub trait FromScriptValue: Sized {
    /// Conversion options
    type Config: Clone;

    fn from_script_value(
        cx: &dyn ScriptContext,
        value: &ScriptValue,
        config: Self::Config,
    ) -> Fallible<Self>;
}

/// Conversion to a script value
pub trait ToScriptValue {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue>;
}

/// Reduce a number modulo 2^bits into `[0, 2^bits)`, non-finite to zero
fn modulo_bits(n: f64, bits: i32) -> f64 {
    if !n.is_finite() {
        return 0.0;
    }
    let modulus = 2f64.powi(bits);
    let rem = n.trunc() % modulus;
    if rem < 0.0 {
        rem + modulus
    } else {
        rem
    }
}

macro_rules! unsigned_conversion {
    ($($ty:ty => $bits:expr),*) => {
        $(
            impl FromScriptValue for $ty {
                type Config = ();

                fn from_script_value(cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
                    Ok(modulo_bits(cx.to_number(value)?, $bits) as $ty)
                }
            }
        )*
    };
}

macro_rules! signed_conversion {
    ($($ty:ty => $bits:expr),*) => {
        $(
            impl FromScriptValue for $ty {
                type Config = ();

                fn from_script_value(cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
                    let unsigned = modulo_bits(cx.to_number(value)?, $bits);
                    let signed = if unsigned >= 2f64.powi($bits - 1) {
                        unsigned - 2f64.powi($bits)
                    } else {
                        unsigned
                    };
                    Ok(signed as $ty)
                }
            }
        )*
    };
}

unsigned_conversion!(u8 => 8, u16 => 16, u32 => 32, u64 => 64);
signed_conversion!(i8 => 8, i16 => 16, i32 => 32, i64 => 64);

impl FromScriptValue for f64 {
    type Config = FloatBehavior;

    fn from_script_value(
        cx: &dyn ScriptContext,
        value: &ScriptValue,
        config: FloatBehavior,
    ) -> Fallible<Self> {
        let n = cx.to_number(value)?;
        if config == FloatBehavior::Restricted && !n.is_finite() {
            return Err(Failure);
        }
        Ok(n)
    }
}

impl FromScriptValue for f32 {
    type Config = FloatBehavior;

    fn from_script_value(
        cx: &dyn ScriptContext,
        value: &ScriptValue,
        config: FloatBehavior,
    ) -> Fallible<Self> {
        let n = f64::from_script_value(cx, value, config)? as f32;
        if config == FloatBehavior::Restricted && !n.is_finite() {
            return Err(Failure);
        }
        Ok(n)
    }
}

impl FromScriptValue for bool {
    type Config = ();

    fn from_script_value(cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
        Ok(cx.to_boolean(value))
    }
}

impl FromScriptValue for String {
    type Config = StringificationBehavior;

    fn from_script_value(
        cx: &dyn ScriptContext,
        value: &ScriptValue,
        config: StringificationBehavior,
    ) -> Fallible<Self> {
        if config == StringificationBehavior::Empty && matches!(value, ScriptValue::Null) {
            return Ok(String::new());
        }
        cx.to_string(value)
    }
}

impl FromScriptValue for ScriptValue {
    type Config = ();

    fn from_script_value(_cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
        Ok(value.clone())
    }
}

impl FromScriptValue for ObjectHandle {
    type Config = ();

    fn from_script_value(_cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
        value.as_object().ok_or(Failure)
    }
}

impl FromScriptValue for CallbackFunction {
    type Config = ();

    fn from_script_value(_cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
        value.as_object().map(CallbackFunction::new).ok_or(Failure)
    }
}

impl FromScriptValue for CallbackInterface {
    type Config = ();

    fn from_script_value(_cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
        value.as_object().map(CallbackInterface::new).ok_or(Failure)
    }
}

impl<T: Any> FromScriptValue for Rc<T> {
    type Config = ();

    fn from_script_value(cx: &dyn ScriptContext, value: &ScriptValue, _: ()) -> Fallible<Self> {
        unwrap_reflector(cx, value)
    }
}

impl<T: FromScriptValue> FromScriptValue for Option<T> {
    type Config = T::Config;

    fn from_script_value(
        cx: &dyn ScriptContext,
        value: &ScriptValue,
        config: T::Config,
    ) -> Fallible<Self> {
        if value.is_null_or_undefined() {
            Ok(None)
        } else {
            T::from_script_value(cx, value, config).map(Some)
        }
    }
}

impl<T: FromScriptValue> FromScriptValue for Vec<T> {
    type Config = T::Config;

    /// Elements are read and converted in index order; the first failing
    /// element stops the conversion.
    fn from_script_value(
        cx: &dyn ScriptContext,
        value: &ScriptValue,
        config: T::Config,
    ) -> Fallible<Self> {
        let obj = value.as_object().ok_or(Failure)?;
        let length = sequence_length(cx, obj)?;
        let mut elements = Vec::with_capacity(length.min(PREALLOCATE_LIMIT) as usize);
        for index in 0..length {
            let element = cx.get_property(obj, &PropertyKey::Index(index))?;
            elements.push(T::from_script_value(cx, &element, config.clone())?);
        }
        Ok(elements)
    }
}

/// Most elements reserved up front; `length` is script-controlled
const PREALLOCATE_LIMIT: u32 = 1024;

fn sequence_length(cx: &dyn ScriptContext, obj: ObjectHandle) -> Fallible<u32> {
    let length = cx.get_property(obj, &PropertyKey::from("length"))?;
    u32::from_script_value(cx, &length, ())
}

/// Elements of an array-like script object, unconverted
pub fn sequence_elements(cx: &dyn ScriptContext, value: &ScriptValue) -> Fallible<Vec<ScriptValue>> {
    Vec::<ScriptValue>::from_script_value(cx, value, ())
}

/// Native object reflected by a script value
pub fn unwrap_reflector<T: Any>(cx: &dyn ScriptContext, value: &ScriptValue) -> Fallible<Rc<T>> {
    let obj = value.as_object().ok_or(Failure)?;
    cx.native_object(obj)
        .ok_or(Failure)?
        .downcast::<T>()
        .map_err(|_| Failure)
}

impl ToScriptValue for () {
    fn to_script_value(&self, _cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        Ok(ScriptValue::Undefined)
    }
}

impl ToScriptValue for bool {
    fn to_script_value(&self, _cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        Ok(ScriptValue::Bool(*self))
    }
}

macro_rules! number_to_script {
    ($($ty:ty),*) => {
        $(
            impl ToScriptValue for $ty {
                fn to_script_value(&self, _cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
                    Ok(ScriptValue::Number(*self as f64))
                }
            }
        )*
    };
}

number_to_script!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl ToScriptValue for String {
    fn to_script_value(&self, _cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        Ok(ScriptValue::String(self.clone()))
    }
}

impl ToScriptValue for str {
    fn to_script_value(&self, _cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        Ok(ScriptValue::String(self.to_string()))
    }
}

impl ToScriptValue for ScriptValue {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        match self {
            ScriptValue::Object(obj) => obj.to_script_value(cx),
            other => Ok(other.clone()),
        }
    }
}

impl ToScriptValue for ObjectHandle {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        cx.wrap_object(*self).map(ScriptValue::Object)
    }
}

impl ToScriptValue for CallbackFunction {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        self.callback().to_script_value(cx)
    }
}

impl ToScriptValue for CallbackInterface {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        self.callback().to_script_value(cx)
    }
}

impl<T: Reflectable> ToScriptValue for Rc<T> {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        self.reflector().to_script_value(cx)
    }
}

impl<T: ToScriptValue> ToScriptValue for Option<T> {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        match self {
            Some(value) => value.to_script_value(cx),
            None => Ok(ScriptValue::Null),
        }
    }
}

impl<T: ToScriptValue> ToScriptValue for Vec<T> {
    fn to_script_value(&self, cx: &dyn ScriptContext) -> Fallible<ScriptValue> {
        let elements = self
            .iter()
            .map(|element| element.to_script_value(cx))
            .collect::<Fallible<Vec<_>>>()?;
        cx.new_array(elements).map(ScriptValue::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glue::mock::MockContext;

    #[test]
    fn test_integer_wrapping() {
        let cx = MockContext::new();
        let convert = |n: f64| i32::from_script_value(&cx, &ScriptValue::Number(n), ()).unwrap();
        assert_eq!(convert(1.9), 1);
        assert_eq!(convert(-1.9), -1);
        assert_eq!(convert(2147483648.0), -2147483648);
        assert_eq!(convert(f64::NAN), 0);
        assert_eq!(
            u8::from_script_value(&cx, &ScriptValue::Number(-1.0), ()),
            Ok(255)
        );
    }

    #[test]
    fn test_restricted_double() {
        let cx = MockContext::new();
        let inf = ScriptValue::Number(f64::INFINITY);
        assert_eq!(
            f64::from_script_value(&cx, &inf, FloatBehavior::Restricted),
            Err(Failure)
        );
        assert_eq!(
            f64::from_script_value(&cx, &inf, FloatBehavior::Unrestricted),
            Ok(f64::INFINITY)
        );
    }

    #[test]
    fn test_treat_null_as_empty_string() {
        let cx = MockContext::new();
        assert_eq!(
            String::from_script_value(&cx, &ScriptValue::Null, StringificationBehavior::Empty),
            Ok(String::new())
        );
        assert_eq!(
            String::from_script_value(&cx, &ScriptValue::Null, StringificationBehavior::Default),
            Ok("null".to_string())
        );
    }

    #[test]
    fn test_option_of_null() {
        let cx = MockContext::new();
        assert_eq!(
            Option::<u32>::from_script_value(&cx, &ScriptValue::Undefined, ()),
            Ok(None)
        );
        assert_eq!(
            Option::<u32>::from_script_value(&cx, &ScriptValue::Number(3.0), ()),
            Ok(Some(3))
        );
    }

    #[test]
    fn test_vec_converts_each_element_once() {
        let cx = MockContext::new();
        let array = cx
            .new_array(vec![
                ScriptValue::Number(1.0),
                ScriptValue::Number(2.0),
                ScriptValue::Number(3.0),
            ])
            .unwrap();

        let before = cx.number_conversions();
        let converted =
            Vec::<i32>::from_script_value(&cx, &ScriptValue::Object(array), ()).unwrap();
        assert_eq!(converted, vec![1, 2, 3]);
        // length plus three elements
        assert_eq!(cx.number_conversions() - before, 4);
    }

    #[test]
    fn test_vec_stops_at_first_failure() {
        let cx = MockContext::new();
        let bad = cx.object();
        cx.fail_to_number(bad);
        let array = cx
            .new_array(vec![
                ScriptValue::Number(1.0),
                ScriptValue::Object(bad),
                ScriptValue::Number(3.0),
            ])
            .unwrap();

        let before = cx.number_conversions();
        let result = Vec::<i32>::from_script_value(&cx, &ScriptValue::Object(array), ());
        assert_eq!(result, Err(Failure));
        // length, first element, failing element; the third is never tried
        assert_eq!(cx.number_conversions() - before, 3);
    }

    #[test]
    fn test_vec_with_huge_length_fails_per_element() {
        let cx = MockContext::new();
        let array_like = cx.object();
        // ToUint32(-1) is 4294967295
        cx.put(array_like, "length", ScriptValue::Number(-1.0));

        let before = cx.number_conversions();
        let result = Vec::<f64>::from_script_value(
            &cx,
            &ScriptValue::Object(array_like),
            FloatBehavior::Restricted,
        );
        // element 0 is undefined, NaN under restricted conversion
        assert_eq!(result, Err(Failure));
        assert_eq!(cx.number_conversions() - before, 2);
    }

    #[test]
    fn test_unwrap_reflector() {
        let cx = MockContext::new();
        let obj = cx.object();
        cx.attach_native(obj, Rc::new(41u32));

        let native: Rc<u32> = unwrap_reflector(&cx, &ScriptValue::Object(obj)).unwrap();
        assert_eq!(*native, 41);
        assert!(unwrap_reflector::<String>(&cx, &ScriptValue::Object(obj)).is_err());
        assert!(unwrap_reflector::<u32>(&cx, &ScriptValue::Null).is_err());
    }

    #[test]
    fn test_vec_to_script() {
        let cx = MockContext::new();
        let value = vec![Some(1u8), None].to_script_value(&cx).unwrap();
        let array = value.as_object().unwrap();
        assert_eq!(
            cx.get_property(array, &PropertyKey::Index(1)),
            Ok(ScriptValue::Null)
        );
        assert_eq!(
            cx.get_property(array, &PropertyKey::from("length")),
            Ok(ScriptValue::Number(2.0))
        );
    }
}
