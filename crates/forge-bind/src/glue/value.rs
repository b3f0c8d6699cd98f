//! Script value model shared by the glue and generated code

use std::fmt;

/// Opaque handle to an object owned by the scripting runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value of the scripting runtime
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScriptValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(ObjectHandle),
}

impl ScriptValue {
    /// Check for `undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, ScriptValue::Undefined)
    }

    /// Check for `null` or `undefined`
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, ScriptValue::Null | ScriptValue::Undefined)
    }

    /// The object handle, if this is an object
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            ScriptValue::Object(obj) => Some(*obj),
            _ => None,
        }
    }
}

impl From<ObjectHandle> for ScriptValue {
    fn from(obj: ObjectHandle) -> Self {
        ScriptValue::Object(obj)
    }
}

/// Largest valid array index
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Key of a property access
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Integer key
    Index(u32),
    /// String key, which may still spell an array index
    String(String),
    /// Symbol key
    Symbol(u64),
}

impl PropertyKey {
    /// Array index named by this key, if any
    ///
    /// A string key is an array index only in its canonical spelling: no
    /// sign, no leading zeros, at most [`MAX_ARRAY_INDEX`].
    pub fn array_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(index) if *index <= MAX_ARRAY_INDEX => Some(*index),
            PropertyKey::Index(_) | PropertyKey::Symbol(_) => None,
            PropertyKey::String(s) => parse_array_index(s),
        }
    }

    /// Property name of a string key that is not an array index
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) if parse_array_index(s).is_none() => Some(s),
            _ => None,
        }
    }

    /// Same key with array-index strings folded to [`PropertyKey::Index`]
    pub fn normalized(&self) -> PropertyKey {
        match self.array_index() {
            Some(index) => PropertyKey::Index(index),
            None => self.clone(),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        PropertyKey::Index(index)
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::String(name.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::String(name)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(index) => write!(f, "{}", index),
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Symbol(id) => write!(f, "Symbol({})", id),
        }
    }
}

fn parse_array_index(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse::<u32>().ok().filter(|index| *index <= MAX_ARRAY_INDEX)
}

/// An own data property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Object the property is reported on
    pub owner: ObjectHandle,
    /// Property value
    pub value: ScriptValue,
    /// Not writable
    pub read_only: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data property
    pub fn data(owner: ObjectHandle, value: ScriptValue) -> Self {
        Self {
            owner,
            value,
            read_only: false,
            enumerable: true,
            configurable: true,
        }
    }
}

/// Opaque failure of a runtime operation
///
/// Detail lives in the runtime's pending exception state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Failure;

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script operation failed")
    }
}

impl std::error::Error for Failure {}

/// Result of a runtime operation
pub type Fallible<T> = Result<T, Failure>;

/// Token for an entered realm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RealmId(pub u64);

/// Token for a registered root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_index_detection() {
        assert_eq!(PropertyKey::from("0").array_index(), Some(0));
        assert_eq!(PropertyKey::from("42").array_index(), Some(42));
        assert_eq!(PropertyKey::from("4294967294").array_index(), Some(MAX_ARRAY_INDEX));
        assert_eq!(PropertyKey::from("4294967295").array_index(), None);
        assert_eq!(PropertyKey::from("007").array_index(), None);
        assert_eq!(PropertyKey::from("-1").array_index(), None);
        assert_eq!(PropertyKey::from("").array_index(), None);
        assert_eq!(PropertyKey::Index(u32::MAX).array_index(), None);
        assert_eq!(PropertyKey::Symbol(1).array_index(), None);
    }

    #[test]
    fn test_as_name() {
        assert_eq!(PropertyKey::from("length").as_name(), Some("length"));
        assert_eq!(PropertyKey::from("3").as_name(), None);
        assert_eq!(PropertyKey::Index(3).as_name(), None);
        assert_eq!(PropertyKey::from("03").as_name(), Some("03"));
    }

    #[test]
    fn test_normalized() {
        assert_eq!(PropertyKey::from("7").normalized(), PropertyKey::Index(7));
        assert_eq!(PropertyKey::from("x").normalized(), PropertyKey::from("x"));
    }
}
