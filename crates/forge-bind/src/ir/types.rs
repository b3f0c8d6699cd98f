//! IDL type system for forge-bind
//!
//! [`IdlType`] is the resolved type of an argument, attribute or return
//! value as handed over by the interface front end. Each type knows the
//! native Rust type it maps to in generated code.
//!
//! | IDL type | Native type |
//! |----------|-------------|
//! | `boolean` | `bool` |
//! | `byte` / `octet` | `i8` / `u8` |
//! | `short` / `unsigned short` | `i16` / `u16` |
//! | `long` / `unsigned long` | `i32` / `u32` |
//! | `long long` / `unsigned long long` | `i64` / `u64` |
//! | `float` / `double` (restricted or not) | `f32` / `f64` |
//! | `DOMString`, `ByteString`, `USVString` | `String` |
//! | `any` | `ScriptValue` |
//! | `object` | `ObjectHandle` |
//! | interface `Foo` | `Rc<Foo>` |
//! | callback `Foo` | `Foo` |
//! | `T?` | `Option<T>` |
//! | `sequence<T>` | `Vec<T>` |
//! | `void` | `()` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive numeric and boolean types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdlPrimitive {
    Boolean,
    Byte,
    Octet,
    Short,
    UnsignedShort,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    UnrestrictedFloat,
    Double,
    UnrestrictedDouble,
}

impl IdlPrimitive {
    /// Native Rust type name
    pub fn native_type(&self) -> &'static str {
        match self {
            IdlPrimitive::Boolean => "bool",
            IdlPrimitive::Byte => "i8",
            IdlPrimitive::Octet => "u8",
            IdlPrimitive::Short => "i16",
            IdlPrimitive::UnsignedShort => "u16",
            IdlPrimitive::Long => "i32",
            IdlPrimitive::UnsignedLong => "u32",
            IdlPrimitive::LongLong => "i64",
            IdlPrimitive::UnsignedLongLong => "u64",
            IdlPrimitive::Float | IdlPrimitive::UnrestrictedFloat => "f32",
            IdlPrimitive::Double | IdlPrimitive::UnrestrictedDouble => "f64",
        }
    }

    /// IDL spelling of the type
    pub fn idl_name(&self) -> &'static str {
        match self {
            IdlPrimitive::Boolean => "boolean",
            IdlPrimitive::Byte => "byte",
            IdlPrimitive::Octet => "octet",
            IdlPrimitive::Short => "short",
            IdlPrimitive::UnsignedShort => "unsigned short",
            IdlPrimitive::Long => "long",
            IdlPrimitive::UnsignedLong => "unsigned long",
            IdlPrimitive::LongLong => "long long",
            IdlPrimitive::UnsignedLongLong => "unsigned long long",
            IdlPrimitive::Float => "float",
            IdlPrimitive::UnrestrictedFloat => "unrestricted float",
            IdlPrimitive::Double => "double",
            IdlPrimitive::UnrestrictedDouble => "unrestricted double",
        }
    }

    /// Whether non-finite values are accepted
    pub fn is_unrestricted(&self) -> bool {
        matches!(
            self,
            IdlPrimitive::UnrestrictedFloat | IdlPrimitive::UnrestrictedDouble
        )
    }

    /// Whether this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            IdlPrimitive::Float
                | IdlPrimitive::UnrestrictedFloat
                | IdlPrimitive::Double
                | IdlPrimitive::UnrestrictedDouble
        )
    }
}

/// String flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdlString {
    DomString,
    ByteString,
    UsvString,
}

/// A resolved IDL type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdlType {
    /// Numeric or boolean primitive
    Primitive(IdlPrimitive),
    /// String type
    String(IdlString),
    /// `any`
    Any,
    /// `object`
    Object,
    /// `void` (return position only)
    Void,
    /// Reference to a native-backed interface
    Interface(String),
    /// Reference to a callback function or callback interface
    Callback(String),
    /// `T?`
    Nullable(Box<IdlType>),
    /// `sequence<T>`
    Sequence(Box<IdlType>),
}

impl IdlType {
    /// `boolean`
    pub fn boolean() -> Self {
        IdlType::Primitive(IdlPrimitive::Boolean)
    }

    /// `long`
    pub fn long() -> Self {
        IdlType::Primitive(IdlPrimitive::Long)
    }

    /// `unsigned long`
    pub fn unsigned_long() -> Self {
        IdlType::Primitive(IdlPrimitive::UnsignedLong)
    }

    /// `double`
    pub fn double() -> Self {
        IdlType::Primitive(IdlPrimitive::Double)
    }

    /// `DOMString`
    pub fn dom_string() -> Self {
        IdlType::String(IdlString::DomString)
    }

    /// Interface reference
    pub fn interface(name: impl Into<String>) -> Self {
        IdlType::Interface(name.into())
    }

    /// Callback reference
    pub fn callback(name: impl Into<String>) -> Self {
        IdlType::Callback(name.into())
    }

    /// `T?`
    pub fn nullable(inner: IdlType) -> Self {
        IdlType::Nullable(Box::new(inner))
    }

    /// `sequence<T>`
    pub fn sequence(inner: IdlType) -> Self {
        IdlType::Sequence(Box::new(inner))
    }

    /// Native Rust type used for locals, arguments and return values
    pub fn native_type(&self) -> String {
        match self {
            IdlType::Primitive(p) => p.native_type().to_string(),
            IdlType::String(_) => "String".to_string(),
            IdlType::Any => "ScriptValue".to_string(),
            IdlType::Object => "ObjectHandle".to_string(),
            IdlType::Void => "()".to_string(),
            IdlType::Interface(name) => format!("Rc<{}>", name),
            IdlType::Callback(name) => name.clone(),
            IdlType::Nullable(inner) => format!("Option<{}>", inner.native_type()),
            IdlType::Sequence(inner) => format!("Vec<{}>", inner.native_type()),
        }
    }

    /// Whether a native value of this type holds on to runtime-managed
    /// memory past the statement that produced it
    pub fn needs_rooting(&self) -> bool {
        match self {
            IdlType::Any | IdlType::Object | IdlType::Interface(_) | IdlType::Callback(_) => true,
            IdlType::Nullable(inner) | IdlType::Sequence(inner) => inner.needs_rooting(),
            IdlType::Primitive(_) | IdlType::String(_) | IdlType::Void => false,
        }
    }

    /// Check for `void`
    pub fn is_void(&self) -> bool {
        matches!(self, IdlType::Void)
    }

    /// Check for a string type
    pub fn is_string(&self) -> bool {
        matches!(self, IdlType::String(_))
    }

    /// Check for `T?`
    pub fn is_nullable(&self) -> bool {
        matches!(self, IdlType::Nullable(_))
    }
}

impl fmt::Display for IdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlType::Primitive(p) => write!(f, "{}", p.idl_name()),
            IdlType::String(IdlString::DomString) => write!(f, "DOMString"),
            IdlType::String(IdlString::ByteString) => write!(f, "ByteString"),
            IdlType::String(IdlString::UsvString) => write!(f, "USVString"),
            IdlType::Any => write!(f, "any"),
            IdlType::Object => write!(f, "object"),
            IdlType::Void => write!(f, "void"),
            IdlType::Interface(name) | IdlType::Callback(name) => write!(f, "{}", name),
            IdlType::Nullable(inner) => write!(f, "{}?", inner),
            IdlType::Sequence(inner) => write!(f, "sequence<{}>", inner),
        }
    }
}
