//! Interface descriptors
//!
//! An [`InterfaceDescriptor`] is the resolved, typed description of one
//! interface as produced by the front end. It is immutable for the whole
//! generation pass.

use crate::ir::IdlType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a `null` value is coerced when converting to a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatNullAs {
    /// `null` stringifies to `"null"`
    #[default]
    Default,
    /// `null` becomes the empty string
    EmptyString,
}

/// What generated code does when a fallible native call fails
///
/// There is no implicit default: either the member carries a policy or the
/// generator configuration supplies one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The native call cannot fail and returns its value directly
    Infallible,
    /// Report the failure to the runtime and return the opaque failure
    Propagate,
    /// Swallow the failure and behave as if nothing was found
    Fallback,
}

/// Per-member extended attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedAttributes {
    /// Failure policy of the native call
    #[serde(default)]
    pub failure: Option<FailurePolicy>,
    /// Null coercion for string-typed values
    #[serde(default)]
    pub treat_null_as: TreatNullAs,
}

/// One argument of a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// IDL name
    pub name: String,
    /// Resolved type
    #[serde(rename = "type")]
    pub ty: IdlType,
    /// `optional` keyword present
    #[serde(default)]
    pub optional: bool,
    /// Trailing `...`
    #[serde(default)]
    pub variadic: bool,
    /// Default value expression, if any
    #[serde(default)]
    pub default_value: Option<String>,
    /// Null coercion for this argument
    #[serde(default)]
    pub treat_null_as: TreatNullAs,
}

impl Argument {
    /// Create a required argument
    pub fn new(name: impl Into<String>, ty: IdlType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            variadic: false,
            default_value: None,
            treat_null_as: TreatNullAs::Default,
        }
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark as variadic
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Set a default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.optional = true;
        self.default_value = Some(value.into());
        self
    }

    /// Set null coercion
    pub fn treat_null_as(mut self, policy: TreatNullAs) -> Self {
        self.treat_null_as = policy;
        self
    }

    /// Optional without a default, so the caller may leave it out
    pub fn is_omittable(&self) -> bool {
        self.optional && self.default_value.is_none() && !self.variadic
    }

    /// Native type of the parameter in generated method signatures
    pub fn native_param_type(&self) -> String {
        if self.variadic {
            format!("Vec<{}>", self.ty.native_type())
        } else if self.is_omittable() {
            format!("Option<{}>", self.ty.native_type())
        } else {
            self.ty.native_type()
        }
    }
}

/// Return type plus ordered arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Return type
    pub return_type: IdlType,
    /// Arguments in declaration order
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

impl Signature {
    /// Create a signature
    pub fn new(return_type: IdlType, arguments: Vec<Argument>) -> Self {
        Self {
            return_type,
            arguments,
        }
    }

    /// `void` signature without arguments
    pub fn void() -> Self {
        Self::new(IdlType::Void, Vec::new())
    }

    /// Whether the last argument is variadic
    pub fn is_variadic(&self) -> bool {
        self.arguments.last().map(|a| a.variadic).unwrap_or(false)
    }
}

/// An operation with one or more overload signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// IDL identifier; empty for identifier-less special operations
    #[serde(default)]
    pub name: String,
    /// Overload signatures
    pub signatures: Vec<Signature>,
    /// Static operation
    #[serde(default)]
    pub is_static: bool,
    /// Extended attributes
    #[serde(default)]
    pub extended: ExtendedAttributes,
}

impl Operation {
    /// Create an operation with one signature
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signatures: vec![signature],
            is_static: false,
            extended: ExtendedAttributes::default(),
        }
    }

    /// Add an overload signature
    pub fn overload(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Mark as static
    pub fn static_op(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the failure policy
    pub fn with_failure(mut self, policy: FailurePolicy) -> Self {
        self.extended.failure = Some(policy);
        self
    }

    /// Mark as infallible
    pub fn infallible(self) -> Self {
        self.with_failure(FailurePolicy::Infallible)
    }

    /// Check for an identifier-less operation
    pub fn is_identifier_less(&self) -> bool {
        self.name.is_empty()
    }
}

/// An attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// IDL identifier
    pub name: String,
    /// Attribute type
    #[serde(rename = "type")]
    pub ty: IdlType,
    /// `readonly`
    #[serde(default)]
    pub readonly: bool,
    /// `static`
    #[serde(default)]
    pub is_static: bool,
    /// Extended attributes
    #[serde(default)]
    pub extended: ExtendedAttributes,
}

impl Attribute {
    /// Create a writable attribute
    pub fn new(name: impl Into<String>, ty: IdlType) -> Self {
        Self {
            name: name.into(),
            ty,
            readonly: false,
            is_static: false,
            extended: ExtendedAttributes::default(),
        }
    }

    /// Mark as readonly
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Mark as static
    pub fn static_attr(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// An interface member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "member")]
pub enum Member {
    Operation(Operation),
    Attribute(Attribute),
}

/// Special operations that turn an interface into an exotic object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecialOperation {
    IndexedGetter,
    IndexedSetter,
    IndexedCreator,
    NamedGetter,
    NamedSetter,
    NamedCreator,
    Stringifier,
}

impl SpecialOperation {
    /// All special operations
    pub const ALL: [SpecialOperation; 7] = [
        SpecialOperation::IndexedGetter,
        SpecialOperation::IndexedSetter,
        SpecialOperation::IndexedCreator,
        SpecialOperation::NamedGetter,
        SpecialOperation::NamedSetter,
        SpecialOperation::NamedCreator,
        SpecialOperation::Stringifier,
    ];

    /// Native method name used when the operation has no identifier
    pub fn default_native_name(&self) -> &'static str {
        match self {
            SpecialOperation::IndexedGetter => "indexed_getter",
            SpecialOperation::IndexedSetter => "indexed_setter",
            SpecialOperation::IndexedCreator => "indexed_creator",
            SpecialOperation::NamedGetter => "named_getter",
            SpecialOperation::NamedSetter => "named_setter",
            SpecialOperation::NamedCreator => "named_creator",
            SpecialOperation::Stringifier => "stringifier",
        }
    }

    /// Number of arguments the operation must take
    pub fn arity(&self) -> usize {
        match self {
            SpecialOperation::IndexedGetter | SpecialOperation::NamedGetter => 1,
            SpecialOperation::IndexedSetter
            | SpecialOperation::IndexedCreator
            | SpecialOperation::NamedSetter
            | SpecialOperation::NamedCreator => 2,
            SpecialOperation::Stringifier => 0,
        }
    }
}

impl fmt::Display for SpecialOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Kind of interface being bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceKind {
    /// Native-backed interface, possibly with special operations
    #[default]
    Interface,
    /// Callback interface implemented by a script object
    CallbackInterface,
    /// Callback function type
    CallbackFunction,
}

/// Resolved description of one interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    /// Interface name
    pub name: String,
    /// Kind of interface
    #[serde(default)]
    pub kind: InterfaceKind,
    /// Native type backing proxy objects (defaults to the interface name)
    #[serde(default)]
    pub native_type: Option<String>,
    /// Members in declaration order
    #[serde(default)]
    pub members: Vec<Member>,
    /// Special operations by kind
    #[serde(default)]
    pub operations: BTreeMap<SpecialOperation, Operation>,
    /// Callback interface with exactly one operation
    #[serde(default)]
    pub single_operation: bool,
    /// Implemented in script rather than natively
    #[serde(default)]
    pub script_implemented: bool,
    /// Documentation
    #[serde(default)]
    pub doc: Option<String>,
}

impl InterfaceDescriptor {
    /// Create a native-backed interface
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: InterfaceKind::Interface,
            native_type: None,
            members: Vec::new(),
            operations: BTreeMap::new(),
            single_operation: false,
            script_implemented: false,
            doc: None,
        }
    }

    /// Create a callback interface
    pub fn callback_interface(name: impl Into<String>) -> Self {
        Self {
            kind: InterfaceKind::CallbackInterface,
            ..Self::new(name)
        }
    }

    /// Create a callback function with its signature
    pub fn callback_function(name: impl Into<String>, signature: Signature) -> Self {
        let mut descriptor = Self {
            kind: InterfaceKind::CallbackFunction,
            ..Self::new(name)
        };
        descriptor
            .members
            .push(Member::Operation(Operation::new("call", signature)));
        descriptor
    }

    /// Parse a descriptor from front end JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add an operation member
    pub fn operation(mut self, op: Operation) -> Self {
        self.members.push(Member::Operation(op));
        self
    }

    /// Add an attribute member
    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.members.push(Member::Attribute(attr));
        self
    }

    /// Declare a special operation
    pub fn special(mut self, kind: SpecialOperation, op: Operation) -> Self {
        self.operations.insert(kind, op);
        self
    }

    /// Set the native type
    pub fn with_native_type(mut self, ty: impl Into<String>) -> Self {
        self.native_type = Some(ty.into());
        self
    }

    /// Mark as a single-operation callback interface
    pub fn single_operation(mut self) -> Self {
        self.single_operation = true;
        self
    }

    /// Mark as script-implemented
    pub fn script_implemented(mut self) -> Self {
        self.script_implemented = true;
        self
    }

    /// Set documentation
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Look up a special operation
    pub fn special_operation(&self, kind: SpecialOperation) -> Option<&Operation> {
        self.operations.get(&kind)
    }

    /// Whether a special operation is declared
    pub fn has(&self, kind: SpecialOperation) -> bool {
        self.operations.contains_key(&kind)
    }

    /// Whether the interface needs proxy traps
    pub fn is_proxy(&self) -> bool {
        self.kind == InterfaceKind::Interface && !self.operations.is_empty()
    }

    /// Native type name of the backing object
    pub fn concrete_type(&self) -> &str {
        self.native_type.as_deref().unwrap_or(&self.name)
    }

    /// Non-static operations in declaration order
    pub fn regular_operations(&self) -> impl Iterator<Item = &Operation> {
        self.members.iter().filter_map(|m| match m {
            Member::Operation(op) if !op.is_static => Some(op),
            _ => None,
        })
    }

    /// Non-static attributes in declaration order
    pub fn regular_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.members.iter().filter_map(|m| match m {
            Member::Attribute(attr) if !attr.is_static => Some(attr),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_function_member() {
        let descriptor = InterfaceDescriptor::callback_function(
            "Function",
            Signature::new(IdlType::Any, vec![Argument::new("args", IdlType::Any).variadic()]),
        );
        assert_eq!(descriptor.kind, InterfaceKind::CallbackFunction);
        let op = descriptor.regular_operations().next().unwrap();
        assert_eq!(op.name, "call");
        assert!(op.signatures[0].is_variadic());
    }

    #[test]
    fn test_argument_param_types() {
        assert_eq!(
            Argument::new("x", IdlType::long()).optional().native_param_type(),
            "Option<i32>"
        );
        assert_eq!(
            Argument::new("x", IdlType::long()).with_default("0").native_param_type(),
            "i32"
        );
        assert_eq!(
            Argument::new("x", IdlType::Any).variadic().native_param_type(),
            "Vec<ScriptValue>"
        );
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "name": "HTMLCollection",
            "members": [
                {"member": "attribute", "name": "length", "type": {"primitive": "unsigned_long"}, "readonly": true}
            ],
            "operations": {
                "IndexedGetter": {
                    "name": "item",
                    "signatures": [{
                        "return_type": {"nullable": {"interface": "Element"}},
                        "arguments": [{"name": "index", "type": {"primitive": "unsigned_long"}}]
                    }],
                    "extended": {"failure": "infallible"}
                }
            }
        }"#;

        let descriptor = InterfaceDescriptor::from_json(json).unwrap();
        assert!(descriptor.is_proxy());
        assert_eq!(descriptor.concrete_type(), "HTMLCollection");
        let getter = descriptor
            .special_operation(SpecialOperation::IndexedGetter)
            .unwrap();
        assert_eq!(getter.extended.failure, Some(FailurePolicy::Infallible));
        assert_eq!(descriptor.regular_attributes().count(), 1);
    }
}
