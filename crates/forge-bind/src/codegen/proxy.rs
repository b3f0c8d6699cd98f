//! Proxy trap generation
//!
//! Interfaces declaring special operations are reflected as exotic objects.
//! For such an interface this module emits:
//!
//! - `<Name>SpecialOperations`, the trait the native type implements
//! - `<snake>_traps`, a module of the six trap functions and `proxy_traps()`
//! - `<Name>Proxy`, a handle wrapper with one method per trap
//!
//! Every trap resolves a key in the same order: native special operation,
//! then the expando object, then the prototype chain.

use std::collections::BTreeMap;

use crate::codegen::class::{ClassSpec, Constructor, Method, TraitImpl};
use crate::codegen::conversion::{
    conversion_template, instantiate, is_index_type, wrap_for_type, ConversionOptions,
    FAILURE_ESCAPE,
};
use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::ir::{
    native_member_name, to_snake_case, CgNode, FailurePolicy, IdlType, InterfaceDescriptor,
    Operation, Signature, SpecialOperation,
};

/// A validated special operation
#[derive(Debug, Clone)]
struct SpecialMember<'a> {
    kind: SpecialOperation,
    op: &'a Operation,
    signature: &'a Signature,
    /// Native method name
    method: String,
    policy: FailurePolicy,
}

impl SpecialMember<'_> {
    /// Member name reported on failure
    fn member_name(&self) -> &str {
        if self.op.is_identifier_less() {
            self.kind.default_native_name()
        } else {
            &self.op.name
        }
    }

    /// Type of a present getter result
    ///
    /// A nullable return is folded into the `Option` marking absence.
    fn found_type(&self) -> &IdlType {
        match &self.signature.return_type {
            IdlType::Nullable(inner) => inner,
            other => other,
        }
    }

    fn key_type(&self) -> &'static str {
        match self.kind {
            SpecialOperation::NamedGetter
            | SpecialOperation::NamedSetter
            | SpecialOperation::NamedCreator => "String",
            _ => "u32",
        }
    }

    /// Method declaration inside the native trait
    fn trait_method(&self) -> String {
        let fallible = self.policy != FailurePolicy::Infallible;
        let wrap = |ty: String| {
            if fallible {
                format!("Fallible<{}>", ty)
            } else {
                ty
            }
        };
        let args = &self.signature.arguments;
        let arg_name = |i: usize| to_snake_case(&args[i].name);

        match self.kind {
            SpecialOperation::IndexedGetter | SpecialOperation::NamedGetter => format!(
                "fn {}(&self, {}: {}) -> {};",
                self.method,
                arg_name(0),
                self.key_type(),
                wrap(format!("Option<{}>", self.found_type().native_type()))
            ),
            SpecialOperation::Stringifier => format!(
                "fn {}(&self) -> {};",
                self.method,
                wrap(self.signature.return_type.native_type())
            ),
            _ => {
                let ret = if fallible {
                    " -> Fallible<()>".to_string()
                } else {
                    String::new()
                };
                format!(
                    "fn {}(&self, {}: {}, {}: {}){};",
                    self.method,
                    arg_name(0),
                    self.key_type(),
                    arg_name(1),
                    args[1].ty.native_type(),
                    ret
                )
            }
        }
    }
}

/// Generator for proxy-bearing interfaces
pub struct ProxyGenerator<'a> {
    descriptor: &'a InterfaceDescriptor,
    config: &'a GeneratorConfig,
}

impl<'a> ProxyGenerator<'a> {
    /// Create a new proxy generator
    pub fn new(descriptor: &'a InterfaceDescriptor, config: &'a GeneratorConfig) -> Self {
        Self { descriptor, config }
    }

    fn invalid(&self, operation: SpecialOperation, reason: impl Into<String>) -> GenerationError {
        GenerationError::InvalidSpecialOperation {
            interface: self.descriptor.name.clone(),
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Validate every declared special operation
    fn special_members(&self) -> Result<BTreeMap<SpecialOperation, SpecialMember<'a>>, GenerationError> {
        let d = self.descriptor;
        self.check_setter_creator(SpecialOperation::IndexedSetter, SpecialOperation::IndexedCreator)?;
        self.check_setter_creator(SpecialOperation::NamedSetter, SpecialOperation::NamedCreator)?;

        let mut members = BTreeMap::new();
        let mut names: BTreeMap<String, &Operation> = BTreeMap::new();

        for (&kind, op) in &d.operations {
            let [signature] = op.signatures.as_slice() else {
                return Err(self.invalid(kind, "special operations cannot be overloaded"));
            };
            let args = &signature.arguments;
            if args.len() != kind.arity() {
                return Err(self.invalid(
                    kind,
                    format!("expected {} arguments, found {}", kind.arity(), args.len()),
                ));
            }
            if args.iter().any(|a| a.optional || a.variadic) {
                return Err(self.invalid(kind, "arguments must be required"));
            }

            match kind {
                SpecialOperation::IndexedGetter
                | SpecialOperation::IndexedSetter
                | SpecialOperation::IndexedCreator => {
                    if !is_index_type(&args[0].ty) {
                        return Err(self.invalid(
                            kind,
                            format!("index argument must be unsigned long, found {}", args[0].ty),
                        ));
                    }
                }
                SpecialOperation::NamedGetter
                | SpecialOperation::NamedSetter
                | SpecialOperation::NamedCreator => {
                    if !args[0].ty.is_string() {
                        return Err(self.invalid(
                            kind,
                            format!("name argument must be a string, found {}", args[0].ty),
                        ));
                    }
                }
                SpecialOperation::Stringifier => {}
            }
            if matches!(
                kind,
                SpecialOperation::IndexedGetter
                    | SpecialOperation::NamedGetter
                    | SpecialOperation::Stringifier
            ) && signature.return_type.is_void()
            {
                return Err(self.invalid(kind, "must return a value"));
            }

            let method = if op.is_identifier_less() {
                kind.default_native_name().to_string()
            } else {
                native_member_name(&d.name, &op.name)?
            };
            if let Some(existing) = names.get(&method) {
                if *existing != op {
                    return Err(self.invalid(
                        kind,
                        format!("native method `{}` is already used by another operation", method),
                    ));
                }
            }
            names.insert(method.clone(), op);

            let member_name = if op.is_identifier_less() {
                kind.default_native_name()
            } else {
                op.name.as_str()
            };
            let policy = op
                .extended
                .failure
                .or(self.config.default_failure_policy)
                .ok_or_else(|| GenerationError::UnspecifiedFailurePolicy {
                    interface: d.name.clone(),
                    member: member_name.to_string(),
                })?;

            members.insert(
                kind,
                SpecialMember {
                    kind,
                    op,
                    signature,
                    method,
                    policy,
                },
            );
        }

        Ok(members)
    }

    /// A setter must be the same operation as its creator
    fn check_setter_creator(
        &self,
        setter: SpecialOperation,
        creator: SpecialOperation,
    ) -> Result<(), GenerationError> {
        let d = self.descriptor;
        let (s, c) = (d.special_operation(setter), d.special_operation(creator));
        if s == c {
            return Ok(());
        }
        let describe = |op: Option<&Operation>| match op {
            Some(op) if !op.is_identifier_less() => op.name.clone(),
            Some(_) => "<anonymous>".to_string(),
            None => "<none>".to_string(),
        };
        Err(GenerationError::MismatchedSetterCreator {
            interface: d.name.clone(),
            setter: describe(s),
            creator: describe(c),
        })
    }

    fn unwrap_native(&self) -> CgNode {
        CgNode::literal(format!(
            "let native = unwrap_proxy::<{}>(cx, proxy)?;",
            self.descriptor.concrete_type()
        ))
    }

    fn report(&self, member: &SpecialMember) -> String {
        format!(
            "cx.report_failure({:?}, {:?});",
            self.descriptor.name,
            member.member_name()
        )
    }

    /// Bind `found: Option<T>` to the getter's result for `key`
    fn getter_call(&self, getter: &SpecialMember, key: &str) -> CgNode {
        let call = format!("native.{}({})", getter.method, key);
        let decl = format!("let found: Option<{}> = ", getter.found_type().native_type());
        let lookup = match getter.policy {
            FailurePolicy::Infallible => CgNode::literal(format!("{}{};", decl, call)),
            FailurePolicy::Fallback => CgNode::literal(format!("{}{}.ok().flatten();", decl, call)),
            FailurePolicy::Propagate => CgNode::literal(format!(
                "{decl}match {call} {{\n    Ok(found) => found,\n    Err(_) => {{\n        {report}\n        return Err(Failure);\n    }}\n}};",
                report = self.report(getter)
            )),
        };
        CgNode::lines(vec![self.unwrap_native(), lookup])
    }

    /// Convert `desc.value` and hand it to the setter for `key`
    fn setter_call(&self, setter: &SpecialMember, key: &str) -> Result<CgNode, GenerationError> {
        let value_arg = &setter.signature.arguments[1];
        let options = ConversionOptions::failing().treat_null_as(value_arg.treat_null_as);
        let template = conversion_template(&value_arg.ty, &options)?;
        let call = format!("native.{}({}, value)", setter.method, key);

        let invoke = match setter.policy {
            FailurePolicy::Infallible => CgNode::literal(format!("{};", call)),
            FailurePolicy::Fallback => CgNode::if_wrap(
                format!("{}.is_err()", call),
                CgNode::literal("return Ok(false);"),
            ),
            FailurePolicy::Propagate => CgNode::if_wrap(
                format!("{}.is_err()", call),
                CgNode::lines(vec![
                    CgNode::literal(self.report(setter)),
                    CgNode::literal("return Err(Failure);"),
                ]),
            ),
        };

        Ok(CgNode::lines(vec![
            self.unwrap_native(),
            instantiate(&template, "desc.value", "value")?,
            invoke,
            CgNode::literal("return Ok(true);"),
        ]))
    }

    /// `let value = <result as script value>;`
    fn wrap_result(&self, ty: &IdlType) -> Result<CgNode, GenerationError> {
        Ok(CgNode::wrap(
            CgNode::literal(wrap_for_type(ty, "result", FAILURE_ESCAPE)?),
            "let value = ",
            ";",
        ))
    }

    fn trap(name: &str, params: &[(&str, &str)], ret: &str, body: Vec<CgNode>, indent: usize) -> CgNode {
        let mut method = Method::new(name, CgNode::lines(body))
            .public()
            .associated()
            .param("cx", "&dyn ScriptContext")
            .param("proxy", "ObjectHandle");
        for (param, ty) in params {
            method = method.param(*param, *ty);
        }
        method.returns(ret).render(indent)
    }

    fn index_block(body: CgNode) -> CgNode {
        CgNode::if_wrap("let Some(index) = key.array_index()", body)
    }

    /// String keys not shadowed by the prototype chain
    fn name_block(body: CgNode) -> CgNode {
        CgNode::if_wrap(
            "let Some(name) = key.as_name()",
            CgNode::if_wrap("!has_property_on_prototype(cx, proxy, key)?", body),
        )
    }

    fn get_own_property_descriptor(
        &self,
        ops: &BTreeMap<SpecialOperation, SpecialMember>,
    ) -> Result<CgNode, GenerationError> {
        use SpecialOperation::*;
        let mut body = Vec::new();

        if let Some(getter) = ops.get(&IndexedGetter) {
            body.push(Self::index_block(CgNode::lines(vec![
                self.getter_call(getter, "index"),
                CgNode::if_wrap(
                    "let Some(result) = found",
                    CgNode::lines(vec![
                        self.wrap_result(getter.found_type())?,
                        CgNode::literal(format!(
                            "return Ok(Some(fill_property_descriptor(proxy, value, {})));",
                            !ops.contains_key(&IndexedSetter)
                        )),
                    ]),
                ),
            ])));
        }

        let placeholder = "return Ok(Some(fill_property_descriptor(proxy, ScriptValue::Undefined, false)));";
        let mut placeholders = Vec::new();
        if ops.contains_key(&IndexedSetter) {
            placeholders.push(CgNode::if_wrap(
                "key.array_index().is_some()",
                CgNode::literal(placeholder),
            ));
        }
        if ops.contains_key(&NamedSetter) {
            placeholders.push(CgNode::if_wrap(
                "key.as_name().is_some()",
                CgNode::literal(placeholder),
            ));
        }
        let set_param = if placeholders.is_empty() { "_set" } else { "set" };
        if !placeholders.is_empty() {
            body.push(CgNode::if_wrap("set", CgNode::lines(placeholders)));
        }

        if let Some(getter) = ops.get(&NamedGetter) {
            body.push(Self::name_block(CgNode::lines(vec![
                self.getter_call(getter, "name.to_string()"),
                CgNode::if_wrap(
                    "let Some(result) = found",
                    CgNode::lines(vec![
                        self.wrap_result(getter.found_type())?,
                        CgNode::literal(format!(
                            "return Ok(Some(fill_property_descriptor(proxy, value, {})));",
                            !ops.contains_key(&NamedSetter)
                        )),
                    ]),
                ),
            ])));
        }

        body.push(CgNode::literal("get_expando_descriptor(cx, proxy, key)"));
        Ok(Self::trap(
            "get_own_property_descriptor",
            &[("key", "&PropertyKey"), (set_param, "bool")],
            "Fallible<Option<PropertyDescriptor>>",
            body,
            self.config.indent,
        ))
    }

    fn define_property(
        &self,
        ops: &BTreeMap<SpecialOperation, SpecialMember>,
    ) -> Result<CgNode, GenerationError> {
        use SpecialOperation::*;
        let mut body = Vec::new();

        if let Some(setter) = ops.get(&IndexedSetter) {
            body.push(Self::index_block(self.setter_call(setter, "index")?));
        } else if ops.contains_key(&IndexedGetter) {
            body.push(CgNode::if_wrap(
                "key.array_index().is_some()",
                CgNode::literal("return Ok(false);"),
            ));
        }

        if let Some(setter) = ops.get(&NamedSetter) {
            body.push(CgNode::if_wrap(
                "let Some(name) = key.as_name()",
                self.setter_call(setter, "name.to_string()")?,
            ));
        } else if let Some(getter) = ops.get(&NamedGetter) {
            body.push(CgNode::if_wrap(
                "let Some(name) = key.as_name()",
                CgNode::lines(vec![
                    self.getter_call(getter, "name.to_string()"),
                    CgNode::if_wrap("found.is_some()", CgNode::literal("return Ok(false);")),
                ]),
            ));
        }

        body.push(CgNode::literal("define_property_on_expando(cx, proxy, key, desc)"));
        Ok(Self::trap(
            "define_property",
            &[("key", "&PropertyKey"), ("desc", "&PropertyDescriptor")],
            "Fallible<bool>",
            body,
            self.config.indent,
        ))
    }

    /// `has_own` and `delete` share their shape: a getter hit decides
    fn getter_probe(
        &self,
        ops: &BTreeMap<SpecialOperation, SpecialMember>,
        on_hit: &str,
    ) -> Vec<CgNode> {
        let mut body = Vec::new();
        if let Some(getter) = ops.get(&SpecialOperation::IndexedGetter) {
            body.push(Self::index_block(CgNode::lines(vec![
                self.getter_call(getter, "index"),
                CgNode::if_wrap("found.is_some()", CgNode::literal(on_hit)),
            ])));
        }
        if let Some(getter) = ops.get(&SpecialOperation::NamedGetter) {
            body.push(Self::name_block(CgNode::lines(vec![
                self.getter_call(getter, "name.to_string()"),
                CgNode::if_wrap("found.is_some()", CgNode::literal(on_hit)),
            ])));
        }
        body
    }

    fn has_own(&self, ops: &BTreeMap<SpecialOperation, SpecialMember>) -> CgNode {
        let mut body = self.getter_probe(ops, "return Ok(true);");
        body.push(CgNode::literal("has_on_expando(cx, proxy, key)"));
        Self::trap(
            "has_own",
            &[("key", "&PropertyKey")],
            "Fallible<bool>",
            body,
            self.config.indent,
        )
    }

    fn delete(&self, ops: &BTreeMap<SpecialOperation, SpecialMember>) -> CgNode {
        let mut body = self.getter_probe(ops, "return Ok(false);");
        body.push(CgNode::literal("delete_from_expando(cx, proxy, key)"));
        Self::trap(
            "delete",
            &[("key", "&PropertyKey")],
            "Fallible<bool>",
            body,
            self.config.indent,
        )
    }

    /// `get` consults the named getter too, between the indexed getter and
    /// the expando, so a named hit wins over the expando here exactly as it
    /// does in `has_own` and `get_own_property_descriptor`
    fn get(&self, ops: &BTreeMap<SpecialOperation, SpecialMember>) -> Result<CgNode, GenerationError> {
        let mut body = Vec::new();
        let hit = |getter: &SpecialMember| -> Result<CgNode, GenerationError> {
            Ok(CgNode::if_wrap(
                "let Some(result) = found",
                CgNode::lines(vec![
                    self.wrap_result(getter.found_type())?,
                    CgNode::literal("return Ok(value);"),
                ]),
            ))
        };

        if let Some(getter) = ops.get(&SpecialOperation::IndexedGetter) {
            body.push(Self::index_block(CgNode::lines(vec![
                self.getter_call(getter, "index"),
                hit(getter)?,
            ])));
        }
        if let Some(getter) = ops.get(&SpecialOperation::NamedGetter) {
            body.push(Self::name_block(CgNode::lines(vec![
                self.getter_call(getter, "name.to_string()"),
                hit(getter)?,
            ])));
        }

        body.push(CgNode::if_wrap(
            "let Some(value) = get_from_expando(cx, proxy, key)?",
            CgNode::literal("return Ok(value);"),
        ));
        body.push(CgNode::literal(
            "Ok(get_property_on_prototype(cx, proxy, key)?.unwrap_or_default())",
        ));
        Ok(Self::trap(
            "get",
            &[("key", "&PropertyKey")],
            "Fallible<ScriptValue>",
            body,
            self.config.indent,
        ))
    }

    fn stringify(&self, ops: &BTreeMap<SpecialOperation, SpecialMember>) -> Result<CgNode, GenerationError> {
        let fallback = format!(
            "ScriptValue::String(default_stringify({:?}))",
            self.descriptor.name
        );

        let body = match ops.get(&SpecialOperation::Stringifier) {
            None => {
                return Ok(Method::new("stringify", CgNode::literal(format!("Ok({})", fallback)))
                    .public()
                    .associated()
                    .param("_cx", "&dyn ScriptContext")
                    .param("_proxy", "ObjectHandle")
                    .returns("Fallible<ScriptValue>")
                    .render(self.config.indent));
            }
            Some(stringifier) => {
                let call = format!("native.{}()", stringifier.method);
                let decl = format!(
                    "let result: {} = ",
                    stringifier.signature.return_type.native_type()
                );
                let result = match stringifier.policy {
                    FailurePolicy::Infallible => CgNode::literal(format!("{}{};", decl, call)),
                    FailurePolicy::Fallback => CgNode::literal(format!(
                        "{decl}match {call} {{\n    Ok(result) => result,\n    Err(_) => return Ok({fallback}),\n}};"
                    )),
                    FailurePolicy::Propagate => CgNode::literal(format!(
                        "{decl}match {call} {{\n    Ok(result) => result,\n    Err(_) => {{\n        {report}\n        return Err(Failure);\n    }}\n}};",
                        report = self.report(stringifier)
                    )),
                };
                vec![
                    self.unwrap_native(),
                    result,
                    self.wrap_result(&stringifier.signature.return_type)?,
                    CgNode::literal("Ok(value)"),
                ]
            }
        };

        Ok(Self::trap(
            "stringify",
            &[],
            "Fallible<ScriptValue>",
            body,
            self.config.indent,
        ))
    }

    fn native_trait(&self, ops: &BTreeMap<SpecialOperation, SpecialMember>) -> CgNode {
        let d = self.descriptor;
        let mut seen = Vec::new();
        let mut methods = Vec::new();
        for member in ops.values() {
            if seen.contains(&member.method) {
                continue;
            }
            seen.push(member.method.clone());
            methods.push(CgNode::literal(member.trait_method()));
        }

        CgNode::wrap(
            CgNode::indent_by(CgNode::lines(methods), self.config.indent),
            format!(
                "/// Special operations of `{}` implemented by its native type\npub trait {}SpecialOperations {{\n",
                d.name, d.name
            ),
            "\n}",
        )
    }

    fn traps_module(&self, ops: &BTreeMap<SpecialOperation, SpecialMember>) -> Result<CgNode, GenerationError> {
        let items = vec![
            CgNode::literal("use super::*;"),
            self.get_own_property_descriptor(ops)?,
            self.define_property(ops)?,
            self.has_own(ops),
            self.get(ops)?,
            self.delete(ops),
            self.stringify(ops)?,
            CgNode::literal(
                "/// Trap table to install for this interface\npub fn proxy_traps() -> ProxyTraps {\n    ProxyTraps {\n        get_own_property_descriptor,\n        define_property,\n        has_own,\n        get,\n        delete,\n        stringify,\n    }\n}",
            ),
        ];

        let name = format!("{}_traps", to_snake_case(&self.descriptor.name));
        Ok(CgNode::namespace(
            &name,
            CgNode::wrap(
                CgNode::indent_by(CgNode::sequence(items, "\n\n"), self.config.indent),
                "",
                "\n",
            ),
            true,
        ))
    }

    fn proxy_class(&self) -> Result<CgNode, GenerationError> {
        let d = self.descriptor;
        let module = format!("{}_traps", to_snake_case(&d.name));
        let forward = |name: &str, params: &[(&str, &str)], ret: &str| {
            let mut args = vec!["cx".to_string(), "self.parent".to_string()];
            args.extend(params.iter().map(|(p, _)| p.to_string()));
            let mut method = Method::new(
                name,
                CgNode::literal(format!("{}::{}({})", module, name, args.join(", "))),
            )
            .public()
            .param("cx", "&dyn ScriptContext");
            for (param, ty) in params {
                method = method.param(*param, *ty);
            }
            method.returns(ret)
        };

        ClassSpec::new(format!("{}Proxy", d.name))
            .base("ObjectHandle")
            .decorator("#[derive(Debug, Clone, Copy, PartialEq, Eq)]")
            .with_doc(format!("Proxy object reflecting a native `{}`", d.concrete_type()))
            .constructor(Constructor::new().param("proxy", "ObjectHandle").base("proxy"))
            .method(forward(
                "get_own_property_descriptor",
                &[("key", "&PropertyKey"), ("set", "bool")],
                "Fallible<Option<PropertyDescriptor>>",
            ))
            .method(forward(
                "define_property",
                &[("key", "&PropertyKey"), ("desc", "&PropertyDescriptor")],
                "Fallible<bool>",
            ))
            .method(forward("has_own", &[("key", "&PropertyKey")], "Fallible<bool>"))
            .method(forward("get", &[("key", "&PropertyKey")], "Fallible<ScriptValue>"))
            .method(forward("delete", &[("key", "&PropertyKey")], "Fallible<bool>"))
            .method(forward("stringify", &[], "Fallible<ScriptValue>"))
            .trait_impl(
                TraitImpl::new("Reflectable")
                    .method(Method::new("reflector", CgNode::literal("self.parent")).returns("ObjectHandle")),
            )
            .build(self.config.indent)
    }

    /// Generate the native trait, trap module and proxy class
    pub fn generate(&self) -> Result<CgNode, GenerationError> {
        let ops = self.special_members()?;
        tracing::debug!(
            interface = %self.descriptor.name,
            operations = ?ops.keys().collect::<Vec<_>>(),
            "generating proxy traps"
        );

        Ok(CgNode::sequence(
            vec![
                CgNode::wrap(self.native_trait(&ops), "", "\n"),
                self.proxy_class()?,
                self.traps_module(&ops)?,
            ],
            "\n",
        ))
    }
}
