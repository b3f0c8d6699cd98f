//! Callback invoker generation
//!
//! Turns callback functions and callback interfaces into native classes
//! whose methods call back into script. Members that let the caller choose
//! `this` become three methods:
//!
//! - `<name>_with_this<T: Reflectable>` delegates with the caller's reflector
//! - `<name>` delegates with no `this`
//! - `<name>_impl` holds call setup, the wrapping of `this` into the
//!   callback's realm, argument conversion, the call and the result
//!   conversion
//!
//! Every other member becomes a single method with the same body shape.

use std::collections::BTreeSet;

use crate::codegen::class::{
    ClassSpec, Constructor, ForwardImpl, ForwardMethod, Method, Param, TraitImpl,
};
use crate::codegen::conversion::{
    conversion_template, instantiate, wrap_for_type, ConversionOptions, FAILURE_ESCAPE,
};
use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::ir::{
    is_identifier, native_member_name, to_snake_case, validate_member_name, Argument, CgNode,
    IdlType, InterfaceDescriptor, InterfaceKind, Signature, TreatNullAs,
};

/// Local names used by generated bodies; arguments with these names get a
/// trailing `_`
const RESERVED_LOCALS: &[&str] = &[
    "cx",
    "handling",
    "this_obj",
    "argv",
    "argc",
    "rval",
    "rval_decl",
    "rval_decl_root",
    "callable",
    "is_callable",
    "idx",
    "root",
];

/// Who chooses `this` for the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisHandling {
    /// `this` is the callback object
    Fixed,
    /// The caller supplies `this` (or none)
    CallerSupplied,
}

/// What gets called
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// The callback object itself
    Callable,
    /// A callable property of the callback object
    Property(String),
    /// The object if it is callable, else its callable property
    SingleOperation(String),
}

/// Body strategy of a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackBody {
    Invoke {
        target: CallTarget,
        signature: Signature,
        treat_null_as: TreatNullAs,
    },
    GetAttribute {
        name: String,
        ty: IdlType,
        treat_null_as: TreatNullAs,
    },
    SetAttribute {
        name: String,
        ty: IdlType,
    },
}

/// One invocable entry of a callback class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackMember {
    /// Native method name
    pub method_name: String,
    pub this_handling: ThisHandling,
    pub body: CallbackBody,
    /// Script-implemented interfaces rethrow content exceptions instead of
    /// taking an `ExceptionHandling` argument
    pub script_implemented: bool,
}

impl CallbackMember {
    /// Native parameters following `cx` (and `this_obj`)
    fn params(&self, interface: &str) -> Result<Vec<Param>, GenerationError> {
        let mut params = match &self.body {
            CallbackBody::Invoke { signature, .. } => signature
                .arguments
                .iter()
                .map(|arg| Ok(Param::new(arg_local(interface, arg)?, arg.native_param_type())))
                .collect::<Result<Vec<_>, GenerationError>>()?,
            CallbackBody::GetAttribute { .. } => Vec::new(),
            CallbackBody::SetAttribute { ty, .. } => vec![Param::new("value", ty.native_type())],
        };
        if !self.script_implemented {
            params.push(Param::new("handling", "ExceptionHandling"));
        }
        Ok(params)
    }

    fn return_type(&self) -> String {
        match &self.body {
            CallbackBody::Invoke { signature, .. } => {
                format!("Fallible<{}>", signature.return_type.native_type())
            }
            CallbackBody::GetAttribute { ty, .. } => format!("Fallible<{}>", ty.native_type()),
            CallbackBody::SetAttribute { .. } => "Fallible<()>".to_string(),
        }
    }

    /// Every native method this member emits
    fn method_names(&self) -> Vec<String> {
        match self.this_handling {
            ThisHandling::Fixed => vec![self.method_name.clone()],
            ThisHandling::CallerSupplied => vec![
                format!("{}_with_this", self.method_name),
                self.method_name.clone(),
                format!("{}_impl", self.method_name),
            ],
        }
    }

    fn handling_expr(&self) -> &'static str {
        if self.script_implemented {
            "ExceptionHandling::RethrowContentExceptions"
        } else {
            "handling"
        }
    }

    /// Generate the methods of this member: one for fixed `this`, three
    /// for caller-supplied `this`
    pub fn methods(&self, interface: &str) -> Result<Vec<Method>, GenerationError> {
        let params = self.params(interface)?;
        let ret = self.return_type();
        let body = self.worker_body(interface)?;

        match self.this_handling {
            ThisHandling::Fixed => Ok(vec![Method::new(&self.method_name, body)
                .public()
                .param("cx", "&dyn ScriptContext")
                .with_params(params)
                .returns(ret)]),
            ThisHandling::CallerSupplied => {
                let worker = format!("{}_impl", self.method_name);
                let forwarded: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
                let forwarded = forwarded.join(", ");
                let tail = if forwarded.is_empty() {
                    String::new()
                } else {
                    format!(", {}", forwarded)
                };

                let with_this = Method::new(
                    format!("{}_with_this", self.method_name),
                    CgNode::literal(format!(
                        "self.{}(cx, Some(this_obj.reflector()){})",
                        worker, tail
                    )),
                )
                .public()
                .with_generics("T: Reflectable")
                .param("cx", "&dyn ScriptContext")
                .param("this_obj", "&T")
                .with_params(params.clone())
                .returns(&ret);

                let plain = Method::new(
                    &self.method_name,
                    CgNode::literal(format!("self.{}(cx, None{})", worker, tail)),
                )
                .public()
                .param("cx", "&dyn ScriptContext")
                .with_params(params.clone())
                .returns(&ret);

                let imp = Method::new(worker, body)
                    .param("cx", "&dyn ScriptContext")
                    .param("this_obj", "Option<ObjectHandle>")
                    .with_params(params)
                    .returns(ret);

                Ok(vec![with_this, plain, imp])
            }
        }
    }

    fn worker_body(&self, interface: &str) -> Result<CgNode, GenerationError> {
        let setup = CgNode::literal(format!(
            "let _setup = CallSetup::new(cx, &self.parent, {})?;",
            self.handling_expr()
        ));

        match &self.body {
            CallbackBody::Invoke {
                target,
                signature,
                treat_null_as,
            } => {
                let this_expr = match self.this_handling {
                    ThisHandling::CallerSupplied => "this_obj",
                    ThisHandling::Fixed => "Some(self.parent.callback())",
                };
                let call = format!("cx.call({}, &callable, &argv)?", this_expr);

                let mut lines = vec![setup];
                if self.this_handling == ThisHandling::CallerSupplied {
                    lines.push(CgNode::literal(
                        "let this_obj = wrap_call_this_object(cx, this_obj)?;",
                    ));
                }
                lines.push(argument_conversions(interface, &signature.arguments)?);
                lines.push(call_target(target));
                lines.extend(result_conversion(
                    &signature.return_type,
                    *treat_null_as,
                    call,
                )?);
                Ok(CgNode::lines(lines))
            }

            CallbackBody::GetAttribute {
                name,
                ty,
                treat_null_as,
            } => {
                let get = format!(
                    "cx.get_property(self.parent.callback(), &PropertyKey::from({:?}))?",
                    name
                );
                let mut lines = vec![setup];
                lines.extend(result_conversion(ty, *treat_null_as, get)?);
                Ok(CgNode::lines(lines))
            }

            CallbackBody::SetAttribute { name, ty } => Ok(CgNode::lines(vec![
                setup,
                CgNode::wrap(
                    CgNode::literal(wrap_for_type(ty, "value", FAILURE_ESCAPE)?),
                    "let value_arg = Rooted::new(cx, ",
                    ");",
                ),
                CgNode::literal(format!(
                    "cx.set_property(self.parent.callback(), &PropertyKey::from({:?}), value_arg.get().clone())?;",
                    name
                )),
                CgNode::literal("Ok(())"),
            ])),
        }
    }
}

/// Native local name of an argument
fn arg_local(interface: &str, arg: &Argument) -> Result<String, GenerationError> {
    let name = native_member_name(interface, &arg.name)?;
    if RESERVED_LOCALS.contains(&name.as_str()) {
        Ok(format!("{}_", name))
    } else {
        Ok(name)
    }
}

/// Root every argument's script value and assemble `argv`
fn argument_conversions(interface: &str, args: &[Argument]) -> Result<CgNode, GenerationError> {
    let mut lines = Vec::new();
    let mut fill = Vec::new();
    let fixed: Vec<&Argument> = args.iter().filter(|a| !a.variadic).collect();
    let mut variadic: Option<String> = None;

    for (i, arg) in args.iter().enumerate() {
        let local = arg_local(interface, arg)?;
        if arg.variadic {
            let wrapped = wrap_for_type(&arg.ty, &format!("{}[idx]", local), FAILURE_ESCAPE)?;
            lines.push(CgNode::lines(vec![
                CgNode::literal(format!(
                    "let mut {local}_args = Vec::with_capacity({local}.len());"
                )),
                CgNode::wrap(
                    CgNode::indent(CgNode::wrap(
                        CgNode::literal(wrapped),
                        format!("{}_args.push(Rooted::new(cx, ", local),
                        "));",
                    )),
                    format!("for idx in 0..{}.len() {{\n", local),
                    "\n}",
                ),
            ]));
            variadic = Some(local);
        } else if arg.is_omittable() {
            let wrapped = wrap_for_type(&arg.ty, &local, FAILURE_ESCAPE)?;
            lines.push(CgNode::wrap(
                CgNode::indent(CgNode::lines(vec![
                    CgNode::wrap(
                        CgNode::literal(wrapped),
                        format!("Some({}) => Some(Rooted::new(cx, ", local),
                        ")),",
                    ),
                    CgNode::literal("None => None,"),
                ])),
                format!("let {local}_arg = match &{local} {{\n"),
                "\n};",
            ));
            fill.push(CgNode::if_wrap(
                format!("let Some(root) = &{}_arg", local),
                CgNode::literal(format!("argv[{}] = root.get().clone();", i)),
            ));
        } else {
            let wrapped = wrap_for_type(&arg.ty, &local, FAILURE_ESCAPE)?;
            lines.push(CgNode::wrap(
                CgNode::literal(wrapped),
                format!("let {}_arg = Rooted::new(cx, ", local),
                ");",
            ));
            fill.push(CgNode::literal(format!(
                "argv[{}] = {}_arg.get().clone();",
                i, local
            )));
        }
    }

    if fixed.is_empty() && variadic.is_none() {
        lines.push(CgNode::literal("let argv: Vec<ScriptValue> = Vec::new();"));
        return Ok(CgNode::lines(lines));
    }

    if fixed.is_empty() {
        lines.push(CgNode::literal("let mut argv: Vec<ScriptValue> = Vec::new();"));
    } else {
        lines.push(CgNode::literal(format!(
            "let mut argv: Vec<ScriptValue> = vec![ScriptValue::Undefined; {}];",
            fixed.len()
        )));
    }
    lines.extend(fill);

    // Trailing omitted arguments are not passed at all
    let trailing: Vec<usize> = (0..fixed.len())
        .rev()
        .take_while(|&i| fixed[i].is_omittable())
        .collect();
    if !trailing.is_empty() {
        lines.push(CgNode::literal(format!("let mut argc = {};", fixed.len())));
        let mut nested: Option<CgNode> = None;
        for &i in trailing.iter().rev() {
            let local = arg_local(interface, fixed[i])?;
            let assign = CgNode::literal(format!("argc = {};", i));
            let body = match nested.take() {
                Some(inner) => CgNode::lines(vec![assign, inner]),
                None => assign,
            };
            let mut condition = format!("{}_arg.is_none()", local);
            if i == fixed.len() - 1 {
                if let Some(rest) = &variadic {
                    condition = format!("{}.is_empty() && {}", rest, condition);
                }
            }
            nested = Some(CgNode::if_wrap(condition, body));
        }
        lines.extend(nested);
        lines.push(CgNode::literal("argv.truncate(argc);"));
    }

    if let Some(rest) = variadic {
        lines.push(CgNode::wrap(
            CgNode::indent(CgNode::literal(format!(
                "argv.push({}_args[idx].get().clone());",
                rest
            ))),
            format!("for idx in 0..{}_args.len() {{\n", rest),
            "\n}",
        ));
    }

    Ok(CgNode::lines(lines))
}

/// Bind `callable` (and rebind `this_obj` for single-operation interfaces)
fn call_target(target: &CallTarget) -> CgNode {
    match target {
        CallTarget::Callable => {
            CgNode::literal("let callable = ScriptValue::Object(self.parent.callback());")
        }
        CallTarget::Property(name) => CgNode::literal(format!(
            "let callable = self.parent.get_callable_property(cx, {:?})?;",
            name
        )),
        CallTarget::SingleOperation(name) => CgNode::lines(vec![
            CgNode::literal("let is_callable = cx.is_callable(self.parent.callback());"),
            CgNode::wrap(
                CgNode::if_else(
                    "is_callable",
                    CgNode::literal("ScriptValue::Object(self.parent.callback())"),
                    CgNode::literal(format!(
                        "self.parent.get_callable_property(cx, {:?})?",
                        name
                    )),
                ),
                "let callable = ",
                ";",
            ),
            CgNode::wrap(
                CgNode::if_else(
                    "is_callable",
                    CgNode::literal("this_obj"),
                    CgNode::literal("Some(self.parent.callback())"),
                ),
                "let this_obj = ",
                ";",
            ),
        ]),
    }
}

/// Evaluate `source` and convert its result to the native return value
fn result_conversion(
    ty: &IdlType,
    treat_null_as: TreatNullAs,
    source: String,
) -> Result<Vec<CgNode>, GenerationError> {
    if ty.is_void() {
        return Ok(vec![
            CgNode::literal(format!("{};", source)),
            CgNode::literal("Ok(())"),
        ]);
    }

    let options = ConversionOptions::failing()
        .callback_return()
        .treat_null_as(treat_null_as);
    let template = conversion_template(ty, &options)?;
    Ok(vec![
        CgNode::literal(format!("let rval = {};", source)),
        instantiate(&template, "rval", "rval_decl")?,
        CgNode::literal("Ok(rval_decl)"),
    ])
}

/// Generator for callback functions and callback interfaces
pub struct CallbackGenerator<'a> {
    descriptor: &'a InterfaceDescriptor,
    config: &'a GeneratorConfig,
}

impl<'a> CallbackGenerator<'a> {
    /// Create a new callback generator
    pub fn new(descriptor: &'a InterfaceDescriptor, config: &'a GeneratorConfig) -> Self {
        Self { descriptor, config }
    }

    /// Base type of the generated class
    fn base(&self) -> &'static str {
        match self.descriptor.kind {
            InterfaceKind::CallbackFunction => "CallbackFunction",
            _ => "CallbackInterface",
        }
    }

    /// Collect the invocable members in declaration order
    pub fn members(&self) -> Result<Vec<CallbackMember>, GenerationError> {
        let d = self.descriptor;
        let script_implemented = d.script_implemented;
        let mut members = Vec::new();

        for op in d.regular_operations() {
            let base_name = native_member_name(&d.name, &op.name)?;
            for (n, signature) in op.signatures.iter().enumerate() {
                let method_name = if n == 0 {
                    base_name.clone()
                } else {
                    format!("{}_{}", base_name, n)
                };
                let (target, this_handling) = match d.kind {
                    InterfaceKind::CallbackFunction => {
                        (CallTarget::Callable, ThisHandling::CallerSupplied)
                    }
                    _ if d.single_operation => (
                        CallTarget::SingleOperation(op.name.clone()),
                        ThisHandling::CallerSupplied,
                    ),
                    _ => (CallTarget::Property(op.name.clone()), ThisHandling::Fixed),
                };
                members.push(CallbackMember {
                    method_name,
                    this_handling,
                    body: CallbackBody::Invoke {
                        target,
                        signature: signature.clone(),
                        treat_null_as: op.extended.treat_null_as,
                    },
                    script_implemented,
                });
            }
        }

        if d.kind == InterfaceKind::CallbackInterface {
            for attr in d.regular_attributes() {
                members.push(CallbackMember {
                    method_name: accessor_name(&d.name, "get", &attr.name)?,
                    this_handling: ThisHandling::Fixed,
                    body: CallbackBody::GetAttribute {
                        name: attr.name.clone(),
                        ty: attr.ty.clone(),
                        treat_null_as: attr.extended.treat_null_as,
                    },
                    script_implemented,
                });
                if !attr.readonly {
                    members.push(CallbackMember {
                        method_name: accessor_name(&d.name, "set", &attr.name)?,
                        this_handling: ThisHandling::Fixed,
                        body: CallbackBody::SetAttribute {
                            name: attr.name.clone(),
                            ty: attr.ty.clone(),
                        },
                        script_implemented,
                    });
                }
            }
        }

        let mut seen = BTreeSet::from(["new".to_string()]);
        for member in &members {
            for name in member.method_names() {
                if !seen.insert(name.clone()) {
                    return Err(GenerationError::MalformedMemberName {
                        interface: d.name.clone(),
                        name,
                    });
                }
            }
        }

        Ok(members)
    }

    /// Generate the callback class
    pub fn generate(&self) -> Result<CgNode, GenerationError> {
        let d = self.descriptor;
        let base = self.base();

        let mut methods = Vec::new();
        for member in self.members()? {
            tracing::debug!(
                interface = %d.name,
                member = %member.method_name,
                this_handling = ?member.this_handling,
                "generating callback member"
            );
            methods.extend(member.methods(&d.name)?);
        }

        let from_script = Method::new(
            "from_script_value",
            CgNode::lines(vec![
                CgNode::literal(format!(
                    "let parent = <{} as FromScriptValue>::from_script_value(cx, value, config)?;",
                    base
                )),
                CgNode::literal("Ok(Self { parent })"),
            ]),
        )
        .associated()
        .param("cx", "&dyn ScriptContext")
        .param("value", "&ScriptValue")
        .param("config", "()")
        .returns("Fallible<Self>");

        let doc = d.doc.clone().unwrap_or_else(|| match d.kind {
            InterfaceKind::CallbackFunction => format!("Script callback function `{}`", d.name),
            _ => format!("Script object implementing `{}`", d.name),
        });

        ClassSpec::new(&d.name)
            .base(base)
            .with_doc(doc)
            .decorator("#[derive(Debug, Clone, PartialEq, Eq)]")
            .constructor(
                Constructor::new()
                    .param("callback", "ObjectHandle")
                    .base(format!("{}::new(callback)", base)),
            )
            .methods(methods)
            .forward(
                ForwardImpl::new("CallbackContainer")
                    .method(ForwardMethod::new("callback").returns("ObjectHandle"))
                    .method(ForwardMethod::new("is_function").returns("bool")),
            )
            .forward(
                ForwardImpl::new("ToScriptValue").method(
                    ForwardMethod::new("to_script_value")
                        .param("cx", "&dyn ScriptContext")
                        .returns("Fallible<ScriptValue>"),
                ),
            )
            .trait_impl(
                TraitImpl::new("FromScriptValue")
                    .item("type Config = ();")
                    .method(from_script),
            )
            .build(self.config.indent)
    }
}

/// `get_<attr>` / `set_<attr>`
fn accessor_name(interface: &str, prefix: &str, name: &str) -> Result<String, GenerationError> {
    validate_member_name(interface, name)?;
    let accessor = format!("{}_{}", prefix, to_snake_case(name));
    if is_identifier(&accessor) {
        Ok(accessor)
    } else {
        Err(GenerationError::MalformedMemberName {
            interface: interface.to_string(),
            name: name.to_string(),
        })
    }
}
