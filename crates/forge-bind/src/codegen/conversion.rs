//! Conversion template engine
//!
//! A [`ConversionTemplate`] is the code that turns one script value into a
//! native value of a given IDL type. Templates are text with two
//! variables:
//!
//! - `${val}`: an expression of type `&ScriptValue`
//! - `${exceptionCode}`: the diverging error escape, e.g. `return Err(Failure)`
//!
//! Every variable must be bound when a template is instantiated. The
//! reverse direction, native value to script value, is [`wrap_for_type`].

use crate::error::GenerationError;
use crate::ir::{CgNode, IdlPrimitive, IdlType, TreatNullAs};

/// Error escape used by generated functions returning `Fallible`
pub const FAILURE_ESCAPE: &str = "return Err(Failure)";

/// Knobs of one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Diverging expression evaluated when the conversion fails
    pub exception_code: String,
    /// The source is the return value of a script call
    ///
    /// Such a value is reachable only from native code, so it is rooted
    /// whenever the converted type keeps runtime references.
    pub callback_return: bool,
    /// Null coercion of string conversions
    pub treat_null_as: Option<TreatNullAs>,
}

impl ConversionOptions {
    /// Options with the given escape
    pub fn new(exception_code: impl Into<String>) -> Self {
        Self {
            exception_code: exception_code.into(),
            callback_return: false,
            treat_null_as: None,
        }
    }

    /// Options with the standard `Fallible` escape
    pub fn failing() -> Self {
        Self::new(FAILURE_ESCAPE)
    }

    pub fn callback_return(mut self) -> Self {
        self.callback_return = true;
        self
    }

    pub fn treat_null_as(mut self, policy: TreatNullAs) -> Self {
        self.treat_null_as = Some(policy);
        self
    }
}

/// Code converting one script value to one native type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTemplate {
    /// Expression text with `${val}` and `${exceptionCode}`
    pub template: String,
    /// Native type of the declared local
    pub decl_type: String,
    /// The source value must be rooted while the conversion runs
    pub needs_rooting: bool,
    /// Error escape bound at instantiation
    pub exception_code: String,
}

/// Build the conversion template of `ty`
pub fn conversion_template(
    ty: &IdlType,
    options: &ConversionOptions,
) -> Result<ConversionTemplate, GenerationError> {
    if options.exception_code.trim().is_empty() {
        return Err(GenerationError::EmptyErrorEscape { ty: ty.to_string() });
    }

    let template = template_expr(ty, options)?;
    tracing::trace!(ty = %ty, callback_return = options.callback_return, "conversion template");

    Ok(ConversionTemplate {
        template,
        decl_type: ty.native_type(),
        needs_rooting: options.callback_return && ty.needs_rooting(),
        exception_code: options.exception_code.clone(),
    })
}

fn template_expr(ty: &IdlType, options: &ConversionOptions) -> Result<String, GenerationError> {
    match ty {
        IdlType::Void => Err(GenerationError::UnsupportedType {
            ty: ty.to_string(),
            position: "as a converted value".to_string(),
        }),
        IdlType::Sequence(inner) => {
            let element = template_expr(inner, options)?;
            Ok(format!(
                "match sequence_elements(cx, ${{val}}) {{\n    Ok(elements) => {},\n    Err(_) => ${{exceptionCode}},\n}}",
                indent_continuation(&element_loop(&element, "elements", &inner.native_type()), 4)
            ))
        }
        IdlType::Nullable(inner) if matches!(**inner, IdlType::Sequence(_)) => {
            let converted = template_expr(inner, options)?;
            Ok(format!(
                "if (${{val}}).is_null_or_undefined() {{\n    None\n}} else {{\n    Some({})\n}}",
                indent_continuation(&converted, 4)
            ))
        }
        _ => Ok(format!(
            "match <{} as FromScriptValue>::from_script_value(cx, ${{val}}, {}) {{\n    Ok(value) => value,\n    Err(_) => ${{exceptionCode}},\n}}",
            ty.native_type(),
            conversion_config(ty, options)
        )),
    }
}

/// Config argument of `FromScriptValue` for `ty`
fn conversion_config(ty: &IdlType, options: &ConversionOptions) -> String {
    match ty {
        IdlType::Nullable(inner) => conversion_config(inner, options),
        IdlType::String(_) => match options.treat_null_as.unwrap_or_default() {
            TreatNullAs::Default => "StringificationBehavior::Default".to_string(),
            TreatNullAs::EmptyString => "StringificationBehavior::Empty".to_string(),
        },
        IdlType::Primitive(p) if p.is_float() => {
            if p.is_unrestricted() {
                "FloatBehavior::Unrestricted".to_string()
            } else {
                "FloatBehavior::Restricted".to_string()
            }
        }
        _ => "()".to_string(),
    }
}

/// Index-ordered loop applying `element_template` to each value of the
/// slice `source`; the first failing element escapes
fn element_loop(element_template: &str, source: &str, element_type: &str) -> String {
    let element = bind_val(element_template, &format!("&{}[idx]", source));
    format!(
        "{{\n    let mut converted: Vec<{ty}> = Vec::with_capacity({src}.len());\n    for idx in 0..{src}.len() {{\n        converted.push({elem});\n    }}\n    converted\n}}",
        ty = element_type,
        src = source,
        elem = indent_continuation(&element, 8),
    )
}

/// Prefix every line after the first with `width` spaces
fn indent_continuation(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.replace('\n', &format!("\n{}", pad))
}

fn bind_val(template: &str, value: &str) -> String {
    template.replace("${val}", value)
}

/// Replace every `${name}` in `template` with its binding
///
/// A variable without a binding is an error; a `$` not followed by `{` is
/// kept as is.
pub fn substitute(template: &str, bindings: &[(&str, &str)]) -> Result<String, GenerationError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| GenerationError::UnboundTemplateVariable {
                name: after.to_string(),
            })?;
        let name = &after[..end];
        let value = bindings
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| GenerationError::UnboundTemplateVariable {
                name: name.to_string(),
            })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Declare `decl_name` holding the conversion of `value_expr`
///
/// `value_expr` is a place of type `ScriptValue`. When the template needs
/// rooting, the value is held by a `Rooted` guard that lives until the end
/// of the enclosing scope.
pub fn instantiate(
    template: &ConversionTemplate,
    value_expr: &str,
    decl_name: &str,
) -> Result<CgNode, GenerationError> {
    let mut lines = Vec::new();
    let val = if template.needs_rooting {
        let root = format!("{}_root", decl_name);
        lines.push(CgNode::literal(format!(
            "let {} = Rooted::new(cx, {}.clone());",
            root, value_expr
        )));
        format!("{}.get()", root)
    } else {
        format!("&{}", value_expr)
    };

    let expr = substitute(
        &template.template,
        &[("val", &val), ("exceptionCode", &template.exception_code)],
    )?;
    lines.push(CgNode::wrap(
        CgNode::literal(expr),
        format!("let {}: {} = ", decl_name, template.decl_type),
        ";",
    ));
    Ok(CgNode::lines(lines))
}

/// Declare `decl_name: Vec<T>` converting every value of the slice
/// `source_expr` with `template`, in index order
pub fn variadic_conversion(
    template: &ConversionTemplate,
    source_expr: &str,
    decl_name: &str,
) -> Result<CgNode, GenerationError> {
    let body = element_loop(&template.template, source_expr, &template.decl_type);
    let expr = substitute(&body, &[("exceptionCode", &template.exception_code)])?;
    Ok(CgNode::wrap(
        CgNode::literal(expr),
        format!("let {}: Vec<{}> = ", decl_name, template.decl_type),
        ";",
    ))
}

/// Expression converting the native place `value` of type `ty` to a
/// `ScriptValue`
pub fn wrap_for_type(ty: &IdlType, value: &str, exception_code: &str) -> Result<String, GenerationError> {
    if exception_code.trim().is_empty() {
        return Err(GenerationError::EmptyErrorEscape { ty: ty.to_string() });
    }
    match ty {
        IdlType::Void => Ok("ScriptValue::Undefined".to_string()),
        _ => Ok(format!(
            "match {}.to_script_value(cx) {{\n    Ok(value) => value,\n    Err(_) => {},\n}}",
            value, exception_code
        )),
    }
}

/// IDL types a special operation may take as its key argument
pub fn is_index_type(ty: &IdlType) -> bool {
    matches!(ty, IdlType::Primitive(IdlPrimitive::UnsignedLong))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_substitute() {
        assert_eq!(
            substitute("f(${a}, ${b}) $x", &[("a", "1"), ("b", "2")]).unwrap(),
            "f(1, 2) $x"
        );
        assert_eq!(
            substitute("${missing}", &[("a", "1")]),
            Err(GenerationError::UnboundTemplateVariable {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn test_empty_escape_rejected() {
        let err = conversion_template(&IdlType::long(), &ConversionOptions::new("  ")).unwrap_err();
        assert_eq!(err, GenerationError::EmptyErrorEscape { ty: "long".into() });
        assert!(wrap_for_type(&IdlType::long(), "x", "").is_err());
    }

    #[test]
    fn test_void_not_convertible() {
        assert!(matches!(
            conversion_template(&IdlType::Void, &ConversionOptions::failing()),
            Err(GenerationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_instantiate_primitive() {
        let template =
            conversion_template(&IdlType::unsigned_long(), &ConversionOptions::failing()).unwrap();
        assert!(!template.needs_rooting);
        let text = instantiate(&template, "desc.value", "index").unwrap().render();
        assert_eq!(
            text,
            "let index: u32 = match <u32 as FromScriptValue>::from_script_value(cx, &desc.value, ()) {
    Ok(value) => value,
    Err(_) => return Err(Failure),
};"
        );
    }

    #[test]
    fn test_instantiate_rooted_callback_return() {
        let template = conversion_template(
            &IdlType::nullable(IdlType::interface("Node")),
            &ConversionOptions::failing().callback_return(),
        )
        .unwrap();
        assert!(template.needs_rooting);
        let text = instantiate(&template, "rval", "rval_decl").unwrap().render();
        assert!(text.starts_with("let rval_decl_root = Rooted::new(cx, rval.clone());\n"));
        assert!(text.contains(
            "<Option<Rc<Node>> as FromScriptValue>::from_script_value(cx, rval_decl_root.get(), ())"
        ));
    }

    #[test]
    fn test_treat_null_as_empty() {
        let template = conversion_template(
            &IdlType::dom_string(),
            &ConversionOptions::failing().treat_null_as(TreatNullAs::EmptyString),
        )
        .unwrap();
        assert!(template.template.contains("StringificationBehavior::Empty"));
    }

    #[test]
    fn test_sequence_uses_index_loop() {
        let template = conversion_template(
            &IdlType::sequence(IdlType::double()),
            &ConversionOptions::failing(),
        )
        .unwrap();
        let text = instantiate(&template, "value", "values").unwrap().render();
        assert!(text.contains("sequence_elements(cx, &value)"));
        assert!(text.contains("for idx in 0..elements.len()"));
        assert!(text.contains("from_script_value(cx, &elements[idx], FloatBehavior::Restricted)"));
        let wrapped = format!("fn f() -> Fallible<()> {{\n{}\nOk(())\n}}", text);
        assert!(syn::parse_file(&wrapped).is_ok());
    }

    #[test]
    fn test_variadic_conversion() {
        let template = conversion_template(&IdlType::Any, &ConversionOptions::failing()).unwrap();
        let text = variadic_conversion(&template, "args", "rest").unwrap().render();
        assert!(text.starts_with("let rest: Vec<ScriptValue> = {"));
        assert!(text.contains("for idx in 0..args.len()"));
        assert!(!text.contains("${"));
        let wrapped = format!("fn f() -> Fallible<()> {{\n{}\nOk(())\n}}", text);
        assert!(syn::parse_file(&wrapped).is_ok());
    }

    #[test]
    fn test_wrap_for_type() {
        assert_eq!(
            wrap_for_type(&IdlType::dom_string(), "label", FAILURE_ESCAPE).unwrap(),
            "match label.to_script_value(cx) {\n    Ok(value) => value,\n    Err(_) => return Err(Failure),\n}"
        );
        assert_eq!(
            wrap_for_type(&IdlType::Void, "x", FAILURE_ESCAPE).unwrap(),
            "ScriptValue::Undefined"
        );
    }
}
