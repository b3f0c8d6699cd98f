//! Per-interface entry point of the generator

use crate::codegen::callback::CallbackGenerator;
use crate::codegen::proxy::ProxyGenerator;
use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::ir::{is_identifier, to_snake_case, CgNode, InterfaceDescriptor, InterfaceKind};

/// Rendered bindings of one interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Interface name
    pub interface: String,
    /// File name of the unit (`<snake_name>.rs`)
    pub file_name: String,
    /// Module name the unit is included under
    pub module_name: String,
    /// Rust source
    pub source: String,
}

/// Generates Rust bindings from interface descriptors
///
/// # Example
/// ```ignore
/// use forge_bind::{BindingGenerator, GeneratorConfig, InterfaceDescriptor};
///
/// let descriptor = InterfaceDescriptor::from_json(json)?;
/// let unit = BindingGenerator::new(GeneratorConfig::default()).generate(&descriptor)?;
/// std::fs::write(&unit.file_name, unit.source)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindingGenerator {
    config: GeneratorConfig,
}

impl BindingGenerator {
    /// Create a generator with the given configuration
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the bindings of one interface
    pub fn generate(&self, descriptor: &InterfaceDescriptor) -> Result<GeneratedUnit, GenerationError> {
        if !is_identifier(&descriptor.name) {
            return Err(GenerationError::MalformedMemberName {
                interface: descriptor.name.clone(),
                name: descriptor.name.clone(),
            });
        }

        let body = match descriptor.kind {
            InterfaceKind::CallbackFunction | InterfaceKind::CallbackInterface => {
                CallbackGenerator::new(descriptor, &self.config).generate()?
            }
            InterfaceKind::Interface if descriptor.is_proxy() => {
                ProxyGenerator::new(descriptor, &self.config).generate()?
            }
            InterfaceKind::Interface => {
                return Err(GenerationError::NothingToGenerate {
                    interface: descriptor.name.clone(),
                })
            }
        };

        let source = CgNode::lines(vec![self.header(descriptor), body]).render();
        if self.config.verify_syntax {
            syn::parse_file(&source).map_err(|e| GenerationError::SyntaxCheck {
                interface: descriptor.name.clone(),
                message: e.to_string(),
            })?;
        }

        let module_name = to_snake_case(&descriptor.name);
        tracing::debug!(
            interface = %descriptor.name,
            kind = ?descriptor.kind,
            bytes = source.len(),
            "generated bindings"
        );

        Ok(GeneratedUnit {
            interface: descriptor.name.clone(),
            file_name: format!("{}.rs", module_name),
            module_name,
            source,
        })
    }

    /// Generate every interface, stopping at the first failure
    pub fn generate_all<'d>(
        &self,
        descriptors: impl IntoIterator<Item = &'d InterfaceDescriptor>,
    ) -> Result<Vec<GeneratedUnit>, GenerationError> {
        descriptors.into_iter().map(|d| self.generate(d)).collect()
    }

    fn header(&self, descriptor: &InterfaceDescriptor) -> CgNode {
        let mut lines = Vec::new();
        if self.config.emit_header {
            lines.push(CgNode::literal(format!(
                "// Generated by forge-bind from `{}`. Do not edit.\n",
                descriptor.name
            )));
        }
        let glue = format!("{}::*", self.config.glue_path);
        for import in ["super::*", glue.as_str(), "std::rc::Rc"] {
            lines.push(CgNode::literal(format!(
                "#[allow(unused_imports)]\nuse {};",
                import
            )));
        }
        CgNode::wrap(CgNode::lines(lines), "", "\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Argument, FailurePolicy, IdlType, Operation, Signature, SpecialOperation};
    use pretty_assertions::assert_eq;

    fn listener() -> InterfaceDescriptor {
        InterfaceDescriptor::callback_interface("EventListener")
            .single_operation()
            .operation(Operation::new(
                "handleEvent",
                Signature::new(IdlType::Void, vec![Argument::new("event", IdlType::Any)]),
            ))
    }

    fn token_list() -> InterfaceDescriptor {
        InterfaceDescriptor::new("DOMTokenList")
            .with_native_type("TokenList")
            .special(
                SpecialOperation::IndexedGetter,
                Operation::new(
                    "item",
                    Signature::new(
                        IdlType::nullable(IdlType::dom_string()),
                        vec![Argument::new("index", IdlType::unsigned_long())],
                    ),
                ),
            )
            .special(
                SpecialOperation::Stringifier,
                Operation::new("", Signature::new(IdlType::dom_string(), vec![])),
            )
    }

    #[test]
    fn test_callback_unit() {
        let generator = BindingGenerator::new(GeneratorConfig::default().with_syntax_check(true));
        let unit = generator.generate(&listener()).unwrap();
        assert_eq!(unit.file_name, "event_listener.rs");
        assert_eq!(unit.module_name, "event_listener");
        assert!(unit
            .source
            .starts_with("// Generated by forge-bind from `EventListener`. Do not edit.\n\n#[allow(unused_imports)]\nuse super::*;"));
        assert!(unit.source.contains("use forge_bind::glue::*;"));
        assert!(unit.source.contains("pub struct EventListener {"));
    }

    #[test]
    fn test_proxy_unit_uses_config_default_policy() {
        let descriptor = token_list();
        let strict = BindingGenerator::new(GeneratorConfig::default());
        assert!(matches!(
            strict.generate(&descriptor),
            Err(GenerationError::UnspecifiedFailurePolicy { .. })
        ));

        let generator = BindingGenerator::new(
            GeneratorConfig::default()
                .with_default_failure_policy(FailurePolicy::Fallback)
                .with_glue_path("crate::glue")
                .with_header(false)
                .with_syntax_check(true),
        );
        let unit = generator.generate(&descriptor).unwrap();
        assert_eq!(unit.file_name, "dom_token_list.rs");
        assert!(unit.source.starts_with("#[allow(unused_imports)]\nuse super::*;"));
        assert!(unit.source.contains("use crate::glue::*;"));
        assert!(unit.source.contains("unwrap_proxy::<TokenList>(cx, proxy)?"));
        assert!(unit.source.contains("pub fn proxy_traps() -> ProxyTraps {"));
    }

    #[test]
    fn test_plain_interface_rejected() {
        let generator = BindingGenerator::default();
        assert_eq!(
            generator.generate(&InterfaceDescriptor::new("Node")),
            Err(GenerationError::NothingToGenerate {
                interface: "Node".into()
            })
        );
    }

    #[test]
    fn test_interface_name_must_be_identifier() {
        let generator = BindingGenerator::default();
        assert!(matches!(
            generator.generate(&InterfaceDescriptor::callback_interface("Event Listener")),
            Err(GenerationError::MalformedMemberName { .. })
        ));
    }

    #[test]
    fn test_generate_all_stops_at_first_failure() {
        let generator = BindingGenerator::default();
        let units = generator.generate_all(&[listener()]).unwrap();
        assert_eq!(units.len(), 1);

        let result = generator.generate_all(&[listener(), InterfaceDescriptor::new("Node")]);
        assert!(result.is_err());
    }
}
