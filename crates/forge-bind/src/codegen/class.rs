//! Native class model
//!
//! A [`ClassSpec`] describes one generated native type: a struct whose first
//! field owns the single base, followed by data members, sibling type
//! items, one inherent `impl`, a `Drop` impl and one forwarding impl per
//! trait the base implements. Items are always emitted in that order.

use crate::error::GenerationError;
use crate::ir::CgNode;

/// Name of the synthesized field holding the base
pub const BASE_FIELD: &str = "parent";

/// A named, typed parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    fn render(&self) -> String {
        format!("{}: {}", self.name, self.ty)
    }
}

/// Data member of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMember {
    pub name: String,
    pub ty: String,
    pub public: bool,
    /// Expression used by every constructor
    pub initializer: Option<String>,
}

impl ClassMember {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            public: false,
            initializer: None,
        }
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn with_initializer(mut self, expr: impl Into<String>) -> Self {
        self.initializer = Some(expr.into());
        self
    }
}

/// How a method receives `self`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// `&self`
    Ref,
    /// Associated function
    None,
}

/// A method of the inherent impl or of a trait impl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub public: bool,
    pub generics: Option<String>,
    pub receiver: Receiver,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: CgNode,
    pub doc: Option<String>,
}

impl Method {
    /// Create a private `&self` method
    pub fn new(name: impl Into<String>, body: CgNode) -> Self {
        Self {
            name: name.into(),
            public: false,
            generics: None,
            receiver: Receiver::Ref,
            params: Vec::new(),
            return_type: None,
            body,
            doc: None,
        }
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn associated(mut self) -> Self {
        self.receiver = Receiver::None;
        self
    }

    pub fn with_generics(mut self, generics: impl Into<String>) -> Self {
        self.generics = Some(generics.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    fn signature(&self) -> String {
        let mut params: Vec<String> = Vec::new();
        if self.receiver == Receiver::Ref {
            params.push("&self".to_string());
        }
        params.extend(self.params.iter().map(Param::render));

        format!(
            "{}fn {}{}({}){}",
            if self.public { "pub " } else { "" },
            self.name,
            self.generics
                .as_ref()
                .map(|g| format!("<{}>", g))
                .unwrap_or_default(),
            params.join(", "),
            self.return_type
                .as_ref()
                .map(|r| format!(" -> {}", r))
                .unwrap_or_default()
        )
    }

    pub(crate) fn render(self, indent: usize) -> CgNode {
        let doc = doc_lines(self.doc.as_deref());
        let signature = self.signature();
        CgNode::lines(vec![
            doc,
            CgNode::wrap(
                CgNode::indent_by(self.body, indent),
                format!("{} {{\n", signature),
                "\n}",
            ),
        ])
    }
}

/// A constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub name: String,
    pub params: Vec<Param>,
    /// At most one expression initializing the base
    pub base_initializers: Vec<String>,
    /// Statements run before the struct is built
    pub body: Option<CgNode>,
    pub doc: Option<String>,
}

impl Constructor {
    /// Create a `new` constructor
    pub fn new() -> Self {
        Self {
            name: "new".to_string(),
            params: Vec::new(),
            base_initializers: Vec::new(),
            body: None,
            doc: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    pub fn base(mut self, expr: impl Into<String>) -> Self {
        self.base_initializers.push(expr.into());
        self
    }

    pub fn with_body(mut self, body: CgNode) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl Default for Constructor {
    fn default() -> Self {
        Self::new()
    }
}

/// A trait method forwarded to the base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardMethod {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
}

impl ForwardMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }
}

/// A trait implemented by delegating every method to the base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardImpl {
    pub trait_path: String,
    pub methods: Vec<ForwardMethod>,
}

impl ForwardImpl {
    pub fn new(trait_path: impl Into<String>) -> Self {
        Self {
            trait_path: trait_path.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: ForwardMethod) -> Self {
        self.methods.push(method);
        self
    }
}

/// A trait implemented with explicit items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitImpl {
    pub trait_path: String,
    /// Associated items such as `type Config = ();`
    pub items: Vec<String>,
    pub methods: Vec<Method>,
}

impl TraitImpl {
    pub fn new(trait_path: impl Into<String>) -> Self {
        Self {
            trait_path: trait_path.into(),
            items: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }
}

/// A fieldless enum emitted next to the class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    pub name: String,
    pub variants: Vec<String>,
}

/// A tagged union emitted next to the class as an enum with payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionSpec {
    pub name: String,
    pub variants: Vec<Param>,
}

/// One generated native type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    pub name: String,
    pub bases: Vec<String>,
    pub decorators: Vec<String>,
    pub doc: Option<String>,
    pub members: Vec<ClassMember>,
    pub aliases: Vec<Param>,
    pub enums: Vec<EnumSpec>,
    pub unions: Vec<UnionSpec>,
    pub constructors: Vec<Constructor>,
    pub methods: Vec<Method>,
    /// Body of `Drop::drop`
    pub destructor: Option<CgNode>,
    pub forwards: Vec<ForwardImpl>,
    pub trait_impls: Vec<TraitImpl>,
}

impl ClassSpec {
    /// Create a class without a base
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            decorators: Vec::new(),
            doc: None,
            members: Vec::new(),
            aliases: Vec::new(),
            enums: Vec::new(),
            unions: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            destructor: None,
            forwards: Vec::new(),
            trait_impls: Vec::new(),
        }
    }

    pub fn base(mut self, ty: impl Into<String>) -> Self {
        self.bases.push(ty.into());
        self
    }

    pub fn decorator(mut self, attr: impl Into<String>) -> Self {
        self.decorators.push(attr.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn member(mut self, member: ClassMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn alias(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.aliases.push(Param::new(name, ty));
        self
    }

    pub fn enumeration(mut self, name: impl Into<String>, variants: &[&str]) -> Self {
        self.enums.push(EnumSpec {
            name: name.into(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    pub fn union(mut self, name: impl Into<String>, variants: Vec<Param>) -> Self {
        self.unions.push(UnionSpec {
            name: name.into(),
            variants,
        });
        self
    }

    pub fn constructor(mut self, ctor: Constructor) -> Self {
        self.constructors.push(ctor);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn destructor(mut self, body: CgNode) -> Self {
        self.destructor = Some(body);
        self
    }

    pub fn forward(mut self, forward: ForwardImpl) -> Self {
        self.forwards.push(forward);
        self
    }

    pub fn trait_impl(mut self, imp: TraitImpl) -> Self {
        self.trait_impls.push(imp);
        self
    }

    /// The single base type, or an error for zero or several bases
    pub fn base_type(&self) -> Result<&str, GenerationError> {
        match self.bases.as_slice() {
            [base] => Ok(base),
            [] => Err(GenerationError::MissingBase {
                class: self.name.clone(),
            }),
            many => Err(GenerationError::MultipleBases {
                class: self.name.clone(),
                count: many.len(),
            }),
        }
    }

    /// Build the node tree of the class
    pub fn build(self, indent: usize) -> Result<CgNode, GenerationError> {
        let base = self.base_type()?.to_string();
        if let Some(ctor) = self
            .constructors
            .iter()
            .find(|c| c.base_initializers.len() > 1)
        {
            return Err(GenerationError::MultipleBaseInitializers {
                class: self.name.clone(),
                count: ctor.base_initializers.len(),
            });
        }

        let mut items = vec![self.render_struct(&base, indent)];

        items.extend(
            self.aliases
                .iter()
                .map(|a| CgNode::literal(format!("pub type {} = {};", a.name, a.ty))),
        );
        items.extend(self.enums.iter().map(|e| {
            let variants = e
                .variants
                .iter()
                .map(|v| CgNode::literal(format!("{},", v)))
                .collect();
            CgNode::wrap(
                CgNode::indent_by(CgNode::lines(variants), indent),
                format!(
                    "#[derive(Debug, Clone, Copy, PartialEq, Eq)]\npub enum {} {{\n",
                    e.name
                ),
                "\n}",
            )
        }));
        items.extend(self.unions.iter().map(|u| {
            let variants = u
                .variants
                .iter()
                .map(|v| CgNode::literal(format!("{}({}),", v.name, v.ty)))
                .collect();
            CgNode::wrap(
                CgNode::indent_by(CgNode::lines(variants), indent),
                format!("#[derive(Debug, Clone)]\npub enum {} {{\n", u.name),
                "\n}",
            )
        }));

        let mut inherent: Vec<CgNode> = self
            .constructors
            .iter()
            .map(|ctor| self.render_constructor(ctor, indent))
            .collect();
        inherent.extend(self.methods.into_iter().map(|m| m.render(indent)));
        if !inherent.is_empty() {
            items.push(CgNode::wrap(
                CgNode::indent_by(CgNode::sequence(inherent, "\n\n"), indent),
                format!("impl {} {{\n", self.name),
                "\n}",
            ));
        }

        if let Some(body) = self.destructor {
            let drop_fn = CgNode::wrap(
                CgNode::indent_by(body, indent),
                "fn drop(&mut self) {\n",
                "\n}",
            );
            items.push(CgNode::wrap(
                CgNode::indent_by(drop_fn, indent),
                format!("impl Drop for {} {{\n", self.name),
                "\n}",
            ));
        }

        for forward in &self.forwards {
            items.push(render_forward(&self.name, forward, indent));
        }

        for imp in self.trait_impls {
            let mut body: Vec<CgNode> = imp.items.into_iter().map(CgNode::literal).collect();
            body.extend(imp.methods.into_iter().map(|m| m.render(indent)));
            items.push(CgNode::wrap(
                CgNode::indent_by(CgNode::sequence(body, "\n\n"), indent),
                format!("impl {} for {} {{\n", imp.trait_path, self.name),
                "\n}",
            ));
        }

        Ok(CgNode::wrap(CgNode::sequence(items, "\n\n"), "", "\n"))
    }

    fn render_struct(&self, base: &str, indent: usize) -> CgNode {
        let mut fields = vec![CgNode::literal(format!("{}: {},", BASE_FIELD, base))];
        fields.extend(self.members.iter().map(|m| {
            CgNode::literal(format!(
                "{}{}: {},",
                if m.public { "pub " } else { "" },
                m.name,
                m.ty
            ))
        }));

        let mut header = vec![doc_lines(self.doc.as_deref())];
        header.extend(self.decorators.iter().cloned().map(CgNode::literal));
        CgNode::lines(vec![
            CgNode::lines(header),
            CgNode::wrap(
                CgNode::indent_by(CgNode::lines(fields), indent),
                format!("pub struct {} {{\n", self.name),
                "\n}",
            ),
        ])
    }

    fn render_constructor(&self, ctor: &Constructor, indent: usize) -> CgNode {
        let base_init = ctor
            .base_initializers
            .first()
            .cloned()
            .unwrap_or_else(|| "Default::default()".to_string());

        let mut inits = vec![CgNode::literal(format!("{}: {},", BASE_FIELD, base_init))];
        inits.extend(self.members.iter().map(|m| {
            let value = match &m.initializer {
                Some(expr) => format!("{}: {},", m.name, expr),
                None if ctor.params.iter().any(|p| p.name == m.name) => format!("{},", m.name),
                None => format!("{}: Default::default(),", m.name),
            };
            CgNode::literal(value)
        }));

        let construct = CgNode::wrap(
            CgNode::indent_by(CgNode::lines(inits), indent),
            "Self {\n",
            "\n}",
        );
        let body = CgNode::lines(vec![ctor.body.clone().unwrap_or_else(CgNode::empty), construct]);

        let params: Vec<String> = ctor.params.iter().map(Param::render).collect();
        CgNode::lines(vec![
            doc_lines(ctor.doc.as_deref()),
            CgNode::wrap(
                CgNode::indent_by(body, indent),
                format!("pub fn {}({}) -> Self {{\n", ctor.name, params.join(", ")),
                "\n}",
            ),
        ])
    }
}

fn render_forward(class: &str, forward: &ForwardImpl, indent: usize) -> CgNode {
    let methods = forward
        .methods
        .iter()
        .map(|m| {
            let mut params = vec!["&self".to_string()];
            params.extend(m.params.iter().map(Param::render));
            let mut call_args = vec![format!("&self.{}", BASE_FIELD)];
            call_args.extend(m.params.iter().map(|p| p.name.clone()));
            let ret = m
                .return_type
                .as_ref()
                .map(|r| format!(" -> {}", r))
                .unwrap_or_default();
            CgNode::wrap(
                CgNode::indent_by(
                    CgNode::literal(format!(
                        "{}::{}({})",
                        forward.trait_path,
                        m.name,
                        call_args.join(", ")
                    )),
                    indent,
                ),
                format!("fn {}({}){} {{\n", m.name, params.join(", "), ret),
                "\n}",
            )
        })
        .collect();

    CgNode::wrap(
        CgNode::indent_by(CgNode::sequence(methods, "\n\n"), indent),
        format!("impl {} for {} {{\n", forward.trait_path, class),
        "\n}",
    )
}

fn doc_lines(doc: Option<&str>) -> CgNode {
    match doc {
        Some(doc) => CgNode::lines(
            doc.lines()
                .map(|line| CgNode::literal(format!("/// {}", line).trim_end().to_string()))
                .collect(),
        ),
        None => CgNode::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn callback_class() -> ClassSpec {
        ClassSpec::new("EventHandler")
            .base("CallbackFunction")
            .decorator("#[derive(Debug, Clone)]")
            .constructor(
                Constructor::new()
                    .param("callback", "ObjectHandle")
                    .base("CallbackFunction::new(callback)"),
            )
            .forward(
                ForwardImpl::new("CallbackContainer")
                    .method(ForwardMethod::new("callback").returns("ObjectHandle")),
            )
    }

    #[test]
    fn test_class_layout() {
        let text = callback_class().build(4).unwrap().render();
        assert_eq!(
            text,
            "#[derive(Debug, Clone)]
pub struct EventHandler {
    parent: CallbackFunction,
}

impl EventHandler {
    pub fn new(callback: ObjectHandle) -> Self {
        Self {
            parent: CallbackFunction::new(callback),
        }
    }
}

impl CallbackContainer for EventHandler {
    fn callback(&self) -> ObjectHandle {
        CallbackContainer::callback(&self.parent)
    }
}
"
        );
    }

    #[test]
    fn test_base_count() {
        assert_eq!(
            ClassSpec::new("Orphan").build(4),
            Err(GenerationError::MissingBase {
                class: "Orphan".into()
            })
        );
        assert_eq!(
            ClassSpec::new("Diamond").base("A").base("B").build(4),
            Err(GenerationError::MultipleBases {
                class: "Diamond".into(),
                count: 2
            })
        );
    }

    #[test]
    fn test_multiple_base_initializers_rejected() {
        let spec = ClassSpec::new("Twice")
            .base("Base")
            .constructor(Constructor::new().base("Base::a()").base("Base::b()"));
        assert!(matches!(
            spec.build(4),
            Err(GenerationError::MultipleBaseInitializers { count: 2, .. })
        ));
    }

    #[test]
    fn test_member_initializers() {
        let text = ClassSpec::new("Counter")
            .base("Base")
            .member(ClassMember::new("count", "u32").with_initializer("1"))
            .member(ClassMember::new("label", "String"))
            .member(ClassMember::new("cache", "Vec<u8>"))
            .constructor(Constructor::new().param("label", "String"))
            .build(4)
            .unwrap()
            .render();

        assert!(text.contains("            parent: Default::default(),\n"));
        assert!(text.contains("            count: 1,\n"));
        assert!(text.contains("            label,\n"));
        assert!(text.contains("            cache: Default::default(),\n"));
    }

    #[test]
    fn test_item_order() {
        let text = ClassSpec::new("Widget")
            .base("Base")
            .alias("Handle", "u64")
            .enumeration("Mode", &["On", "Off"])
            .union("Payload", vec![Param::new("Text", "String"), Param::new("Number", "f64")])
            .method(Method::new("poke", CgNode::literal("self.parent.poke();")).public())
            .destructor(CgNode::literal("self.parent.release();"))
            .forward(ForwardImpl::new("Reflectable").method(
                ForwardMethod::new("reflector").returns("ObjectHandle"),
            ))
            .build(4)
            .unwrap()
            .render();

        let order = [
            "pub struct Widget",
            "pub type Handle = u64;",
            "pub enum Mode",
            "pub enum Payload",
            "impl Widget {",
            "impl Drop for Widget",
            "impl Reflectable for Widget",
        ];
        let positions: Vec<usize> = order.iter().map(|s| text.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("    Text(String),\n    Number(f64),"));
        assert!(syn::parse_file(&text).is_ok());
    }

    #[test]
    fn test_generic_method_signature() {
        let method = Method::new("call_with_this", CgNode::literal("todo_body()"))
            .public()
            .with_generics("T: Reflectable")
            .param("this_obj", "&T")
            .returns("Fallible<()>");
        assert_eq!(
            method.signature(),
            "pub fn call_with_this<T: Reflectable>(&self, this_obj: &T) -> Fallible<()>"
        );
    }
}
