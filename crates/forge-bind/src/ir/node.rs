//! Text-producing code generation nodes
//!
//! Every piece of emitted source is a [`CgNode`] tree. Nodes are built top
//! down and rendered exactly once: [`CgNode::render`] consumes the tree.
//! Composition is purely structural, a node never looks at what its
//! children contain.
//!
//! Conditionals and namespace blocks are not separate variants. They are
//! assembled from wraps and indents by [`CgNode::if_wrap`],
//! [`CgNode::if_else`] and [`CgNode::namespace`].

/// Default indentation width of generated Rust code
pub const DEFAULT_INDENT: usize = 4;

/// A node of the code generation tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CgNode {
    /// Fixed text
    Literal(String),

    /// Children rendered in order, non-empty renderings joined by `joiner`
    Sequence { children: Vec<CgNode>, joiner: String },

    /// Child surrounded by `pre` and `post`
    ///
    /// With `reindent`, continuation lines of the child are aligned to the
    /// width of `pre` so inline nesting lines up.
    Wrap {
        child: Box<CgNode>,
        pre: String,
        post: String,
        reindent: bool,
    },

    /// Child with every non-blank line prefixed by `width` spaces
    Indent { child: Box<CgNode>, width: usize },
}

impl CgNode {
    /// Create a literal node
    pub fn literal(text: impl Into<String>) -> Self {
        CgNode::Literal(text.into())
    }

    /// Create an empty node
    pub fn empty() -> Self {
        CgNode::Literal(String::new())
    }

    /// Create a sequence with a joiner
    pub fn sequence(children: Vec<CgNode>, joiner: impl Into<String>) -> Self {
        CgNode::Sequence {
            children,
            joiner: joiner.into(),
        }
    }

    /// Create a sequence joined by newlines
    pub fn lines(children: Vec<CgNode>) -> Self {
        Self::sequence(children, "\n")
    }

    /// Wrap a node with prefix and suffix text
    pub fn wrap(child: CgNode, pre: impl Into<String>, post: impl Into<String>) -> Self {
        CgNode::Wrap {
            child: Box::new(child),
            pre: pre.into(),
            post: post.into(),
            reindent: false,
        }
    }

    /// Wrap a node, aligning its continuation lines to the prefix width
    pub fn wrap_reindent(child: CgNode, pre: impl Into<String>, post: impl Into<String>) -> Self {
        CgNode::Wrap {
            child: Box::new(child),
            pre: pre.into(),
            post: post.into(),
            reindent: true,
        }
    }

    /// Indent a node by the default width
    pub fn indent(child: CgNode) -> Self {
        Self::indent_by(child, DEFAULT_INDENT)
    }

    /// Indent a node by `width` spaces
    pub fn indent_by(child: CgNode, width: usize) -> Self {
        CgNode::Indent {
            child: Box::new(child),
            width,
        }
    }

    /// `if <condition> {` + indented body + `}`
    pub fn if_wrap(condition: impl Into<String>, body: CgNode) -> Self {
        let pre = CgNode::wrap_reindent(CgNode::literal(condition), "if ", " {\n").render();
        CgNode::wrap(CgNode::indent(body), pre, "\n}")
    }

    /// An if/else chain built from an if-wrap and an indented else wrap
    pub fn if_else(condition: impl Into<String>, if_true: CgNode, if_false: CgNode) -> Self {
        CgNode::sequence(
            vec![
                CgNode::if_wrap(condition, if_true),
                CgNode::wrap(CgNode::indent(if_false), " else {\n", "\n}"),
            ],
            "",
        )
    }

    /// A `mod` block around a child
    pub fn namespace(name: &str, child: CgNode, public: bool) -> Self {
        let visibility = if public { "pub " } else { "" };
        CgNode::wrap(
            child,
            format!("{}mod {} {{\n", visibility, name),
            format!("}} // mod {}\n", name),
        )
    }

    /// Nested `mod` blocks, outermost first
    pub fn namespaces(path: &[&str], child: CgNode, public: bool) -> Self {
        match path.split_first() {
            None => child,
            Some((first, rest)) => {
                CgNode::namespace(first, CgNode::namespaces(rest, child, public), public)
            }
        }
    }

    /// `Name<child>`
    pub fn templated(name: &str, child: CgNode) -> Self {
        CgNode::wrap(child, format!("{}<", name), ">")
    }

    /// Check whether this node is a literal with no text
    pub fn is_empty_literal(&self) -> bool {
        matches!(self, CgNode::Literal(text) if text.is_empty())
    }

    /// Render the tree into text
    pub fn render(self) -> String {
        match self {
            CgNode::Literal(text) => text,

            CgNode::Sequence { children, joiner } => children
                .into_iter()
                .map(CgNode::render)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(&joiner),

            CgNode::Wrap {
                child,
                pre,
                post,
                reindent,
            } => {
                let mut body = child.render();
                if reindent {
                    let continuation = format!("\n{}", " ".repeat(pre.len()));
                    body = strip_trailing_whitespace(&body.replace('\n', &continuation));
                }
                format!("{}{}{}", pre, body, post)
            }

            CgNode::Indent { child, width } => indent_text(&child.render(), width),
        }
    }
}

impl From<&str> for CgNode {
    fn from(text: &str) -> Self {
        CgNode::literal(text)
    }
}

impl From<String> for CgNode {
    fn from(text: String) -> Self {
        CgNode::Literal(text)
    }
}

/// Prefix every non-blank line of `text` with `width` spaces
pub fn indent_text(text: &str, width: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let prefix = " ".repeat(width);
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove trailing whitespace from every line, keeping a final newline
pub fn strip_trailing_whitespace(text: &str) -> String {
    let tail = if text.ends_with('\n') { "\n" } else { "" };
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    format!("{}{}", lines.join("\n"), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequence_skips_empty_children() {
        let node = CgNode::lines(vec![
            CgNode::literal("a"),
            CgNode::empty(),
            CgNode::literal("b"),
        ]);
        assert_eq!(node.render(), "a\nb");
    }

    #[test]
    fn test_indent_leaves_blank_lines() {
        let node = CgNode::indent_by(CgNode::literal("let a = 1;\n\nlet b = 2;\n"), 3);
        assert_eq!(node.render(), "   let a = 1;\n\n   let b = 2;\n");
    }

    #[test]
    fn test_reindent_preserves_line_count() {
        let text = "one\n\n  two\nthree";
        let once = indent_text(text, 4);
        let twice = indent_text(&once, 4);
        assert_eq!(once.lines().count(), text.lines().count());
        assert_eq!(twice.lines().count(), text.lines().count());
        assert_eq!(twice, "        one\n\n          two\n        three");
    }

    #[test]
    fn test_indent_empty_child() {
        assert_eq!(CgNode::indent(CgNode::empty()).render(), "");
    }

    #[test]
    fn test_wrap_reindent_aligns_continuation() {
        let node = CgNode::wrap_reindent(CgNode::literal("a &&\nb"), "if ", " {");
        assert_eq!(node.render(), "if a &&\n   b {");
    }

    #[test]
    fn test_if_else() {
        let node = CgNode::if_else(
            "ready",
            CgNode::literal("go();"),
            CgNode::literal("wait();"),
        );
        assert_eq!(
            node.render(),
            "if ready {\n    go();\n} else {\n    wait();\n}"
        );
    }

    #[test]
    fn test_nested_namespaces() {
        let node = CgNode::namespaces(&["outer", "inner"], CgNode::literal("fn f() {}\n"), true);
        assert_eq!(
            node.render(),
            "pub mod outer {\npub mod inner {\nfn f() {}\n} // mod inner\n} // mod outer\n"
        );
    }

    #[test]
    fn test_templated() {
        let node = CgNode::templated("Vec", CgNode::literal("String"));
        assert_eq!(node.render(), "Vec<String>");
    }
}
