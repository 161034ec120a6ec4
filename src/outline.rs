//! Document outline built from the visitor protocol.
//!
//! [`OutlineBuilder`] listens to a [`walk`] and rebuilds a labelled tree of
//! the declarations in one unit, each with the byte range it covers. A
//! template declaration is folded into the declaration it owns, whose label
//! gains the parameter list (`Box<T>`) and whose range grows to include the
//! `template<...>` prefix.

use std::fmt;

use anyhow::bail;
use cxxfront_parser::visitor::{SourceElementVisitor, TraversalOptions, walk};
use cxxfront_parser::{
    Ast, AstNode, ClassDecl, EnumDecl, EnumeratorDecl, FunctionDecl, LinkageSpec, NamespaceDecl,
    ParameterDecl, TemplateDeclaration, TemplateParameterDecl, TranslationUnitDecl, TypedefDecl,
    UsingDirective, VariableDecl,
};
use tracing::debug;

/// One entry of an outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub label: String,
    /// Kind of declaration, e.g. `namespace`, `struct`, `function`.
    pub kind: &'static str,
    /// Type spelling for variables, typedefs and enumerations with an
    /// underlying type.
    pub detail: Option<String>,
    pub start: u32,
    pub length: u32,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    fn new(kind: &'static str, node: &AstNode<'_>) -> Self {
        Self {
            label: String::new(),
            kind,
            detail: None,
            start: node.starting_offset(),
            length: node.offsets().length(),
            children: Vec::new(),
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{} {}", "", self.kind, self.label, indent = depth * 2)?;
        if let Some(detail) = &self.detail {
            write!(f, " : {detail}")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for OutlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// An entry whose children are still being collected.
struct Pending {
    node: OutlineNode,
    name: String,
    /// Parameter types of a function.
    parameters: Option<Vec<String>>,
    /// Parameter names collected by an enclosing template declaration.
    template_arguments: Vec<String>,
}

impl Pending {
    fn finish(mut self) -> OutlineNode {
        self.node.label = compose_label(&self.name, &self.template_arguments, self.parameters.as_deref());
        self.node
    }
}

fn compose_label(name: &str, template_arguments: &[String], parameters: Option<&[String]>) -> String {
    let mut label = name.to_string();
    if !template_arguments.is_empty() {
        label.push('<');
        label.push_str(&template_arguments.join(", "));
        label.push('>');
    }
    if let Some(parameters) = parameters {
        label.push('(');
        label.push_str(&parameters.join(", "));
        label.push(')');
    }
    label
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        "(anonymous)".to_string()
    } else {
        name.to_string()
    }
}

/// Visitor that collects an outline of the top-level declarations.
#[derive(Default)]
pub struct OutlineBuilder {
    stack: Vec<Pending>,
    roots: Vec<OutlineNode>,
}

impl OutlineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished top-level entries.
    pub fn into_roots(self) -> Vec<OutlineNode> {
        self.roots
    }

    fn inherited_arguments(&self) -> Vec<String> {
        match self.stack.last() {
            Some(parent) if parent.node.kind == "template" => parent.template_arguments.clone(),
            _ => Vec::new(),
        }
    }

    fn open(&mut self, kind: &'static str, node: &AstNode<'_>, name: String, function: bool) {
        let template_arguments = self.inherited_arguments();
        self.stack.push(Pending {
            node: OutlineNode::new(kind, node),
            name,
            parameters: function.then(Vec::new),
            template_arguments,
        });
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let Some(pending) = self.stack.pop() else {
            bail!("exit event without a matching enter");
        };
        self.attach(pending.finish());
        Ok(())
    }

    fn leaf(&mut self, kind: &'static str, node: &AstNode<'_>, name: &str, detail: Option<&str>) {
        let mut entry = OutlineNode::new(kind, node);
        entry.label = compose_label(name, &self.inherited_arguments(), None);
        entry.detail = detail.map(str::to_string);
        self.attach(entry);
    }

    fn attach(&mut self, entry: OutlineNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.node.children.push(entry),
            None => self.roots.push(entry),
        }
    }
}

impl<'ast> SourceElementVisitor<'ast> for OutlineBuilder {
    fn exit_translation_unit(
        &mut self,
        _node: &AstNode<'ast>,
        _decl: &TranslationUnitDecl,
    ) -> anyhow::Result<()> {
        if !self.stack.is_empty() {
            bail!("{} outline entries left open", self.stack.len());
        }
        Ok(())
    }

    fn enter_namespace(&mut self, node: &AstNode<'ast>, decl: &NamespaceDecl<'ast>) -> anyhow::Result<()> {
        self.open("namespace", node, display_name(decl.name), false);
        Ok(())
    }

    fn exit_namespace(&mut self, _node: &AstNode<'ast>, _decl: &NamespaceDecl<'ast>) -> anyhow::Result<()> {
        self.close()
    }

    fn enter_linkage(&mut self, node: &AstNode<'ast>, decl: &LinkageSpec<'ast>) -> anyhow::Result<()> {
        self.open("linkage", node, format!("extern \"{}\"", decl.language), false);
        Ok(())
    }

    fn exit_linkage(&mut self, _node: &AstNode<'ast>, _decl: &LinkageSpec<'ast>) -> anyhow::Result<()> {
        self.close()
    }

    fn enter_class(&mut self, node: &AstNode<'ast>, decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
        self.open(decl.key.as_str(), node, display_name(decl.name), false);
        Ok(())
    }

    fn exit_class(&mut self, _node: &AstNode<'ast>, _decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
        self.close()
    }

    fn enter_enum(&mut self, node: &AstNode<'ast>, decl: &EnumDecl<'ast>) -> anyhow::Result<()> {
        self.open("enum", node, display_name(decl.name), false);
        if let (Some(entry), Some(underlying)) = (self.stack.last_mut(), decl.underlying) {
            entry.node.detail = Some(underlying.text.to_string());
        }
        Ok(())
    }

    fn exit_enum(&mut self, _node: &AstNode<'ast>, _decl: &EnumDecl<'ast>) -> anyhow::Result<()> {
        self.close()
    }

    fn enter_function(&mut self, node: &AstNode<'ast>, decl: &FunctionDecl<'ast>) -> anyhow::Result<()> {
        let name = match decl.qualifier {
            Some(qualifier) => format!("{qualifier}::{}", decl.name),
            None => decl.name.to_string(),
        };
        self.open("function", node, name, true);
        if let Some(entry) = self.stack.last_mut() {
            entry.node.detail = decl.return_type.map(|ty| ty.text.to_string());
            // Out-of-line members spell the arguments in their qualifier.
            if decl.qualifier.is_some() {
                entry.template_arguments.clear();
            }
        }
        Ok(())
    }

    fn exit_function(&mut self, _node: &AstNode<'ast>, _decl: &FunctionDecl<'ast>) -> anyhow::Result<()> {
        self.close()
    }

    fn enter_template_declaration(
        &mut self,
        node: &AstNode<'ast>,
        _decl: &TemplateDeclaration,
    ) -> anyhow::Result<()> {
        self.open("template", node, "template".to_string(), false);
        Ok(())
    }

    fn exit_template_declaration(
        &mut self,
        _node: &AstNode<'ast>,
        _decl: &TemplateDeclaration,
    ) -> anyhow::Result<()> {
        let Some(mut template) = self.stack.pop() else {
            bail!("exit event without a matching enter");
        };
        match template.node.children.pop() {
            Some(mut owned) if template.node.children.is_empty() => {
                owned.start = template.node.start;
                owned.length = template.node.length;
                self.attach(owned);
            }
            popped => {
                template.node.children.extend(popped);
                self.attach(template.finish());
            }
        }
        Ok(())
    }

    fn accept_variable(&mut self, node: &AstNode<'ast>, decl: &VariableDecl<'ast>) -> anyhow::Result<()> {
        let name = match decl.qualifier {
            Some(qualifier) => format!("{qualifier}::{}", decl.name),
            None => decl.name.to_string(),
        };
        self.leaf("variable", node, &name, Some(decl.ty.text));
        Ok(())
    }

    fn accept_typedef(&mut self, node: &AstNode<'ast>, decl: &TypedefDecl<'ast>) -> anyhow::Result<()> {
        self.leaf("typedef", node, decl.name, Some(decl.ty.text));
        Ok(())
    }

    fn accept_enumerator(
        &mut self,
        node: &AstNode<'ast>,
        decl: &EnumeratorDecl<'ast>,
    ) -> anyhow::Result<()> {
        self.leaf("enumerator", node, decl.name, None);
        Ok(())
    }

    fn accept_parameter(&mut self, _node: &AstNode<'ast>, decl: &ParameterDecl<'ast>) -> anyhow::Result<()> {
        let Some(function) = self.stack.last_mut() else {
            bail!("parameter outside of a function");
        };
        let mut spelling = decl.ty.text.to_string();
        if decl.variadic && spelling != "..." {
            spelling.push_str("...");
        }
        function.parameters.get_or_insert_with(Vec::new).push(spelling);
        Ok(())
    }

    fn accept_template_parameter(
        &mut self,
        _node: &AstNode<'ast>,
        decl: &TemplateParameterDecl<'ast>,
    ) -> anyhow::Result<()> {
        let Some(template) = self.stack.last_mut() else {
            bail!("template parameter outside of a template declaration");
        };
        let mut argument = decl.name.unwrap_or("").to_string();
        if decl.variadic {
            argument.push_str("...");
        }
        template.template_arguments.push(argument);
        Ok(())
    }

    fn accept_using_directive(
        &mut self,
        node: &AstNode<'ast>,
        decl: &UsingDirective<'ast>,
    ) -> anyhow::Result<()> {
        self.leaf("using", node, &format!("namespace {}", decl.path), None);
        Ok(())
    }
}

/// Build the outline of `ast`.
///
/// Fails if the walk reported a fault, which means the tree was not
/// bracketed properly.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn outline(ast: &Ast<'_>) -> anyhow::Result<Vec<OutlineNode>> {
    let mut builder = OutlineBuilder::new();
    let report = walk(ast, &mut builder, TraversalOptions::default());
    if let Some(fault) = report.diagnostics.iter().next() {
        bail!("outline walk failed: {fault}");
    }
    let roots = builder.into_roots();
    debug!(unit = %ast.unit(), entries = roots.len(), "built outline");
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use cxxfront_core::UnitId;
    use cxxfront_parser::{ParseOptions, Parser};
    use cxxfront_symbols::SymbolTable;

    fn outline_of(source: &str) -> Vec<OutlineNode> {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = Parser::parse(source, &arena, &mut symbols, UnitId::new(0), ParseOptions::default())
            .unwrap();
        outline(&ast).unwrap()
    }

    #[test]
    fn namespaces_and_members() {
        let roots = outline_of("namespace geo {\n  struct Point { int x; int y; };\n  double length(Point p);\n}\n");

        assert_eq!(roots.len(), 1);
        let geo = &roots[0];
        assert_eq!((geo.kind, geo.label.as_str()), ("namespace", "geo"));
        let labels: Vec<_> = geo.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Point", "length(Point)"]);
        assert_eq!(geo.children[1].detail.as_deref(), Some("double"));
        assert_eq!(geo.children[0].children[1].detail.as_deref(), Some("int"));
    }

    #[test]
    fn template_folds_into_owned_declaration() {
        let source = "template<typename T, int N> struct Array { T items; };";
        let roots = outline_of(source);

        assert_eq!(roots.len(), 1);
        let array = &roots[0];
        assert_eq!(array.kind, "struct");
        assert_eq!(array.label, "Array<T, N>");
        assert_eq!(array.start, 0);
        assert_eq!(array.length as usize, source.len());
        assert_eq!(array.children[0].label, "items");
    }

    #[test]
    fn forward_template_keeps_prefix_entry() {
        let roots = outline_of("template<class T> class Box;");
        assert_eq!(roots.len(), 1);
        assert_eq!((roots[0].kind, roots[0].label.as_str()), ("template", "template<T>"));
    }

    #[test]
    fn function_template_label() {
        let roots = outline_of("template<class... Ts> void log(const char* format, Ts... args);");
        assert_eq!(roots[0].label, "log<Ts...>(const char*, Ts...)");
    }

    #[test]
    fn rendering_indents_children() {
        let roots = outline_of("enum class Color : unsigned char { Red, Green };");
        let text = roots[0].to_string();
        assert_eq!(text, "enum Color : unsigned char\n  enumerator Red\n  enumerator Green\n");
    }

    #[test]
    fn unbalanced_exit_is_a_fault() {
        let mut builder = OutlineBuilder::new();
        assert!(builder.close().is_err());
    }
}
