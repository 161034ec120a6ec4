//! Abstract syntax tree for one translation unit.
//!
//! Nodes live in a flat arena owned by [`Ast`] and refer to each other and to
//! symbols only through handles ([`NodeId`], [`SymbolId`]). Every node carries
//! the [`Offsets`] of the source range it was parsed from; they are sealed
//! once the parser has seen the node's last token.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cxxfront_parser::{NodeKind, ParseOptions, Parser};
//! use cxxfront_core::UnitId;
//! use cxxfront_symbols::SymbolTable;
//!
//! let arena = Bump::new();
//! let mut symbols = SymbolTable::new();
//! let ast = Parser::parse(
//!     "namespace geo { struct Point { int x; }; }",
//!     &arena,
//!     &mut symbols,
//!     UnitId::new(0),
//!     ParseOptions::default(),
//! )
//! .unwrap();
//!
//! let namespace = ast.children(ast.root())[0];
//! assert!(matches!(ast[namespace].kind(), NodeKind::Namespace(_)));
//! ```

mod node;
mod template_decl;
pub mod visitor;

pub use node::*;
pub use template_decl::{ContainerRef, TemplateDeclaration, TemplatePhase};

use std::iter::FusedIterator;

use cxxfront_core::{AstError, NodeId, NodeRef, Offsets, Span, UnitId};
use cxxfront_symbols::{SymbolId, SymbolTable};

use visitor::SourceElementVisitor;

/// A node in the per-unit arena.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode<'ast> {
    id: NodeId,
    kind: NodeKind<'ast>,
    parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    offsets: Offsets,
}

impl<'ast> AstNode<'ast> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind<'ast> {
        &self.kind
    }

    /// The enclosing node; `None` only for the translation unit.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    pub fn starting_offset(&self) -> u32 {
        self.offsets.starting_offset()
    }

    pub fn ending_offset(&self) -> u32 {
        self.offsets.ending_offset()
    }

    pub fn starting_line(&self) -> u32 {
        self.offsets.starting_line()
    }

    pub fn ending_line(&self) -> u32 {
        self.offsets.ending_line()
    }

    /// Convenience for [`NodeKind::symbol`].
    pub fn symbol(&self) -> Option<SymbolId> {
        self.kind.symbol()
    }

    pub fn template_declaration(&self) -> Option<&TemplateDeclaration> {
        match &self.kind {
            NodeKind::TemplateDeclaration(decl) => Some(decl),
            _ => None,
        }
    }

    /// Member declarations of a namespace, class, enum, linkage block or
    /// translation unit.
    ///
    /// Other kinds, including template declarations, do not keep a member
    /// list and report [`AstError::UnsupportedOperation`].
    pub fn declarations(&self) -> Result<&[NodeId], AstError> {
        if self.kind.tracks_declarations() {
            Ok(&self.children)
        } else {
            Err(self.unsupported("declarations"))
        }
    }

    /// Deliver the enter event of a scope node to `visitor`.
    pub fn enter_scope<V>(&self, visitor: &mut V) -> anyhow::Result<()>
    where
        V: SourceElementVisitor<'ast> + ?Sized,
    {
        match &self.kind {
            NodeKind::TranslationUnit(decl) => visitor.enter_translation_unit(self, decl),
            NodeKind::Namespace(decl) => visitor.enter_namespace(self, decl),
            NodeKind::Linkage(decl) => visitor.enter_linkage(self, decl),
            NodeKind::Class(decl) => visitor.enter_class(self, decl),
            NodeKind::Enum(decl) => visitor.enter_enum(self, decl),
            NodeKind::Function(decl) => visitor.enter_function(self, decl),
            NodeKind::TemplateDeclaration(decl) => visitor.enter_template_declaration(self, decl),
            _ => Err(self.unsupported("enter_scope").into()),
        }
    }

    /// Deliver the exit event of a scope node to `visitor`.
    pub fn exit_scope<V>(&self, visitor: &mut V) -> anyhow::Result<()>
    where
        V: SourceElementVisitor<'ast> + ?Sized,
    {
        match &self.kind {
            NodeKind::TranslationUnit(decl) => visitor.exit_translation_unit(self, decl),
            NodeKind::Namespace(decl) => visitor.exit_namespace(self, decl),
            NodeKind::Linkage(decl) => visitor.exit_linkage(self, decl),
            NodeKind::Class(decl) => visitor.exit_class(self, decl),
            NodeKind::Enum(decl) => visitor.exit_enum(self, decl),
            NodeKind::Function(decl) => visitor.exit_function(self, decl),
            NodeKind::TemplateDeclaration(decl) => visitor.exit_template_declaration(self, decl),
            _ => Err(self.unsupported("exit_scope").into()),
        }
    }

    /// Deliver a leaf declaration to `visitor`.
    pub fn accept<V>(&self, visitor: &mut V) -> anyhow::Result<()>
    where
        V: SourceElementVisitor<'ast> + ?Sized,
    {
        match &self.kind {
            NodeKind::Variable(decl) => visitor.accept_variable(self, decl),
            NodeKind::Typedef(decl) => visitor.accept_typedef(self, decl),
            NodeKind::Enumerator(decl) => visitor.accept_enumerator(self, decl),
            NodeKind::Parameter(decl) => visitor.accept_parameter(self, decl),
            NodeKind::TemplateParameter(decl) => visitor.accept_template_parameter(self, decl),
            NodeKind::UsingDirective(decl) => visitor.accept_using_directive(self, decl),
            _ => Err(self.unsupported("accept").into()),
        }
    }

    fn unsupported(&self, operation: &'static str) -> AstError {
        AstError::UnsupportedOperation {
            operation,
            node_kind: self.kind.description(),
        }
    }
}

/// The syntax tree of one translation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast<'ast> {
    unit: UnitId,
    nodes: Vec<AstNode<'ast>>,
}

impl<'ast> Ast<'ast> {
    /// An AST holding only its translation unit node.
    pub(crate) fn new(unit: UnitId, symbol: SymbolId) -> Self {
        let root = AstNode {
            id: NodeId::new(0),
            kind: NodeKind::TranslationUnit(TranslationUnitDecl { unit, symbol }),
            parent: None,
            children: Vec::new(),
            offsets: Offsets::default(),
        };
        Self {
            unit,
            nodes: vec![root],
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// The translation unit node.
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode<'ast>> {
        self.nodes.get(id.index())
    }

    /// Resolve a handle, requiring it to belong to this unit.
    pub fn resolve(&self, node: NodeRef) -> Option<&AstNode<'ast>> {
        if node.unit == self.unit {
            self.get(node.node)
        } else {
            None
        }
    }

    pub fn node_ref(&self, id: NodeId) -> NodeRef {
        NodeRef::new(self.unit, id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order, which is document order of their first token.
    pub fn iter(&self) -> impl Iterator<Item = &AstNode<'ast>> {
        self.nodes.iter()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(AstNode::children).unwrap_or(&[])
    }

    /// Member declarations of `id`. See [`AstNode::declarations`].
    pub fn declarations(&self, id: NodeId) -> Result<&[NodeId], AstError> {
        self.get(id).ok_or(AstError::NotFound)?.declarations()
    }

    /// Template declaration nodes, in document order.
    pub fn template_declarations(&self) -> impl Iterator<Item = &AstNode<'ast>> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::TemplateDeclaration(_)))
    }

    pub fn template_declaration(&self, id: NodeId) -> Result<&TemplateDeclaration, AstError> {
        let node = self.get(id).ok_or(AstError::NotFound)?;
        node.template_declaration()
            .ok_or_else(|| node.unsupported("template_declaration"))
    }

    pub(crate) fn template_declaration_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut TemplateDeclaration, AstError> {
        let node = self.nodes.get_mut(id.index()).ok_or(AstError::NotFound)?;
        let description = node.kind.description();
        match &mut node.kind {
            NodeKind::TemplateDeclaration(decl) => Ok(decl),
            _ => Err(AstError::UnsupportedOperation {
                operation: "template_declaration",
                node_kind: description,
            }),
        }
    }

    /// The declaration node wrapped by the template declaration `id`.
    pub fn owned_declaration(
        &self,
        id: NodeId,
        symbols: &SymbolTable,
    ) -> Result<Option<NodeRef>, AstError> {
        Ok(self.template_declaration(id)?.owned_declaration(symbols))
    }

    /// Parameter nodes of the template declaration `id`, in order.
    pub fn template_parameters(&self, id: NodeId) -> Result<TemplateParameters<'_, 'ast>, AstError> {
        let decl = self.template_declaration(id)?;
        Ok(TemplateParameters {
            ast: self,
            ids: decl.parameter_nodes().iter(),
        })
    }

    /// The innermost node whose range contains `offset`.
    pub fn node_at(&self, offset: u32) -> Option<NodeId> {
        let mut current = self.root();
        if !self.nodes[0].offsets.contains(offset) {
            return None;
        }
        'descend: loop {
            for &child in self.children(current) {
                if self.nodes[child.index()].offsets.contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Append a node under `parent`, starting at `start`.
    pub(crate) fn push_node(
        &mut self,
        kind: NodeKind<'ast>,
        parent: NodeId,
        start: Span,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        let mut offsets = Offsets::default();
        offsets.set_starting_offset_and_line(start.offset, start.line);
        self.nodes.push(AstNode {
            id,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            offsets,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Record where `id` ends and seal its offsets.
    pub(crate) fn finish_node(&mut self, id: NodeId, end: Span) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            if node.offsets.is_sealed() {
                return;
            }
            node.offsets.set_ending_offset_and_line(end.end(), end.line);
            node.offsets.seal();
        }
    }

    /// Set the translation unit's range to the whole source.
    pub(crate) fn finish_root(&mut self, end_offset: u32, end_line: u32) {
        let root = &mut self.nodes[0].offsets;
        root.set_starting_offset_and_line(0, 1);
        root.set_ending_offset_and_line(end_offset, end_line);
        root.seal();
    }

    /// Seal every template declaration that is not sealed yet, releasing
    /// their factories. Returns how many were sealed.
    pub fn seal_template_declarations(&mut self) -> usize {
        self.nodes
            .iter_mut()
            .filter_map(|node| match &mut node.kind {
                NodeKind::TemplateDeclaration(decl) => Some(decl),
                _ => None,
            })
            .filter(|decl| decl.phase() != TemplatePhase::Sealed)
            .map(|decl| decl.seal())
            .filter(Result::is_ok)
            .count()
    }
}

impl<'ast> std::ops::Index<NodeId> for Ast<'ast> {
    type Output = AstNode<'ast>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.index()]
    }
}

/// One-shot iterator over the parameter nodes of a template declaration.
#[derive(Debug)]
pub struct TemplateParameters<'a, 'ast> {
    ast: &'a Ast<'ast>,
    ids: std::slice::Iter<'a, NodeId>,
}

impl<'a, 'ast> Iterator for TemplateParameters<'a, 'ast> {
    type Item = &'a AstNode<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|&id| &self.ast[id])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for TemplateParameters<'_, '_> {}

impl FusedIterator for TemplateParameters<'_, '_> {}
