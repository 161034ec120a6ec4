//! The `template<...> declaration` node.
//!
//! A [`TemplateDeclaration`] is created as soon as the parser recognizes a
//! `template<` prefix, while the template factory of the enclosing container
//! still has a frame open for it. Its lifecycle:
//!
//! ```text
//! Open ──set_owned_declaration──▶ Bound ──seal──▶ Sealed
//!   └────────────────────seal─────────────────────▲
//! ```
//!
//! The parser binds the declaration once it has been parsed and leaves the
//! node `Bound`, or `Open` when the body failed to parse or declared nothing
//! the AST records. Sealing happens when the session is finished, through
//! [`Ast::seal_template_declarations`](super::Ast::seal_template_declarations).

use std::fmt;

use cxxfront_core::{AstError, NodeId, NodeRef};
use cxxfront_symbols::{FactoryId, SymbolId, SymbolTable};
use tracing::trace;

/// Lifecycle phase of a [`TemplateDeclaration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplatePhase {
    /// Factory attached, owned declaration not yet known.
    Open,
    /// Owned declaration attached.
    Bound,
    /// Offsets final and factory released. Terminal.
    Sealed,
}

impl TemplatePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplatePhase::Open => "open",
            TemplatePhase::Bound => "bound",
            TemplatePhase::Sealed => "sealed",
        }
    }
}

impl fmt::Display for TemplatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`TemplateDeclaration::container_symbol`] currently refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerRef {
    /// The factory that is still shaping the template.
    Factory(FactoryId),
    /// The template symbol, once the factory has been released.
    Template(SymbolId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDeclaration {
    template: SymbolId,
    scope_node: NodeId,
    parameters: Vec<NodeId>,
    owned: Option<SymbolId>,
    factory: Option<FactoryId>,
    phase: TemplatePhase,
    exported: bool,
}

impl TemplateDeclaration {
    /// A new declaration in the `Open` phase.
    ///
    /// `scope_node` is the node of the enclosing scope; `factory` is the
    /// factory holding the frame for `template`.
    pub fn new(template: SymbolId, scope_node: NodeId, factory: FactoryId) -> Self {
        Self {
            template,
            scope_node,
            parameters: Vec::new(),
            owned: None,
            factory: Some(factory),
            phase: TemplatePhase::Open,
            exported: false,
        }
    }

    pub(crate) fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub(crate) fn push_parameter(&mut self, node: NodeId) {
        self.parameters.push(node);
    }

    pub fn template_symbol(&self) -> SymbolId {
        self.template
    }

    /// Node of the scope enclosing this declaration.
    pub fn scope_node(&self) -> NodeId {
        self.scope_node
    }

    pub fn phase(&self) -> TemplatePhase {
        self.phase
    }

    /// Declared with `export template`.
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Template parameter nodes in declaration order.
    pub fn parameter_nodes(&self) -> &[NodeId] {
        &self.parameters
    }

    /// The explicitly attached owned declaration symbol.
    pub fn owned_symbol(&self) -> Option<SymbolId> {
        self.owned
    }

    /// Attach the declaration this template wraps. Only legal while `Open`.
    pub fn set_owned_declaration(&mut self, symbol: SymbolId) -> Result<(), AstError> {
        if self.phase != TemplatePhase::Open {
            return Err(AstError::InvalidTransition {
                from: self.phase.as_str(),
                to: TemplatePhase::Bound.as_str(),
            });
        }
        trace!(template = %self.template, owned = %symbol, "bound template declaration");
        self.owned = Some(symbol);
        self.phase = TemplatePhase::Bound;
        Ok(())
    }

    /// The node of the declaration this template wraps.
    ///
    /// Always `None` while `Open`. Once bound, an explicitly attached
    /// declaration wins; otherwise the template symbol's templated symbol is
    /// used. Each is followed to the node recorded in its AST extension.
    /// `None` when neither resolves, which is normal for a forward
    /// declaration or a body that failed to parse.
    pub fn owned_declaration(&self, symbols: &SymbolTable) -> Option<NodeRef> {
        if self.phase == TemplatePhase::Open {
            return None;
        }
        let primary = |symbol: SymbolId| {
            symbols
                .get(symbol)
                .and_then(|symbol| symbol.extension())
                .map(|extension| extension.primary_declaration)
        };

        self.owned
            .and_then(primary)
            .or_else(|| symbols.templated_symbol(self.template).and_then(primary))
    }

    /// The live factory until it is released, the template symbol afterwards.
    pub fn container_symbol(&self) -> ContainerRef {
        match self.factory {
            Some(factory) => ContainerRef::Factory(factory),
            None => ContainerRef::Template(self.template),
        }
    }

    /// Drop the reference to the factory. The template symbol persists in
    /// the symbol table.
    pub fn release_factory(&mut self) -> Option<FactoryId> {
        self.factory.take()
    }

    /// Finalize the declaration, releasing the factory.
    pub fn seal(&mut self) -> Result<(), AstError> {
        if self.phase == TemplatePhase::Sealed {
            return Err(AstError::InvalidTransition {
                from: self.phase.as_str(),
                to: TemplatePhase::Sealed.as_str(),
            });
        }
        self.release_factory();
        self.phase = TemplatePhase::Sealed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxfront_core::UnitId;
    use cxxfront_symbols::{AstExtension, ClassKey, NewSymbol, SymbolKind};

    struct Fixture {
        symbols: SymbolTable,
        factory: FactoryId,
        template: SymbolId,
    }

    fn fixture() -> Fixture {
        let mut symbols = SymbolTable::new();
        let root = symbols.root();
        let factory = symbols.template_factory_for(root).unwrap();
        let template = symbols.begin_template(factory, None).unwrap();
        Fixture {
            symbols,
            factory,
            template,
        }
    }

    fn node(index: u32) -> NodeRef {
        NodeRef::new(UnitId::new(0), NodeId::new(index))
    }

    #[test]
    fn open_declaration_owns_nothing() {
        let f = fixture();
        let decl = TemplateDeclaration::new(f.template, NodeId::new(0), f.factory);

        assert_eq!(decl.phase(), TemplatePhase::Open);
        assert_eq!(decl.owned_declaration(&f.symbols), None);
        assert_eq!(decl.container_symbol(), ContainerRef::Factory(f.factory));
    }

    #[test]
    fn owned_declaration_through_templated_symbol() {
        let mut f = fixture();
        let root = f.symbols.root();
        let class = f
            .symbols
            .declare_templated(f.factory, root, NewSymbol::new("Box", SymbolKind::Class(ClassKey::Class)))
            .unwrap();
        f.symbols
            .set_extension(class, Some(AstExtension::new(node(4))))
            .unwrap();

        let mut decl = TemplateDeclaration::new(f.template, NodeId::new(0), f.factory);
        decl.seal().unwrap();
        assert_eq!(decl.owned_declaration(&f.symbols), Some(node(4)));
    }

    #[test]
    fn open_declaration_ignores_resolvable_templated_symbol() {
        let mut f = fixture();
        let root = f.symbols.root();
        let class = f
            .symbols
            .declare_templated(f.factory, root, NewSymbol::new("Box", SymbolKind::Class(ClassKey::Class)))
            .unwrap();
        f.symbols
            .set_extension(class, Some(AstExtension::new(node(4))))
            .unwrap();

        let decl = TemplateDeclaration::new(f.template, NodeId::new(0), f.factory);
        assert_eq!(decl.phase(), TemplatePhase::Open);
        assert_eq!(f.symbols.templated_symbol(f.template), Some(class));
        assert_eq!(decl.owned_declaration(&f.symbols), None);
    }

    #[test]
    fn explicit_owned_declaration_wins() {
        let mut f = fixture();
        let root = f.symbols.root();
        let templated = f
            .symbols
            .declare_templated(f.factory, root, NewSymbol::new("Box", SymbolKind::Class(ClassKey::Class)))
            .unwrap();
        f.symbols
            .set_extension(templated, Some(AstExtension::new(node(4))))
            .unwrap();
        let other = f.symbols.declare(root, "Other", SymbolKind::Class(ClassKey::Struct)).unwrap();
        f.symbols
            .set_extension(other, Some(AstExtension::new(node(9))))
            .unwrap();

        let mut decl = TemplateDeclaration::new(f.template, NodeId::new(0), f.factory);
        decl.set_owned_declaration(other).unwrap();

        assert_eq!(decl.phase(), TemplatePhase::Bound);
        assert_eq!(decl.owned_symbol(), Some(other));
        assert_eq!(decl.owned_declaration(&f.symbols), Some(node(9)));
    }

    #[test]
    fn explicit_symbol_without_node_falls_back() {
        let mut f = fixture();
        let root = f.symbols.root();
        let templated = f
            .symbols
            .declare_templated(f.factory, root, NewSymbol::new("f", SymbolKind::Function))
            .unwrap();
        f.symbols
            .set_extension(templated, Some(AstExtension::new(node(2))))
            .unwrap();
        let bare = f.symbols.declare(root, "bare", SymbolKind::Variable).unwrap();

        let mut decl = TemplateDeclaration::new(f.template, NodeId::new(0), f.factory);
        decl.set_owned_declaration(bare).unwrap();
        assert_eq!(decl.owned_declaration(&f.symbols), Some(node(2)));
    }

    #[test]
    fn transitions_are_one_directional() {
        let f = fixture();
        let mut decl = TemplateDeclaration::new(f.template, NodeId::new(0), f.factory);
        decl.set_owned_declaration(f.template).unwrap();

        assert_eq!(
            decl.set_owned_declaration(f.template),
            Err(AstError::InvalidTransition {
                from: "bound",
                to: "bound"
            })
        );

        decl.seal().unwrap();
        assert_eq!(decl.phase(), TemplatePhase::Sealed);
        assert_eq!(decl.container_symbol(), ContainerRef::Template(f.template));
        assert_eq!(
            decl.seal(),
            Err(AstError::InvalidTransition {
                from: "sealed",
                to: "sealed"
            })
        );
        assert!(decl.set_owned_declaration(f.template).is_err());
    }

    #[test]
    fn open_declaration_can_be_sealed() {
        let f = fixture();
        let mut decl = TemplateDeclaration::new(f.template, NodeId::new(0), f.factory);
        assert!(decl.seal().is_ok());
        assert_eq!(decl.owned_symbol(), None);
        assert_eq!(decl.release_factory(), None);
    }
}
