//! Several translation units parsed against one symbol table.

use bumpalo::Bump;
use cxxfront_core::{AstError, Diagnostic, Diagnostics, NodeRef, ParseErrors, UnitId};
use cxxfront_symbols::SymbolTable;
use tracing::{debug, warn};

use crate::ast::visitor::{walk, SourceElementVisitor, TraversalOptions, TraversalReport};
use crate::ast::{Ast, AstNode};
use crate::options::ParseOptions;
use crate::parser::Parser;

/// Owns the symbol table shared by the units it parses.
///
/// Units are numbered in the order they are parsed. Names declared by an
/// earlier unit are visible to later ones, and namespaces reopened across
/// units resolve to one symbol. A class or variable defined again by a later
/// unit gets a symbol of its own; lookup keeps finding the first definition.
///
/// ```
/// use bumpalo::Bump;
/// use cxxfront_parser::ParseSession;
///
/// let arena = Bump::new();
/// let mut session = ParseSession::new(&arena);
/// session.parse_unit("namespace app { struct Config; }").unwrap();
/// session.parse_unit("namespace app { struct Config { int port; }; }").unwrap();
///
/// let diagnostics = session.finish();
/// assert!(diagnostics.is_empty());
/// assert_eq!(session.units().len(), 2);
/// ```
pub struct ParseSession<'ast> {
    arena: &'ast Bump,
    options: ParseOptions,
    symbols: SymbolTable,
    units: Vec<Ast<'ast>>,
}

impl<'ast> ParseSession<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self::with_options(arena, ParseOptions::default())
    }

    pub fn with_options(arena: &'ast Bump, options: ParseOptions) -> Self {
        Self {
            arena,
            options,
            symbols: SymbolTable::new(),
            units: Vec::new(),
        }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parse `source` as the next unit.
    ///
    /// The unit is kept even when it has errors, so symbols it bound keep a
    /// valid back-reference.
    pub fn parse_unit(&mut self, source: &str) -> Result<UnitId, ParseErrors> {
        let (unit, errors) = self.parse_unit_lenient(source);
        if errors.is_empty() {
            Ok(unit)
        } else {
            Err(errors)
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_unit_lenient(&mut self, source: &str) -> (UnitId, ParseErrors) {
        let unit = UnitId::new(self.units.len() as u32);
        let (ast, errors) =
            Parser::parse_lenient(source, self.arena, &mut self.symbols, unit, self.options);
        debug!(%unit, nodes = ast.len(), errors = errors.len(), "added unit to session");
        self.units.push(ast);
        (unit, errors)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn unit(&self, unit: UnitId) -> Option<&Ast<'ast>> {
        self.units.get(unit.index() as usize)
    }

    pub fn units(&self) -> &[Ast<'ast>] {
        &self.units
    }

    /// Follow a node handle into whichever unit it belongs to.
    pub fn resolve(&self, node: NodeRef) -> Option<&AstNode<'ast>> {
        self.unit(node.unit)?.resolve(node)
    }

    /// The declaration wrapped by the template declaration at `node`.
    pub fn owned_declaration(&self, node: NodeRef) -> Result<Option<NodeRef>, AstError> {
        let ast = self.unit(node.unit).ok_or(AstError::NotFound)?;
        ast.owned_declaration(node.node, &self.symbols)
    }

    /// Walk one unit with `visitor`.
    pub fn walk<V>(
        &self,
        unit: UnitId,
        visitor: &mut V,
        options: TraversalOptions,
    ) -> Result<TraversalReport, AstError>
    where
        V: SourceElementVisitor<'ast> + ?Sized,
    {
        let ast = self.unit(unit).ok_or(AstError::NotFound)?;
        Ok(walk(ast, visitor, options))
    }

    /// Seal every template declaration and check that all template
    /// factories were left balanced.
    ///
    /// Returns one error diagnostic per factory with frames still open.
    pub fn finish(&mut self) -> Diagnostics {
        let sealed: usize = self
            .units
            .iter_mut()
            .map(Ast::seal_template_declarations)
            .sum();
        debug!(sealed, units = self.units.len(), "finished parse session");

        let mut diagnostics = Diagnostics::new();
        for (factory, pending) in self.symbols.unbalanced_factories() {
            warn!(%factory, pending, "template factory left unbalanced");
            diagnostics.push(Diagnostic::error(format!(
                "template factory {factory} has {pending} unclosed template frame(s)"
            )));
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, TemplatePhase};

    #[test]
    fn units_share_symbols() {
        let arena = Bump::new();
        let mut session = ParseSession::new(&arena);
        let first = session.parse_unit("namespace geo { struct Point { int x; }; }").unwrap();
        let second = session
            .parse_unit("namespace geo { Point origin; }")
            .unwrap();

        assert_ne!(first, second);
        let origin = session
            .unit(second)
            .unwrap()
            .iter()
            .find_map(|node| match node.kind() {
                NodeKind::Variable(variable) => Some(*variable),
                _ => None,
            })
            .unwrap();
        let point = origin.ty.symbol.unwrap();
        let definition = session.symbols()[point].extension().unwrap().primary_declaration;
        assert_eq!(definition.unit, first);
        assert!(matches!(session.resolve(definition).unwrap().kind(), NodeKind::Class(_)));
    }

    #[test]
    fn units_may_repeat_a_definition() {
        let arena = Bump::new();
        let mut session = ParseSession::new(&arena);
        let header = "struct Point { int x; };\ntypedef int scalar;\n";
        let first = session.parse_unit(header).unwrap();
        let second = session.parse_unit(header).unwrap();

        let class_symbol = |unit| {
            session
                .unit(unit)
                .unwrap()
                .iter()
                .find_map(|node| match node.kind() {
                    NodeKind::Class(class) => Some(class.symbol),
                    _ => None,
                })
                .unwrap()
        };
        let (a, b) = (class_symbol(first), class_symbol(second));
        assert_ne!(a, b);
        assert_eq!(session.symbols()[a].unit(), Some(first));
        assert_eq!(session.symbols()[b].unit(), Some(second));

        let root = session.symbols().root();
        assert_eq!(session.symbols().lookup("Point", root), Ok(a));

        // Within one unit the definition still clashes.
        let errors = session
            .parse_unit("struct Point { int x; };\nstruct Point { int y; };")
            .unwrap_err();
        assert!(errors.contains_kind(cxxfront_core::ParseErrorKind::DuplicateDeclaration));
        assert!(session.finish().is_empty());
    }

    #[test]
    fn finish_seals_templates() {
        let arena = Bump::new();
        let mut session = ParseSession::new(&arena);
        let unit = session
            .parse_unit("template<class T> struct Box;\ntemplate<class T> struct Box { T item; };")
            .unwrap();

        let before: Vec<_> = session
            .unit(unit)
            .unwrap()
            .template_declarations()
            .map(|node| node.template_declaration().unwrap().phase())
            .collect();
        assert_eq!(before, vec![TemplatePhase::Open, TemplatePhase::Bound]);

        assert!(session.finish().is_empty());
        let ast = session.unit(unit).unwrap();
        for node in ast.template_declarations() {
            let decl = node.template_declaration().unwrap();
            assert_eq!(decl.phase(), TemplatePhase::Sealed);
            assert!(matches!(decl.container_symbol(), crate::ast::ContainerRef::Template(_)));
        }

        let definition = ast.template_declarations().nth(1).unwrap();
        let owned = session
            .owned_declaration(ast.node_ref(definition.id()))
            .unwrap()
            .unwrap();
        assert!(matches!(session.resolve(owned).unwrap().kind(), NodeKind::Class(_)));
    }

    #[test]
    fn unknown_unit() {
        let arena = Bump::new();
        let session = ParseSession::new(&arena);
        let missing = NodeRef::new(UnitId::new(3), cxxfront_core::NodeId::new(0));

        assert!(session.resolve(missing).is_none());
        assert_eq!(session.owned_declaration(missing), Err(AstError::NotFound));
        let mut visitor = NoopVisitor;
        assert!(session
            .walk(UnitId::new(3), &mut visitor, TraversalOptions::default())
            .is_err());
    }

    struct NoopVisitor;

    impl<'ast> SourceElementVisitor<'ast> for NoopVisitor {}
}
