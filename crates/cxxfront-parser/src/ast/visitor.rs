//! Push-style traversal of an [`Ast`].
//!
//! [`walk`] drives a [`SourceElementVisitor`] through one translation unit in
//! document order. Scope-introducing nodes produce an `enter_*` callback
//! before their children and the matching `exit_*` callback after them; leaf
//! declarations produce a single `accept_*` callback.
//!
//! Callbacks are fallible. A callback error never aborts the walk: the driver
//! logs it, records it as a [`Diagnostic`] in the returned [`TraversalReport`]
//! and carries on according to the [`FaultPolicy`].
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cxxfront_core::UnitId;
//! use cxxfront_parser::visitor::{walk, SourceElementVisitor, TraversalOptions};
//! use cxxfront_parser::{AstNode, ClassDecl, ParseOptions, Parser};
//! use cxxfront_symbols::SymbolTable;
//!
//! #[derive(Default)]
//! struct ClassNames(Vec<String>);
//!
//! impl<'ast> SourceElementVisitor<'ast> for ClassNames {
//!     fn enter_class(&mut self, _node: &AstNode<'ast>, decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
//!         self.0.push(decl.name.to_string());
//!         Ok(())
//!     }
//! }
//!
//! let arena = Bump::new();
//! let mut symbols = SymbolTable::new();
//! let source = "struct A {}; namespace n { class B {}; }";
//! let ast = Parser::parse(source, &arena, &mut symbols, UnitId::new(0), ParseOptions::default()).unwrap();
//!
//! let mut names = ClassNames::default();
//! let report = walk(&ast, &mut names, TraversalOptions::default());
//! assert_eq!(names.0, ["A", "B"]);
//! assert!(report.diagnostics.is_empty());
//! ```

use cxxfront_core::{Diagnostic, Diagnostics, NodeId};
use tracing::warn;

use super::{
    Ast, AstNode, ClassDecl, EnumDecl, EnumeratorDecl, FunctionDecl, LinkageSpec, NamespaceDecl,
    ParameterDecl, TemplateDeclaration, TemplateParameterDecl, TranslationUnitDecl, TypedefDecl,
    UsingDirective, VariableDecl,
};

/// Callbacks invoked while walking an [`Ast`].
///
/// Every method has a no-op default, so implementors override only the
/// events they care about.
#[allow(unused_variables)]
pub trait SourceElementVisitor<'ast> {
    // === Scopes ===

    fn enter_translation_unit(
        &mut self,
        node: &AstNode<'ast>,
        decl: &TranslationUnitDecl,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn exit_translation_unit(
        &mut self,
        node: &AstNode<'ast>,
        decl: &TranslationUnitDecl,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn enter_namespace(&mut self, node: &AstNode<'ast>, decl: &NamespaceDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn exit_namespace(&mut self, node: &AstNode<'ast>, decl: &NamespaceDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    /// `extern "C" { ... }`
    fn enter_linkage(&mut self, node: &AstNode<'ast>, decl: &LinkageSpec<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn exit_linkage(&mut self, node: &AstNode<'ast>, decl: &LinkageSpec<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn enter_class(&mut self, node: &AstNode<'ast>, decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn exit_class(&mut self, node: &AstNode<'ast>, decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn enter_enum(&mut self, node: &AstNode<'ast>, decl: &EnumDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn exit_enum(&mut self, node: &AstNode<'ast>, decl: &EnumDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Functions are scopes for their parameters.
    fn enter_function(&mut self, node: &AstNode<'ast>, decl: &FunctionDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn exit_function(&mut self, node: &AstNode<'ast>, decl: &FunctionDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Template parameters and the owned declaration follow as children.
    fn enter_template_declaration(
        &mut self,
        node: &AstNode<'ast>,
        decl: &TemplateDeclaration,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn exit_template_declaration(
        &mut self,
        node: &AstNode<'ast>,
        decl: &TemplateDeclaration,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    // === Leaves ===

    fn accept_variable(&mut self, node: &AstNode<'ast>, decl: &VariableDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn accept_typedef(&mut self, node: &AstNode<'ast>, decl: &TypedefDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn accept_enumerator(
        &mut self,
        node: &AstNode<'ast>,
        decl: &EnumeratorDecl<'ast>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn accept_parameter(&mut self, node: &AstNode<'ast>, decl: &ParameterDecl<'ast>) -> anyhow::Result<()> {
        Ok(())
    }

    fn accept_template_parameter(
        &mut self,
        node: &AstNode<'ast>,
        decl: &TemplateParameterDecl<'ast>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn accept_using_directive(
        &mut self,
        node: &AstNode<'ast>,
        decl: &UsingDirective<'ast>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What the walk does after an `enter_*` callback fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Record the fault and visit the children anyway.
    #[default]
    Continue,
    /// Record the fault and skip the node's children. The matching `exit_*`
    /// callback is still delivered.
    SkipSubtree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraversalOptions {
    pub policy: FaultPolicy,
}

impl TraversalOptions {
    pub fn skip_subtree() -> Self {
        Self {
            policy: FaultPolicy::SkipSubtree,
        }
    }
}

/// Outcome of a [`walk`].
#[derive(Debug, Clone, Default)]
pub struct TraversalReport {
    /// Number of `enter_*` events delivered.
    pub entered: usize,
    /// Number of `exit_*` events delivered. Always equal to `entered`.
    pub exited: usize,
    /// Number of `accept_*` events delivered.
    pub accepted: usize,
    /// Nodes not visited because their parent's enter callback failed.
    pub skipped: usize,
    /// One error per failed callback, in the order they failed.
    pub diagnostics: Diagnostics,
}

impl TraversalReport {
    pub fn has_faults(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Walk `ast` in document order, delivering events to `visitor`.
pub fn walk<'ast, V>(ast: &Ast<'ast>, visitor: &mut V, options: TraversalOptions) -> TraversalReport
where
    V: SourceElementVisitor<'ast> + ?Sized,
{
    let mut walker = Walker {
        ast,
        visitor,
        options,
        report: TraversalReport::default(),
    };
    walker.visit(ast.root());
    walker.report
}

struct Walker<'w, 'ast, V: ?Sized> {
    ast: &'w Ast<'ast>,
    visitor: &'w mut V,
    options: TraversalOptions,
    report: TraversalReport,
}

impl<'ast, V> Walker<'_, 'ast, V>
where
    V: SourceElementVisitor<'ast> + ?Sized,
{
    fn visit(&mut self, id: NodeId) {
        let ast = self.ast;
        let node = &ast[id];
        if !node.kind().is_scope() {
            self.report.accepted += 1;
            let result = node.accept(self.visitor);
            self.record(node, "accept", result);
            return;
        }

        self.report.entered += 1;
        let entered = node.enter_scope(self.visitor);
        let failed = entered.is_err();
        self.record(node, "enter", entered);

        if failed && self.options.policy == FaultPolicy::SkipSubtree {
            self.report.skipped += self.count_descendants(id);
        } else {
            for &child in node.children() {
                self.visit(child);
            }
        }

        self.report.exited += 1;
        let exited = node.exit_scope(self.visitor);
        self.record(node, "exit", exited);
    }

    fn record(&mut self, node: &AstNode<'ast>, event: &str, result: anyhow::Result<()>) {
        let Err(error) = result else {
            return;
        };
        warn!(
            node = %node.id(),
            kind = node.kind().description(),
            event,
            error = %error,
            "visitor callback failed"
        );
        let message = format!("{event} {} failed: {error:#}", node.kind().description());
        self.report
            .diagnostics
            .push(Diagnostic::error(message).at(self.ast.node_ref(node.id()), node.starting_line()));
    }

    fn count_descendants(&self, id: NodeId) -> usize {
        self.ast[id]
            .children()
            .iter()
            .map(|&child| 1 + self.count_descendants(child))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParseOptions, Parser};
    use anyhow::bail;
    use bumpalo::Bump;
    use cxxfront_core::UnitId;
    use cxxfront_symbols::SymbolTable;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        depth: usize,
        max_depth: usize,
    }

    impl Recorder {
        fn enter(&mut self, what: String) -> anyhow::Result<()> {
            self.events.push(format!("+{what}"));
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
            Ok(())
        }

        fn exit(&mut self, what: String) -> anyhow::Result<()> {
            self.events.push(format!("-{what}"));
            self.depth -= 1;
            Ok(())
        }
    }

    impl<'ast> SourceElementVisitor<'ast> for Recorder {
        fn enter_translation_unit(&mut self, _: &AstNode<'ast>, _: &TranslationUnitDecl) -> anyhow::Result<()> {
            self.enter("unit".into())
        }
        fn exit_translation_unit(&mut self, _: &AstNode<'ast>, _: &TranslationUnitDecl) -> anyhow::Result<()> {
            self.exit("unit".into())
        }
        fn enter_namespace(&mut self, _: &AstNode<'ast>, decl: &NamespaceDecl<'ast>) -> anyhow::Result<()> {
            self.enter(format!("ns {}", decl.name))
        }
        fn exit_namespace(&mut self, _: &AstNode<'ast>, decl: &NamespaceDecl<'ast>) -> anyhow::Result<()> {
            self.exit(format!("ns {}", decl.name))
        }
        fn enter_class(&mut self, _: &AstNode<'ast>, decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
            self.enter(format!("class {}", decl.name))
        }
        fn exit_class(&mut self, _: &AstNode<'ast>, decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
            self.exit(format!("class {}", decl.name))
        }
        fn enter_function(&mut self, _: &AstNode<'ast>, decl: &FunctionDecl<'ast>) -> anyhow::Result<()> {
            self.enter(format!("fn {}", decl.name))
        }
        fn exit_function(&mut self, _: &AstNode<'ast>, decl: &FunctionDecl<'ast>) -> anyhow::Result<()> {
            self.exit(format!("fn {}", decl.name))
        }
        fn enter_template_declaration(&mut self, _: &AstNode<'ast>, _: &TemplateDeclaration) -> anyhow::Result<()> {
            self.enter("template".into())
        }
        fn exit_template_declaration(&mut self, _: &AstNode<'ast>, _: &TemplateDeclaration) -> anyhow::Result<()> {
            self.exit("template".into())
        }
        fn accept_variable(&mut self, _: &AstNode<'ast>, decl: &VariableDecl<'ast>) -> anyhow::Result<()> {
            self.events.push(format!("var {}", decl.name));
            Ok(())
        }
        fn accept_parameter(&mut self, _: &AstNode<'ast>, decl: &ParameterDecl<'ast>) -> anyhow::Result<()> {
            self.events.push(format!("param {}", decl.name.unwrap_or("_")));
            Ok(())
        }
        fn accept_template_parameter(
            &mut self,
            _: &AstNode<'ast>,
            decl: &TemplateParameterDecl<'ast>,
        ) -> anyhow::Result<()> {
            self.events.push(format!("tparam {}", decl.name.unwrap_or("_")));
            Ok(())
        }
    }

    fn parse<'a>(source: &'a str, arena: &'a Bump, symbols: &mut SymbolTable) -> Ast<'a> {
        Parser::parse(source, arena, symbols, UnitId::new(0), ParseOptions::default()).unwrap()
    }

    #[test]
    fn events_in_document_order() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "namespace n { template<class T> struct Box { T value; }; int f(int a); }",
            &arena,
            &mut symbols,
        );

        let mut recorder = Recorder::default();
        let report = walk(&ast, &mut recorder, TraversalOptions::default());

        assert_eq!(
            recorder.events,
            [
                "+unit",
                "+ns n",
                "+template",
                "tparam T",
                "+class Box",
                "var value",
                "-class Box",
                "-template",
                "+fn f",
                "param a",
                "-fn f",
                "-ns n",
                "-unit",
            ]
        );
        assert_eq!(recorder.depth, 0);
        assert_eq!(recorder.max_depth, 4);
        assert_eq!(report.entered, report.exited);
        assert_eq!(report.entered, 5);
        assert_eq!(report.accepted, 3);
        assert!(!report.has_faults());
    }

    struct FailingClass {
        exits: usize,
        seen_variables: Vec<String>,
    }

    impl<'ast> SourceElementVisitor<'ast> for FailingClass {
        fn enter_class(&mut self, _: &AstNode<'ast>, decl: &ClassDecl<'ast>) -> anyhow::Result<()> {
            bail!("cannot handle {}", decl.name)
        }
        fn exit_class(&mut self, _: &AstNode<'ast>, _: &ClassDecl<'ast>) -> anyhow::Result<()> {
            self.exits += 1;
            Ok(())
        }
        fn accept_variable(&mut self, _: &AstNode<'ast>, decl: &VariableDecl<'ast>) -> anyhow::Result<()> {
            self.seen_variables.push(decl.name.to_string());
            Ok(())
        }
    }

    const FAULTY: &str = "struct S {\n int inside;\n};\nint outside;";

    #[test]
    fn fault_is_reported_and_walk_continues() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(FAULTY, &arena, &mut symbols);

        let mut visitor = FailingClass {
            exits: 0,
            seen_variables: Vec::new(),
        };
        let report = walk(&ast, &mut visitor, TraversalOptions::default());

        assert_eq!(visitor.seen_variables, ["inside", "outside"]);
        assert_eq!(visitor.exits, 1);
        assert_eq!(report.diagnostics.len(), 1);
        let diagnostic = report.diagnostics.iter().next().unwrap();
        assert!(diagnostic.message.contains("cannot handle S"));
        assert_eq!(diagnostic.line, 1);
    }

    #[test]
    fn skip_subtree_policy() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(FAULTY, &arena, &mut symbols);

        let mut visitor = FailingClass {
            exits: 0,
            seen_variables: Vec::new(),
        };
        let report = walk(&ast, &mut visitor, TraversalOptions::skip_subtree());

        assert_eq!(visitor.seen_variables, ["outside"]);
        assert_eq!(visitor.exits, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.entered, report.exited);
        assert!(report.has_faults());
    }
}
