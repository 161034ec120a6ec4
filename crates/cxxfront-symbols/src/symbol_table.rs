//! Symbol Table - hierarchical storage for every declared symbol.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: [`Symbol`] (containers also hold a name → children map)
//! - Edges: `Contains` for ownership, `Uses` for `using namespace`
//!
//! Every symbol has at most one incoming `Contains` edge, so ownership forms
//! a tree rooted at the translation-unit symbol.

use cxxfront_core::{SymbolError, UnitId};
use petgraph::Direction;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::symbol::{Members, NewSymbol, Symbol, SymbolId, SymbolKind, TemplateInfo};
use crate::template_factory::{FactoryId, TemplateFactory};

/// Edge types in the symbol graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEdge {
    /// Parent scope owns the child symbol.
    Contains,
    /// `using namespace` directive: source scope sees target's members.
    Uses,
}

/// Coarse grouping used to decide whether two declarations may share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Namespace,
    /// Class, struct, union and enum names live in the tag namespace.
    Tag,
    Function,
    Object,
    Other,
}

#[derive(Debug, Clone, Copy)]
struct Signature {
    category: Category,
    defined: bool,
    specialization: bool,
    template: bool,
    unit: Option<UnitId>,
}

impl Signature {
    fn of_request(request: &NewSymbol, template: bool) -> Self {
        Self {
            category: category(&request.kind),
            defined: request.defined,
            specialization: request.specialization,
            template,
            unit: request.unit,
        }
    }
}

fn category(kind: &SymbolKind) -> Category {
    match kind {
        SymbolKind::Namespace => Category::Namespace,
        SymbolKind::Class(_) | SymbolKind::Enum { .. } => Category::Tag,
        SymbolKind::Function => Category::Function,
        SymbolKind::Variable => Category::Object,
        _ => Category::Other,
    }
}

fn conflicts(existing: Signature, incoming: Signature) -> bool {
    use Category::*;

    if existing.specialization || incoming.specialization {
        return false;
    }
    match (existing.category, incoming.category) {
        (Namespace, Namespace) => false,
        (Namespace, _) | (_, Namespace) => true,
        (Function, Function) => false,
        // Each translation unit may carry its own definition.
        (Tag, Tag) | (Object, Object) => {
            existing.template != incoming.template
                || (existing.defined && incoming.defined && existing.unit == incoming.unit)
        }
        (Tag, _) | (_, Tag) => false,
        _ => existing.unit == incoming.unit || existing.category != incoming.category,
    }
}

/// The symbol graph of one parse session.
pub struct SymbolTable {
    graph: DiGraph<Symbol, ScopeEdge>,
    root: SymbolId,
    factories: Vec<TemplateFactory>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<SymbolId> for SymbolTable {
    type Output = Symbol;

    fn index(&self, id: SymbolId) -> &Symbol {
        &self.graph[id.0]
    }
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(Symbol::from_request(NewSymbol::new(
            "",
            SymbolKind::TranslationUnit,
        )));
        Self {
            graph,
            root: SymbolId(root),
            factories: Vec::new(),
        }
    }

    /// The global scope.
    pub fn root(&self) -> SymbolId {
        self.root
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.graph.node_weight(id.0)
    }

    fn members_mut(&mut self, scope: SymbolId) -> Option<&mut Members> {
        self.graph.node_weight_mut(scope.0)?.members.as_mut()
    }

    /// Number of symbols, including the global scope.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 1
    }

    /// The scope that owns `id`.
    pub fn owner(&self, id: SymbolId) -> Option<SymbolId> {
        self.graph
            .edges_directed(id.0, Direction::Incoming)
            .find(|edge| *edge.weight() == ScopeEdge::Contains)
            .map(|edge| SymbolId(edge.source()))
    }

    /// Enclosing scopes of `id`, innermost first.
    pub fn ancestors(&self, id: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        std::iter::successors(self.owner(id), move |&scope| self.owner(scope))
    }

    /// Children of `scope` in declaration order.
    pub fn children(&self, scope: SymbolId) -> &[SymbolId] {
        self.get(scope)
            .and_then(Symbol::members)
            .map(Members::in_order)
            .unwrap_or(&[])
    }

    /// Every entry declared as `name` directly in `scope`.
    pub fn entries(&self, scope: SymbolId, name: &str) -> &[SymbolId] {
        self.get(scope)
            .and_then(Symbol::members)
            .map(|members| members.get(name))
            .unwrap_or(&[])
    }

    /// Fully qualified name, e.g. `ns::Box::get`.
    ///
    /// Template symbols share their name with the templated declaration and
    /// are skipped when they appear as an enclosing scope.
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let mut segments = Vec::new();
        if let Some(symbol) = self.get(id) {
            if !matches!(symbol.kind, SymbolKind::TranslationUnit) {
                segments.push(display_name(symbol));
            }
        }
        for scope in self.ancestors(id) {
            let symbol = &self.graph[scope.0];
            match symbol.kind {
                SymbolKind::TranslationUnit | SymbolKind::Template(_) => {}
                _ => segments.push(display_name(symbol)),
            }
        }
        segments.reverse();
        segments.join("::")
    }

    // ========================================================================
    // Declaration
    // ========================================================================

    /// Declare a defining `name` of `kind` in `scope`.
    pub fn declare(
        &mut self,
        scope: SymbolId,
        name: &str,
        kind: SymbolKind,
    ) -> Result<SymbolId, SymbolError> {
        self.declare_with(scope, NewSymbol::new(name, kind))
    }

    /// Declare a symbol described by `request` in `scope`.
    ///
    /// Fails with [`SymbolError::DuplicateDeclaration`] when an incompatible
    /// entry of the same name already exists directly in `scope`.
    pub fn declare_with(
        &mut self,
        scope: SymbolId,
        request: NewSymbol,
    ) -> Result<SymbolId, SymbolError> {
        self.check_container(scope)?;
        if !request.name.is_empty() {
            self.check_conflict(scope, &request.name, Signature::of_request(&request, false))?;
        }
        let id = self.attach(scope, Symbol::from_request(request));
        debug!(
            symbol = %id,
            name = self.graph[id.0].name.as_str(),
            kind = self.graph[id.0].kind.description(),
            scope = %scope,
            "declared symbol"
        );
        Ok(id)
    }

    /// Reopen the namespace `name` in `scope`, declaring it on first use.
    ///
    /// An empty name denotes the scope's anonymous namespace.
    pub fn find_or_declare_namespace(
        &mut self,
        scope: SymbolId,
        name: &str,
        unit: Option<UnitId>,
    ) -> Result<SymbolId, SymbolError> {
        let existing = if name.is_empty() {
            self.children(scope).iter().copied().find(|&child| {
                let symbol = &self.graph[child.0];
                symbol.is_anonymous() && symbol.kind == SymbolKind::Namespace
            })
        } else {
            self.entries(scope, name)
                .iter()
                .copied()
                .find(|&entry| self.graph[entry.0].kind == SymbolKind::Namespace)
        };
        if let Some(namespace) = existing {
            return Ok(namespace);
        }

        let mut request = NewSymbol::new(name, SymbolKind::Namespace);
        request.unit = unit;
        self.declare_with(scope, request)
    }

    /// Attach or replace the AST back-reference of a symbol.
    pub fn set_extension(
        &mut self,
        id: SymbolId,
        extension: Option<crate::AstExtension>,
    ) -> Result<(), SymbolError> {
        let symbol = self
            .graph
            .node_weight_mut(id.0)
            .ok_or_else(|| SymbolError::NotFound(id.to_string()))?;
        symbol.extension = extension;
        Ok(())
    }

    /// Move `id` under `new_scope`.
    ///
    /// Fails with [`SymbolError::CyclicScope`] when `new_scope` is `id` or
    /// one of its descendants.
    pub fn reparent(&mut self, id: SymbolId, new_scope: SymbolId) -> Result<(), SymbolError> {
        self.check_container(new_scope)?;
        if id == new_scope || self.ancestors(new_scope).any(|scope| scope == id) {
            return Err(SymbolError::CyclicScope(self.qualified_name(id)));
        }

        let old_edge = self
            .graph
            .edges_directed(id.0, Direction::Incoming)
            .find(|edge| *edge.weight() == ScopeEdge::Contains)
            .map(|edge| (edge.id(), SymbolId(edge.source())));
        if let Some((edge, old_scope)) = old_edge {
            self.graph.remove_edge(edge);
            if let Some(members) = self.members_mut(old_scope) {
                members.remove(id);
            }
        }

        self.graph.add_edge(new_scope.0, id.0, ScopeEdge::Contains);
        let name = self.graph[id.0].name.clone();
        if let Some(members) = self.members_mut(new_scope) {
            members.insert(&name, id);
        }
        Ok(())
    }

    /// Add a `using namespace target;` directive to `scope`.
    pub fn add_using_directive(&mut self, scope: SymbolId, target: SymbolId) {
        let exists = self
            .graph
            .edges(scope.0)
            .any(|edge| *edge.weight() == ScopeEdge::Uses && edge.target() == target.0);
        if !exists {
            self.graph.add_edge(scope.0, target.0, ScopeEdge::Uses);
        }
    }

    /// Namespaces nominated by `using` directives in `scope`.
    pub fn using_directives(&self, scope: SymbolId) -> Vec<SymbolId> {
        let mut targets: Vec<SymbolId> = self
            .graph
            .edges(scope.0)
            .filter(|edge| *edge.weight() == ScopeEdge::Uses)
            .map(|edge| SymbolId(edge.target()))
            .collect();
        targets.sort();
        targets
    }

    fn attach(&mut self, scope: SymbolId, symbol: Symbol) -> SymbolId {
        let name = symbol.name.clone();
        let id = SymbolId(self.graph.add_node(symbol));
        self.graph.add_edge(scope.0, id.0, ScopeEdge::Contains);
        if let Some(members) = self.members_mut(scope) {
            members.insert(&name, id);
        }
        id
    }

    fn check_container(&self, scope: SymbolId) -> Result<(), SymbolError> {
        match self.get(scope) {
            Some(symbol) if symbol.is_container() => Ok(()),
            Some(_) => Err(SymbolError::NotAContainer(self.qualified_name(scope))),
            None => Err(SymbolError::NotFound(scope.to_string())),
        }
    }

    fn signature(&self, id: SymbolId) -> Signature {
        let symbol = &self.graph[id.0];
        match &symbol.kind {
            SymbolKind::Template(info) => {
                let kind = info.templated.map(|templated| &self.graph[templated.0].kind);
                Signature {
                    category: kind.map(category).unwrap_or(Category::Other),
                    defined: symbol.defined,
                    specialization: symbol.specialization,
                    template: true,
                    unit: symbol.unit,
                }
            }
            kind => Signature {
                category: category(kind),
                defined: symbol.defined,
                specialization: symbol.specialization,
                template: false,
                unit: symbol.unit,
            },
        }
    }

    fn check_conflict(
        &self,
        scope: SymbolId,
        name: &str,
        incoming: Signature,
    ) -> Result<(), SymbolError> {
        let clash = self
            .entries(scope, name)
            .iter()
            .any(|&existing| conflicts(self.signature(existing), incoming));
        if clash {
            debug!(name, scope = %scope, "duplicate declaration");
            return Err(SymbolError::DuplicateDeclaration {
                name: name.to_string(),
                scope: self.qualified_name(scope),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Unqualified lookup of `name` starting at `scope`.
    ///
    /// Walks outward through enclosing scopes. The first scope that declares
    /// the name wins, whatever the kind of the outer declarations. Within a
    /// scope, its own members are searched before namespaces nominated by
    /// its `using` directives.
    pub fn lookup(&self, name: &str, scope: SymbolId) -> Result<SymbolId, SymbolError> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            if let Some(found) = self.lookup_in_scope(scope, name)? {
                return Ok(found);
            }
            current = self.owner(scope);
        }
        Err(SymbolError::NotFound(name.to_string()))
    }

    /// Qualified lookup of `path` such as `["std", "vector"]`.
    ///
    /// The first segment is found by unqualified lookup from `scope` (or in
    /// the global scope when `global` is set, for `::std::vector`). Each later
    /// segment is searched only in the direct scope named by its predecessor.
    pub fn lookup_qualified(
        &self,
        path: &[&str],
        scope: SymbolId,
        global: bool,
    ) -> Result<SymbolId, SymbolError> {
        let Some((first, rest)) = path.split_first() else {
            return Err(SymbolError::NotFound(String::new()));
        };
        let mut current = if global {
            self.lookup_in_scope(self.root, first)?
                .ok_or_else(|| SymbolError::NotFound(format!("::{first}")))?
        } else {
            self.lookup(first, scope)?
        };

        for segment in rest {
            let container = self
                .scope_of(current)
                .ok_or_else(|| SymbolError::NotAContainer(self.qualified_name(current)))?;
            current = self.find_local(container, segment).ok_or_else(|| {
                SymbolError::NotFound(format!("{}::{segment}", self.qualified_name(container)))
            })?;
        }
        Ok(current)
    }

    /// The scope a qualified name continues into after naming `id`.
    ///
    /// Templates continue into their templated declaration.
    pub fn scope_of(&self, id: SymbolId) -> Option<SymbolId> {
        let symbol = self.get(id)?;
        match &symbol.kind {
            SymbolKind::Template(info) => info.templated.and_then(|templated| self.scope_of(templated)),
            SymbolKind::Function => None,
            _ if symbol.is_container() => Some(id),
            _ => None,
        }
    }

    /// Find `name` declared directly in `scope`.
    ///
    /// Members of unscoped enums and anonymous namespaces are visible in the
    /// enclosing scope and are found here too.
    pub fn find_local(&self, scope: SymbolId, name: &str) -> Option<SymbolId> {
        let members = self.get(scope)?.members()?;
        if let Some(found) = self.preferred(members.get(name)) {
            return Some(found);
        }
        members
            .in_order()
            .iter()
            .filter(|&&child| self.is_transparent(child))
            .find_map(|&child| self.find_local(child, name))
    }

    fn lookup_in_scope(&self, scope: SymbolId, name: &str) -> Result<Option<SymbolId>, SymbolError> {
        if let Some(found) = self.find_local(scope, name) {
            return Ok(Some(found));
        }

        let mut hits: Vec<SymbolId> = Vec::new();
        for target in self.using_directives(scope) {
            if let Some(found) = self.find_local(target, name) {
                if !hits.contains(&found) {
                    hits.push(found);
                }
            }
        }
        match hits.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => Err(SymbolError::Ambiguous {
                name: name.to_string(),
                candidates: hits.len(),
            }),
        }
    }

    /// A definition is preferred over earlier forward declarations.
    fn preferred(&self, entries: &[SymbolId]) -> Option<SymbolId> {
        entries
            .iter()
            .copied()
            .find(|&entry| self.graph[entry.0].defined)
            .or_else(|| entries.first().copied())
    }

    fn is_transparent(&self, id: SymbolId) -> bool {
        let symbol = &self.graph[id.0];
        match symbol.kind {
            SymbolKind::Enum { scoped } => !scoped,
            SymbolKind::Namespace => symbol.is_anonymous(),
            _ => false,
        }
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// The factory `container` was upgraded with, if a template was seen in it.
    pub fn as_template_factory(&self, container: SymbolId) -> Option<FactoryId> {
        self.get(container)?.factory
    }

    /// The factory of `container`, creating and binding one on first use.
    pub fn template_factory_for(&mut self, container: SymbolId) -> Result<FactoryId, SymbolError> {
        self.check_container(container)?;
        if let Some(existing) = self.graph[container.0].factory {
            return Ok(existing);
        }

        let id = FactoryId(self.factories.len() as u32);
        let mut factory = TemplateFactory::new(id);
        factory.set_containing_symbol(container);
        self.factories.push(factory);
        self.graph[container.0].factory = Some(id);
        debug!(factory = %id, container = %container, "upgraded container with template factory");
        Ok(id)
    }

    pub fn factory(&self, id: FactoryId) -> Option<&TemplateFactory> {
        self.factories.get(id.index())
    }

    pub fn factory_mut(&mut self, id: FactoryId) -> Option<&mut TemplateFactory> {
        self.factories.get_mut(id.index())
    }

    pub fn factories(&self) -> impl Iterator<Item = &TemplateFactory> {
        self.factories.iter()
    }

    /// Create an anonymous template symbol and push a frame for it.
    ///
    /// The new template is provisionally owned by the innermost open template
    /// of the factory, or by the factory's container, so lookups from inside
    /// the template see the enclosing template parameters.
    pub fn begin_template(
        &mut self,
        factory: FactoryId,
        unit: Option<UnitId>,
    ) -> Result<SymbolId, SymbolError> {
        let parent = {
            let factory = self
                .factory(factory)
                .ok_or_else(|| SymbolError::NotFound(factory.to_string()))?;
            factory
                .current()
                .or(factory.containing_symbol())
                .unwrap_or(self.root)
        };

        let mut request = NewSymbol::new("", SymbolKind::Template(TemplateInfo::default()));
        request.unit = unit;
        let template = self.attach(parent, Symbol::from_request(request));
        self.factories[factory.index()].push_template(template);
        Ok(template)
    }

    /// Declare the next parameter of `template`.
    pub fn add_template_parameter(
        &mut self,
        template: SymbolId,
        request: NewSymbol,
    ) -> Result<SymbolId, SymbolError> {
        if !self.get(template).is_some_and(Symbol::is_template) {
            return Err(SymbolError::NotAContainer(self.qualified_name(template)));
        }
        let parameter = self.declare_with(template, request)?;
        if let SymbolKind::Template(info) = &mut self.graph[template.0].kind {
            info.parameters.push(parameter);
        }
        Ok(parameter)
    }

    /// Parameters of `template`, in order.
    pub fn template_parameters(&self, template: SymbolId) -> &[SymbolId] {
        self.get(template)
            .and_then(Symbol::template_info)
            .map(|info| info.parameters.as_slice())
            .unwrap_or(&[])
    }

    /// The declaration `template` wraps.
    pub fn templated_symbol(&self, template: SymbolId) -> Option<SymbolId> {
        self.get(template)?.template_info()?.templated
    }

    /// Declare the declaration wrapped by the factory's open templates.
    ///
    /// The new symbol is owned by the innermost open template. Every frame is
    /// then popped, innermost first: each template takes the declaration's
    /// name and adopts the previous one as its templated symbol. The outermost
    /// template finally becomes a named member of `target`, normally the
    /// factory's container, or the class named by a qualified declarator.
    pub fn declare_templated(
        &mut self,
        factory: FactoryId,
        target: SymbolId,
        request: NewSymbol,
    ) -> Result<SymbolId, SymbolError> {
        let innermost = self
            .factory(factory)
            .ok_or_else(|| SymbolError::NotFound(factory.to_string()))?
            .current()
            .ok_or(SymbolError::EmptyFactoryStack)?;
        self.check_container(target)?;
        if !request.name.is_empty() {
            self.check_conflict(target, &request.name, Signature::of_request(&request, true))?;
        }

        let name = request.name.clone();
        let defined = request.defined;
        let specialization = request.specialization;
        let declared = self.attach(innermost, Symbol::from_request(request));

        let mut inner = declared;
        let mut outermost = innermost;
        while self.factories[factory.index()].depth() > 0 {
            let template = self.factories[factory.index()].pop_template()?;
            {
                let symbol = &mut self.graph[template.0];
                symbol.name.clone_from(&name);
                symbol.defined = defined;
                symbol.specialization = specialization;
                if let SymbolKind::Template(info) = &mut symbol.kind {
                    info.templated = Some(inner);
                }
            }
            if self.owner(inner) != Some(template) {
                self.reparent(inner, template)?;
            } else if let Some(members) = self.members_mut(template) {
                members.name_child(&name, inner);
            }
            debug!(template = %template, templated = %inner, name = name.as_str(), "bound template");
            inner = template;
            outermost = template;
        }

        if self.owner(outermost) == Some(target) {
            if let Some(members) = self.members_mut(target) {
                members.name_child(&name, outermost);
            }
        } else {
            self.reparent(outermost, target)?;
        }
        Ok(declared)
    }

    /// Check that a factory has no open frames.
    pub fn release_factory(&self, factory: FactoryId) -> Result<(), SymbolError> {
        self.factory(factory)
            .ok_or_else(|| SymbolError::NotFound(factory.to_string()))?
            .release()
    }

    /// Factories that still hold open frames, with their frame counts.
    pub fn unbalanced_factories(&self) -> Vec<(FactoryId, usize)> {
        self.factories
            .iter()
            .filter(|factory| factory.depth() > 0)
            .map(|factory| (factory.id(), factory.depth()))
            .collect()
    }
}

fn display_name(symbol: &Symbol) -> String {
    if symbol.is_anonymous() {
        "(anonymous)".to_string()
    } else {
        symbol.name.clone()
    }
}
