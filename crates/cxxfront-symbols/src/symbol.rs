//! Symbol entries stored in the symbol table.
//!
//! A [`Symbol`] is one declared entity. Symbols whose kind introduces a scope
//! (namespaces, classes, enums, functions, templates) carry a [`Members`]
//! map and act as container symbols.

use std::fmt;

use cxxfront_core::{NodeRef, UnitId};
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;

use crate::FactoryId;

/// Handle to a symbol in a [`SymbolTable`](crate::SymbolTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) NodeIndex);

impl SymbolId {
    /// Raw index, stable for the lifetime of the table.
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym_{}", self.0.index())
    }
}

/// Class-key of a class specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKey {
    Class,
    Struct,
    Union,
}

impl ClassKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassKey::Class => "class",
            ClassKey::Struct => "struct",
            ClassKey::Union => "union",
        }
    }
}

/// Flavour of a template parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateParamKind {
    /// `typename T` / `class T`
    Type,
    /// `int N`
    NonType,
    /// `template<typename> class C`
    Template,
}

/// Data owned by a template symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateInfo {
    /// Parameters in declaration order. Order is part of the template's identity.
    pub parameters: Vec<SymbolId>,
    /// The declaration being templated, once recognized.
    pub templated: Option<SymbolId>,
}

/// What a symbol denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// The global scope of the session.
    TranslationUnit,
    Namespace,
    Class(ClassKey),
    Enum {
        scoped: bool,
    },
    Enumerator,
    Function,
    Variable,
    Parameter,
    Typedef,
    TemplateParameter(TemplateParamKind),
    Template(TemplateInfo),
}

impl SymbolKind {
    /// Whether symbols of this kind own a scope.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            SymbolKind::TranslationUnit
                | SymbolKind::Namespace
                | SymbolKind::Class(_)
                | SymbolKind::Enum { .. }
                | SymbolKind::Function
                | SymbolKind::Template(_)
        )
    }

    /// Functions may share a name within a scope.
    pub fn is_overloadable(&self) -> bool {
        matches!(self, SymbolKind::Function)
    }

    pub fn description(&self) -> &'static str {
        match self {
            SymbolKind::TranslationUnit => "translation unit",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Class(key) => key.as_str(),
            SymbolKind::Enum { .. } => "enum",
            SymbolKind::Enumerator => "enumerator",
            SymbolKind::Function => "function",
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Typedef => "typedef",
            SymbolKind::TemplateParameter(_) => "template parameter",
            SymbolKind::Template(_) => "template",
        }
    }
}

/// Back-reference from a symbol to the syntax that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AstExtension {
    /// The declaration node that introduced the symbol.
    pub primary_declaration: NodeRef,
}

impl AstExtension {
    pub fn new(primary_declaration: NodeRef) -> Self {
        Self {
            primary_declaration,
        }
    }
}

/// Name → children map of a container symbol.
#[derive(Debug, Clone, Default)]
pub struct Members {
    by_name: FxHashMap<String, Vec<SymbolId>>,
    order: Vec<SymbolId>,
}

impl Members {
    pub(crate) fn insert(&mut self, name: &str, id: SymbolId) {
        if !name.is_empty() {
            self.by_name.entry(name.to_string()).or_default().push(id);
        }
        self.order.push(id);
    }

    /// Register a name for an already-owned child, e.g. a template that
    /// received its name when its declaration was recognized.
    pub(crate) fn name_child(&mut self, name: &str, id: SymbolId) {
        let entries = self.by_name.entry(name.to_string()).or_default();
        if !entries.contains(&id) {
            entries.push(id);
        }
    }

    pub(crate) fn remove(&mut self, id: SymbolId) {
        self.order.retain(|&child| child != id);
        self.by_name.retain(|_, entries| {
            entries.retain(|&child| child != id);
            !entries.is_empty()
        });
    }

    /// Entries declared under `name`, in declaration order.
    pub fn get(&self, name: &str) -> &[SymbolId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All children in declaration order, including anonymous ones.
    pub fn in_order(&self) -> &[SymbolId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A request to create a symbol.
#[derive(Debug, Clone)]
pub struct NewSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Definitions conflict with other definitions; declarations do not.
    pub defined: bool,
    /// Explicit specializations never conflict with the primary declaration.
    pub specialization: bool,
    pub unit: Option<UnitId>,
}

impl NewSymbol {
    /// A defining declaration of `name`.
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            defined: true,
            specialization: false,
            unit: None,
        }
    }

    /// A non-defining declaration (forward class, prototype, `extern` variable).
    pub fn declaration(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            defined: false,
            ..Self::new(name, kind)
        }
    }

    pub fn specialization(mut self, specialization: bool) -> Self {
        self.specialization = specialization;
        self
    }

    pub fn in_unit(mut self, unit: UnitId) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// A declared entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub(crate) name: String,
    pub(crate) kind: SymbolKind,
    pub(crate) defined: bool,
    pub(crate) specialization: bool,
    pub(crate) unit: Option<UnitId>,
    pub(crate) extension: Option<AstExtension>,
    pub(crate) members: Option<Members>,
    pub(crate) factory: Option<FactoryId>,
}

impl Symbol {
    pub(crate) fn from_request(request: NewSymbol) -> Self {
        let members = request.kind.is_container().then(Members::default);
        Self {
            name: request.name,
            kind: request.kind,
            defined: request.defined,
            specialization: request.specialization,
            unit: request.unit,
            extension: None,
            members,
            factory: None,
        }
    }

    /// Declared name; empty for anonymous entities.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn is_specialization(&self) -> bool {
        self.specialization
    }

    pub fn is_container(&self) -> bool {
        self.members.is_some()
    }

    pub fn is_template(&self) -> bool {
        matches!(self.kind, SymbolKind::Template(_))
    }

    /// Template data, if this is a template symbol.
    pub fn template_info(&self) -> Option<&TemplateInfo> {
        match &self.kind {
            SymbolKind::Template(info) => Some(info),
            _ => None,
        }
    }

    /// Unit that declared the symbol.
    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    pub fn extension(&self) -> Option<&AstExtension> {
        self.extension.as_ref()
    }

    pub fn members(&self) -> Option<&Members> {
        self.members.as_ref()
    }

    /// The template factory this container was upgraded with, if any.
    pub fn template_factory(&self) -> Option<FactoryId> {
        self.factory
    }
}
