//! Declaration node payloads.
//!
//! Each scope-introducing or leaf declaration stores its syntactic details
//! here. Names and type spellings are allocated in the parse arena.

use bitflags::bitflags;
use cxxfront_core::UnitId;
use cxxfront_symbols::{ClassKey, SymbolId, TemplateParamKind};

use super::template_decl::TemplateDeclaration;

bitflags! {
    /// Declaration specifiers that do not affect the type spelling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Specifiers: u16 {
        const STATIC = 1 << 0;
        const EXTERN = 1 << 1;
        const INLINE = 1 << 2;
        const VIRTUAL = 1 << 3;
        const EXPLICIT = 1 << 4;
        const CONSTEXPR = 1 << 5;
        const MUTABLE = 1 << 6;
        const THREAD_LOCAL = 1 << 7;
        const REGISTER = 1 << 8;
        const FRIEND = 1 << 9;
        /// `= 0`
        const PURE = 1 << 10;
        /// `= default`
        const DEFAULTED = 1 << 11;
        /// `= delete`
        const DELETED = 1 << 12;
        /// `override`
        const OVERRIDE = 1 << 13;
        /// `final`
        const FINAL = 1 << 14;
    }
}

/// A type as written, with the symbol its name resolved to when lookup
/// succeeded at the point of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRef<'ast> {
    pub text: &'ast str,
    pub symbol: Option<SymbolId>,
}

impl<'ast> TypeRef<'ast> {
    pub fn new(text: &'ast str) -> Self {
        Self { text, symbol: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationUnitDecl {
    pub unit: UnitId,
    /// The global scope shared by every unit of a session.
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceDecl<'ast> {
    /// Empty for an anonymous namespace.
    pub name: &'ast str,
    pub inline: bool,
    pub symbol: SymbolId,
}

/// `extern "C" { ... }` or `extern "C" declaration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkageSpec<'ast> {
    /// Language name without quotes, e.g. `C`.
    pub language: &'ast str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl<'ast> {
    /// Empty for an anonymous class.
    pub name: &'ast str,
    pub key: ClassKey,
    pub bases: Vec<TypeRef<'ast>>,
    pub symbol: SymbolId,
    /// Explicit or partial specialization (`class Box<int>`).
    pub specialization: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumDecl<'ast> {
    pub name: &'ast str,
    /// `enum class` / `enum struct`.
    pub scoped: bool,
    pub underlying: Option<TypeRef<'ast>>,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumeratorDecl<'ast> {
    pub name: &'ast str,
    pub symbol: SymbolId,
    pub has_value: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDecl<'ast> {
    pub name: &'ast str,
    /// Qualifier of an out-of-line definition, e.g. `Box<T>` in `Box<T>::get`.
    pub qualifier: Option<&'ast str>,
    /// `None` for constructors, destructors and conversion functions.
    pub return_type: Option<TypeRef<'ast>>,
    pub specifiers: Specifiers,
    pub symbol: SymbolId,
    /// Whether a body (or `= default` / `= delete`) was given.
    pub is_definition: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDecl<'ast> {
    pub name: Option<&'ast str>,
    pub ty: TypeRef<'ast>,
    /// Declared in the function's scope when the parameter is named.
    pub symbol: Option<SymbolId>,
    pub has_default: bool,
    /// The trailing `...` of a variadic function.
    pub variadic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDecl<'ast> {
    pub name: &'ast str,
    pub qualifier: Option<&'ast str>,
    pub ty: TypeRef<'ast>,
    pub specifiers: Specifiers,
    pub symbol: SymbolId,
    pub has_initializer: bool,
}

/// `typedef T name;` or `using name = T;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedefDecl<'ast> {
    pub name: &'ast str,
    pub ty: TypeRef<'ast>,
    pub symbol: SymbolId,
}

/// `using namespace path;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsingDirective<'ast> {
    pub path: &'ast str,
    /// The nominated namespace, if it was declared before the directive.
    pub target: Option<SymbolId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateParameterDecl<'ast> {
    pub name: Option<&'ast str>,
    pub kind: TemplateParamKind,
    /// Type of a non-type parameter (`int` in `int N`).
    pub ty: Option<TypeRef<'ast>>,
    pub symbol: Option<SymbolId>,
    pub has_default: bool,
    /// A parameter pack (`typename... Ts`).
    pub variadic: bool,
}

/// What an AST node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'ast> {
    TranslationUnit(TranslationUnitDecl),
    Namespace(NamespaceDecl<'ast>),
    Linkage(LinkageSpec<'ast>),
    Class(ClassDecl<'ast>),
    Enum(EnumDecl<'ast>),
    Enumerator(EnumeratorDecl<'ast>),
    Function(FunctionDecl<'ast>),
    Parameter(ParameterDecl<'ast>),
    Variable(VariableDecl<'ast>),
    Typedef(TypedefDecl<'ast>),
    UsingDirective(UsingDirective<'ast>),
    TemplateDeclaration(TemplateDeclaration),
    TemplateParameter(TemplateParameterDecl<'ast>),
}

impl<'ast> NodeKind<'ast> {
    /// Human-readable kind name, used in error messages.
    pub fn description(&self) -> &'static str {
        match self {
            NodeKind::TranslationUnit(_) => "translation unit",
            NodeKind::Namespace(_) => "namespace",
            NodeKind::Linkage(_) => "linkage specification",
            NodeKind::Class(_) => "class",
            NodeKind::Enum(_) => "enum",
            NodeKind::Enumerator(_) => "enumerator",
            NodeKind::Function(_) => "function",
            NodeKind::Parameter(_) => "parameter",
            NodeKind::Variable(_) => "variable",
            NodeKind::Typedef(_) => "typedef",
            NodeKind::UsingDirective(_) => "using directive",
            NodeKind::TemplateDeclaration(_) => "template declaration",
            NodeKind::TemplateParameter(_) => "template parameter",
        }
    }

    /// Declared name, if the node declares one.
    pub fn name(&self) -> Option<&'ast str> {
        match self {
            NodeKind::Namespace(decl) => Some(decl.name),
            NodeKind::Class(decl) => Some(decl.name),
            NodeKind::Enum(decl) => Some(decl.name),
            NodeKind::Enumerator(decl) => Some(decl.name),
            NodeKind::Function(decl) => Some(decl.name),
            NodeKind::Parameter(decl) => decl.name,
            NodeKind::Variable(decl) => Some(decl.name),
            NodeKind::Typedef(decl) => Some(decl.name),
            NodeKind::TemplateParameter(decl) => decl.name,
            NodeKind::TranslationUnit(_)
            | NodeKind::Linkage(_)
            | NodeKind::UsingDirective(_)
            | NodeKind::TemplateDeclaration(_) => None,
        }
    }

    /// The symbol this node declares.
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            NodeKind::TranslationUnit(decl) => Some(decl.symbol),
            NodeKind::Namespace(decl) => Some(decl.symbol),
            NodeKind::Class(decl) => Some(decl.symbol),
            NodeKind::Enum(decl) => Some(decl.symbol),
            NodeKind::Enumerator(decl) => Some(decl.symbol),
            NodeKind::Function(decl) => Some(decl.symbol),
            NodeKind::Parameter(decl) => decl.symbol,
            NodeKind::Variable(decl) => Some(decl.symbol),
            NodeKind::Typedef(decl) => Some(decl.symbol),
            NodeKind::TemplateDeclaration(decl) => Some(decl.template_symbol()),
            NodeKind::TemplateParameter(decl) => decl.symbol,
            NodeKind::Linkage(_) | NodeKind::UsingDirective(_) => None,
        }
    }

    /// Whether the visitor protocol brackets this node with enter/exit.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::TranslationUnit(_)
                | NodeKind::Namespace(_)
                | NodeKind::Linkage(_)
                | NodeKind::Class(_)
                | NodeKind::Enum(_)
                | NodeKind::Function(_)
                | NodeKind::TemplateDeclaration(_)
        )
    }

    /// Whether the node holds a list of member declarations.
    pub(crate) fn tracks_declarations(&self) -> bool {
        matches!(
            self,
            NodeKind::TranslationUnit(_)
                | NodeKind::Namespace(_)
                | NodeKind::Linkage(_)
                | NodeKind::Class(_)
                | NodeKind::Enum(_)
        )
    }
}
