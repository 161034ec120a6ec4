//! Declarations: namespaces, linkage blocks, using, classes, enums,
//! functions, variables and typedefs.
//!
//! A simple declaration is read as decl-specifiers followed by a list of
//! init-declarators. The specifiers yield the type spelling; each
//! declarator adds pointer operators, array bounds or a parameter list and
//! decides between a function and a variable.

use cxxfront_core::{NodeId, ParseError, ParseErrorKind, Span};
use cxxfront_symbols::{ClassKey, NewSymbol, SymbolId, SymbolKind, TemplateParamKind};

use super::{DeclareTarget, FrameKind, Parser, ScopeFrame};
use crate::ast::{
    ClassDecl, EnumDecl, EnumeratorDecl, FunctionDecl, LinkageSpec, NamespaceDecl, NodeKind,
    ParameterDecl, Specifiers, TypeRef, TypedefDecl, UsingDirective, VariableDecl,
};
use crate::lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SpecMode {
    /// Start of a declaration: class and enum bodies are allowed.
    Declaration,
    Parameter,
    /// A type-id, as in `using X = type` or a trailing return type.
    TypeId,
}

/// An elaborated type specifier with no declarator, e.g. `struct Node;`.
#[derive(Debug, Clone)]
pub(super) struct ForwardTag<'ast> {
    path: NamePath<'ast>,
    kind: SymbolKind,
}

#[derive(Debug, Clone, Default)]
pub(super) struct DeclSpecs<'ast> {
    /// Buffer positions of the tokens spelling the type.
    pub positions: Vec<usize>,
    pub specifiers: Specifiers,
    pub typedef: bool,
    pub has_type: bool,
    pub type_symbol: Option<SymbolId>,
    forward: Option<ForwardTag<'ast>>,
}

/// A possibly qualified name such as `::std::vector<int>`.
#[derive(Debug, Clone)]
pub(super) struct NamePath<'ast> {
    pub global: bool,
    pub segments: Vec<&'ast str>,
    /// Template arguments follow the last segment.
    pub has_template_args: bool,
    /// Buffer range covered by the path.
    pub start: usize,
    pub end: usize,
    /// Span of the last segment.
    pub span: Span,
}

impl<'ast> NamePath<'ast> {
    pub fn name(&self) -> &'ast str {
        self.segments.last().copied().unwrap_or("")
    }

    fn qualifier(&self) -> &[&'ast str] {
        &self.segments[..self.segments.len().saturating_sub(1)]
    }
}

/// The `A::B::` part of a qualified declarator id.
#[derive(Debug, Clone)]
pub(super) struct Qualifier<'ast> {
    global: bool,
    segments: Vec<&'ast str>,
    text: &'ast str,
}

#[derive(Debug, Clone)]
pub(super) struct DeclaratorId<'ast> {
    qualifier: Option<Qualifier<'ast>>,
    pub name: &'ast str,
    pub span: Span,
    has_template_args: bool,
}

#[derive(Debug, Clone)]
pub(super) struct ParsedParam<'ast> {
    name: Option<&'ast str>,
    ty: TypeRef<'ast>,
    has_default: bool,
    variadic: bool,
    start: Span,
    end: Span,
}

#[derive(Debug, Clone)]
pub(super) struct Declarator<'ast> {
    pub id: Option<DeclaratorId<'ast>>,
    /// Buffer positions of pointer operators, array bounds and other type
    /// parts contributed by the declarator.
    pub positions: Vec<usize>,
    parameters: Option<Vec<ParsedParam<'ast>>>,
    pub pack: bool,
    direct_init: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeclaratorMode {
    /// A declarator id is required.
    Named,
    /// A declarator id is optional.
    Parameter,
    /// No declarator id.
    Abstract,
}

/// Result of one init-declarator.
struct InitDeclarator {
    /// Node still waiting for the end of the declaration.
    node: Option<NodeId>,
    /// A function body was consumed, which ends the declaration.
    body: bool,
}

impl<'ast, 'sym> Parser<'ast, 'sym> {
    /// Parse one declaration at the cursor.
    pub(super) fn parse_declaration(&mut self) -> Result<(), ParseError> {
        self.skip_attributes()?;
        let token = *self.peek();
        let next = self.peek_nth(1).kind;
        match token.kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::Namespace => self.parse_namespace(token.span, false),
            TokenKind::Inline if next == TokenKind::Namespace => {
                self.advance();
                self.parse_namespace(token.span, true)
            }
            TokenKind::Extern if next == TokenKind::StringLiteral => self.parse_linkage(token.span),
            TokenKind::Extern if next == TokenKind::Template => {
                self.synchronize();
                Ok(())
            }
            TokenKind::Export if next == TokenKind::Template => {
                self.advance();
                self.parse_template_declaration(token.span, true)
            }
            TokenKind::Export => {
                self.advance();
                if self.eat(TokenKind::LeftBrace).is_some() {
                    self.parse_declaration_seq(true);
                    self.expect(TokenKind::RightBrace)?;
                    return Ok(());
                }
                self.parse_declaration()
            }
            TokenKind::Template => self.parse_template_declaration(token.span, false),
            TokenKind::Using => self.parse_using(token.span),
            TokenKind::StaticAssert | TokenKind::Friend => {
                self.synchronize();
                Ok(())
            }
            TokenKind::Public | TokenKind::Protected | TokenKind::Private
                if next == TokenKind::Colon =>
            {
                self.advance();
                self.advance();
                Ok(())
            }
            TokenKind::Identifier
                if matches!(token.lexeme, "module" | "import")
                    && matches!(next, TokenKind::Identifier | TokenKind::Semicolon | TokenKind::Less) =>
            {
                self.synchronize();
                Ok(())
            }
            _ => self.parse_simple_declaration(token.span),
        }
    }

    // ========================================================================
    // Namespaces, Linkage, Using
    // ========================================================================

    /// `namespace a::inline b { ... }`, reopening namespaces that exist.
    fn parse_namespace(&mut self, start: Span, inline: bool) -> Result<(), ParseError> {
        self.expect(TokenKind::Namespace)?;
        self.skip_attributes()?;

        if self.check(TokenKind::Identifier) && self.peek_nth(1).kind == TokenKind::Equal {
            // Namespace alias.
            self.synchronize();
            return Ok(());
        }

        let mut segments = Vec::new();
        if self.check(TokenKind::Identifier) {
            segments.push((self.advance().lexeme, inline));
            while self.eat(TokenKind::ColonColon).is_some() {
                let inline = self.eat(TokenKind::Inline).is_some();
                segments.push((self.expect_identifier()?.lexeme, inline));
            }
        } else {
            segments.push(("", inline));
        }
        self.skip_attributes()?;
        if !self.check(TokenKind::LeftBrace) {
            self.expect(TokenKind::LeftBrace)?;
        }

        let mut nodes = Vec::with_capacity(segments.len());
        for (name, inline) in segments {
            let opened = self.open_namespace(start, name, inline);
            match opened {
                Ok(node) => nodes.push(node),
                Err(error) => {
                    for node in nodes.into_iter().rev() {
                        self.pop_scope();
                        self.finish_node(node);
                    }
                    return Err(error);
                }
            }
        }

        self.expect(TokenKind::LeftBrace)?;
        self.parse_declaration_seq(true);
        self.eat(TokenKind::RightBrace);
        for node in nodes.into_iter().rev() {
            self.pop_scope();
            self.finish_node(node);
        }
        Ok(())
    }

    fn open_namespace(&mut self, start: Span, name: &'ast str, inline: bool) -> Result<NodeId, ParseError> {
        self.check_nesting(start)?;
        let parent = self.lookup_scope();
        let namespace = self
            .symbols
            .find_or_declare_namespace(parent, name, Some(self.unit))
            .map_err(|error| ParseError::from_symbol_error(start, &error))?;
        if inline {
            self.symbols.add_using_directive(parent, namespace);
        }

        let node = self.add_node(
            NodeKind::Namespace(NamespaceDecl {
                name,
                inline,
                symbol: namespace,
            }),
            start,
        );
        self.push_scope(ScopeFrame {
            node,
            symbol: namespace,
            target: DeclareTarget::Container,
            kind: FrameKind::Namespace,
        });
        Ok(node)
    }

    /// `extern "C" { ... }` or `extern "C" declaration`.
    fn parse_linkage(&mut self, start: Span) -> Result<(), ParseError> {
        self.expect(TokenKind::Extern)?;
        let literal = self.expect(TokenKind::StringLiteral)?;
        self.check_nesting(start)?;
        let language = literal.lexeme.trim_matches('"');

        let symbol = self.lookup_scope();
        let node = self.add_node(NodeKind::Linkage(LinkageSpec { language }), start);
        self.push_scope(ScopeFrame {
            node,
            symbol,
            target: DeclareTarget::Container,
            kind: FrameKind::Linkage,
        });

        let result = if self.eat(TokenKind::LeftBrace).is_some() {
            self.parse_declaration_seq(true);
            self.eat(TokenKind::RightBrace);
            Ok(())
        } else {
            self.parse_declaration()
        };
        self.pop_scope();
        self.finish_node(node);
        result
    }

    /// `using namespace n;` and `using X = type;`. Using-declarations are
    /// skipped.
    fn parse_using(&mut self, start: Span) -> Result<(), ParseError> {
        self.expect(TokenKind::Using)?;

        if self.eat(TokenKind::Namespace).is_some() {
            let path = self.parse_name_path()?;
            let terminated = self.expect(TokenKind::Semicolon);
            let scope = self.lookup_scope();
            let target = self
                .resolve(&path)
                .filter(|&target| *self.symbols[target].kind() == SymbolKind::Namespace);
            if let Some(target) = target {
                self.symbols.add_using_directive(scope, target);
            }
            let node = self.add_node(
                NodeKind::UsingDirective(UsingDirective {
                    path: self.render_range(path.start, path.end),
                    target,
                }),
                start,
            );
            self.finish_node(node);
            return terminated.map(|_| ());
        }

        if self.check(TokenKind::Identifier)
            && matches!(self.peek_nth(1).kind, TokenKind::Equal | TokenKind::LeftBracket)
        {
            return self.parse_alias_declaration(start);
        }

        self.synchronize();
        Ok(())
    }

    fn parse_alias_declaration(&mut self, start: Span) -> Result<(), ParseError> {
        let name = self.expect_identifier()?;
        self.skip_attributes()?;
        self.expect(TokenKind::Equal)?;
        let specs = self.parse_decl_specifiers(SpecMode::TypeId)?;
        if !specs.has_type {
            let found = *self.peek();
            return Err(ParseError::new(
                ParseErrorKind::ExpectedType,
                found.span,
                format!("expected type after '=', found {}", found.kind),
            ));
        }
        let declarator = self.parse_declarator(DeclaratorMode::Abstract)?;
        let ty = self.type_ref(&specs, &declarator);

        let symbol = self.declare(NewSymbol::new(name.lexeme, SymbolKind::Typedef), None, name.span)?;
        let node = self.add_node(
            NodeKind::Typedef(TypedefDecl {
                name: name.lexeme,
                ty,
                symbol,
            }),
            start,
        );
        let terminated = self.expect(TokenKind::Semicolon);
        self.finish_node(node);
        terminated.map(|_| ())
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Parse `::`? identifier (`<...>`)? (`::` identifier (`<...>`)?)*.
    pub(super) fn parse_name_path(&mut self) -> Result<NamePath<'ast>, ParseError> {
        let start = self.position;
        let global = self.eat(TokenKind::ColonColon).is_some();
        let mut segments = Vec::new();
        let mut has_template_args;
        let mut span;
        loop {
            self.eat(TokenKind::Template);
            let name = self.expect_identifier()?;
            segments.push(name.lexeme);
            span = name.span;
            has_template_args = false;
            if self.check(TokenKind::Less) && self.angle_close(self.position).is_some() {
                self.skip_template_args()?;
                has_template_args = true;
            }
            let continues = self.check(TokenKind::ColonColon)
                && matches!(
                    self.peek_nth(1).kind,
                    TokenKind::Identifier | TokenKind::Template
                );
            if !continues {
                break;
            }
            self.advance();
        }
        Ok(NamePath {
            global,
            segments,
            has_template_args,
            start,
            end: self.position,
            span,
        })
    }

    /// Look a name path up from the current scope.
    pub(super) fn resolve(&self, path: &NamePath<'ast>) -> Option<SymbolId> {
        self.symbols
            .lookup_qualified(&path.segments, self.lookup_scope(), path.global)
            .ok()
    }

    /// The scope an entity named by `path` is declared in, when qualified.
    fn path_qualifier(&self, path: &NamePath<'ast>) -> Result<Option<SymbolId>, ParseError> {
        if path.segments.len() > 1 {
            self.resolve_scope(path.qualifier(), path.global, path.span)
                .map(Some)
        } else if path.global {
            Ok(Some(self.symbols.root()))
        } else {
            Ok(None)
        }
    }

    fn qualifier_scope(&self, id: &DeclaratorId<'ast>) -> Result<Option<SymbolId>, ParseError> {
        match &id.qualifier {
            None => Ok(None),
            Some(qualifier) if qualifier.segments.is_empty() => Ok(Some(self.symbols.root())),
            Some(qualifier) => self
                .resolve_scope(&qualifier.segments, qualifier.global, id.span)
                .map(Some),
        }
    }

    fn in_class_body(&self) -> bool {
        self.current_class_name().is_some()
    }

    /// Whether the name at the cursor declares a constructor or destructor
    /// rather than naming a type: `Point(` inside class `Point`, or
    /// `Point::Point(` and `Point::~Point` anywhere.
    fn constructor_ahead(&self) -> bool {
        let mut index = self.position;
        if self.token_at(index).kind == TokenKind::ColonColon {
            index += 1;
        }
        let mut segments: Vec<&str> = Vec::new();
        loop {
            let token = self.token_at(index);
            if token.kind != TokenKind::Identifier {
                return false;
            }
            segments.push(token.lexeme);
            index += 1;
            if self.token_at(index).kind == TokenKind::Less {
                match self.angle_close(index) {
                    Some(end) => index = end,
                    None => return false,
                }
            }
            match self.token_at(index).kind {
                TokenKind::ColonColon => {
                    index += 1;
                    if self.token_at(index).kind == TokenKind::Tilde {
                        return true;
                    }
                }
                TokenKind::LeftParen => break,
                _ => return false,
            }
        }
        match segments.as_slice() {
            [single] => self.current_class_name() == Some(*single),
            [.., outer, inner] => outer == inner,
            [] => false,
        }
    }

    // ========================================================================
    // Declaration Specifiers
    // ========================================================================

    pub(super) fn parse_decl_specifiers(&mut self, mode: SpecMode) -> Result<DeclSpecs<'ast>, ParseError> {
        let mut specs = DeclSpecs::default();
        loop {
            let token = *self.peek();
            let flag = match token.kind {
                TokenKind::Static => Some(Specifiers::STATIC),
                TokenKind::Extern => Some(Specifiers::EXTERN),
                TokenKind::Inline => Some(Specifiers::INLINE),
                TokenKind::Virtual => Some(Specifiers::VIRTUAL),
                TokenKind::Explicit => Some(Specifiers::EXPLICIT),
                TokenKind::Constexpr | TokenKind::Consteval | TokenKind::Constinit => {
                    Some(Specifiers::CONSTEXPR)
                }
                TokenKind::Mutable => Some(Specifiers::MUTABLE),
                TokenKind::ThreadLocal => Some(Specifiers::THREAD_LOCAL),
                TokenKind::Register => Some(Specifiers::REGISTER),
                TokenKind::Friend => Some(Specifiers::FRIEND),
                _ => None,
            };
            if let Some(flag) = flag {
                specs.specifiers |= flag;
                self.advance();
                if token.kind == TokenKind::Explicit && self.check(TokenKind::LeftParen) {
                    self.skip_balanced()?;
                }
                if token.kind == TokenKind::Extern {
                    self.eat(TokenKind::StringLiteral);
                }
                continue;
            }

            match token.kind {
                TokenKind::Typedef => {
                    specs.typedef = true;
                    self.advance();
                }
                kind if kind.is_cv_qualifier() => {
                    specs.positions.push(self.position);
                    self.advance();
                }
                kind if kind.is_builtin_type() => {
                    specs.positions.push(self.position);
                    specs.has_type = true;
                    self.advance();
                }
                TokenKind::Typename => {
                    self.advance();
                    let path = self.parse_name_path()?;
                    specs.positions.extend(path.start..path.end);
                    specs.type_symbol = self.resolve(&path);
                    specs.has_type = true;
                }
                TokenKind::Decltype => {
                    let begin = self.position;
                    self.advance();
                    if self.check(TokenKind::LeftParen) {
                        self.skip_balanced()?;
                    }
                    specs.positions.extend(begin..self.position);
                    specs.has_type = true;
                }
                TokenKind::Class | TokenKind::Struct | TokenKind::Union if !specs.has_type => {
                    self.parse_class_specifier(&mut specs, mode == SpecMode::Declaration)?;
                }
                TokenKind::Enum if !specs.has_type => {
                    self.parse_enum_specifier(&mut specs, mode == SpecMode::Declaration)?;
                }
                TokenKind::Alignas => self.skip_attributes()?,
                TokenKind::LeftBracket if self.peek_nth(1).kind == TokenKind::LeftBracket => {
                    self.skip_attributes()?;
                }
                TokenKind::Identifier if super::is_vendor_attribute(token.lexeme) => {
                    self.skip_attributes()?;
                }
                TokenKind::Identifier | TokenKind::ColonColon if !specs.has_type => {
                    if mode == SpecMode::Declaration && self.constructor_ahead() {
                        break;
                    }
                    let path = self.parse_name_path()?;
                    specs.positions.extend(path.start..path.end);
                    specs.type_symbol = self.resolve(&path);
                    specs.has_type = true;
                }
                _ => break,
            }
        }
        Ok(specs)
    }

    fn class_key(kind: TokenKind) -> ClassKey {
        match kind {
            TokenKind::Struct => ClassKey::Struct,
            TokenKind::Union => ClassKey::Union,
            _ => ClassKey::Class,
        }
    }

    /// A class specifier with a body, or an elaborated `class Name`.
    fn parse_class_specifier(&mut self, specs: &mut DeclSpecs<'ast>, allow_body: bool) -> Result<(), ParseError> {
        let key_position = self.position;
        let key_token = self.advance();
        let key = Self::class_key(key_token.kind);
        self.skip_attributes()?;

        let path = if self.check(TokenKind::Identifier) || self.check(TokenKind::ColonColon) {
            Some(self.parse_name_path()?)
        } else {
            None
        };
        let is_final = self.check_contextual("final");
        if is_final {
            self.advance();
        }

        specs.has_type = true;
        specs.positions.push(key_position);
        if let Some(path) = &path {
            specs.positions.extend(path.start..path.end);
        }

        let has_body = allow_body && (self.check(TokenKind::LeftBrace) || self.check(TokenKind::Colon));
        if !has_body {
            let Some(path) = path else {
                let found = *self.peek();
                return Err(ParseError::expected_identifier(found.span, &found.kind.to_string()));
            };
            specs.type_symbol = self.resolve(&path);
            specs.forward = Some(ForwardTag {
                path,
                kind: SymbolKind::Class(key),
            });
            return Ok(());
        }

        let bases = self.parse_base_clause()?;
        self.check_nesting(key_token.span)?;

        let (name, qualifier, specialization, span) = match &path {
            Some(path) => (
                path.name(),
                self.path_qualifier(path)?,
                path.has_template_args,
                path.span,
            ),
            None => ("", None, false, key_token.span),
        };
        let request = NewSymbol::new(name, SymbolKind::Class(key)).specialization(specialization);
        let symbol = self.declare(request, qualifier, span)?;
        specs.type_symbol = Some(symbol);

        let node = self.add_node(
            NodeKind::Class(ClassDecl {
                name,
                key,
                bases,
                symbol,
                specialization,
                is_final,
            }),
            key_token.span,
        );

        if let Err(error) = self.expect(TokenKind::LeftBrace) {
            self.finish_node(node);
            return Err(error);
        }
        self.push_scope(ScopeFrame {
            node,
            symbol,
            target: DeclareTarget::Container,
            kind: FrameKind::Class(name),
        });
        self.parse_declaration_seq(true);
        self.pop_scope();
        self.eat(TokenKind::RightBrace);
        self.finish_node(node);
        Ok(())
    }

    fn parse_base_clause(&mut self) -> Result<Vec<TypeRef<'ast>>, ParseError> {
        let mut bases = Vec::new();
        if self.eat(TokenKind::Colon).is_none() {
            return Ok(bases);
        }
        loop {
            self.skip_attributes()?;
            while matches!(
                self.peek().kind,
                TokenKind::Virtual | TokenKind::Public | TokenKind::Protected | TokenKind::Private
            ) {
                self.advance();
            }
            let path = self.parse_name_path()?;
            let mut base = TypeRef::new(self.render_range(path.start, path.end));
            base.symbol = self.resolve(&path);
            self.eat(TokenKind::Ellipsis);
            bases.push(base);
            if self.eat(TokenKind::Comma).is_none() {
                return Ok(bases);
            }
        }
    }

    fn parse_enum_specifier(&mut self, specs: &mut DeclSpecs<'ast>, allow_body: bool) -> Result<(), ParseError> {
        let key_position = self.position;
        let key_token = self.advance();
        specs.positions.push(key_position);
        let scoped = matches!(self.peek().kind, TokenKind::Class | TokenKind::Struct);
        if scoped {
            specs.positions.push(self.position);
            self.advance();
        }
        self.skip_attributes()?;

        let path = if self.check(TokenKind::Identifier) || self.check(TokenKind::ColonColon) {
            Some(self.parse_name_path()?)
        } else {
            None
        };
        if let Some(path) = &path {
            specs.positions.extend(path.start..path.end);
        }
        specs.has_type = true;

        let underlying = if allow_body && self.eat(TokenKind::Colon).is_some() {
            let base = self.parse_decl_specifiers(SpecMode::TypeId)?;
            let mut ty = TypeRef::new(self.render(&base.positions));
            ty.symbol = base.type_symbol;
            Some(ty)
        } else {
            None
        };

        if !(allow_body && self.check(TokenKind::LeftBrace)) {
            let Some(path) = path else {
                let found = *self.peek();
                return Err(ParseError::expected_identifier(found.span, &found.kind.to_string()));
            };
            specs.type_symbol = self.resolve(&path);
            specs.forward = Some(ForwardTag {
                path,
                kind: SymbolKind::Enum { scoped },
            });
            return Ok(());
        }

        self.check_nesting(key_token.span)?;
        let (name, qualifier, span) = match &path {
            Some(path) => (path.name(), self.path_qualifier(path)?, path.span),
            None => ("", None, key_token.span),
        };
        let symbol = self.declare(NewSymbol::new(name, SymbolKind::Enum { scoped }), qualifier, span)?;
        specs.type_symbol = Some(symbol);

        let node = self.add_node(
            NodeKind::Enum(EnumDecl {
                name,
                scoped,
                underlying,
                symbol,
            }),
            key_token.span,
        );
        if let Err(error) = self.expect(TokenKind::LeftBrace) {
            self.finish_node(node);
            return Err(error);
        }
        let closed = self.parse_enumerators(node, symbol);
        self.finish_node(node);
        closed
    }

    /// Enumerators up to and including the closing `}`.
    fn parse_enumerators(&mut self, parent: NodeId, scope: SymbolId) -> Result<(), ParseError> {
        while !matches!(self.peek().kind, TokenKind::RightBrace | TokenKind::Eof) {
            if let Err(error) = self.parse_enumerator(parent, scope) {
                self.errors.push(error);
                while !matches!(
                    self.peek().kind,
                    TokenKind::Comma | TokenKind::RightBrace | TokenKind::Semicolon | TokenKind::Eof
                ) {
                    if matches!(
                        self.peek().kind,
                        TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace
                    ) {
                        self.skip_balanced()?;
                    } else {
                        self.advance();
                    }
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightBrace).map(|_| ())
    }

    fn parse_enumerator(&mut self, parent: NodeId, scope: SymbolId) -> Result<(), ParseError> {
        let name = self.expect_identifier()?;
        self.skip_attributes()?;
        let has_value = self.eat(TokenKind::Equal).is_some();
        if has_value {
            self.skip_expression(&[TokenKind::Comma])?;
        }

        let request = NewSymbol::new(name.lexeme, SymbolKind::Enumerator).in_unit(self.unit);
        let symbol = self
            .symbols
            .declare_with(scope, request)
            .map_err(|error| ParseError::from_symbol_error(name.span, &error))?;
        let node = self.add_node_under(
            parent,
            NodeKind::Enumerator(EnumeratorDecl {
                name: name.lexeme,
                symbol,
                has_value,
            }),
            name.span,
        );
        self.finish_node(node);
        Ok(())
    }

    // ========================================================================
    // Simple Declarations
    // ========================================================================

    fn parse_simple_declaration(&mut self, start: Span) -> Result<(), ParseError> {
        let specs = self.parse_decl_specifiers(SpecMode::Declaration)?;
        if specs.specifiers.contains(Specifiers::FRIEND) {
            self.synchronize();
            return Ok(());
        }

        if self.check(TokenKind::Semicolon) {
            self.advance();
            if let Some(forward) = specs.forward {
                self.declare_forward(forward)?;
            }
            return Ok(());
        }

        let mut start = start;
        loop {
            let declared = self.parse_init_declarator(&specs, start)?;
            if declared.body {
                return Ok(());
            }
            if self.check(TokenKind::Comma) {
                if let Some(node) = declared.node {
                    self.finish_node(node);
                }
                self.advance();
                start = self.peek().span;
                continue;
            }
            let terminated = self.expect(TokenKind::Semicolon);
            if let Some(node) = declared.node {
                self.finish_node(node);
            }
            return terminated.map(|_| ());
        }
    }

    /// `struct Node;`, `enum class Color : int;` and the like. Produces a
    /// symbol but no node.
    fn declare_forward(&mut self, forward: ForwardTag<'ast>) -> Result<(), ParseError> {
        let ForwardTag { path, kind } = forward;
        let qualifier = self.path_qualifier(&path)?;
        let request = NewSymbol::declaration(path.name(), kind).specialization(path.has_template_args);
        self.declare(request, qualifier, path.span)?;
        Ok(())
    }

    fn parse_init_declarator(&mut self, specs: &DeclSpecs<'ast>, start: Span) -> Result<InitDeclarator, ParseError> {
        let mut declarator = self.parse_declarator(DeclaratorMode::Named)?;
        let Some(id) = declarator.id.clone() else {
            let found = *self.peek();
            return Err(ParseError::expected_identifier(found.span, &found.kind.to_string()));
        };

        if !specs.typedef {
            if let Some(parameters) = declarator.parameters.take() {
                return self.parse_function_rest(specs, &declarator, id, parameters, start);
            }
        }

        if !specs.has_type {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedType,
                id.span,
                format!("'{}' is declared without a type", id.name),
            ));
        }
        let ty = self.type_ref(specs, &declarator);

        if specs.typedef {
            let symbol = self.declare(NewSymbol::new(id.name, SymbolKind::Typedef), None, id.span)?;
            let node = self.add_node(
                NodeKind::Typedef(TypedefDecl {
                    name: id.name,
                    ty,
                    symbol,
                }),
                start,
            );
            return Ok(InitDeclarator {
                node: Some(node),
                body: false,
            });
        }

        if self.eat(TokenKind::Colon).is_some() {
            // Bit-field width.
            self.skip_expression(&[TokenKind::Comma, TokenKind::Equal, TokenKind::LeftBrace])?;
        }
        let has_initializer = if declarator.direct_init {
            true
        } else if self.eat(TokenKind::Equal).is_some() {
            self.skip_expression(&[TokenKind::Comma])?;
            true
        } else if self.check(TokenKind::LeftBrace) {
            self.skip_balanced()?;
            true
        } else {
            false
        };

        let qualifier = self.qualifier_scope(&id)?;
        let declaration_only = !has_initializer
            && (specs.specifiers.contains(Specifiers::EXTERN)
                || (self.in_class_body()
                    && specs.specifiers.contains(Specifiers::STATIC)
                    && id.qualifier.is_none()));
        let request = if declaration_only {
            NewSymbol::declaration(id.name, SymbolKind::Variable)
        } else {
            NewSymbol::new(id.name, SymbolKind::Variable)
        };
        let symbol = self.declare(request.specialization(id.has_template_args), qualifier, id.span)?;

        let node = self.add_node(
            NodeKind::Variable(VariableDecl {
                name: id.name,
                qualifier: id.qualifier.as_ref().map(|qualifier| qualifier.text),
                ty,
                specifiers: specs.specifiers,
                symbol,
                has_initializer,
            }),
            start,
        );
        Ok(InitDeclarator {
            node: Some(node),
            body: false,
        })
    }

    pub(super) fn type_ref(&self, specs: &DeclSpecs<'ast>, declarator: &Declarator<'ast>) -> TypeRef<'ast> {
        let mut positions = specs.positions.clone();
        positions.extend_from_slice(&declarator.positions);
        TypeRef {
            text: self.render(&positions),
            symbol: specs.type_symbol,
        }
    }

    // ========================================================================
    // Declarators
    // ========================================================================

    pub(super) fn parse_declarator(&mut self, mode: DeclaratorMode) -> Result<Declarator<'ast>, ParseError> {
        let mut declarator = Declarator {
            id: None,
            positions: Vec::new(),
            parameters: None,
            pack: false,
            direct_init: false,
        };
        self.parse_ptr_operators(&mut declarator.positions)?;
        if self.eat(TokenKind::Ellipsis).is_some() {
            declarator.pack = true;
        }

        let nested = self.check(TokenKind::LeftParen)
            && matches!(
                self.peek_nth(1).kind,
                TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp | TokenKind::Caret
            );
        if nested {
            // `(*name)(params)`: the outer suffixes belong to the type.
            declarator.positions.push(self.position);
            self.advance();
            let inner = self.parse_declarator(mode)?;
            declarator.positions.extend(inner.positions);
            declarator.id = inner.id;
            declarator.pack |= inner.pack;
            declarator.parameters = inner.parameters;
            declarator.positions.push(self.position);
            self.expect(TokenKind::RightParen)?;
            self.parse_type_suffixes(&mut declarator.positions)?;
            return Ok(declarator);
        }

        match mode {
            DeclaratorMode::Named => declarator.id = Some(self.parse_declarator_id()?),
            DeclaratorMode::Parameter
                if matches!(
                    self.peek().kind,
                    TokenKind::Identifier | TokenKind::Operator | TokenKind::ColonColon
                ) =>
            {
                declarator.id = Some(self.parse_declarator_id()?);
            }
            DeclaratorMode::Parameter | DeclaratorMode::Abstract => {}
        }
        self.skip_attributes()?;

        loop {
            match self.peek().kind {
                TokenKind::LeftParen
                    if mode == DeclaratorMode::Named && declarator.parameters.is_none() =>
                {
                    if self.looks_like_parameters() {
                        declarator.parameters = Some(self.parse_parameter_list()?);
                    } else {
                        self.skip_balanced()?;
                        declarator.direct_init = true;
                        break;
                    }
                }
                TokenKind::LeftBracket if self.peek_nth(1).kind == TokenKind::LeftBracket => {
                    self.skip_attributes()?;
                }
                TokenKind::LeftBracket | TokenKind::LeftParen if declarator.parameters.is_none() => {
                    let begin = self.position;
                    self.skip_balanced()?;
                    declarator.positions.extend(begin..self.position);
                }
                _ => break,
            }
        }
        Ok(declarator)
    }

    /// `*`, `&`, `&&`, cv-qualifiers and member pointers `C::*`.
    fn parse_ptr_operators(&mut self, positions: &mut Vec<usize>) -> Result<(), ParseError> {
        loop {
            let token = *self.peek();
            match token.kind {
                TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp | TokenKind::Caret => {
                    positions.push(self.position);
                    self.advance();
                }
                kind if kind.is_cv_qualifier() => {
                    positions.push(self.position);
                    self.advance();
                }
                TokenKind::Identifier if matches!(token.lexeme, "__restrict" | "__restrict__") => {
                    self.advance();
                }
                TokenKind::LeftBracket if self.peek_nth(1).kind == TokenKind::LeftBracket => {
                    self.skip_attributes()?;
                }
                TokenKind::Identifier | TokenKind::ColonColon => match self.member_pointer_end() {
                    Some(end) => {
                        positions.extend(self.position..end);
                        self.position = end;
                    }
                    None => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    /// End of a `C::*` member pointer operator at the cursor.
    fn member_pointer_end(&self) -> Option<usize> {
        let mut index = self.position;
        if self.token_at(index).kind == TokenKind::ColonColon {
            index += 1;
        }
        loop {
            if self.token_at(index).kind != TokenKind::Identifier {
                return None;
            }
            index += 1;
            if self.token_at(index).kind == TokenKind::Less {
                index = self.angle_close(index)?;
            }
            if self.token_at(index).kind != TokenKind::ColonColon {
                return None;
            }
            index += 1;
            if self.token_at(index).kind == TokenKind::Star {
                return Some(index + 1);
            }
        }
    }

    fn parse_type_suffixes(&mut self, positions: &mut Vec<usize>) -> Result<(), ParseError> {
        while matches!(self.peek().kind, TokenKind::LeftParen | TokenKind::LeftBracket) {
            let begin = self.position;
            self.skip_balanced()?;
            positions.extend(begin..self.position);
        }
        Ok(())
    }

    fn parse_declarator_id(&mut self) -> Result<DeclaratorId<'ast>, ParseError> {
        let begin = self.position;
        let global = self.eat(TokenKind::ColonColon).is_some();
        let mut segments = Vec::new();
        let mut qualifier_end = self.position;

        loop {
            let token = *self.peek();
            let (name, span, has_template_args) = match token.kind {
                TokenKind::Tilde => {
                    self.advance();
                    let class = self.expect_identifier()?;
                    if self.check(TokenKind::Less) {
                        self.skip_template_args()?;
                    }
                    let name: &'ast str = self.arena.alloc_str(&format!("~{}", class.lexeme));
                    (name, token.span.merge(class.span), false)
                }
                TokenKind::Operator => (self.parse_operator_name()?, token.span, false),
                TokenKind::Identifier => {
                    self.advance();
                    let has_args = self.check(TokenKind::Less)
                        && self.angle_close(self.position).is_some();
                    if has_args {
                        self.skip_template_args()?;
                    }
                    let qualifies = self.check(TokenKind::ColonColon)
                        && matches!(
                            self.peek_nth(1).kind,
                            TokenKind::Identifier
                                | TokenKind::Tilde
                                | TokenKind::Operator
                                | TokenKind::Template
                        );
                    if qualifies {
                        segments.push(token.lexeme);
                        qualifier_end = self.position;
                        self.advance();
                        self.eat(TokenKind::Template);
                        continue;
                    }
                    (token.lexeme, token.span, has_args)
                }
                _ => {
                    return Err(ParseError::expected_identifier(
                        token.span,
                        &token.kind.to_string(),
                    ));
                }
            };

            let qualifier = (global || !segments.is_empty()).then(|| Qualifier {
                global,
                text: self.render_range(begin, qualifier_end),
                segments,
            });
            return Ok(DeclaratorId {
                qualifier,
                name,
                span,
                has_template_args,
            });
        }
    }

    /// `operator+`, `operator()`, `operator new[]`, `operator""_km` or a
    /// conversion function `operator const char*`.
    fn parse_operator_name(&mut self) -> Result<&'ast str, ParseError> {
        let begin = self.position;
        let keyword = self.expect(TokenKind::Operator)?;
        let token = *self.peek();
        match token.kind {
            TokenKind::LeftParen => {
                self.advance();
                self.expect(TokenKind::RightParen)?;
            }
            TokenKind::LeftBracket => {
                self.advance();
                self.expect(TokenKind::RightBracket)?;
            }
            TokenKind::New | TokenKind::Delete => {
                self.advance();
                if self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
                    self.advance();
                    self.advance();
                }
            }
            TokenKind::StringLiteral => {
                self.advance();
                self.eat(TokenKind::Identifier);
            }
            kind if is_operator_punctuator(kind) => {
                self.advance();
            }
            TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::Eof => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    keyword.span,
                    "expected an operator after 'operator'",
                ));
            }
            _ => {
                while !matches!(
                    self.peek().kind,
                    TokenKind::LeftParen | TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::Eof
                ) {
                    self.advance();
                }
            }
        }
        Ok(self.render_range(begin, self.position))
    }

    /// Whether the `(` at the cursor opens a parameter list rather than a
    /// direct initializer such as `Point p(1, 2)`.
    fn looks_like_parameters(&self) -> bool {
        let token = self.peek_nth(1);
        match token.kind {
            TokenKind::RightParen | TokenKind::Ellipsis => true,
            kind if kind.is_builtin_type() || kind.is_cv_qualifier() => true,
            TokenKind::Class
            | TokenKind::Struct
            | TokenKind::Union
            | TokenKind::Enum
            | TokenKind::Typename
            | TokenKind::Decltype
            | TokenKind::Register
            | TokenKind::ColonColon => true,
            TokenKind::LeftBracket => self.peek_nth(2).kind == TokenKind::LeftBracket,
            TokenKind::Identifier => match self.symbols.lookup(token.lexeme, self.lookup_scope()) {
                Ok(symbol) => !matches!(
                    self.symbols[symbol].kind(),
                    SymbolKind::Variable
                        | SymbolKind::Function
                        | SymbolKind::Enumerator
                        | SymbolKind::Parameter
                        | SymbolKind::TemplateParameter(TemplateParamKind::NonType)
                ),
                Err(_) => true,
            },
            _ => false,
        }
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<ParsedParam<'ast>>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut parameters = Vec::new();
        if self.check(TokenKind::Void) && self.peek_nth(1).kind == TokenKind::RightParen {
            self.advance();
        }
        if self.eat(TokenKind::RightParen).is_some() {
            return Ok(parameters);
        }

        loop {
            let start = self.peek().span;
            if self.eat(TokenKind::Ellipsis).is_some() {
                parameters.push(ParsedParam {
                    name: None,
                    ty: TypeRef::new("..."),
                    has_default: false,
                    variadic: true,
                    start,
                    end: start,
                });
                break;
            }

            self.skip_attributes()?;
            let specs = self.parse_decl_specifiers(SpecMode::Parameter)?;
            if !specs.has_type {
                let found = *self.peek();
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedType,
                    found.span,
                    format!("expected parameter type, found {}", found.kind),
                ));
            }
            let declarator = self.parse_declarator(DeclaratorMode::Parameter)?;
            let ty = self.type_ref(&specs, &declarator);
            let has_default = self.eat(TokenKind::Equal).is_some();
            if has_default {
                self.skip_expression(&[TokenKind::Comma, TokenKind::RightParen])?;
            }
            parameters.push(ParsedParam {
                name: declarator.id.map(|id| id.name),
                ty,
                has_default,
                variadic: declarator.pack,
                start,
                end: self.previous_span(),
            });

            if self.check(TokenKind::Ellipsis) {
                // `int...` without a comma.
                let span = self.advance().span;
                parameters.push(ParsedParam {
                    name: None,
                    ty: TypeRef::new("..."),
                    has_default: false,
                    variadic: true,
                    start: span,
                    end: span,
                });
                break;
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(parameters)
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn parse_function_rest(
        &mut self,
        specs: &DeclSpecs<'ast>,
        declarator: &Declarator<'ast>,
        id: DeclaratorId<'ast>,
        parameters: Vec<ParsedParam<'ast>>,
        start: Span,
    ) -> Result<InitDeclarator, ParseError> {
        let mut specifiers = specs.specifiers;
        let mut trailing = None;
        loop {
            let token = *self.peek();
            match token.kind {
                kind if kind.is_cv_qualifier() => {
                    self.advance();
                }
                TokenKind::Amp | TokenKind::AmpAmp => {
                    self.advance();
                }
                TokenKind::Noexcept | TokenKind::Throw => {
                    self.advance();
                    if self.check(TokenKind::LeftParen) {
                        self.skip_balanced()?;
                    }
                }
                TokenKind::Identifier if token.lexeme == "override" => {
                    specifiers |= Specifiers::OVERRIDE;
                    self.advance();
                }
                TokenKind::Identifier if token.lexeme == "final" => {
                    specifiers |= Specifiers::FINAL;
                    self.advance();
                }
                TokenKind::Identifier if token.lexeme == "requires" => {
                    self.advance();
                    self.skip_expression(&[TokenKind::LeftBrace, TokenKind::Equal, TokenKind::Comma])?;
                }
                TokenKind::Arrow => {
                    self.advance();
                    let return_specs = self.parse_decl_specifiers(SpecMode::TypeId)?;
                    let return_declarator = self.parse_declarator(DeclaratorMode::Abstract)?;
                    trailing = Some(self.type_ref(&return_specs, &return_declarator));
                }
                TokenKind::LeftBracket if self.peek_nth(1).kind == TokenKind::LeftBracket => {
                    self.skip_attributes()?;
                }
                TokenKind::Identifier if super::is_vendor_attribute(token.lexeme) => {
                    self.skip_attributes()?;
                }
                _ => break,
            }
        }

        let mut is_definition = false;
        if self.check(TokenKind::Equal) {
            let value = *self.peek_nth(1);
            match value.kind {
                TokenKind::IntLiteral if value.lexeme == "0" => specifiers |= Specifiers::PURE,
                TokenKind::Default => {
                    specifiers |= Specifiers::DEFAULTED;
                    is_definition = true;
                }
                TokenKind::Delete => {
                    specifiers |= Specifiers::DELETED;
                    is_definition = true;
                }
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        value.span,
                        format!("expected '0', 'default' or 'delete', found {}", value.kind),
                    ));
                }
            }
            self.advance();
            self.advance();
        }
        let body = matches!(
            self.peek().kind,
            TokenKind::LeftBrace | TokenKind::Colon | TokenKind::Try
        );
        is_definition |= body;

        let return_type = trailing.or_else(|| specs.has_type.then(|| self.type_ref(specs, declarator)));
        let qualifier = self.qualifier_scope(&id)?;
        let request = if is_definition {
            NewSymbol::new(id.name, SymbolKind::Function)
        } else {
            NewSymbol::declaration(id.name, SymbolKind::Function)
        };
        let symbol = self.declare(request.specialization(id.has_template_args), qualifier, id.span)?;

        let node = self.add_node(
            NodeKind::Function(FunctionDecl {
                name: id.name,
                qualifier: id.qualifier.as_ref().map(|qualifier| qualifier.text),
                return_type,
                specifiers,
                symbol,
                is_definition,
            }),
            start,
        );
        for parameter in parameters {
            self.add_parameter(node, symbol, parameter);
        }

        if !body {
            return Ok(InitDeclarator {
                node: Some(node),
                body: false,
            });
        }
        let skipped = self.skip_function_body();
        self.finish_node(node);
        skipped.map(|()| InitDeclarator {
            node: None,
            body: true,
        })
    }

    fn add_parameter(&mut self, function_node: NodeId, function: SymbolId, parameter: ParsedParam<'ast>) {
        let symbol = parameter.name.and_then(|name| {
            let request = NewSymbol::new(name, SymbolKind::Parameter).in_unit(self.unit);
            match self.symbols.declare_with(function, request) {
                Ok(symbol) => Some(symbol),
                Err(error) => {
                    self.errors
                        .push(ParseError::from_symbol_error(parameter.start, &error));
                    None
                }
            }
        });
        let node = self.add_node_under(
            function_node,
            NodeKind::Parameter(ParameterDecl {
                name: parameter.name,
                ty: parameter.ty,
                symbol,
                has_default: parameter.has_default,
                variadic: parameter.variadic,
            }),
            parameter.start,
        );
        self.ast.finish_node(node, parameter.end);
    }

    /// Skip constructor initializers, the body and any function-try-block
    /// handlers.
    fn skip_function_body(&mut self) -> Result<(), ParseError> {
        let is_try = self.eat(TokenKind::Try).is_some();
        if self.eat(TokenKind::Colon).is_some() {
            loop {
                self.eat(TokenKind::ColonColon);
                loop {
                    self.expect_identifier()?;
                    if let Some(end) = self.angle_close(self.position) {
                        self.position = end;
                    }
                    if self.eat(TokenKind::ColonColon).is_none() {
                        break;
                    }
                }
                if !matches!(self.peek().kind, TokenKind::LeftParen | TokenKind::LeftBrace) {
                    self.expect(TokenKind::LeftParen)?;
                }
                self.skip_balanced()?;
                self.eat(TokenKind::Ellipsis);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        if !self.check(TokenKind::LeftBrace) {
            self.expect(TokenKind::LeftBrace)?;
        }
        self.skip_balanced()?;

        if is_try {
            while self.eat(TokenKind::Catch).is_some() {
                if self.check(TokenKind::LeftParen) {
                    self.skip_balanced()?;
                }
                if !self.check(TokenKind::LeftBrace) {
                    self.expect(TokenKind::LeftBrace)?;
                }
                self.skip_balanced()?;
            }
        }
        Ok(())
    }
}

fn is_operator_punctuator(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Plus | PlusPlus
            | PlusEqual
            | Minus
            | MinusMinus
            | MinusEqual
            | Star
            | StarEqual
            | Slash
            | SlashEqual
            | Percent
            | PercentEqual
            | Caret
            | CaretEqual
            | Amp
            | AmpAmp
            | AmpEqual
            | Pipe
            | PipePipe
            | PipeEqual
            | Tilde
            | Bang
            | Equal
            | EqualEqual
            | BangEqual
            | Less
            | LessEqual
            | LessLess
            | LessLessEqual
            | Greater
            | GreaterEqual
            | GreaterGreater
            | GreaterGreaterEqual
            | Spaceship
            | Comma
            | Arrow
            | ArrowStar
    )
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use cxxfront_core::{ParseErrorKind, UnitId};
    use cxxfront_symbols::SymbolTable;

    use crate::ast::{Ast, NodeKind, Specifiers};
    use crate::options::ParseOptions;
    use crate::parser::Parser;

    fn parse<'a>(source: &str, arena: &'a Bump, symbols: &mut SymbolTable) -> Ast<'a> {
        match Parser::parse(source, arena, symbols, UnitId::new(0), ParseOptions::default()) {
            Ok(ast) => ast,
            Err(errors) => panic!("parse failed: {:?}", errors.into_vec()),
        }
    }

    fn find<'a, 'ast>(ast: &'a Ast<'ast>, name: &str) -> &'a NodeKind<'ast> {
        ast.iter()
            .map(|node| node.kind())
            .find(|kind| kind.name() == Some(name))
            .unwrap_or_else(|| panic!("no node named {name}"))
    }

    #[test]
    fn nested_namespaces_share_closing_brace() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse("namespace a::inline b { int x; }", &arena, &mut symbols);

        let a = ast.children(ast.root())[0];
        let b = ast.children(a)[0];
        assert!(matches!(ast[b].kind(), NodeKind::Namespace(decl) if decl.inline));
        assert_eq!(ast[a].ending_offset(), ast[b].ending_offset());

        let root = symbols.root();
        let a_symbol = symbols.lookup("a", root).unwrap();
        let b_symbol = symbols.find_local(a_symbol, "b").unwrap();
        assert_eq!(symbols.using_directives(a_symbol), vec![b_symbol]);
    }

    #[test]
    fn reopened_namespace_keeps_one_symbol() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse("namespace n { int a; } namespace n { int b; }", &arena, &mut symbols);

        let namespaces: Vec<_> = ast.children(ast.root()).iter().map(|&id| ast[id].symbol()).collect();
        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[0], namespaces[1]);
    }

    #[test]
    fn class_members_and_bases() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let source = "struct Base {};\nclass Derived final : public virtual Base {\npublic:\n  Derived();\n  ~Derived();\n  virtual int area() const override;\n  static const int count;\n};";
        let ast = parse(source, &arena, &mut symbols);

        let NodeKind::Class(derived) = find(&ast, "Derived") else {
            panic!("expected class");
        };
        assert!(derived.is_final);
        assert_eq!(derived.bases.len(), 1);
        assert_eq!(derived.bases[0].text, "Base");
        assert!(derived.bases[0].symbol.is_some());

        let NodeKind::Function(area) = find(&ast, "area") else {
            panic!("expected function");
        };
        assert!(area.specifiers.contains(Specifiers::VIRTUAL | Specifiers::OVERRIDE));
        assert_eq!(area.return_type.map(|ty| ty.text), Some("int"));
        assert!(!area.is_definition);

        assert!(matches!(find(&ast, "~Derived"), NodeKind::Function(f) if f.return_type.is_none()));
        let count = symbols.lookup_qualified(&["Derived", "count"], symbols.root(), false).unwrap();
        assert!(!symbols[count].is_defined());
    }

    #[test]
    fn constructor_inside_class_is_not_a_type() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "struct P { P(int x) : x_(x) {} explicit P(); int x_; };",
            &arena,
            &mut symbols,
        );

        let constructors = ast
            .iter()
            .filter(|node| matches!(node.kind(), NodeKind::Function(f) if f.name == "P"))
            .count();
        assert_eq!(constructors, 2);
    }

    #[test]
    fn out_of_line_definition_binds_into_class() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "struct Counter { void bump(); };\nvoid Counter::bump() { ++value; }",
            &arena,
            &mut symbols,
        );

        let definition = ast
            .iter()
            .find_map(|node| match node.kind() {
                NodeKind::Function(f) if f.is_definition => Some(*f),
                _ => None,
            })
            .unwrap();
        assert_eq!(definition.qualifier, Some("Counter"));
        let class = symbols.lookup("Counter", symbols.root()).unwrap();
        assert_eq!(symbols.owner(definition.symbol), Some(class));
    }

    #[test]
    fn unresolved_qualifier() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let errors = Parser::parse(
            "void Missing::f() {}",
            &arena,
            &mut symbols,
            UnitId::new(0),
            ParseOptions::default(),
        )
        .unwrap_err();
        assert!(errors.contains_kind(ParseErrorKind::UnresolvedName));
    }

    #[test]
    fn function_parameters() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "int printf(const char* format, ...);\nvoid sort(int* first, int* last, bool (*less)(int, int) = nullptr);",
            &arena,
            &mut symbols,
        );

        let printf = ast.iter().find(|node| node.kind().name() == Some("printf")).unwrap();
        let params: Vec<_> = printf
            .children()
            .iter()
            .map(|&id| match ast[id].kind() {
                NodeKind::Parameter(p) => (p.name, p.ty.text, p.variadic),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            params,
            vec![(Some("format"), "const char*", false), (None, "...", true)]
        );

        let sort = ast.iter().find(|node| node.kind().name() == Some("sort")).unwrap();
        let NodeKind::Parameter(less) = ast[sort.children()[2]].kind() else {
            panic!("expected parameter");
        };
        assert_eq!(less.name, Some("less"));
        assert_eq!(less.ty.text, "bool(*)(int, int)");
        assert!(less.has_default);
    }

    #[test]
    fn direct_initializer_is_not_a_function() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "struct Point { Point(int, int); };\nint x = 1;\nPoint origin(0, x);\nPoint make(Point);",
            &arena,
            &mut symbols,
        );

        assert!(matches!(find(&ast, "origin"), NodeKind::Variable(v) if v.has_initializer));
        assert!(matches!(find(&ast, "make"), NodeKind::Function(_)));
    }

    #[test]
    fn enums() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "enum class Color : unsigned char { Red, Green = 2, Blue, };\nenum Flags { A = 1 << 0, B = 1 << 1 };\nenum class Opaque : int;",
            &arena,
            &mut symbols,
        );

        let NodeKind::Enum(color) = find(&ast, "Color") else {
            panic!("expected enum");
        };
        assert!(color.scoped);
        assert_eq!(color.underlying.map(|ty| ty.text), Some("unsigned char"));

        let root = symbols.root();
        assert!(symbols.lookup("Red", root).is_err());
        assert!(symbols.lookup_qualified(&["Color", "Green"], root, false).is_ok());
        assert!(symbols.lookup("B", root).is_ok());
        assert!(ast.iter().all(|node| node.kind().name() != Some("Opaque")));
        assert!(symbols.lookup("Opaque", root).is_ok());
    }

    #[test]
    fn typedefs_and_aliases() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "typedef unsigned long size_type, *size_ptr;\nusing callback = void (*)(int);",
            &arena,
            &mut symbols,
        );

        assert!(matches!(find(&ast, "size_type"), NodeKind::Typedef(t) if t.ty.text == "unsigned long"));
        assert!(matches!(find(&ast, "size_ptr"), NodeKind::Typedef(t) if t.ty.text == "unsigned long*"));
        assert!(matches!(find(&ast, "callback"), NodeKind::Typedef(t) if t.ty.text == "void(*)(int)"));
    }

    #[test]
    fn using_directive_resolves_target() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "namespace lib { int value; }\nusing namespace lib;\nusing namespace unknown;\nint copy = value;",
            &arena,
            &mut symbols,
        );

        let directives: Vec<_> = ast
            .iter()
            .filter_map(|node| match node.kind() {
                NodeKind::UsingDirective(using) => Some((using.path, using.target.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(directives, vec![("lib", true), ("unknown", false)]);
        assert!(symbols.lookup("value", symbols.root()).is_ok());
    }

    #[test]
    fn linkage_block() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "extern \"C\" {\n  int puts(const char*);\n}\nextern \"C\" void exit(int);",
            &arena,
            &mut symbols,
        );

        let blocks: Vec<_> = ast
            .children(ast.root())
            .iter()
            .map(|&id| match ast[id].kind() {
                NodeKind::Linkage(linkage) => (linkage.language, ast.children(id).len()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(blocks, vec![("C", 1), ("C", 1)]);
        assert!(symbols.lookup("puts", symbols.root()).is_ok());
    }

    #[test]
    fn duplicate_variable() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let (ast, errors) = Parser::parse_lenient(
            "int x;\nint x;\nextern int y;\nint y = 1;",
            &arena,
            &mut symbols,
            UnitId::new(0),
            ParseOptions::default(),
        );

        assert_eq!(errors.len(), 1);
        assert!(errors.contains_kind(ParseErrorKind::DuplicateDeclaration));
        assert_eq!(errors.iter().next().map(|error| error.span.line), Some(2));
        assert_eq!(ast.children(ast.root()).len(), 3);
    }

    #[test]
    fn operators_and_conversions() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = parse(
            "struct V {\n  V& operator+=(const V& other);\n  bool operator==(const V&) const = default;\n  operator bool() const;\n  int operator()(int) const;\n};",
            &arena,
            &mut symbols,
        );

        let names: Vec<_> = ast
            .iter()
            .filter_map(|node| match node.kind() {
                NodeKind::Function(f) => Some(f.name),
                _ => None,
            })
            .collect();
        assert_eq!(
            names,
            vec!["operator+=", "operator==", "operator bool", "operator()"]
        );
    }

    #[test]
    fn variable_offsets_cover_declaration() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let source = "static int counter = 0;";
        let ast = parse(source, &arena, &mut symbols);

        let node = &ast[ast.children(ast.root())[0]];
        assert_eq!(node.starting_offset(), 0);
        assert_eq!(node.ending_offset() as usize, source.len());
    }

    #[test]
    fn class_without_body_is_still_sealed() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let source = "struct A : B int x; };\nint after;";
        let (ast, errors) =
            Parser::parse_lenient(source, &arena, &mut symbols, UnitId::new(0), ParseOptions::default());

        assert!(!errors.is_empty());
        let class = ast
            .iter()
            .find(|node| matches!(node.kind(), NodeKind::Class(_)))
            .unwrap();
        assert!(class.offsets().is_sealed());
        assert_eq!(class.starting_offset(), 0);
        assert!(class.ending_offset() > class.starting_offset());
        assert!(ast.iter().all(|node| node.offsets().is_sealed()));
    }

    #[test]
    fn c_dialect_struct_tags() {
        let arena = Bump::new();
        let mut symbols = SymbolTable::new();
        let ast = Parser::parse(
            "typedef struct node { struct node* next; int class; } node_t;\nint main(void) { return 0; }",
            &arena,
            &mut symbols,
            UnitId::new(0),
            ParseOptions::c(),
        )
        .unwrap();

        assert!(matches!(find(&ast, "class"), NodeKind::Variable(_)));
        assert!(matches!(find(&ast, "next"), NodeKind::Variable(v) if v.ty.text == "struct node*"));
        assert!(matches!(find(&ast, "main"), NodeKind::Function(f) if f.is_definition));
    }
}
