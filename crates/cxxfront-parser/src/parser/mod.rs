//! Recursive-descent parser that binds declarations while it reads them.
//!
//! The parser keeps a stack of [`ScopeFrame`]s mirroring the lexical scopes
//! it is inside. Every declaration is entered into the [`SymbolTable`] at
//! the moment it is recognized, so later declarations in the same unit can
//! be resolved against it: qualifiers of out-of-line definitions, base
//! classes, types of members and parameters.
//!
//! Function bodies, initializers and other expressions are skipped with
//! balanced-delimiter matching; only declarations produce nodes.

mod decl_parser;
mod template_parser;

use bumpalo::Bump;
use cxxfront_core::{NodeId, ParseError, ParseErrorKind, ParseErrors, Span, SymbolError, UnitId};
use cxxfront_symbols::{AstExtension, FactoryId, NewSymbol, SymbolId, SymbolTable};
use tracing::debug;

use crate::ast::{Ast, NodeKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::options::ParseOptions;

/// Where declarations made in a frame are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclareTarget {
    /// Directly into the frame's symbol.
    Container,
    /// Through the factory's open templates, landing in `container`.
    Template {
        factory: FactoryId,
        container: SymbolId,
    },
    /// A template whose single declaration has already been made.
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind<'ast> {
    TranslationUnit,
    Namespace,
    Linkage,
    /// A class body; carries the class name for constructor detection.
    Class(&'ast str),
    Template,
}

/// One lexical scope the parser is inside.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScopeFrame<'ast> {
    /// Node that receives the scope's declarations.
    pub node: NodeId,
    /// Scope searched first by name lookup.
    pub symbol: SymbolId,
    pub target: DeclareTarget,
    pub kind: FrameKind<'ast>,
}

/// Parser for C and C++ translation units.
///
/// The `'ast` lifetime is that of the arena holding token lexemes and the
/// strings referenced by AST nodes; `'sym` is the borrow of the symbol
/// table the unit's declarations are bound into.
pub struct Parser<'ast, 'sym> {
    pub(super) buffer: Vec<Token<'ast>>,
    pub(super) position: usize,
    pub(super) errors: ParseErrors,
    pub(super) arena: &'ast Bump,
    pub(super) options: ParseOptions,
    pub(super) unit: UnitId,
    pub(super) ast: Ast<'ast>,
    pub(super) symbols: &'sym mut SymbolTable,
    pub(super) scopes: Vec<ScopeFrame<'ast>>,
}

impl<'ast, 'sym> Parser<'ast, 'sym> {
    /// Parse `source` as translation unit `unit`, failing on any error.
    ///
    /// Declarations are bound into `symbols` even when the parse fails; use
    /// [`parse_lenient`](Self::parse_lenient) to keep the partial AST too.
    pub fn parse(
        source: &str,
        arena: &'ast Bump,
        symbols: &'sym mut SymbolTable,
        unit: UnitId,
        options: ParseOptions,
    ) -> Result<Ast<'ast>, ParseErrors> {
        let (ast, errors) = Self::parse_lenient(source, arena, symbols, unit, options);
        if errors.is_empty() {
            Ok(ast)
        } else {
            Err(errors)
        }
    }

    /// Parse `source`, recovering from errors at declaration boundaries.
    ///
    /// Always returns an AST holding every declaration that parsed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_lenient(
        source: &str,
        arena: &'ast Bump,
        symbols: &'sym mut SymbolTable,
        unit: UnitId,
        options: ParseOptions,
    ) -> (Ast<'ast>, ParseErrors) {
        let mut parser = Parser::new(source, arena, symbols, unit, options);
        parser.parse_translation_unit();
        parser.finish()
    }

    fn new(
        source: &str,
        arena: &'ast Bump,
        symbols: &'sym mut SymbolTable,
        unit: UnitId,
        options: ParseOptions,
    ) -> Self {
        let mut lexer = Lexer::new(source, arena, options.dialect);
        let mut buffer = Vec::with_capacity((source.len() / 6).clamp(64, 1 << 16));
        let mut errors = ParseErrors::new();

        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Error => {
                    for error in lexer.take_errors() {
                        errors.push(ParseError::new(
                            ParseErrorKind::InvalidToken,
                            error.span(),
                            error.to_string(),
                        ));
                    }
                }
                TokenKind::Eof => {
                    buffer.push(token);
                    break;
                }
                _ => buffer.push(token),
            }
        }

        let root = symbols.root();
        let ast = Ast::new(unit, root);
        let scopes = vec![ScopeFrame {
            node: ast.root(),
            symbol: root,
            target: DeclareTarget::Container,
            kind: FrameKind::TranslationUnit,
        }];

        Self {
            buffer,
            position: 0,
            errors,
            arena,
            options,
            unit,
            ast,
            symbols,
            scopes,
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn parse_translation_unit(&mut self) {
        debug!(unit = %self.unit, tokens = self.buffer.len(), "parsing translation unit");
        self.parse_declaration_seq(false);
        let eof = self.peek().span;
        self.ast.finish_root(eof.offset, eof.line);
    }

    fn finish(self) -> (Ast<'ast>, ParseErrors) {
        debug!(
            unit = %self.unit,
            nodes = self.ast.len(),
            errors = self.errors.len(),
            "parsed translation unit"
        );
        (self.ast, self.errors)
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// The token at buffer index `index`, or the trailing EOF past the end.
    pub(super) fn token_at(&self, index: usize) -> &Token<'ast> {
        &self.buffer[index.min(self.buffer.len() - 1)]
    }

    pub(super) fn peek(&self) -> &Token<'ast> {
        self.token_at(self.position)
    }

    pub(super) fn peek_nth(&self, n: usize) -> &Token<'ast> {
        self.token_at(self.position + n)
    }

    /// Consume the current token. EOF is never consumed.
    pub(super) fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = *self.peek();
        if token.kind == TokenKind::Eof {
            Err(ParseError::unexpected_eof(token.span))
        } else {
            Err(ParseError::expected_token(
                token.span,
                &kind.to_string(),
                &token.kind.to_string(),
            ))
        }
    }

    pub(super) fn expect_identifier(&mut self) -> Result<Token<'ast>, ParseError> {
        if self.check(TokenKind::Identifier) {
            return Ok(self.advance());
        }
        let token = *self.peek();
        Err(ParseError::expected_identifier(token.span, &token.kind.to_string()))
    }

    /// Contextual keywords such as `final`, `override` or `requires`.
    pub(super) fn check_contextual(&self, name: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Identifier && token.lexeme == name
    }

    /// Span of the last consumed token.
    pub(super) fn previous_span(&self) -> Span {
        match self.position.checked_sub(1) {
            Some(index) => self.buffer[index].span,
            None => self.peek().span,
        }
    }

    /// Split a `>>` at the cursor into two `>` tokens.
    pub(super) fn split_shift(&mut self) {
        let token = self.buffer[self.position];
        let Span {
            offset, line, col, ..
        } = token.span;
        let first = Token::new(TokenKind::Greater, ">", Span::new(offset, line, col, 1));
        let second = Token::new(TokenKind::Greater, ">", Span::new(offset + 1, line, col + 1, 1));
        self.buffer[self.position] = second;
        self.buffer.insert(self.position, first);
    }

    /// Expect the `>` closing a template list, splitting `>>` if needed.
    pub(super) fn expect_closing_angle(&mut self) -> Result<Token<'ast>, ParseError> {
        if self.check(TokenKind::GreaterGreater) {
            self.split_shift();
        }
        self.expect(TokenKind::Greater)
    }

    // ========================================================================
    // Skipping
    // ========================================================================

    /// Skip the delimited group opened by the current token.
    ///
    /// Returns the span of the closing delimiter.
    pub(super) fn skip_balanced(&mut self) -> Result<Span, ParseError> {
        let open = self.advance();
        let close = match open.kind {
            TokenKind::LeftParen => TokenKind::RightParen,
            TokenKind::LeftBracket => TokenKind::RightBracket,
            TokenKind::LeftBrace => TokenKind::RightBrace,
            _ => return Ok(open.span),
        };

        let mut depth = 1usize;
        loop {
            let kind = self.peek().kind;
            if kind == TokenKind::Eof {
                return Err(ParseError::new(
                    ParseErrorKind::MismatchedDelimiter,
                    open.span,
                    format!("unclosed {}", open.kind),
                ));
            }
            if kind == open.kind {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(self.advance().span);
                }
            }
            self.advance();
        }
    }

    /// Skip a template argument list starting at `<`.
    pub(super) fn skip_template_args(&mut self) -> Result<(), ParseError> {
        let open = self.expect(TokenKind::Less)?;
        let mut depth = 1usize;
        loop {
            match self.peek().kind {
                TokenKind::Less => depth += 1,
                TokenKind::Greater => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                TokenKind::GreaterGreater if depth == 1 => {
                    self.split_shift();
                    self.advance();
                    return Ok(());
                }
                TokenKind::GreaterGreater => {
                    depth -= 2;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    self.skip_balanced()?;
                    continue;
                }
                TokenKind::Semicolon
                | TokenKind::RightParen
                | TokenKind::RightBrace
                | TokenKind::Eof => {
                    return Err(ParseError::new(
                        ParseErrorKind::MismatchedDelimiter,
                        open.span,
                        "unclosed template argument list",
                    ));
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Index just past the `>` matching the `<` at `open`, without consuming.
    pub(super) fn angle_close(&self, open: usize) -> Option<usize> {
        if self.token_at(open).kind != TokenKind::Less {
            return None;
        }
        let mut depth = 0i32;
        let mut parens = 0usize;
        let mut index = open;
        loop {
            match self.token_at(index).kind {
                TokenKind::Less if parens == 0 => depth += 1,
                TokenKind::Greater if parens == 0 => depth -= 1,
                TokenKind::GreaterGreater if parens == 0 => depth -= 2,
                TokenKind::LeftParen | TokenKind::LeftBracket => parens += 1,
                TokenKind::RightParen | TokenKind::RightBracket => {
                    parens = parens.checked_sub(1)?;
                }
                TokenKind::Semicolon
                | TokenKind::LeftBrace
                | TokenKind::RightBrace
                | TokenKind::Eof => return None,
                _ => {}
            }
            index += 1;
            if depth <= 0 {
                return Some(index);
            }
        }
    }

    /// Skip an expression up to one of `terminators` at nesting depth zero.
    pub(super) fn skip_expression(&mut self, terminators: &[TokenKind]) -> Result<(), ParseError> {
        loop {
            let token = *self.peek();
            if terminators.contains(&token.kind) {
                return Ok(());
            }
            match token.kind {
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::RightBrace => return Ok(()),
                TokenKind::RightParen | TokenKind::RightBracket => return Ok(()),
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    self.skip_balanced()?;
                }
                TokenKind::Identifier if self.peek_nth(1).kind == TokenKind::Less => {
                    self.advance();
                    if let Some(end) = self.angle_close(self.position) {
                        self.position = end;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip `[[...]]`, `alignas(...)`, `__attribute__((...))` and `__declspec(...)`.
    pub(super) fn skip_attributes(&mut self) -> Result<(), ParseError> {
        loop {
            let token = *self.peek();
            match token.kind {
                TokenKind::LeftBracket if self.peek_nth(1).kind == TokenKind::LeftBracket => {
                    self.skip_balanced()?;
                }
                TokenKind::Alignas => {
                    self.advance();
                    if self.check(TokenKind::LeftParen) {
                        self.skip_balanced()?;
                    }
                }
                TokenKind::Identifier if is_vendor_attribute(token.lexeme) => {
                    self.advance();
                    if self.check(TokenKind::LeftParen) {
                        self.skip_balanced()?;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Skip to the end of the current declaration: through the next `;`, or
    /// through a braced block and an optional `;` after it.
    ///
    /// Stops in front of a `}` so the enclosing scope can close.
    pub(super) fn synchronize(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof | TokenKind::RightBrace => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::LeftBrace => {
                    if self.skip_balanced().is_ok() {
                        self.eat(TokenKind::Semicolon);
                    }
                    return;
                }
                TokenKind::LeftParen | TokenKind::LeftBracket => {
                    if self.skip_balanced().is_err() {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse declarations until `}` (when `closing`) or end of file.
    pub(super) fn parse_declaration_seq(&mut self, closing: bool) {
        loop {
            let token = *self.peek();
            match token.kind {
                TokenKind::Eof => {
                    if closing {
                        self.errors.push(ParseError::new(
                            ParseErrorKind::MismatchedDelimiter,
                            token.span,
                            "expected '}' before end of file",
                        ));
                    }
                    return;
                }
                TokenKind::RightBrace if closing => return,
                TokenKind::RightBrace => {
                    self.advance();
                    self.errors.push(ParseError::new(
                        ParseErrorKind::MismatchedDelimiter,
                        token.span,
                        "unmatched '}'",
                    ));
                }
                _ => {
                    if let Err(error) = self.parse_declaration() {
                        debug!(error = %error, "recovering from parse error");
                        self.errors.push(error);
                        self.synchronize();
                    }
                }
            }
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Spell the tokens at `positions` as source text, in the arena.
    pub(super) fn render(&self, positions: &[usize]) -> &'ast str {
        let mut text = String::new();
        let mut previous: Option<&Token<'ast>> = None;
        for &index in positions {
            let token = self.token_at(index);
            if let Some(previous) = previous {
                if needs_space(previous, token) {
                    text.push(' ');
                }
            }
            text.push_str(token.lexeme);
            previous = Some(token);
        }
        self.arena.alloc_str(&text)
    }

    pub(super) fn render_range(&self, start: usize, end: usize) -> &'ast str {
        let positions: Vec<usize> = (start..end).collect();
        self.render(&positions)
    }

    // ========================================================================
    // Scopes and Binding
    // ========================================================================

    pub(super) fn top(&self) -> &ScopeFrame<'ast> {
        &self.scopes[self.scopes.len() - 1]
    }

    /// Scope that name lookup starts from.
    pub(super) fn lookup_scope(&self) -> SymbolId {
        self.top().symbol
    }

    /// Name of the class whose body is being parsed, looking through
    /// template frames of member templates.
    pub(super) fn current_class_name(&self) -> Option<&'ast str> {
        self.scopes
            .iter()
            .rev()
            .find(|frame| frame.kind != FrameKind::Template)
            .and_then(|frame| match frame.kind {
                FrameKind::Class(name) => Some(name),
                _ => None,
            })
    }

    pub(super) fn check_nesting(&self, span: Span) -> Result<(), ParseError> {
        if self.scopes.len() >= self.options.max_nesting_depth {
            return Err(ParseError::new(
                ParseErrorKind::NestingTooDeep,
                span,
                format!(
                    "scopes nested deeper than {} levels",
                    self.options.max_nesting_depth
                ),
            ));
        }
        Ok(())
    }

    pub(super) fn push_scope(&mut self, frame: ScopeFrame<'ast>) {
        self.scopes.push(frame);
    }

    pub(super) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Enter `request` into the scope the innermost frame declares into.
    ///
    /// `qualifier` overrides the scope for out-of-line definitions such as
    /// `void Box::get()`. Inside a template prefix the symbol is routed
    /// through the template factory, which closes every open template.
    pub(super) fn declare(
        &mut self,
        request: NewSymbol,
        qualifier: Option<SymbolId>,
        span: Span,
    ) -> Result<SymbolId, ParseError> {
        let request = request.in_unit(self.unit);
        let frame = *self.top();
        let declared = match frame.target {
            DeclareTarget::Container => self
                .symbols
                .declare_with(qualifier.unwrap_or(frame.symbol), request),
            DeclareTarget::Template { factory, container } => {
                let declared =
                    self.symbols
                        .declare_templated(factory, qualifier.unwrap_or(container), request);
                if declared.is_ok() {
                    for frame in self
                        .scopes
                        .iter_mut()
                        .rev()
                        .take_while(|frame| frame.kind == FrameKind::Template)
                    {
                        frame.target = DeclareTarget::Consumed;
                    }
                }
                declared
            }
            DeclareTarget::Consumed => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    span,
                    "a template declaration declares exactly one entity",
                ));
            }
        };
        declared.map_err(|error| ParseError::from_symbol_error(span, &error))
    }

    /// Resolve the scope named by a qualifier such as `A::B` in `A::B::f`.
    pub(super) fn resolve_scope(
        &self,
        segments: &[&str],
        global: bool,
        span: Span,
    ) -> Result<SymbolId, ParseError> {
        let named = self
            .symbols
            .lookup_qualified(segments, self.lookup_scope(), global)
            .map_err(|error| ParseError::from_symbol_error(span, &error))?;
        self.symbols.scope_of(named).ok_or_else(|| {
            let error = SymbolError::NotAContainer(self.symbols.qualified_name(named));
            ParseError::from_symbol_error(span, &error)
        })
    }

    /// Append a node under the innermost frame's node.
    pub(super) fn add_node(&mut self, kind: NodeKind<'ast>, start: Span) -> NodeId {
        let parent = self.top().node;
        self.add_node_under(parent, kind, start)
    }

    /// Append a node under `parent`, recording it as the primary declaration
    /// of its symbol unless an earlier node already is.
    pub(super) fn add_node_under(&mut self, parent: NodeId, kind: NodeKind<'ast>, start: Span) -> NodeId {
        let symbol = kind.symbol();
        let id = self.ast.push_node(kind, parent, start);
        if let Some(symbol) = symbol {
            let unbound = self
                .symbols
                .get(symbol)
                .is_some_and(|symbol| symbol.extension().is_none());
            if unbound {
                let extension = AstExtension::new(self.ast.node_ref(id));
                if let Err(error) = self.symbols.set_extension(symbol, Some(extension)) {
                    self.errors.push(ParseError::from_symbol_error(start, &error));
                }
            }
        }
        id
    }

    /// End `node` at the last consumed token.
    pub(super) fn finish_node(&mut self, node: NodeId) {
        let end = self.previous_span();
        self.ast.finish_node(node, end);
    }
}

fn is_vendor_attribute(lexeme: &str) -> bool {
    matches!(lexeme, "__attribute__" | "__declspec")
}

fn is_word(token: &Token<'_>) -> bool {
    token
        .lexeme
        .starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$')
}

fn needs_space(left: &Token<'_>, right: &Token<'_>) -> bool {
    (is_word(left) && is_word(right))
        || left.kind == TokenKind::Comma
        || (right.kind.is_cv_qualifier() && left.kind != TokenKind::LeftParen)
}
