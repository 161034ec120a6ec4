//! `template<...>` prefixes and their parameters.
//!
//! Every prefix opens a frame on the template factory of the enclosing
//! container and a [`ScopeFrame`] routing the next declaration through that
//! factory. Nested prefixes (`template<class T> template<class U>`) share
//! one factory; the single declaration that follows closes all of them.

use cxxfront_core::{NodeId, ParseError, ParseErrorKind, Span};
use cxxfront_symbols::{FactoryId, NewSymbol, SymbolId, SymbolKind, TemplateParamKind};
use tracing::trace;

use super::decl_parser::{DeclaratorMode, SpecMode};
use super::{DeclareTarget, FrameKind, Parser, ScopeFrame};
use crate::ast::{NodeKind, TemplateDeclaration, TemplateParameterDecl};
use crate::lexer::TokenKind;

impl<'ast, 'sym> Parser<'ast, 'sym> {
    /// Parse `template<params> declaration` starting at the `template`
    /// keyword. An explicit instantiation (`template class Box<int>;`) is
    /// skipped.
    pub(super) fn parse_template_declaration(&mut self, start: Span, exported: bool) -> Result<(), ParseError> {
        self.expect(TokenKind::Template)?;
        if !self.check(TokenKind::Less) {
            self.synchronize();
            return Ok(());
        }
        self.check_nesting(start)?;

        let (factory, container) = self.template_factory(start)?;
        let template = self
            .symbols
            .begin_template(factory, Some(self.unit))
            .map_err(|error| ParseError::from_symbol_error(start, &error))?;
        trace!(template = %template, factory = %factory, "opened template");

        let scope_node = self.top().node;
        let declaration = TemplateDeclaration::new(template, scope_node, factory).exported(exported);
        let node = self.add_node(NodeKind::TemplateDeclaration(declaration), start);
        self.push_scope(ScopeFrame {
            node,
            symbol: template,
            target: DeclareTarget::Template { factory, container },
            kind: FrameKind::Template,
        });

        let parsed = self
            .parse_template_parameter_list(node, template)
            .and_then(|()| self.parse_templated_declaration());
        self.pop_scope();

        let pending = self
            .symbols
            .factory(factory)
            .is_some_and(|factory| factory.is_pending(template));
        if pending {
            if let Some(factory) = self.symbols.factory_mut(factory) {
                factory.discard(template);
            }
            trace!(template = %template, "discarded template without a declaration");
            if matches!(parsed, Ok(true)) {
                self.errors.push(ParseError::new(
                    ParseErrorKind::IncompleteTemplate,
                    start,
                    "template declaration does not declare anything",
                ));
            }
        }

        self.bind_owned_declaration(node);
        self.finish_node(node);
        parsed.map(|_| ())
    }

    /// The factory to open a template frame on, and the container the
    /// templated declaration lands in.
    ///
    /// A nested prefix reuses the factory of the prefix around it.
    fn template_factory(&mut self, span: Span) -> Result<(FactoryId, SymbolId), ParseError> {
        let frame = *self.top();
        if let DeclareTarget::Template { factory, container } = frame.target {
            return Ok((factory, container));
        }
        let factory = self
            .symbols
            .template_factory_for(frame.symbol)
            .map_err(|error| ParseError::from_symbol_error(span, &error))?;
        Ok((factory, frame.symbol))
    }

    /// Parse what follows the parameter list.
    ///
    /// Returns whether a declaration that should have closed the template
    /// was attempted. Nested templates, friends and concepts report `false`.
    fn parse_templated_declaration(&mut self) -> Result<bool, ParseError> {
        if self.check_contextual("requires") {
            self.advance();
            self.skip_requires_clause()?;
        }

        let token = *self.peek();
        match token.kind {
            TokenKind::Template => {
                self.parse_template_declaration(token.span, false)?;
                Ok(false)
            }
            TokenKind::Friend => {
                self.synchronize();
                Ok(false)
            }
            TokenKind::Identifier if token.lexeme == "concept" => {
                self.synchronize();
                Ok(false)
            }
            _ => {
                self.parse_declaration()?;
                Ok(true)
            }
        }
    }

    /// `requires C<T> && (sizeof(T) > 1)`.
    fn skip_requires_clause(&mut self) -> Result<(), ParseError> {
        loop {
            let token = *self.peek();
            if token.kind == TokenKind::LeftParen {
                self.skip_balanced()?;
            } else if token.kind.is_literal() {
                self.advance();
            } else {
                self.parse_name_path()?;
            }
            if self.eat(TokenKind::AmpAmp).is_none() && self.eat(TokenKind::PipePipe).is_none() {
                return Ok(());
            }
        }
    }

    /// Attach the template's last non-parameter child as its owned
    /// declaration.
    fn bind_owned_declaration(&mut self, node: NodeId) {
        let owned = self
            .ast
            .children(node)
            .iter()
            .rev()
            .map(|&child| self.ast[child].kind())
            .find(|kind| !matches!(kind, NodeKind::TemplateParameter(_)))
            .and_then(NodeKind::symbol);
        let Some(owned) = owned else {
            return;
        };

        let span = self.previous_span();
        if let Ok(declaration) = self.ast.template_declaration_mut(node) {
            if let Err(error) = declaration.set_owned_declaration(owned) {
                self.errors.push(ParseError::new(
                    ParseErrorKind::InternalError,
                    span,
                    error.to_string(),
                ));
            }
        }
    }

    // ========================================================================
    // Template Parameters
    // ========================================================================

    fn parse_template_parameter_list(&mut self, node: NodeId, template: SymbolId) -> Result<(), ParseError> {
        self.expect(TokenKind::Less)?;
        if self.check(TokenKind::Greater) || self.check(TokenKind::GreaterGreater) {
            // `template<>`
            self.expect_closing_angle()?;
            return Ok(());
        }
        loop {
            self.parse_template_parameter(node, template)?;
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect_closing_angle()?;
        Ok(())
    }

    fn parse_template_parameter(&mut self, node: NodeId, template: SymbolId) -> Result<(), ParseError> {
        let token = *self.peek();
        let start = token.span;
        let dependent_type = self.peek_nth(1).kind == TokenKind::Identifier
            && self.peek_nth(2).kind == TokenKind::ColonColon;

        let (kind, name, ty, variadic) = match token.kind {
            TokenKind::Typename | TokenKind::Class if !dependent_type => {
                self.advance();
                let (name, variadic) = self.parse_parameter_name();
                (TemplateParamKind::Type, name, None, variadic)
            }
            TokenKind::Template => {
                self.advance();
                self.skip_template_args()?;
                if !matches!(self.peek().kind, TokenKind::Class | TokenKind::Typename) {
                    let found = *self.peek();
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedTemplateParameter,
                        found.span,
                        format!("expected 'class' or 'typename', found {}", found.kind),
                    ));
                }
                self.advance();
                let (name, variadic) = self.parse_parameter_name();
                (TemplateParamKind::Template, name, None, variadic)
            }
            _ => {
                let specs = self.parse_decl_specifiers(SpecMode::Parameter)?;
                if !specs.has_type {
                    return Err(ParseError::new(
                        ParseErrorKind::ExpectedTemplateParameter,
                        start,
                        format!("expected template parameter, found {}", token.kind),
                    ));
                }
                let declarator = self.parse_declarator(DeclaratorMode::Parameter)?;
                let ty = self.type_ref(&specs, &declarator);
                let name = declarator.id.as_ref().map(|id| id.name);
                (TemplateParamKind::NonType, name, Some(ty), declarator.pack)
            }
        };

        let has_default = self.eat(TokenKind::Equal).is_some();
        if has_default {
            self.skip_template_default()?;
        }

        let request = NewSymbol::new(name.unwrap_or(""), SymbolKind::TemplateParameter(kind)).in_unit(self.unit);
        let symbol = self
            .symbols
            .add_template_parameter(template, request)
            .map_err(|error| ParseError::from_symbol_error(start, &error))?;
        let parameter = self.add_node_under(
            node,
            NodeKind::TemplateParameter(TemplateParameterDecl {
                name,
                kind,
                ty,
                symbol: Some(symbol),
                has_default,
                variadic,
            }),
            start,
        );
        self.finish_node(parameter);
        if let Ok(declaration) = self.ast.template_declaration_mut(node) {
            declaration.push_parameter(parameter);
        }
        Ok(())
    }

    fn parse_parameter_name(&mut self) -> (Option<&'ast str>, bool) {
        let variadic = self.eat(TokenKind::Ellipsis).is_some();
        let name = self.eat(TokenKind::Identifier).map(|token| token.lexeme);
        (name, variadic)
    }

    /// Skip a default template argument, stopping before the `,` or `>`
    /// that ends it.
    fn skip_template_default(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            let token = *self.peek();
            match token.kind {
                TokenKind::Comma if depth == 0 => return Ok(()),
                TokenKind::Greater | TokenKind::GreaterGreater if depth == 0 => return Ok(()),
                TokenKind::Less => depth += 1,
                TokenKind::Greater => depth -= 1,
                TokenKind::GreaterGreater if depth == 1 => {
                    self.split_shift();
                    depth = 0;
                }
                TokenKind::GreaterGreater => depth -= 2,
                TokenKind::LeftParen | TokenKind::LeftBracket => {
                    self.skip_balanced()?;
                    continue;
                }
                TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace | TokenKind::Eof => {
                    return Err(ParseError::new(
                        ParseErrorKind::MismatchedDelimiter,
                        token.span,
                        "unterminated template parameter list",
                    ));
                }
                _ => {}
            }
            self.advance();
        }
    }
}
