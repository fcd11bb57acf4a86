//! Type expression parsing.
//!
//! The tricky part is `T[...]` after a simple name: it's a slice when
//! the brackets are empty, an array when the first token inside is an
//! integer literal, and a generic type-argument list otherwise. All
//! three share the same opening bracket, so the parser peeks at the
//! token just past it rather than trying to parse speculatively.

use super::Parser;
use crate::ast::*;
use crate::lexer::TokenKind;

impl<'a, 'e> Parser<'a, 'e> {
    pub(super) fn parse_type(&mut self) -> &'a Node<'a> {
        if self.check(TokenKind::Ampersand) {
            let tok = self.advance();
            let inner = self.parse_type();
            return self.node(self.span_of(&tok), NodeKind::TypeExpr(TypeExpr::Reference { inner }));
        }
        if self.check(TokenKind::Star) {
            let tok = self.advance();
            let inner = self.parse_type();
            return self.node(self.span_of(&tok), NodeKind::TypeExpr(TypeExpr::Pointer { inner }));
        }
        if self.check(TokenKind::Identifier) {
            let tok = self.advance();
            let mut type_args = Vec::new();
            let mut simple = self.node(
                self.span_of(&tok),
                NodeKind::TypeExpr(TypeExpr::Simple {
                    name: tok.text,
                    type_args: Vec::new(),
                }),
            );

            if self.check(TokenKind::LeftBracket) {
                match self.peek_at(1).map(|t| t.kind) {
                    Some(TokenKind::RightBracket) => {
                        let bracket = self.advance(); // '['
                        self.advance(); // ']'
                        return self.node(
                            self.span_of(&bracket),
                            NodeKind::TypeExpr(TypeExpr::Slice { inner: simple }),
                        );
                    }
                    Some(TokenKind::IntegerLiteral) => {
                        let bracket = self.advance(); // '['
                        let size_expr = self.parse_expression();
                        self.expect(TokenKind::RightBracket, "expected ']' after array size");
                        return self.node(
                            self.span_of(&bracket),
                            NodeKind::TypeExpr(TypeExpr::Array { inner: simple, size_expr }),
                        );
                    }
                    _ => {
                        type_args = self.parse_type_args();
                        simple = self.node(
                            self.span_of(&tok),
                            NodeKind::TypeExpr(TypeExpr::Simple { name: tok.text, type_args }),
                        );
                    }
                }
            }
            return simple;
        }

        let tok = *self.peek();
        self.errors.error(tok.span, "expected type");
        self.panic_mode = true;
        self.node(tok.span, NodeKind::TypeExpr(TypeExpr::Simple { name: "?", type_args: Vec::new() }))
    }

    /// `[int, float]` at a usage site — concrete type arguments.
    pub(super) fn parse_type_args(&mut self) -> Vec<&'a Node<'a>> {
        let mut args = Vec::new();
        self.advance(); // '['
        args.push(self.parse_type());
        while self.matches(TokenKind::Comma) {
            args.push(self.parse_type());
        }
        self.expect(TokenKind::RightBracket, "expected ']' after type arguments");
        args
    }
}
