//! Expression parsing: precedence-climbing from `or` down to primaries
//!.
//!
//! Lowest to highest: `or`, `and`, comparison, addition, multiplication,
//! bitwise `^`, `as` cast, unary (`-`, `&`, `*`, `not`), postfix (`.`
//! field/method, `[]` index), primary. Each level is a small function
//! that parses the next-tighter level and then loops while it sees an
//! operator at its own precedence — the usual recursive-descent
//! encoding of a precedence table.

use super::Parser;
use crate::ast::*;
use crate::lexer::TokenKind;

impl<'a, 'e> Parser<'a, 'e> {
    pub(super) fn parse_expression(&mut self) -> &'a Node<'a> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> &'a Node<'a> {
        let mut left = self.parse_and();
        while self.check(TokenKind::Or) {
            let tok = self.advance();
            let right = self.parse_and();
            left = self.node(
                self.span_of(&tok),
                NodeKind::Expr(Expr::Binary { op: BinaryOp::Or, left, right }),
            );
        }
        left
    }

    fn parse_and(&mut self) -> &'a Node<'a> {
        let mut left = self.parse_comparison();
        while self.check(TokenKind::And) {
            let tok = self.advance();
            let right = self.parse_comparison();
            left = self.node(
                self.span_of(&tok),
                NodeKind::Expr(Expr::Binary { op: BinaryOp::And, left, right }),
            );
        }
        left
    }

    fn parse_comparison(&mut self) -> &'a Node<'a> {
        let mut left = self.parse_addition();
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            let tok = self.advance();
            let right = self.parse_addition();
            left = self.node(self.span_of(&tok), NodeKind::Expr(Expr::Binary { op, left, right }));
        }
        left
    }

    fn parse_addition(&mut self) -> &'a Node<'a> {
        let mut left = self.parse_multiplication();
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let tok = self.advance();
            let right = self.parse_multiplication();
            left = self.node(self.span_of(&tok), NodeKind::Expr(Expr::Binary { op, left, right }));
        }
        left
    }

    fn parse_multiplication(&mut self) -> &'a Node<'a> {
        let mut left = self.parse_bitxor();
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let tok = self.advance();
            let right = self.parse_bitxor();
            left = self.node(self.span_of(&tok), NodeKind::Expr(Expr::Binary { op, left, right }));
        }
        left
    }

    fn parse_bitxor(&mut self) -> &'a Node<'a> {
        let mut left = self.parse_cast();
        while self.check(TokenKind::Caret) {
            let tok = self.advance();
            let right = self.parse_cast();
            left = self.node(
                self.span_of(&tok),
                NodeKind::Expr(Expr::Binary { op: BinaryOp::BitXor, left, right }),
            );
        }
        left
    }

    fn parse_cast(&mut self) -> &'a Node<'a> {
        let mut expr = self.parse_unary();
        while self.check(TokenKind::As) {
            let tok = self.advance();
            let target_type = self.parse_type();
            expr = self.node(
                self.span_of(&tok),
                NodeKind::Expr(Expr::Cast { expr, target_type }),
            );
        }
        expr
    }

    fn parse_unary(&mut self) -> &'a Node<'a> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Ampersand => Some(UnaryOp::Ref),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let tok = self.advance();
            let operand = self.parse_unary();
            return self.node(self.span_of(&tok), NodeKind::Expr(Expr::Unary { op, operand }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> &'a Node<'a> {
        let mut expr = self.parse_primary();
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    let tok = self.advance();
                    let name_tok = match self.expect(TokenKind::Identifier, "expected field or method name after '.'") {
                        Some(tok) => tok,
                        None => break,
                    };
                    if self.check(TokenKind::LeftParen) {
                        self.advance();
                        let args = self.parse_call_args();
                        self.expect(TokenKind::RightParen, "expected ')' after method arguments");
                        expr = self.node(
                            self.span_of(&tok),
                            NodeKind::Expr(Expr::MethodCall {
                                object: expr,
                                method_name: name_tok.text,
                                args,
                            }),
                        );
                    } else {
                        expr = self.node(
                            self.span_of(&tok),
                            NodeKind::Expr(Expr::FieldAccess { object: expr, field_name: name_tok.text }),
                        );
                    }
                }
                TokenKind::LeftBracket => {
                    let tok = self.advance();
                    let index = self.parse_expression();
                    self.expect(TokenKind::RightBracket, "expected ']' after index expression");
                    expr = self.node(self.span_of(&tok), NodeKind::Expr(Expr::Index { object: expr, index }));
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call_args(&mut self) -> Vec<&'a Node<'a>> {
        let mut args = Vec::new();
        if self.check(TokenKind::RightParen) {
            return args;
        }
        args.push(self.parse_expression());
        while self.matches(TokenKind::Comma) {
            args.push(self.parse_expression());
        }
        args
    }

    /// `(field = value, field2 = value2, …)` — always a struct literal,
    /// distinguished from a call by looking for `identifier =` right
    /// after the opening paren.
    fn looks_like_struct_literal(&self) -> bool {
        matches!(self.peek().kind, TokenKind::RightParen)
            || (self.check(TokenKind::Identifier)
                && self.peek_at(1).map(|t| t.kind) == Some(TokenKind::Assign))
    }

    fn parse_struct_literal_fields(&mut self) -> Vec<FieldInit<'a>> {
        let mut fields = Vec::new();
        if self.check(TokenKind::RightParen) {
            return fields;
        }
        loop {
            let name_tok = match self.expect(TokenKind::Identifier, "expected field name in struct literal") {
                Some(tok) => tok,
                None => break,
            };
            self.expect(TokenKind::Assign, "expected '=' after field name in struct literal");
            let value = self.parse_expression();
            fields.push(FieldInit { name: name_tok.text, value });
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        fields
    }

    fn parse_primary(&mut self) -> &'a Node<'a> {
        let tok = *self.peek();
        match tok.kind {
            TokenKind::IntegerLiteral => {
                self.advance();
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::IntegerLiteral { text: tok.text }))
            }
            TokenKind::FloatLiteral => {
                self.advance();
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::FloatLiteral { text: tok.text }))
            }
            TokenKind::StringLiteral => {
                self.advance();
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::StringLiteral { text: tok.text }))
            }
            TokenKind::True => {
                self.advance();
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::BoolLiteral { value: true }))
            }
            TokenKind::False => {
                self.advance();
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::BoolLiteral { value: false }))
            }
            TokenKind::Null => {
                self.advance();
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::NullLiteral))
            }
            TokenKind::SelfKw => {
                self.advance();
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::SelfExpr))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression();
                self.expect(TokenKind::RightParen, "expected ')' to close parenthesized expression");
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::Paren { inner }))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RightBracket) {
                    elements.push(self.parse_expression());
                    while self.matches(TokenKind::Comma) {
                        elements.push(self.parse_expression());
                    }
                }
                self.expect(TokenKind::RightBracket, "expected ']' to close array literal");
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::ArrayLiteral { elements }))
            }
            TokenKind::Identifier => {
                self.advance();
                self.parse_identifier_primary(tok)
            }
            _ if tok.text == "sizeof" => {
                // `sizeof` is lexed as a plain identifier; recognized here
                // by text rather than reserving a keyword the rest of the
                // language doesn't need.
                self.advance();
                self.expect(TokenKind::LeftParen, "expected '(' after 'sizeof'");
                let type_node = self.parse_type();
                self.expect(TokenKind::RightParen, "expected ')' after sizeof type");
                self.node(self.span_of(&tok), NodeKind::Expr(Expr::Sizeof { type_node }))
            }
            _ => {
                self.errors.error(tok.span, "expected expression");
                self.panic_mode = true;
                self.node(tok.span, NodeKind::Expr(Expr::NullLiteral))
            }
        }
    }

    /// An identifier at primary position is one of: a bare variable
    /// reference, a call `f(args)`, a struct literal `S(field = value)`,
    /// or any of those with an explicit generic type-argument list
    /// `f[int](args)` / `S[int](field = value)` first. The brackets are
    /// ambiguous with type-expression arrays/slices, so we only commit to
    /// the type-argument reading when a `(` follows the matching `]`.
    fn parse_identifier_primary(&mut self, tok: crate::lexer::Token<'a>) -> &'a Node<'a> {
        let mut type_args = Vec::new();
        if self.check(TokenKind::LeftBracket) && self.bracket_is_type_args() {
            type_args = self.parse_type_args();
        }

        if self.check(TokenKind::LeftParen) {
            self.advance();
            if self.looks_like_struct_literal() {
                let fields = self.parse_struct_literal_fields();
                self.expect(TokenKind::RightParen, "expected ')' to close struct literal");
                return self.node(
                    self.span_of(&tok),
                    NodeKind::Expr(Expr::StructLiteral { struct_name: tok.text, type_args, fields }),
                );
            }
            let args = self.parse_call_args();
            self.expect(TokenKind::RightParen, "expected ')' after call arguments");
            let callee = self.node(self.span_of(&tok), NodeKind::Expr(Expr::Identifier { name: tok.text }));
            return self.node(self.span_of(&tok), NodeKind::Expr(Expr::Call { callee, type_args, args }));
        }

        self.node(self.span_of(&tok), NodeKind::Expr(Expr::Identifier { name: tok.text }))
    }

    /// Scans from the current `[` to its matching `]` (tracking nesting)
    /// and reports whether `(` immediately follows — the disambiguator
    /// needed between a type-argument list and an
    /// unrelated `[` (e.g. the start of an array-typed expression never
    /// reachable here, or a stray index after an identifier that isn't
    /// actually generic).
    fn bracket_is_type_args(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        loop {
            let Some(tok) = self.tokens.get(i) else { return false };
            match tok.kind {
                TokenKind::LeftBracket => depth += 1,
                TokenKind::RightBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .map(|t| t.kind == TokenKind::LeftParen)
                            .unwrap_or(false);
                    }
                }
                TokenKind::Eof | TokenKind::Newline => return false,
                _ => {}
            }
            i += 1;
        }
    }
}
