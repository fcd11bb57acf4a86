//! Statement and block parsing.
//!
//! A block runs until the parser sees one of `end`, `else`, `elseif`,
//! `case`, or `EOF` — the same four tokens close every kind of body
//! (function, struct method, if/elseif/else arm, for, while, match arm),
//! so `parse_body` is shared by all of them.

use super::Parser;
use crate::ast::*;
use crate::lexer::TokenKind;

impl<'a, 'e> Parser<'a, 'e> {
    pub(super) fn parse_body(&mut self) -> Vec<&'a Node<'a>> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.at_block_end() {
            if self.panic_mode {
                self.synchronize();
                self.skip_newlines();
                // `synchronize` also stops on tokens that only ever
                // open a *top-level* declaration (`func`, `struct`,
                // `interface`, `enum`, `export`, `extern`) — never a
                // valid continuation inside a function/if/for/while/
                // match body. Seeing one here means this block's `end`
                // was never found at all: give up on the block rather
                // than retrying the same unparseable statement forever,
                // and let the enclosing `expect(End, ...)` report the
                // missing terminator.
                if self.at_block_end() || self.at_unclosed_block_leak() {
                    break;
                }
            }
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
            self.skip_newlines();
        }
        stmts
    }

    fn at_block_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::End | TokenKind::Else | TokenKind::Elseif | TokenKind::Case | TokenKind::Eof
        )
    }

    fn at_unclosed_block_leak(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Func | TokenKind::Struct | TokenKind::Interface | TokenKind::Enum
                | TokenKind::Export | TokenKind::Extern
        )
    }

    fn parse_statement(&mut self) -> Option<&'a Node<'a>> {
        match self.peek().kind {
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Break => {
                let tok = self.advance();
                self.expect_newline();
                Some(self.node(self.span_of(&tok), NodeKind::Stmt(Stmt::Break)))
            }
            TokenKind::Continue => {
                let tok = self.advance();
                self.expect_newline();
                Some(self.node(self.span_of(&tok), NodeKind::Stmt(Stmt::Continue)))
            }
            TokenKind::Match => self.parse_match_stmt(),
            TokenKind::Const => self.parse_const_decl(false),
            TokenKind::Var => self.parse_var_decl(false),
            _ => self.parse_assign_or_expr_stmt(),
        }
    }

    fn parse_return_stmt(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'return'
        let value = if self.check(TokenKind::Newline) || self.check(TokenKind::Eof) || self.at_block_end() {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect_newline();
        Some(self.node(self.span_of(&tok), NodeKind::Stmt(Stmt::Return { value })))
    }

    fn parse_if_stmt(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'if'
        let condition = self.parse_expression();
        self.expect_newline();
        let then_body = self.parse_body();

        let mut elseifs = Vec::new();
        while self.check(TokenKind::Elseif) {
            self.advance();
            let elseif_cond = self.parse_expression();
            self.expect_newline();
            let body = self.parse_body();
            elseifs.push(ElseIfBranch { condition: elseif_cond, body });
        }

        let else_body = if self.matches(TokenKind::Else) {
            self.expect_newline();
            self.parse_body()
        } else {
            Vec::new()
        };

        self.expect(TokenKind::End, "expected 'end' to close 'if'");
        Some(self.node(
            self.span_of(&tok),
            NodeKind::Stmt(Stmt::If { condition, then_body, elseifs, else_body }),
        ))
    }

    fn parse_for_stmt(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'for'
        let var_tok = self.expect(TokenKind::Identifier, "expected loop variable name after 'for'")?;
        self.expect(TokenKind::In, "expected 'in' after loop variable");
        let start = self.parse_expression();
        self.expect(TokenKind::Until, "expected 'until' in for-range");
        let end = self.parse_expression();
        let step = if self.matches(TokenKind::Step) {
            Some(self.parse_expression())
        } else {
            None
        };
        self.expect_newline();
        let body = self.parse_body();
        self.expect(TokenKind::End, "expected 'end' to close 'for'");
        Some(self.node(
            self.span_of(&tok),
            NodeKind::Stmt(Stmt::For { var_name: var_tok.text, start, end, step, body }),
        ))
    }

    fn parse_while_stmt(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'while'
        let condition = self.parse_expression();
        self.expect_newline();
        let body = self.parse_body();
        self.expect(TokenKind::End, "expected 'end' to close 'while'");
        Some(self.node(self.span_of(&tok), NodeKind::Stmt(Stmt::While { condition, body })))
    }

    fn parse_match_stmt(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'match'
        let subject = self.parse_expression();
        self.expect_newline();
        self.skip_newlines();

        let mut cases = Vec::new();
        let mut else_body = Vec::new();
        while self.check(TokenKind::Case) {
            self.advance();
            let mut values = vec![self.parse_expression()];
            while self.matches(TokenKind::Comma) {
                values.push(self.parse_expression());
            }
            self.expect_newline();
            let body = self.parse_body();
            cases.push(MatchCase { values, body });
        }
        if self.matches(TokenKind::Else) {
            self.expect_newline();
            else_body = self.parse_body();
        }

        self.expect(TokenKind::End, "expected 'end' to close 'match'");
        Some(self.node(self.span_of(&tok), NodeKind::Stmt(Stmt::Match { subject, cases, else_body })))
    }

    /// An expression-led statement is either a plain expression (a call
    /// for its side effects), a simple assignment `target = value`, or a
    /// compound assignment `target += value` and friends. We parse the
    /// leading expression once and branch on what follows rather than
    /// trying to predict lvalue-ness up front.
    fn parse_assign_or_expr_stmt(&mut self) -> Option<&'a Node<'a>> {
        let start_tok = *self.peek();
        let expr = self.parse_expression();

        let compound_op = match self.peek().kind {
            TokenKind::PlusAssign => Some(CompoundAssignOp::AddAssign),
            TokenKind::MinusAssign => Some(CompoundAssignOp::SubAssign),
            TokenKind::StarAssign => Some(CompoundAssignOp::MulAssign),
            TokenKind::SlashAssign => Some(CompoundAssignOp::DivAssign),
            _ => None,
        };

        if let Some(op) = compound_op {
            self.advance();
            let value = self.parse_expression();
            self.expect_newline();
            return Some(self.node(
                self.span_of(&start_tok),
                NodeKind::Stmt(Stmt::CompoundAssign { op, target: expr, value }),
            ));
        }

        if self.check(TokenKind::Assign) {
            self.advance();
            let value = self.parse_expression();
            self.expect_newline();
            return Some(self.node(
                self.span_of(&start_tok),
                NodeKind::Stmt(Stmt::Assign { target: expr, value }),
            ));
        }

        self.expect_newline();
        Some(self.node(self.span_of(&start_tok), NodeKind::Stmt(Stmt::ExprStmt { expr })))
    }
}
