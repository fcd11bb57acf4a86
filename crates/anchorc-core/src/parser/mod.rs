//! Recursive-descent parser.
//!
//! Every production records the source position of the token that
//! opened it. A single `panic_mode` flag is set on the first parse
//! error seen inside a declaration or statement; `synchronize` then
//! walks forward to the next token that plausibly starts a new
//! declaration or statement before parsing resumes, so one malformed
//! construct doesn't cascade into unrelated errors.

pub mod expression;
pub mod statement;
pub mod types;

use crate::arena::Arena;
use crate::ast::*;
use crate::errors::Errors;
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

pub struct Parser<'a, 'e> {
    arena: &'a Arena,
    errors: &'e mut Errors,
    src: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    panic_mode: bool,
}

impl<'a, 'e> Parser<'a, 'e> {
    pub fn new(arena: &'a Arena, errors: &'e mut Errors, src: &'a str, tokens: Vec<Token<'a>>) -> Self {
        Parser {
            arena,
            errors,
            src,
            tokens,
            pos: 0,
            panic_mode: false,
        }
    }

    pub fn parse(arena: &'a Arena, errors: &'e mut Errors, src: &'a str) -> &'a Node<'a> {
        let tokens = crate::lexer::Lexer::tokenize(src, errors);
        let mut parser = Parser::new(arena, errors, src, tokens);
        parser.parse_program()
    }

    // -- token navigation --------------------------------------------------

    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Token<'a> {
        let tok = self.tokens[self.pos];
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token<'a>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            let tok = *self.peek();
            self.errors.error(tok.span, message);
            self.panic_mode = true;
            None
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_newline(&mut self) {
        if self.check(TokenKind::Newline) || self.check(TokenKind::Eof) {
            self.skip_newlines();
        } else {
            let tok = *self.peek();
            self.errors.error(tok.span, "expected newline");
        }
    }

    /// Advances until a token that plausibly opens a new top-level
    /// declaration or statement, then clears `panic_mode`.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        while !self.check(TokenKind::Eof) {
            use TokenKind::*;
            match self.peek().kind {
                Func | Struct | Interface | Enum | Const | Var | Export | Extern | End | Return
                | If | For | While | Break | Continue | Match | Case | Else | Elseif => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // -- node allocation -----------------------------------------------

    fn node(&self, span: Span, kind: NodeKind<'a>) -> &'a Node<'a> {
        self.arena.alloc(Node::new(span, kind))
    }

    fn span_of(&self, tok: &Token<'a>) -> Span {
        tok.span
    }

    // -- top level -------------------------------------------------------

    fn parse_program(&mut self) -> &'a Node<'a> {
        let start_span = self.peek().span;
        let mut declarations = Vec::new();
        self.skip_newlines();

        while !self.check(TokenKind::Eof) {
            if self.panic_mode {
                self.synchronize();
            }

            let decl = match self.peek().kind {
                TokenKind::From => self.parse_import_decl(),
                TokenKind::Export => self.parse_export_declaration(),
                TokenKind::Const => self.parse_const_decl(false),
                TokenKind::Var => self.parse_var_decl(false),
                TokenKind::Func => self.parse_func_decl(false, false),
                TokenKind::Extern => self.parse_extern_func_decl(),
                TokenKind::Struct => self.parse_struct_decl(false),
                TokenKind::Interface => self.parse_interface_decl(),
                TokenKind::Enum => self.parse_enum_decl(false),
                _ => {
                    let tok = *self.peek();
                    self.errors.error(tok.span, "unexpected top-level token");
                    self.panic_mode = true;
                    self.synchronize();
                    self.skip_newlines();
                    continue;
                }
            };

            if let Some(decl) = decl {
                declarations.push(decl);
            }
            self.skip_newlines();
        }

        self.node(start_span, NodeKind::Program(Program { declarations }))
    }

    fn parse_export_declaration(&mut self) -> Option<&'a Node<'a>> {
        self.advance(); // consume 'export'
        match self.peek().kind {
            TokenKind::Const => self.parse_const_decl(true),
            TokenKind::Var => self.parse_var_decl(true),
            TokenKind::Func => self.parse_func_decl(true, false),
            TokenKind::Struct => self.parse_struct_decl(true),
            TokenKind::Enum => self.parse_enum_decl(true),
            _ => {
                let tok = *self.peek();
                self.errors.error(tok.span, "expected declaration after 'export'");
                self.panic_mode = true;
                None
            }
        }
    }

    fn parse_const_decl(&mut self, is_export: bool) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'const'
        let name_tok = self.expect(TokenKind::Identifier, "expected name after 'const'")?;
        let type_node = if self.matches(TokenKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };
        self.expect(TokenKind::Assign, "expected '=' in const declaration");
        let value = self.parse_expression();
        self.expect_newline();
        Some(self.node(
            self.span_of(&tok),
            NodeKind::ConstDecl(ConstDecl {
                is_export,
                name: name_tok.text,
                type_node,
                value,
            }),
        ))
    }

    fn parse_var_decl(&mut self, is_export: bool) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'var'
        let name_tok = self.expect(TokenKind::Identifier, "expected name after 'var'")?;
        let type_node = if self.matches(TokenKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };
        self.expect(TokenKind::Assign, "expected '=' in var declaration");
        let value = self.parse_expression();
        self.expect_newline();
        Some(self.node(
            self.span_of(&tok),
            NodeKind::VarDecl(VarDecl {
                is_export,
                name: name_tok.text,
                type_node,
                value: Some(value),
            }),
        ))
    }

    fn parse_type_params(&mut self) -> Vec<TypeParam<'a>> {
        let mut params = Vec::new();
        self.advance(); // '['
        if let Some(tok) = self.expect(TokenKind::Identifier, "expected type parameter name") {
            params.push(TypeParam { name: tok.text });
            while self.matches(TokenKind::Comma) {
                match self.expect(TokenKind::Identifier, "expected type parameter name") {
                    Some(tok) => params.push(TypeParam { name: tok.text }),
                    None => break,
                }
            }
        }
        self.expect(TokenKind::RightBracket, "expected ']' after type parameters");
        params
    }

    fn parse_param_list(&mut self) -> Vec<Param<'a>> {
        let mut params = Vec::new();
        if self.check(TokenKind::RightParen) {
            return params;
        }
        loop {
            let name_tok = match self.expect(TokenKind::Identifier, "expected parameter name") {
                Some(tok) => tok,
                None => break,
            };
            self.expect(TokenKind::Colon, "expected ':' after parameter name");
            let type_node = self.parse_type();
            params.push(Param {
                name: name_tok.text,
                type_node,
                span: self.span_of(&name_tok),
            });
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        params
    }

    fn parse_func_decl(&mut self, is_export: bool, is_extern: bool) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'func'
        let name_tok = self.expect(TokenKind::Identifier, "expected function name")?;

        let type_params = if self.check(TokenKind::LeftBracket) {
            self.parse_type_params()
        } else {
            Vec::new()
        };

        self.expect(TokenKind::LeftParen, "expected '(' after function name");
        let params = self.parse_param_list();
        self.expect(TokenKind::RightParen, "expected ')' after parameters");

        let return_type = if self.matches(TokenKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };

        self.expect_newline();
        let body = self.parse_body();
        self.expect(TokenKind::End, "expected 'end' to close function");

        Some(self.node(
            self.span_of(&tok),
            NodeKind::FuncDecl(FuncDecl {
                is_export,
                is_extern,
                name: name_tok.text,
                type_params,
                params,
                return_type,
                body,
            }),
        ))
    }

    /// Bodiless signature used both by interface method declarations and
    /// by `extern func` — neither has a block to parse, just the head.
    fn parse_func_signature(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'func'
        let name_tok = self.expect(TokenKind::Identifier, "expected function name")?;
        self.expect(TokenKind::LeftParen, "expected '(' after function name");
        let params = self.parse_param_list();
        self.expect(TokenKind::RightParen, "expected ')' after parameters");
        let return_type = if self.matches(TokenKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };
        Some(self.node(
            self.span_of(&tok),
            NodeKind::FuncDecl(FuncDecl {
                is_export: false,
                is_extern: false,
                name: name_tok.text,
                type_params: Vec::new(),
                params,
                return_type,
                body: Vec::new(),
            }),
        ))
    }

    fn parse_extern_func_decl(&mut self) -> Option<&'a Node<'a>> {
        self.advance(); // 'extern'
        self.expect(TokenKind::Func, "expected 'func' after 'extern'")?;
        // parse_func_signature already consumed 'func' in its own logic;
        // re-implement the head here since extern is its own keyword.
        let name_tok = self.expect(TokenKind::Identifier, "expected function name")?;
        self.expect(TokenKind::LeftParen, "expected '(' after function name");
        let params = self.parse_param_list();
        self.expect(TokenKind::RightParen, "expected ')' after parameters");
        let return_type = if self.matches(TokenKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };
        self.expect_newline();
        Some(self.node(
            name_tok.span,
            NodeKind::FuncDecl(FuncDecl {
                is_export: false,
                is_extern: true,
                name: name_tok.text,
                type_params: Vec::new(),
                params,
                return_type,
                body: Vec::new(),
            }),
        ))
    }

    fn parse_struct_decl(&mut self, is_export: bool) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'struct'
        let name_tok = self.expect(TokenKind::Identifier, "expected struct name")?;
        let type_params = if self.check(TokenKind::LeftBracket) {
            self.parse_type_params()
        } else {
            Vec::new()
        };
        self.expect_newline();
        self.skip_newlines();

        let mut fields = Vec::new();
        let mut methods = Vec::new();

        while !self.check(TokenKind::End) && !self.check(TokenKind::Eof) {
            self.skip_newlines();
            if self.check(TokenKind::End) {
                break;
            }
            if self.check(TokenKind::Func) {
                if let Some(method) = self.parse_func_decl(false, false) {
                    methods.push(method);
                }
            } else if self.check(TokenKind::Identifier) {
                let field_tok = self.advance();
                self.expect(TokenKind::Colon, "expected ':' after field name");
                let type_node = self.parse_type();
                fields.push(Field {
                    name: field_tok.text,
                    type_node,
                    span: self.span_of(&field_tok),
                });
                self.expect_newline();
            } else {
                let tok = *self.peek();
                self.errors.error(tok.span, "expected field or method in struct");
                self.synchronize();
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::End, "expected 'end' to close struct");
        Some(self.node(
            self.span_of(&tok),
            NodeKind::StructDecl(StructDecl {
                is_export,
                name: name_tok.text,
                type_params,
                fields,
                methods,
            }),
        ))
    }

    fn parse_interface_decl(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'interface'
        let name_tok = self.expect(TokenKind::Identifier, "expected interface name")?;
        self.expect_newline();
        self.skip_newlines();

        let mut method_sigs = Vec::new();
        while !self.check(TokenKind::End) && !self.check(TokenKind::Eof) {
            self.skip_newlines();
            if self.check(TokenKind::End) {
                break;
            }
            if self.check(TokenKind::Func) {
                if let Some(sig) = self.parse_func_signature() {
                    method_sigs.push(sig);
                }
                self.expect_newline();
            } else {
                let tok = *self.peek();
                self.errors.error(tok.span, "expected method signature in interface");
                self.synchronize();
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::End, "expected 'end' to close interface");
        Some(self.node(
            self.span_of(&tok),
            NodeKind::InterfaceDecl(InterfaceDecl {
                name: name_tok.text,
                method_sigs,
            }),
        ))
    }

    fn parse_enum_decl(&mut self, is_export: bool) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'enum'
        let name_tok = self.expect(TokenKind::Identifier, "expected enum name")?;
        self.expect_newline();
        self.skip_newlines();

        let mut variants = Vec::new();
        while !self.check(TokenKind::End) && !self.check(TokenKind::Eof) {
            self.skip_newlines();
            if self.check(TokenKind::End) {
                break;
            }
            if self.check(TokenKind::Identifier) {
                let var_tok = self.advance();
                variants.push(EnumVariant {
                    name: var_tok.text,
                    span: self.span_of(&var_tok),
                });
                self.expect_newline();
            } else {
                let tok = *self.peek();
                self.errors.error(tok.span, "expected variant name in enum");
                self.synchronize();
            }
            self.skip_newlines();
        }

        self.expect(TokenKind::End, "expected 'end' to close enum");
        Some(self.node(
            self.span_of(&tok),
            NodeKind::EnumDecl(EnumDecl {
                is_export,
                name: name_tok.text,
                variants,
            }),
        ))
    }

    fn parse_import_decl(&mut self) -> Option<&'a Node<'a>> {
        let tok = self.advance(); // 'from'
        let path_tok = self.expect(TokenKind::Identifier, "expected module name after 'from'")?;
        let path_start = path_tok.span.offset;
        let mut path_end = path_tok.span.offset + path_tok.span.len;

        while self.check(TokenKind::Dot) {
            self.advance();
            match self.expect(TokenKind::Identifier, "expected module name after '.'") {
                Some(next) => path_end = next.span.offset + next.span.len,
                None => break,
            }
        }
        let module_path = &self.src[path_start..path_end];

        let is_export = if self.check(TokenKind::Export) {
            self.advance();
            true
        } else {
            self.expect(TokenKind::Import, "expected 'import' or 'export' after module path");
            false
        };

        let mut names = Vec::new();
        if let Some(name_tok) = self.expect(TokenKind::Identifier, "expected name to import") {
            names.push(ImportName {
                name: name_tok.text,
                span: self.span_of(&name_tok),
            });
            while self.matches(TokenKind::Comma) {
                match self.expect(TokenKind::Identifier, "expected name to import") {
                    Some(next) => names.push(ImportName {
                        name: next.text,
                        span: self.span_of(&next),
                    }),
                    None => break,
                }
            }
        }

        Some(self.node(
            self.span_of(&tok),
            NodeKind::ImportDecl(ImportDecl {
                is_export,
                module_path,
                names,
            }),
        ))
    }
}
