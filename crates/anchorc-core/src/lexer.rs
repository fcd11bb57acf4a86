//! Single-pass tokenizer.
//!
//! The lexer never backtracks: it walks the source buffer once, byte by
//! byte, deciding each token's extent with at most two bytes of
//! lookahead (for `==`, `!=`, `<=`, `>=`, and the `+=`/`-=`/`*=`/`/=`
//! family). Tokens borrow their source text directly out of the
//! arena-allocated buffer they were lexed from, so no copying happens
//! per token.

use crate::errors::Errors;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,

    Identifier,

    Func,
    Return,
    End,
    Const,
    Export,
    Extern,
    Var,
    If,
    Elseif,
    Else,
    Struct,
    Interface,
    For,
    In,
    Until,
    Step,
    While,
    Break,
    Continue,
    Match,
    Case,
    Enum,
    SelfKw,
    Null,
    True,
    False,
    From,
    Import,
    And,
    Or,
    Not,
    As,

    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Caret,

    EqualEqual,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Dot,

    Newline,

    Eof,
    Error,
}

fn keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "func" => Func,
        "return" => Return,
        "end" => End,
        "const" => Const,
        "export" => Export,
        "extern" => Extern,
        "var" => Var,
        "if" => If,
        "elseif" => Elseif,
        "else" => Else,
        "struct" => Struct,
        "interface" => Interface,
        "for" => For,
        "in" => In,
        "until" => Until,
        "step" => Step,
        "while" => While,
        "break" => Break,
        "continue" => Continue,
        "match" => Match,
        "case" => Case,
        "enum" => Enum,
        "self" => SelfKw,
        "null" => Null,
        "true" => True,
        "false" => False,
        "from" => From,
        "import" => Import,
        "and" => And,
        "or" => Or,
        "not" => Not,
        "as" => As,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    current: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            current: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole buffer, appending a final EOF token.
    /// Token storage is a plain `Vec` (doubling on growth is `Vec`'s
    /// default reallocation strategy, so no manual bookkeeping is
    /// needed the way the original C lexer managed its array).
    pub fn tokenize(src: &'a str, errors: &mut Errors) -> Vec<Token<'a>> {
        let mut lexer = Lexer::new(src);
        let mut tokens = Vec::with_capacity(src.len() / 4 + 16);
        loop {
            let tok = lexer.next_token(errors);
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.current).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.current + offset).copied().unwrap_or(0)
    }

    fn advance(&mut self) -> u8 {
        let b = self.peek();
        self.current += 1;
        self.column += 1;
        b
    }

    fn at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    fn span_from(&self, start: usize, start_line: usize, start_column: usize) -> Span {
        Span::new(start, self.current - start, start_line, start_column)
    }

    fn make(&self, kind: TokenKind, start: usize, start_line: usize, start_column: usize) -> Token<'a> {
        Token {
            kind,
            text: &self.src[start..self.current],
            span: self.span_from(start, start_line, start_column),
        }
    }

    fn next_token(&mut self, errors: &mut Errors) -> Token<'a> {
        loop {
            match self.peek() {
                b' ' | b'\t' => {
                    self.advance();
                }
                b'#' => {
                    while !self.at_end() && self.peek() != b'\n' && self.peek() != b'\r' {
                        self.advance();
                    }
                }
                b'\r' | b'\n' => {
                    let start = self.current;
                    let start_line = self.line;
                    let start_column = self.column;
                    if self.peek() == b'\r' {
                        self.advance();
                        if self.peek() == b'\n' {
                            self.advance();
                        }
                    } else {
                        self.advance();
                    }
                    self.line += 1;
                    self.column = 1;
                    return self.make(TokenKind::Newline, start, start_line, start_column);
                }
                _ => break,
            }
        }

        if self.at_end() {
            let start = self.current;
            return self.make(TokenKind::Eof, start, self.line, self.column);
        }

        let start = self.current;
        let start_line = self.line;
        let start_column = self.column;
        let c = self.advance();

        match c {
            b'"' => self.string_literal(start, start_line, start_column, errors),
            b'0'..=b'9' => self.number_literal(start, start_line, start_column),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier_or_keyword(start, start_line, start_column),
            b'+' => self.one_or_two(b'=', TokenKind::Plus, TokenKind::PlusAssign, start, start_line, start_column),
            b'-' => self.one_or_two(b'=', TokenKind::Minus, TokenKind::MinusAssign, start, start_line, start_column),
            b'*' => self.one_or_two(b'=', TokenKind::Star, TokenKind::StarAssign, start, start_line, start_column),
            b'/' => self.one_or_two(b'=', TokenKind::Slash, TokenKind::SlashAssign, start, start_line, start_column),
            b'&' => self.make(TokenKind::Ampersand, start, start_line, start_column),
            b'^' => self.make(TokenKind::Caret, start, start_line, start_column),
            b'=' => self.one_or_two(b'=', TokenKind::Assign, TokenKind::EqualEqual, start, start_line, start_column),
            b'!' => {
                if self.peek() == b'=' {
                    self.advance();
                    self.make(TokenKind::NotEqual, start, start_line, start_column)
                } else {
                    errors.error(
                        self.span_from(start, start_line, start_column),
                        "'!' is not a valid token on its own; did you mean '!='?",
                    );
                    self.make(TokenKind::Error, start, start_line, start_column)
                }
            }
            b'<' => self.one_or_two(b'=', TokenKind::Less, TokenKind::LessEqual, start, start_line, start_column),
            b'>' => self.one_or_two(b'=', TokenKind::Greater, TokenKind::GreaterEqual, start, start_line, start_column),
            b'(' => self.make(TokenKind::LeftParen, start, start_line, start_column),
            b')' => self.make(TokenKind::RightParen, start, start_line, start_column),
            b'[' => self.make(TokenKind::LeftBracket, start, start_line, start_column),
            b']' => self.make(TokenKind::RightBracket, start, start_line, start_column),
            b':' => self.make(TokenKind::Colon, start, start_line, start_column),
            b',' => self.make(TokenKind::Comma, start, start_line, start_column),
            b'.' => self.make(TokenKind::Dot, start, start_line, start_column),
            other => {
                errors.error(
                    self.span_from(start, start_line, start_column),
                    format!("unexpected byte 0x{other:02x}"),
                );
                self.make(TokenKind::Error, start, start_line, start_column)
            }
        }
    }

    fn one_or_two(
        &mut self,
        second: u8,
        one: TokenKind,
        two: TokenKind,
        start: usize,
        start_line: usize,
        start_column: usize,
    ) -> Token<'a> {
        if self.peek() == second {
            self.advance();
            self.make(two, start, start_line, start_column)
        } else {
            self.make(one, start, start_line, start_column)
        }
    }

    fn identifier_or_keyword(&mut self, start: usize, start_line: usize, start_column: usize) -> Token<'a> {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.advance();
        }
        let text = &self.src[start..self.current];
        let kind = keyword(text).unwrap_or(TokenKind::Identifier);
        Token {
            kind,
            text,
            span: self.span_from(start, start_line, start_column),
        }
    }

    fn number_literal(&mut self, start: usize, start_line: usize, start_column: usize) -> Token<'a> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        if self.peek() == b'f' {
            is_float = true;
            self.advance();
        }
        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntegerLiteral
        };
        self.make(kind, start, start_line, start_column)
    }

    fn string_literal(
        &mut self,
        start: usize,
        start_line: usize,
        start_column: usize,
        errors: &mut Errors,
    ) -> Token<'a> {
        while !self.at_end() && self.peek() != b'"' && self.peek() != b'\n' && self.peek() != b'\r' {
            self.advance();
        }
        if self.peek() != b'"' {
            errors.error(
                self.span_from(start, start_line, start_column),
                "unterminated string literal",
            );
            return self.make(TokenKind::Error, start, start_line, start_column);
        }
        self.advance();
        self.make(TokenKind::StringLiteral, start, start_line, start_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut errors = Errors::new();
        Lexer::tokenize(src, &mut errors).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_comments() {
        let mut errors = Errors::new();
        let tokens = Lexer::tokenize("  # a comment\n  const", &mut errors);
        assert!(!errors.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Newline);
        assert_eq!(tokens[1].kind, TokenKind::Const);
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("func self selfish"),
            vec![TokenKind::Func, TokenKind::SelfKw, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 3.14 2f 7.0f"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn two_char_operators_prefer_longest_match() {
        assert_eq!(
            kinds("+= == != <= >="),
            vec![
                TokenKind::PlusAssign,
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn bare_bang_is_lexical_error() {
        let mut errors = Errors::new();
        let tokens = Lexer::tokenize("a ! b", &mut errors);
        assert!(errors.has_errors());
        assert_eq!(tokens[2].kind, TokenKind::Error);
    }

    #[test]
    fn unterminated_string_is_error_token() {
        let mut errors = Errors::new();
        let tokens = Lexer::tokenize("\"abc", &mut errors);
        assert!(errors.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Error);
    }

    #[test]
    fn string_literal_preserves_raw_bytes() {
        let mut errors = Errors::new();
        let tokens = Lexer::tokenize("\"hello\\nworld\"", &mut errors);
        assert!(!errors.has_errors());
        assert_eq!(tokens[0].text, "\"hello\\nworld\"");
    }

    #[test]
    fn crlf_and_lone_cr_both_count_as_one_newline() {
        let mut errors = Errors::new();
        let tokens = Lexer::tokenize("const\r\nvar\rend", &mut errors);
        assert!(!errors.has_errors());
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Const,
                TokenKind::Newline,
                TokenKind::Var,
                TokenKind::Newline,
                TokenKind::End,
                TokenKind::Eof
            ]
        );
    }
}
