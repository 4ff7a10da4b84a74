//! Source text to token stream.
//!
//! A thin, hand-rolled scanner: the surface language is small enough that a
//! lookup-table-driven lexer would be more machinery than the grammar
//! warrants. Mirrors the teacher's preference for a straightforward,
//! single-pass front end that hands a clean, typed stream to the next phase.

mod token;

pub use token::{keyword, Token, TokenKind};

use crate::error::{Error, Position, Result};

pub struct Lexer<'src> {
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    src: &'src str,
    line: usize,
    column: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if matches!(lookahead.peek(), Some((_, '/'))) {
                        self.bump();
                        self.bump();
                        while !matches!(self.peek(), Some('\n') | None) {
                            self.bump();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();
        let pos = self.pos();

        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, pos));
        };

        if c.is_ascii_digit() {
            return self.lex_number(pos);
        }
        if c.is_alphabetic() || c == '_' {
            return self.lex_ident(pos);
        }
        if c == '"' {
            return self.lex_string(pos);
        }
        if c == '\'' {
            return self.lex_char(pos);
        }

        self.lex_punct(pos)
    }

    fn lex_number(&mut self, pos: Position) -> Result<Token> {
        let start = self.byte_offset();
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let end = self.byte_offset();
        let text = &self.src[start..end];
        let value: i64 = text
            .parse()
            .map_err(|_| Error::lexical(pos, format!("malformed integer literal '{text}'")))?;
        Ok(Token::new(TokenKind::IntLit(value), pos))
    }

    fn lex_ident(&mut self, pos: Position) -> Result<Token> {
        let start = self.byte_offset();
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let end = self.byte_offset();
        let text = &self.src[start..end];
        let kind = match keyword(text) {
            Some(kw) => kw,
            None => TokenKind::Ident(text.to_string()),
        };
        Ok(Token::new(kind, pos))
    }

    fn lex_string(&mut self, pos: Position) -> Result<Token> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => s.push(self.escape(pos)?),
                Some(c) => s.push(c),
                None => return Err(Error::lexical(pos, "unterminated string literal")),
            }
        }
        Ok(Token::new(TokenKind::StringLit(s), pos))
    }

    fn lex_char(&mut self, pos: Position) -> Result<Token> {
        self.bump(); // opening quote
        let c = match self.bump() {
            Some('\\') => self.escape(pos)?,
            Some(c) => c,
            None => return Err(Error::lexical(pos, "unterminated char literal")),
        };
        if self.bump() != Some('\'') {
            return Err(Error::lexical(pos, "malformed char literal"));
        }
        if !c.is_ascii() {
            return Err(Error::lexical(pos, "char literal must be ASCII"));
        }
        Ok(Token::new(TokenKind::CharLit(c as u8), pos))
    }

    fn escape(&mut self, pos: Position) -> Result<char> {
        Ok(match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('"') => '"',
            Some(other) => return Err(Error::lexical(pos, format!("unknown escape '\\{other}'"))),
            None => return Err(Error::lexical(pos, "unterminated escape sequence")),
        })
    }

    fn lex_punct(&mut self, pos: Position) -> Result<Token> {
        let c = self.bump().expect("peeked");
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' if self.peek() == Some('&') => {
                self.bump();
                TokenKind::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.bump();
                TokenKind::OrOr
            }
            other => return Err(Error::lexical(pos, format!("unrecognized character '{other}'"))),
        };
        Ok(Token::new(kind, pos))
    }

    fn byte_offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.src.len(), |&(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_idents() {
        assert_eq!(
            kinds("int x = 3;"),
            vec![
                TokenKind::Int,
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::IntLit(3),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_comparison_operators() {
        assert_eq!(
            kinds("a <= b >= c == d != e"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::LtEq,
                TokenKind::Ident("b".into()),
                TokenKind::GtEq,
                TokenKind::Ident("c".into()),
                TokenKind::EqEq,
                TokenKind::Ident("d".into()),
                TokenKind::NotEq,
                TokenKind::Ident("e".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("int x; // trailing comment\nint y;"),
            vec![
                TokenKind::Int,
                TokenKind::Ident("x".into()),
                TokenKind::Semicolon,
                TokenKind::Int,
                TokenKind::Ident("y".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert!(matches!(err, Error::Lexical { .. }));
    }
}
