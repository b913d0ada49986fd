//! Tokenizer for shader stage text
//!
//! Produces identifiers, numbers and single-character punctuation, each
//! tagged with its 1-based line. Comments and whitespace are dropped.
//! Lexing never fails: anything that is not an identifier or a number is
//! emitted as punctuation and left to the reflector to judge.

// ===== TOKEN =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    /// Numeric literal, kept as written (`4`, `1.0f`, `0x10`)
    Number(String),
    Punct(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    /// Identifier text, if this token is an identifier
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this token is the identifier `word`
    pub fn is_ident(&self, word: &str) -> bool {
        self.ident() == Some(word)
    }

    /// Whether this token is the punctuation character `c`
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// Source text of the token
    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s) | TokenKind::Number(s) => s.clone(),
            TokenKind::Punct(c) => c.to_string(),
        }
    }
}

// ===== LEXER =====

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self::starting_at_line(src, 1)
    }

    /// Lexer whose first line is numbered `line` (for text cut out of a
    /// larger document)
    pub fn starting_at_line(src: &'s str, line: usize) -> Self {
        Self { src, pos: 0, line }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
            }
            let rest = &self.src[self.pos..];
            if rest.starts_with("//") {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
            } else if rest.starts_with("/*") {
                self.advance();
                self.advance();
                loop {
                    if self.src[self.pos..].starts_with("*/") {
                        self.advance();
                        self.advance();
                        break;
                    }
                    if self.advance().is_none() {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();

        let ch = self.peek()?;
        let line = self.line;
        let kind = if ch.is_alphabetic() || ch == '_' {
            TokenKind::Ident(self.take_while(|c| c.is_alphanumeric() || c == '_'))
        } else if ch.is_ascii_digit() {
            TokenKind::Number(self.take_while(|c| c.is_ascii_alphanumeric() || c == '.'))
        } else {
            self.advance();
            TokenKind::Punct(ch)
        };
        Some(Token { kind, line })
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.advance();
        }
        self.src[start..self.pos].to_string()
    }
}

/// Tokenize `src`, numbering lines from 1
pub fn tokenize(src: &str) -> Vec<Token> {
    Lexer::new(src).tokenize()
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
