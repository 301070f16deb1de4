use crate::error::{ProtocolError, Result};
use crate::quote::unquote;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Int(usize),
    LParen,
    RParen,
    Comma,
    Colon,
    Period,
    /// `;` or a newline that ends a non-empty statement
    Semi,
    Eof,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier {name:?}"),
            Self::Str(value) => format!("string {value:?}"),
            Self::Int(value) => format!("integer {value}"),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Colon => "':'".to_string(),
            Self::Period => "'.'".to_string(),
            Self::Semi => "end of statement".to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Tokenizer with Go's semicolon rule: a newline terminates the statement
/// when the line carried any token.
pub(crate) struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    line_start: usize,
    pending_semi: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            line: 1,
            line_start: 0,
            pending_semi: false,
            done: false,
        }
    }

    fn column(&self, offset: usize) -> usize {
        offset - self.line_start + 1
    }

    fn token(&mut self, kind: TokenKind, offset: usize) -> Token {
        self.pending_semi = !matches!(kind, TokenKind::Semi | TokenKind::Eof);
        Token {
            kind,
            line: self.line,
            column: self.column(offset),
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Token> {
        loop {
            let Some((offset, ch)) = self.chars.next() else {
                if self.pending_semi {
                    return Ok(self.token(TokenKind::Semi, self.src.len()));
                }
                self.done = true;
                return Ok(self.token(TokenKind::Eof, self.src.len()));
            };
            match ch {
                '\n' => {
                    let semi = self.pending_semi.then(|| self.token(TokenKind::Semi, offset));
                    self.line += 1;
                    self.line_start = offset + 1;
                    if let Some(token) = semi {
                        return Ok(token);
                    }
                }
                c if c.is_whitespace() => {}
                ';' => return Ok(self.token(TokenKind::Semi, offset)),
                '(' => return Ok(self.token(TokenKind::LParen, offset)),
                ')' => return Ok(self.token(TokenKind::RParen, offset)),
                ',' => return Ok(self.token(TokenKind::Comma, offset)),
                ':' => return Ok(self.token(TokenKind::Colon, offset)),
                '.' => return Ok(self.token(TokenKind::Period, offset)),
                '"' => return self.string(offset),
                c if c.is_ascii_digit() => return self.int(offset),
                c if c == '_' || c.is_alphabetic() => return Ok(self.ident(offset)),
                c => {
                    return Err(ProtocolError::UnexpectedChar {
                        line: self.line,
                        column: self.column(offset),
                        ch: c,
                    })
                }
            }
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'a str {
        let mut end = self.src.len();
        while let Some(&(offset, c)) = self.chars.peek() {
            if !pred(c) {
                end = offset;
                break;
            }
            self.chars.next();
        }
        &self.src[start..end]
    }

    fn ident(&mut self, start: usize) -> Token {
        let text = self.take_while(start, |c| c == '_' || c.is_alphanumeric());
        self.token(TokenKind::Ident(text.to_string()), start)
    }

    fn int(&mut self, start: usize) -> Result<Token> {
        let text = self.take_while(start, |c| c.is_ascii_alphanumeric());
        let value = text.parse().map_err(|_| ProtocolError::InvalidInt {
            line: self.line,
            column: self.column(start),
            literal: text.to_string(),
        })?;
        Ok(self.token(TokenKind::Int(value), start))
    }

    fn string(&mut self, start: usize) -> Result<Token> {
        let body_start = start + 1;
        let mut escaped = false;
        let mut body_end = None;
        while let Some((offset, c)) = self.chars.next() {
            match c {
                '\n' => break,
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    body_end = Some(offset);
                    break;
                }
                _ => escaped = false,
            }
        }
        let line = self.line;
        let column = self.column(start);
        let body_end = body_end.ok_or_else(|| ProtocolError::InvalidString {
            line,
            column,
            reason: "literal not terminated".to_string(),
        })?;
        let value = unquote(&self.src[body_start..body_end])
            .map_err(|reason| ProtocolError::InvalidString { line, column, reason })?;
        Ok(self.token(TokenKind::Str(value), start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().expect("token");
            let eof = token.kind == TokenKind::Eof;
            out.push(token.kind);
            if eof {
                return out;
            }
        }
    }

    #[test]
    fn newline_terminates_statement() {
        assert_eq!(
            kinds("gocovObject1.At()\n\n"),
            vec![
                TokenKind::Ident("gocovObject1".into()),
                TokenKind::Period,
                TokenKind::Ident("At".into()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn missing_final_newline_still_terminates() {
        let tokens = kinds("x");
        assert_eq!(tokens[1], TokenKind::Semi);
    }

    #[test]
    fn reports_unterminated_string() {
        let mut lexer = Lexer::new("\"abc\n");
        assert!(matches!(
            lexer.next_token(),
            Err(ProtocolError::InvalidString { line: 1, column: 1, .. })
        ));
    }

    #[test]
    fn rejects_stray_characters() {
        let mut lexer = Lexer::new("  #");
        assert!(matches!(
            lexer.next_token(),
            Err(ProtocolError::UnexpectedChar { line: 1, column: 3, ch: '#' })
        ));
    }
}
