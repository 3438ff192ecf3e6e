//! Tokenizer shared by the schema and value grammars.

use std::fmt;

use crate::error::GrammarError;

/// Kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident(String),
    /// Quoted literal; raw bytes because `blob` literals need not be UTF-8.
    Text(Vec<u8>),
    /// Unsigned numeral.
    Nat(u128),
    /// Numeral with an explicit `+` or `-` sign.
    Int(i128),
    /// Numeral with a fraction or exponent.
    Float(f64),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `;`
    Semi,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `=`
    Eq,
    /// `->`
    Arrow,
    /// `.`
    Dot,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns true if this is the identifier `word`.
    #[must_use]
    pub fn is_ident(&self, word: &str) -> bool {
        matches!(self, Self::Ident(name) if name == word)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "`{name}`"),
            Self::Text(_) => f.write_str("text literal"),
            Self::Nat(n) => write!(f, "numeral `{n}`"),
            Self::Int(i) => write!(f, "numeral `{i:+}`"),
            Self::Float(x) => write!(f, "numeral `{x}`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::LBrace => f.write_str("`{`"),
            Self::RBrace => f.write_str("`}`"),
            Self::Semi => f.write_str("`;`"),
            Self::Comma => f.write_str("`,`"),
            Self::Colon => f.write_str("`:`"),
            Self::Eq => f.write_str("`=`"),
            Self::Arrow => f.write_str("`->`"),
            Self::Dot => f.write_str("`.`"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind and payload.
    pub kind: TokenKind,
    /// Start offset.
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

/// Splits `source` into tokens, ending with [`TokenKind::Eof`].
///
/// # Errors
/// Returns [`GrammarError`] for the first malformed token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, GrammarError> {
    let mut lexer = Lexer::new(source);
    lexer.scan_all()?;
    Ok(lexer.tokens)
}

struct Lexer<'src> {
    text: &'src str,
    source: &'src [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            text: source,
            source: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn scan_all(&mut self) -> Result<(), GrammarError> {
        loop {
            self.skip_trivia()?;
            if self.is_at_end() {
                self.emit(TokenKind::Eof, self.pos);
                return Ok(());
            }
            self.scan_token()?;
        }
    }

    fn scan_token(&mut self) -> Result<(), GrammarError> {
        let start = self.pos;
        let ch = self.advance();

        let kind = match ch {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b';' => TokenKind::Semi,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'=' => TokenKind::Eq,
            b'.' => TokenKind::Dot,
            b'-' if self.match_char(b'>') => TokenKind::Arrow,
            b'-' | b'+' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(start, Some(ch == b'-'))?
            }
            b'-' | b'+' if self.at_word("inf") => {
                self.pos += 3;
                TokenKind::Float(if ch == b'-' {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                })
            }
            b'"' => self.scan_text(start)?,
            c if c.is_ascii_digit() => self.scan_number(start, None)?,
            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_ident(start),
            _ => {
                let found = self.text[start..]
                    .chars()
                    .next()
                    .map_or_else(|| "end of input".to_string(), |c| format!("`{c}`"));
                return Err(self.error(start, found));
            }
        };
        self.emit(kind, start);
        Ok(())
    }

    fn scan_text(&mut self, start: usize) -> Result<TokenKind, GrammarError> {
        let mut bytes = Vec::new();
        loop {
            if self.is_at_end() {
                return Err(self.error(start, "unterminated text literal"));
            }
            match self.advance() {
                b'"' => break,
                b'\\' => {
                    if self.is_at_end() {
                        return Err(self.error(start, "unterminated text literal"));
                    }
                    let escape_start = self.pos - 1;
                    match self.advance() {
                        b'n' => bytes.push(b'\n'),
                        b'r' => bytes.push(b'\r'),
                        b't' => bytes.push(b'\t'),
                        b'\\' => bytes.push(b'\\'),
                        b'"' => bytes.push(b'"'),
                        b'\'' => bytes.push(b'\''),
                        b'u' => {
                            let c = self.scan_unicode_escape(escape_start)?;
                            let mut buf = [0u8; 4];
                            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                        }
                        hi if hi.is_ascii_hexdigit() => {
                            let lo = self
                                .peek()
                                .filter(u8::is_ascii_hexdigit)
                                .ok_or_else(|| self.error(escape_start, "invalid byte escape"))?;
                            self.advance();
                            bytes.push((hex_value(hi) << 4) | hex_value(lo));
                        }
                        other => {
                            return Err(self.error(
                                escape_start,
                                format!("unknown escape `\\{}`", char::from(other)),
                            ));
                        }
                    }
                }
                c => bytes.push(c),
            }
        }
        Ok(TokenKind::Text(bytes))
    }

    fn scan_unicode_escape(&mut self, escape_start: usize) -> Result<char, GrammarError> {
        if !self.match_char(b'{') {
            return Err(self.error(escape_start, "invalid unicode escape"));
        }
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == b'_') {
            self.advance();
        }
        let digits: String = self.text[digits_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if !self.match_char(b'}') || digits.is_empty() {
            return Err(self.error(escape_start, "invalid unicode escape"));
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(escape_start, "unicode escape out of range"))
    }

    fn scan_number(
        &mut self,
        start: usize,
        negative: Option<bool>,
    ) -> Result<TokenKind, GrammarError> {
        let digits_start = if negative.is_some() { start + 1 } else { start };
        if self.source[digits_start] == b'0'
            && matches!(self.source.get(digits_start + 1), Some(b'x' | b'X'))
        {
            self.pos = digits_start + 2;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == b'_') {
                self.advance();
            }
            let digits = self.digits(digits_start + 2);
            if digits.is_empty() {
                return Err(self.error(start, "hexadecimal numeral without digits"));
            }
            let magnitude = u128::from_str_radix(&digits, 16)
                .map_err(|_| self.error(start, "numeral out of range"))?;
            return self.integer(start, negative, magnitude);
        }

        self.skip_digits();
        let mut is_float = false;
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let exponent_digit = match self.peek_next() {
                Some(b'+' | b'-') => self.source.get(self.pos + 2).copied(),
                other => other,
            };
            if exponent_digit.is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let digits = self.digits(digits_start);
        if is_float {
            let magnitude: f64 = digits
                .parse()
                .map_err(|_| self.error(start, format!("invalid float literal `{digits}`")))?;
            let value = if negative == Some(true) {
                -magnitude
            } else {
                magnitude
            };
            return Ok(TokenKind::Float(value));
        }
        let magnitude: u128 = digits
            .parse()
            .map_err(|_| self.error(start, "numeral out of range"))?;
        self.integer(start, negative, magnitude)
    }

    fn integer(
        &self,
        start: usize,
        negative: Option<bool>,
        magnitude: u128,
    ) -> Result<TokenKind, GrammarError> {
        let signed = match negative {
            None => return Ok(TokenKind::Nat(magnitude)),
            Some(true) => 0i128.checked_sub_unsigned(magnitude),
            Some(false) => i128::try_from(magnitude).ok(),
        };
        signed
            .map(TokenKind::Int)
            .ok_or_else(|| self.error(start, "numeral out of range"))
    }

    fn scan_ident(&mut self, start: usize) -> TokenKind {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
        TokenKind::Ident(self.text[start..self.pos].to_string())
    }

    fn skip_trivia(&mut self) -> Result<(), GrammarError> {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'/') if self.peek_next() == Some(b'/') => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_next() == Some(b'*') => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), GrammarError> {
        let start = self.pos;
        self.pos += 2;
        let mut depth = 1u32;
        while depth > 0 {
            match (self.peek(), self.peek_next()) {
                (None, _) => return Err(self.error(start, "unterminated block comment")),
                (Some(b'/'), Some(b'*')) => {
                    depth += 1;
                    self.pos += 2;
                }
                (Some(b'*'), Some(b'/')) => {
                    depth -= 1;
                    self.pos += 2;
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    // -- Helpers --

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'_') {
            self.advance();
        }
    }

    fn digits(&self, from: usize) -> String {
        self.text[from..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        ch
    }

    /// Whether `word` follows as a whole identifier.
    fn at_word(&self, word: &str) -> bool {
        let end = self.pos + word.len();
        self.source[self.pos..].starts_with(word.as_bytes())
            && !self
                .source
                .get(end)
                .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_')
    }

    fn match_char(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn emit(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
        });
    }

    fn error(&self, offset: usize, found: impl Into<String>) -> GrammarError {
        GrammarError::at(self.text, offset, "token", found, Vec::new())
    }
}

const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
