//! Lexer for Rain.
//!
//! Rain is indentation structured. The lexer turns leading whitespace into
//! layout tokens so the parser never looks at columns:
//!
//! - a deeper line emits `INDENT`
//! - a line at the same depth emits `NEWLINE`
//! - a shallower line emits `NEWLINE`, then `DEDENT NEWLINE` per closed level
//! - end of input closes every open level the same way, then emits `END`
//!
//! Blank lines, comment-only lines, and line breaks inside brackets produce
//! no layout tokens.

use rain_foundation::{Error, ErrorKind, Result, Span};

use crate::token::{Keyword, Operator, Symbol, Token, TokenKind};

/// Lexer for Rain source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Open indentation widths; the bottom entry is always 0.
    indents: Vec<u32>,
    /// Bracket nesting depth; layout is suspended while positive.
    depth: usize,
    /// True when the next character begins a physical line.
    at_line_start: bool,
    /// True once the first logical line has been seen.
    started: bool,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            started: false,
            tokens: Vec::new(),
        }
    }

    /// Tokenizes the whole source, ending with [`TokenKind::End`].
    ///
    /// # Errors
    /// Returns a parse error for malformed literals, stray characters, or
    /// inconsistent indentation.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        loop {
            if self.at_line_start && self.depth == 0 {
                let start = self.here();
                let width = self.measure_indent();
                match self.peek_char() {
                    None => break,
                    Some('\n' | '\r') => {
                        self.advance();
                        continue;
                    }
                    Some('#') => {
                        self.skip_comment();
                        continue;
                    }
                    Some(_) => {
                        self.at_line_start = false;
                        self.layout(width, start)?;
                    }
                }
            }

            self.skip_blanks();
            let Some(c) = self.peek_char() else { break };
            match c {
                '#' => self.skip_comment(),
                '\n' => {
                    self.advance();
                    if self.depth == 0 {
                        self.at_line_start = true;
                    }
                }
                '\r' => {
                    self.advance();
                }
                _ => {
                    let token = self.scan_token()?;
                    self.tokens.push(token);
                }
            }
        }

        let end = self.here();
        if self.started {
            self.push_layout(TokenKind::Newline, end);
            while self.indents.len() > 1 {
                self.indents.pop();
                self.push_layout(TokenKind::Dedent, end);
                self.push_layout(TokenKind::Newline, end);
            }
        }
        self.push_layout(TokenKind::End, end);
        Ok(self.tokens)
    }

    /// Emits layout tokens for a logical line starting at `width` columns.
    fn layout(&mut self, width: u32, at: Span) -> Result<()> {
        if !self.started {
            self.started = true;
            if width > 0 {
                return Err(self.error_at(at, "unexpected indentation"));
            }
            return Ok(());
        }

        let top = self.indents.last().copied().unwrap_or(0);
        if width > top {
            self.indents.push(width);
            self.push_layout(TokenKind::Indent, at);
            return Ok(());
        }

        self.push_layout(TokenKind::Newline, at);
        while width < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            self.push_layout(TokenKind::Dedent, at);
            self.push_layout(TokenKind::Newline, at);
        }
        if self.indents.last().copied().unwrap_or(0) != width {
            return Err(self.error_at(at, "dedent does not match any outer indentation level"));
        }
        Ok(())
    }

    fn push_layout(&mut self, kind: TokenKind, at: Span) {
        self.tokens.push(Token::new(kind, at));
    }

    fn scan_token(&mut self) -> Result<Token> {
        let start = self.here();
        let Some(c) = self.peek_char() else {
            return Err(self.error_at(start, "unexpected end of input"));
        };

        let kind = match c {
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_word(),
            c if c.is_ascii_digit() => self.scan_number(start)?,
            '"' | '\'' => self.scan_string(start)?,
            _ => self.scan_punctuation(start)?,
        };

        Ok(Token::new(
            kind,
            Span::new(start.start, self.position, start.line, start.column),
        ))
    }

    fn scan_word(&mut self) -> TokenKind {
        let begin = self.position;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let word = &self.source[begin..self.position];
        match word {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "null" => TokenKind::Null,
            "table" => TokenKind::Table,
            _ => match Keyword::from_word(word) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Name(word.to_string()),
            },
        }
    }

    fn scan_number(&mut self, start: Span) -> Result<TokenKind> {
        let begin = self.position;
        let mut is_float = false;
        self.eat_digits();

        if self.peek_char() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.eat_digits();
        }

        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_next(), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self
                .rest
                .chars()
                .nth(digit_at)
                .is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                self.advance();
                if signed {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        let text = &self.source[begin..self.position];
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error_at(start, &format!("invalid float literal {text}")))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| self.error_at(start, &format!("integer literal {text} out of range")))
        }
    }

    fn eat_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn scan_string(&mut self, start: Span) -> Result<TokenKind> {
        let quote = self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(self.error_at(start, "unterminated string literal"));
                }
                Some('\\') => {
                    let escaped = match self.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c @ ('\\' | '"' | '\'')) => c,
                        Some(c) => {
                            return Err(self.error_at(
                                self.here(),
                                &format!("unknown escape sequence \\{c}"),
                            ));
                        }
                        None => return Err(self.error_at(start, "unterminated string literal")),
                    };
                    value.push(escaped);
                }
                Some(c) if Some(c) == quote => break,
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::Str(value))
    }

    fn scan_punctuation(&mut self, start: Span) -> Result<TokenKind> {
        let c = self.advance().unwrap_or_default();
        let next = self.peek_char();
        let two = |lexer: &mut Self, kind: TokenKind| {
            lexer.advance();
            kind
        };

        Ok(match (c, next) {
            ('(', _) => self.open(Symbol::LParen),
            ('[', _) => self.open(Symbol::LBracket),
            ('{', _) => self.open(Symbol::LBrace),
            (')', _) => self.close(Symbol::RParen),
            (']', _) => self.close(Symbol::RBracket),
            ('}', _) => self.close(Symbol::RBrace),
            (',', _) => TokenKind::Symbol(Symbol::Comma),
            ('.', _) => TokenKind::Symbol(Symbol::Dot),
            ('@', _) => TokenKind::Symbol(Symbol::At),
            ('?', _) => TokenKind::Symbol(Symbol::Question),
            (':', Some(':')) => two(self, TokenKind::Operator(Operator::ColonColon)),
            (':', _) => TokenKind::Symbol(Symbol::Colon),
            ('=', Some('=')) => two(self, TokenKind::Operator(Operator::EqEq)),
            ('=', _) => TokenKind::Symbol(Symbol::Assign),
            ('!', Some('=')) => two(self, TokenKind::Operator(Operator::Ne)),
            ('!', _) => TokenKind::Operator(Operator::Bang),
            ('<', Some('=')) => two(self, TokenKind::Operator(Operator::Le)),
            ('<', _) => TokenKind::Operator(Operator::Lt),
            ('>', Some('=')) => two(self, TokenKind::Operator(Operator::Ge)),
            ('>', _) => TokenKind::Operator(Operator::Gt),
            ('-', Some('>')) => two(self, TokenKind::Operator(Operator::Arrow)),
            ('-', _) => TokenKind::Operator(Operator::Minus),
            ('+', _) => TokenKind::Operator(Operator::Plus),
            ('*', _) => TokenKind::Operator(Operator::Star),
            ('/', _) => TokenKind::Operator(Operator::Slash),
            ('$', _) => TokenKind::Operator(Operator::Dollar),
            ('&', _) => TokenKind::Operator(Operator::Amp),
            ('|', _) => TokenKind::Operator(Operator::Pipe),
            (c, _) => {
                return Err(self.error_at(start, &format!("unexpected character {c:?}")));
            }
        })
    }

    fn open(&mut self, symbol: Symbol) -> TokenKind {
        self.depth += 1;
        TokenKind::Symbol(symbol)
    }

    fn close(&mut self, symbol: Symbol) -> TokenKind {
        self.depth = self.depth.saturating_sub(1);
        TokenKind::Symbol(symbol)
    }

    fn measure_indent(&mut self) -> u32 {
        let mut width = 0;
        while matches!(self.peek_char(), Some(' ' | '\t')) {
            self.advance();
            width += 1;
        }
        width
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek_char(), Some(' ' | '\t')) {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    fn here(&self) -> Span {
        Span::new(self.position, self.position, self.line, self.column)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.rest.chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        let len = c.len_utf8();
        self.rest = &self.rest[len..];
        self.position += len;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_at(&self, span: Span, message: &str) -> Error {
        syntax_error(self.source, span, message)
    }
}

/// Builds a parse error carrying the offending source line.
pub(crate) fn syntax_error(source: &str, span: Span, message: &str) -> Error {
    Error::new(ErrorKind::Parse {
        message: message.to_string(),
        line: span.line,
        column: span.column,
        context: span.line_of(source).to_string(),
    })
    .at(span)
}

/// Tokenizes source text.
///
/// # Errors
/// Returns a parse error if the source cannot be tokenized.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}
