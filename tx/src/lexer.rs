//! Lexer implementation
//!
//! Follows the Nunjucks lexical rules closely enough that any template the
//! Nunjucks lexer accepts produces the same token boundaries here. Raw text is
//! kept for every token, including whitespace and tag delimiters.

use tracing::debug;

use crate::error::{LexError, LexResult};
use crate::token::{Token, TokenKind};

const PUNCT_CHARS: &str = "()[]{},:~|";
const OPERATOR_CHARS: &str = "+-*/%=!<>.#";
const COMPOUND_OPERATORS: [&str; 8] = ["===", "!==", "==", "!=", "<=", ">=", "//", "**"];
const REGEX_FLAGS: &str = "gimy";

/// Tags whose body is passed through as data, with their closing tag names
const RAW_TAGS: [(&str, &str); 2] = [("raw", "endraw"), ("verbatim", "endverbatim")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Block,
    Variable,
}

/// Streaming lexer over a template source
///
/// Yields tokens through [`Iterator`]; after the first error the iterator is
/// exhausted.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    mode: Mode,
    /// Position of the tag opener currently being lexed
    tag_start: (usize, usize),
    /// Whether a non-whitespace token was seen in the current tag
    tag_head_seen: bool,
    /// First symbol of the current block tag
    tag_name: Option<String>,
    /// Closing tag name while inside a raw/verbatim body
    raw_end: Option<&'static str>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            mode: Mode::Text,
            tag_start: (1, 1),
            tag_head_seen: false,
            tag_name: None,
            raw_end: None,
            finished: false,
        }
    }

    /// Lex the whole source, stopping at the first error
    pub fn tokenize(self) -> LexResult<Vec<Token>> {
        debug!(len = self.src.len(), "Lexer::tokenize: called");
        self.collect()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Consume `bytes` bytes, keeping line and column in step
    fn advance(&mut self, bytes: usize) {
        let consumed = &self.src[self.pos..self.pos + bytes];
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += bytes;
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.advance(ch.len_utf8());
        Some(ch)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.advance(ch.len_utf8());
        }
    }

    fn token(&self, kind: TokenKind, value: String, start: usize, line: usize, column: usize) -> Token {
        Token {
            kind,
            value,
            raw: self.src[start..self.pos].to_string(),
            line,
            column,
        }
    }

    /// Token whose value is its raw text
    fn plain(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        let value = self.src[start..self.pos].to_string();
        self.token(kind, value, start, line, column)
    }

    fn next_token(&mut self) -> LexResult<Option<Token>> {
        if self.pos >= self.src.len() {
            return match self.mode {
                Mode::Text => Ok(None),
                Mode::Block | Mode::Variable => Err(LexError::UnterminatedTag {
                    line: self.tag_start.0,
                    column: self.tag_start.1,
                }),
            };
        }
        match self.mode {
            Mode::Text => self.lex_text().map(Some),
            Mode::Block | Mode::Variable => self.lex_tag().map(Some),
        }
    }

    fn lex_text(&mut self) -> LexResult<Token> {
        let (start, line, column) = (self.pos, self.line, self.column);

        if let Some(end_tag) = self.raw_end.take() {
            let end = find_end_tag(self.rest(), end_tag).map_or(self.src.len(), |i| self.pos + i);
            if end > self.pos {
                self.advance(end - self.pos);
                return Ok(self.plain(TokenKind::Data, start, line, column));
            }
            // Empty body: the closing tag is lexed normally below
        }

        let rest = self.rest();
        if rest.starts_with("{#") {
            let Some(close) = rest[2..].find("#}") else {
                return Err(LexError::UnterminatedComment { line, column });
            };
            self.advance(close + 4);
            return Ok(self.plain(TokenKind::Comment, start, line, column));
        }

        if rest.starts_with("{%") || rest.starts_with("{{") {
            let (kind, mode) = if rest.starts_with("{%") {
                (TokenKind::BlockStart, Mode::Block)
            } else {
                (TokenKind::VariableStart, Mode::Variable)
            };
            let len = if rest[2..].starts_with('-') { 3 } else { 2 };
            self.advance(len);
            self.mode = mode;
            self.tag_start = (line, column);
            self.tag_head_seen = false;
            self.tag_name = None;
            return Ok(self.plain(kind, start, line, column));
        }

        let end = find_tag_open(rest).unwrap_or(rest.len());
        self.advance(end);
        Ok(self.plain(TokenKind::Data, start, line, column))
    }

    fn lex_tag(&mut self) -> LexResult<Token> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let rest = self.rest();
        let Some(ch) = self.peek() else {
            return Err(LexError::UnterminatedTag {
                line: self.tag_start.0,
                column: self.tag_start.1,
            });
        };

        if ch.is_whitespace() {
            self.bump_while(char::is_whitespace);
            return Ok(self.plain(TokenKind::Whitespace, start, line, column));
        }

        let closers: [(&str, TokenKind); 2] = match self.mode {
            Mode::Block => [("-%}", TokenKind::BlockEnd), ("%}", TokenKind::BlockEnd)],
            _ => [("-}}", TokenKind::VariableEnd), ("}}", TokenKind::VariableEnd)],
        };
        for (closer, kind) in closers {
            if rest.starts_with(closer) {
                self.advance(closer.len());
                if self.mode == Mode::Block
                    && let Some(name) = self.tag_name.take()
                {
                    self.raw_end = RAW_TAGS.iter().find(|(open, _)| *open == name).map(|(_, end)| *end);
                }
                self.mode = Mode::Text;
                return Ok(self.plain(kind, start, line, column));
            }
        }

        let head = !std::mem::replace(&mut self.tag_head_seen, true);

        if ch == '"' || ch == '\'' {
            return self.lex_string(ch, start, line, column);
        }

        if ch == 'r' && self.peek_nth(1) == Some('/') {
            return self.lex_regex(start, line, column);
        }

        if PUNCT_CHARS.contains(ch) {
            self.advance(ch.len_utf8());
            return Ok(self.plain(TokenKind::Punct, start, line, column));
        }

        if OPERATOR_CHARS.contains(ch) {
            let len = COMPOUND_OPERATORS
                .iter()
                .find(|op| rest.starts_with(*op))
                .map_or(ch.len_utf8(), |op| op.len());
            self.advance(len);
            return Ok(self.plain(TokenKind::Operator, start, line, column));
        }

        if ch.is_ascii_digit() {
            return Ok(self.lex_number(start, line, column));
        }

        if ch.is_control() {
            return Err(LexError::UnexpectedCharacter { ch, line, column });
        }

        self.bump_while(|c| !is_delimiter(c));
        let word = &self.src[start..self.pos];
        let kind = match word {
            "true" | "false" | "True" | "False" => TokenKind::Boolean,
            "none" | "None" | "null" => TokenKind::Null,
            _ => TokenKind::Symbol,
        };
        if head && self.mode == Mode::Block && kind == TokenKind::Symbol {
            self.tag_name = Some(word.to_string());
        }
        Ok(self.plain(kind, start, line, column))
    }

    fn lex_string(&mut self, quote: char, start: usize, line: usize, column: usize) -> LexResult<Token> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { line, column }),
                Some('\\') => match self.bump() {
                    None => return Err(LexError::UnterminatedString { line, column }),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }
        Ok(self.token(TokenKind::String, value, start, line, column))
    }

    fn lex_regex(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token> {
        // r/
        self.advance(2);
        let mut body = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedRegex { line, column }),
                Some('\\') => {
                    body.push('\\');
                    match self.bump() {
                        None => return Err(LexError::UnterminatedRegex { line, column }),
                        Some(c) => body.push(c),
                    }
                }
                Some('/') => break,
                Some(c) => body.push(c),
            }
        }
        let flags_start = self.pos;
        self.bump_while(|c| REGEX_FLAGS.contains(c));
        let flags = self.src[flags_start..self.pos].to_string();
        Ok(self.token(TokenKind::Regex { flags }, body, start, line, column))
    }

    fn lex_number(&mut self, start: usize, line: usize, column: usize) -> Token {
        self.bump_while(|c| c.is_ascii_digit());
        let fractional = self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit());
        if fractional {
            self.advance(1);
            self.bump_while(|c| c.is_ascii_digit());
            self.plain(TokenKind::Float, start, line, column)
        } else {
            self.plain(TokenKind::Int, start, line, column)
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || c.is_control()
        || c == '"'
        || c == '\''
        || PUNCT_CHARS.contains(c)
        || OPERATOR_CHARS.contains(c)
}

/// Offset of the next `{%`, `{{` or `{#` in `text`
fn find_tag_open(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    text.match_indices('{')
        .map(|(i, _)| i)
        .find(|&i| matches!(bytes.get(i + 1), Some(b'%' | b'{' | b'#')))
}

/// Offset of the `{% <name> %}` tag that closes a raw body
fn find_end_tag(text: &str, name: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(i) = text[offset..].find("{%") {
        let at = offset + i;
        let tail = &text[at + 2..];
        let tail = tail.strip_prefix('-').unwrap_or(tail).trim_start();
        if let Some(after) = tail.strip_prefix(name) {
            let after = after.trim_start();
            let after = after.strip_prefix('-').unwrap_or(after);
            if after.starts_with("%}") {
                return Some(at);
            }
        }
        offset = at + 2;
    }
    None
}
