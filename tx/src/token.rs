//! Token types

use std::fmt;

/// Kind of a lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text outside of any tag
    Data,
    /// `{# ... #}`, delimiters included
    Comment,
    /// Whitespace inside a tag
    Whitespace,
    /// `{%` or `{%-`
    BlockStart,
    /// `%}` or `-%}`
    BlockEnd,
    /// `{{` or `{{-`
    VariableStart,
    /// `}}` or `-}}`
    VariableEnd,
    /// Quoted string literal; the value is unescaped
    String,
    /// `r/body/flags` regex literal; the value is the body
    Regex { flags: String },
    /// Identifier or keyword
    Symbol,
    Int,
    Float,
    Boolean,
    /// `none`, `None` or `null`
    Null,
    /// Brackets, braces, parens, `,`, `:`, `~`, `|`
    Punct,
    Operator,
}

impl TokenKind {
    /// Name of this kind as used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Comment => "comment",
            Self::Whitespace => "whitespace",
            Self::BlockStart => "block-start",
            Self::BlockEnd => "block-end",
            Self::VariableStart => "variable-start",
            Self::VariableEnd => "variable-end",
            Self::String => "string",
            Self::Regex { .. } => "regex",
            Self::Symbol => "symbol",
            Self::Int => "int",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Null => "none",
            Self::Punct => "punct",
            Self::Operator => "operator",
        }
    }

    /// True for kinds that only appear between tag delimiters
    pub fn is_code(&self) -> bool {
        !matches!(self, Self::Data | Self::Comment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Semantic value: unescaped text for strings, body for regexes, raw text otherwise
    pub value: String,
    /// Exact source slice this token was read from
    pub raw: String,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character, counted in chars
    pub column: usize,
}

impl Token {
    /// True if this is a symbol with the given name
    pub fn is_symbol(&self, name: &str) -> bool {
        self.kind == TokenKind::Symbol && self.value == name
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} {:?}", self.line, self.column, self.kind, self.value)
    }
}
