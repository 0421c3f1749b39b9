//! tplex - lexer for Nunjucks/Jinja-style templates
//!
//! Splits template source into typed tokens without losing a single byte:
//! every [`Token`] keeps the exact slice of source it was read from in
//! [`Token::raw`], so concatenating the raw text of a token stream always
//! reproduces the input. Tools that rewrite templates lexically rely on this.
//!
//! # Token stream
//!
//! ```text
//! Hello {% include "nav.html" %}!
//!
//! data         "Hello "
//! block-start  "{%"
//! whitespace   " "
//! symbol       "include"
//! whitespace   " "
//! string       "nav.html"     (raw: "\"nav.html\"")
//! whitespace   " "
//! block-end    "%}"
//! data         "!"
//! ```
//!
//! # Example
//!
//! ```
//! use tplex::{Lexer, TokenKind};
//!
//! let tokens = Lexer::new(r#"{% include "nav.html" %}"#).tokenize().unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::BlockStart);
//! assert_eq!(tokens[2].value, "include");
//! assert_eq!(tokens[4].value, "nav.html");
//! ```

mod error;
mod lexer;
mod token;

pub use error::{LexError, LexResult};
pub use lexer::Lexer;
pub use token::{Token, TokenKind};

/// Tokenize a complete template source
pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}
