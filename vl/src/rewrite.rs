//! Namespace injection for templates loaded through a module
//!
//! A template read from a module's view folder refers to its siblings by bare
//! name (`{% include "nav.html" %}`). Once it is loaded under another module's
//! loader those names would resolve against the wrong search path, so the
//! source is re-serialized with the owning module spliced in front of each
//! referenced name:
//!
//! ```text
//! {% include "nav.html" %}   ->   {% include "blog:" + "nav.html" %}
//! ```
//!
//! The splice is a string concatenation evaluated by the template engine, so
//! a computed name (`{% include page.layout %}`) is prefixed too. A name that
//! already carries a module keeps it, because the last prefix in a chained
//! name wins.
//!
//! Rewriting is purely lexical and never changes anything except string and
//! regex quoting plus the injected text.

use tplex::{LexError, Token, TokenKind};
use tracing::debug;

/// Block keywords whose argument names another template
pub const RESERVED_KEYWORDS: [&str; 4] = ["include", "import", "extends", "from"];

/// Source of tokens for the rewriter
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError>;
}

/// The bundled Nunjucks-compatible lexer
#[derive(Debug, Clone, Copy, Default)]
pub struct NunjucksTokenizer;

impl Tokenizer for NunjucksTokenizer {
    fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError> {
        tplex::tokenize(source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Block,
    Expr,
}

/// Rewrite `source` so that every template it references is looked up in `module`
pub fn rewrite(source: &str, module: &str) -> Result<String, LexError> {
    rewrite_with(&NunjucksTokenizer, source, module)
}

/// [`rewrite`] with a caller-supplied tokenizer
pub fn rewrite_with(tokenizer: &dyn Tokenizer, source: &str, module: &str) -> Result<String, LexError> {
    debug!(%module, len = source.len(), "rewrite::rewrite_with: called");
    let tokens = tokenizer.tokenize(source)?;
    let mut out = String::with_capacity(source.len() + 16);
    let mut state = State::Text;
    let mut injections = 0usize;

    for token in &tokens {
        match &token.kind {
            TokenKind::BlockStart => {
                out.push_str(&token.raw);
                state = State::Block;
            }
            TokenKind::BlockEnd => {
                out.push_str(&token.raw);
                state = State::Text;
            }
            TokenKind::Symbol if state == State::Block && RESERVED_KEYWORDS.contains(&token.value.as_str()) => {
                out.push_str(&token.raw);
                out.push_str(&format!(" {} +", quote(&format!("{}:", module))));
                injections += 1;
                state = State::Expr;
            }
            TokenKind::String => out.push_str(&quote(&token.value)),
            TokenKind::Regex { flags } => {
                out.push_str(&format!("r/{}/{}", escape_regex_body(&token.value), flags));
            }
            _ => out.push_str(&token.raw),
        }
    }

    debug!(%module, injections, "rewrite::rewrite_with: done");
    Ok(out)
}

/// Double-quoted literal that the lexer reads back as `value`
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Escape any `/` in a regex body that is not already escaped
fn escape_regex_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut escaped = false;
    for ch in body.chars() {
        if ch == '/' && !escaped {
            out.push('\\');
        }
        escaped = ch == '\\' && !escaped;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rw(src: &str) -> String {
        rewrite(src, "blog").unwrap()
    }

    #[test]
    fn test_include_is_prefixed() {
        assert_eq!(rw(r#"{% include "foo.html" %}"#), r#"{% include "blog:" + "foo.html" %}"#);
    }

    #[test]
    fn test_all_reserved_keywords() {
        assert_eq!(rw(r#"{% extends "base.html" %}"#), r#"{% extends "blog:" + "base.html" %}"#);
        assert_eq!(
            rw(r#"{% import "macros.html" as m %}"#),
            r#"{% import "blog:" + "macros.html" as m %}"#
        );
    }

    #[test]
    fn test_from_import_injects_once() {
        assert_eq!(
            rw(r#"{% from "forms.html" import field %}"#),
            r#"{% from "blog:" + "forms.html" import field %}"#
        );
    }

    #[test]
    fn test_single_quotes_are_normalized() {
        assert_eq!(rw("{% include 'a.html' %}"), r#"{% include "blog:" + "a.html" %}"#);
    }

    #[test]
    fn test_embedded_quotes_are_escaped() {
        assert_eq!(
            rw(r#"{{ 'say "hi"' }}"#),
            r#"{{ "say \"hi\"" }}"#
        );
    }

    #[test]
    fn test_computed_name_is_prefixed() {
        assert_eq!(rw("{% include page.layout %}"), r#"{% include "blog:" + page.layout %}"#);
    }

    #[test]
    fn test_symbols_in_output_tags_are_untouched() {
        let src = "{{ include }} and {{ extends | upper }}";
        assert_eq!(rw(src), src);
    }

    #[test]
    fn test_whitespace_control_tags() {
        assert_eq!(rw(r#"{%- include "x.html" -%}"#), r#"{%- include "blog:" + "x.html" -%}"#);
    }

    #[test]
    fn test_no_keywords_is_identity() {
        let src = "<p>{{ title }}</p>\n{% if a %}{% for x in xs %}{{ x }}{% endfor %}{% endif %}{# c #}";
        assert_eq!(rw(src), src);
    }

    #[test]
    fn test_raw_body_untouched() {
        let src = r#"{% raw %}{% include 'x.html' %}{% endraw %}"#;
        assert_eq!(rw(src), src);
    }

    #[test]
    fn test_regex_round_trips() {
        let src = r"{{ r/a\/b/gi }}";
        assert_eq!(rw(src), src);
        assert_eq!(escape_regex_body("a/b"), r"a\/b");
        assert_eq!(escape_regex_body(r"a\/b"), r"a\/b");
        assert_eq!(escape_regex_body(r"a\\/b"), r"a\\\/b");
    }

    #[test]
    fn test_multiple_blocks() {
        let src = r#"{% extends "layout.html" %}{% block main %}{% include "nav.html" %}{% endblock %}"#;
        let expected = r#"{% extends "blog:" + "layout.html" %}{% block main %}{% include "blog:" + "nav.html" %}{% endblock %}"#;
        assert_eq!(rw(src), expected);
    }

    #[test]
    fn test_module_with_quote_is_escaped() {
        assert_eq!(
            rewrite(r#"{% include "a.html" %}"#, r#"we"ird"#).unwrap(),
            r#"{% include "we\"ird:" + "a.html" %}"#
        );
    }

    #[test]
    fn test_tokenizer_error_propagates() {
        let err = rewrite(r#"{% include "oops %}"#, "blog").unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_custom_tokenizer() {
        struct Fails;
        impl Tokenizer for Fails {
            fn tokenize(&self, _source: &str) -> Result<Vec<Token>, LexError> {
                Err(LexError::UnterminatedTag { line: 1, column: 1 })
            }
        }
        assert!(rewrite_with(&Fails, "anything", "blog").is_err());
    }
}
