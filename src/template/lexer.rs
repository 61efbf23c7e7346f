//! Placeholder lexer.
//!
//! Splits a template into literal runs and `{{path[#tag]}}` placeholders.
//! A path is one or more of `[A-Za-z0-9_.]`, a tag one or more of
//! `[A-Za-z0-9_]`. Anything that does not fit that shape stays literal.

/// A placeholder found in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Full matched text including braces
    pub raw: &'a str,
    pub path: &'a str,
    pub tag: Option<&'a str>,
}

impl Placeholder<'_> {
    /// Placeholders containing `__` are inert and render as nothing.
    pub fn is_escaped(&self) -> bool {
        self.raw.contains("__")
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    Placeholder(Placeholder<'a>),
}

fn is_tag_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_path_byte(b: u8) -> bool {
    is_tag_byte(b) || b == b'.'
}

fn run_len(bytes: &[u8], start: usize, pred: fn(u8) -> bool) -> usize {
    bytes[start..].iter().take_while(|b| pred(**b)).count()
}

/// Try to read a placeholder starting exactly at `start`.
fn placeholder_at(template: &str, start: usize) -> Option<Placeholder<'_>> {
    let bytes = template.as_bytes();
    if !bytes[start..].starts_with(b"{{") {
        return None;
    }

    let path_start = start + 2;
    let path_len = run_len(bytes, path_start, is_path_byte);
    if path_len == 0 {
        return None;
    }
    let path_end = path_start + path_len;

    let (tag, close) = if bytes.get(path_end) == Some(&b'#') {
        let tag_start = path_end + 1;
        let tag_len = run_len(bytes, tag_start, is_tag_byte);
        if tag_len == 0 {
            return None;
        }
        (
            Some(&template[tag_start..tag_start + tag_len]),
            tag_start + tag_len,
        )
    } else {
        (None, path_end)
    };

    if !bytes[close..].starts_with(b"}}") {
        return None;
    }
    let end = close + 2;

    Some(Placeholder {
        raw: &template[start..end],
        path: &template[path_start..path_end],
        tag,
    })
}

/// Tokenize a template left to right. Adjacent literal text is emitted as a
/// single token and empty literals are never produced.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        // Placeholders are pure ASCII, so a match always starts and ends on
        // a char boundary.
        match placeholder_at(template, pos) {
            Some(placeholder) => {
                if pos > literal_start {
                    tokens.push(Token::Literal(&template[literal_start..pos]));
                }
                pos += placeholder.raw.len();
                literal_start = pos;
                tokens.push(Token::Placeholder(placeholder));
            }
            None => pos += 1,
        }
    }

    if literal_start < bytes.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(
        raw: &'static str,
        path: &'static str,
        tag: Option<&'static str>,
    ) -> Token<'static> {
        Token::Placeholder(Placeholder { raw, path, tag })
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokenize("no placeholders"), vec![Token::Literal("no placeholders")]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_path_and_tag() {
        let tokens = tokenize("Device {{Device#Device}} from {{Src.IP}}!");
        assert_eq!(
            tokens,
            vec![
                Token::Literal("Device "),
                placeholder("{{Device#Device}}", "Device", Some("Device")),
                Token::Literal(" from "),
                placeholder("{{Src.IP}}", "Src.IP", None),
                Token::Literal("!"),
            ]
        );
    }

    #[test]
    fn test_malformed_stays_literal() {
        assert_eq!(tokenize("{{}}"), vec![Token::Literal("{{}}")]);
        assert_eq!(tokenize("{{a b}}"), vec![Token::Literal("{{a b}}")]);
        assert_eq!(tokenize("{{a#}}"), vec![Token::Literal("{{a#}}")]);
        assert_eq!(tokenize("{{a#b.c}}"), vec![Token::Literal("{{a#b.c}}")]);
        assert_eq!(tokenize("{{a}"), vec![Token::Literal("{{a}")]);
    }

    #[test]
    fn test_extra_brace_is_literal() {
        assert_eq!(
            tokenize("{{{a}}}"),
            vec![
                Token::Literal("{"),
                placeholder("{{a}}", "a", None),
                Token::Literal("}"),
            ]
        );
    }

    #[test]
    fn test_non_ascii_literal() {
        let tokens = tokenize("→ {{a}} ✓");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::Literal("→ "));
        assert_eq!(tokens[2], Token::Literal(" ✓"));
    }

    #[test]
    fn test_escape_marker() {
        let Token::Placeholder(p) = tokenize("{{__a}}")[0] else {
            panic!("expected placeholder");
        };
        assert!(p.is_escaped());

        let Token::Placeholder(p) = tokenize("{{a#Device}}")[0] else {
            panic!("expected placeholder");
        };
        assert!(!p.is_escaped());
    }
}
