//! Splits free-form post text into styleable segments.
//!
//! The tokenizer is lossless: concatenating the `text` of every token in
//! order reproduces the input exactly, including whitespace and newlines.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plain,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: TokenKind::Plain,
        }
    }

    fn classified(text: &str) -> Self {
        let kind = if is_tag(text) {
            TokenKind::Tag
        } else {
            TokenKind::Plain
        };
        Self {
            text: text.to_string(),
            kind,
        }
    }
}

/// Canonical tag rule: a segment counts as a tag when it starts with `#`,
/// `@`, `http`, or `www.`. The leading prefix alone is enough; a bare sigil
/// is still a tag.
pub fn is_tag(segment: &str) -> bool {
    segment.starts_with('#')
        || segment.starts_with('@')
        || segment.starts_with("http")
        || segment.starts_with("www.")
}

/// Tokenize `text` into alternating word and whitespace segments, classifying
/// each word segment as plain or tag. Whitespace runs (spaces, tabs,
/// newlines) become single plain tokens so spacing round-trips on re-join.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_whitespace = None;

    for (idx, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        match in_whitespace {
            None => in_whitespace = Some(ws),
            Some(prev) if prev != ws => {
                let segment = &text[start..idx];
                tokens.push(if prev {
                    Token::plain(segment)
                } else {
                    Token::classified(segment)
                });
                start = idx;
                in_whitespace = Some(ws);
            }
            Some(_) => {}
        }
    }

    if let Some(ws) = in_whitespace {
        let segment = &text[start..];
        tokens.push(if ws {
            Token::plain(segment)
        } else {
            Token::classified(segment)
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_and_classifies_mixed_content() {
        let tokens = tokenize("Hello #world @friend http://x.co");
        assert_eq!(
            texts(&tokens),
            vec!["Hello", " ", "#world", " ", "@friend", " ", "http://x.co"]
        );
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Plain,
                TokenKind::Plain,
                TokenKind::Tag,
                TokenKind::Plain,
                TokenKind::Tag,
                TokenKind::Plain,
                TokenKind::Tag,
            ]
        );
    }

    #[test]
    fn round_trips_exactly() {
        let inputs = [
            "",
            "   ",
            "one two",
            "line one\n\nline two\t tabbed",
            "#lead trailing space ",
            "  leading\nmix\r\nof newlines",
            "emoji 🚀 and #tag",
        ];
        for input in inputs {
            let joined: String = tokenize(input).iter().map(|t| t.text.as_str()).collect();
            assert_eq!(joined, input, "round trip failed for {input:?}");
        }
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn pure_whitespace_is_one_plain_token() {
        let tokens = tokenize(" \n\t ");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Plain);
        assert_eq!(tokens[0].text, " \n\t ");
    }

    #[test]
    fn bare_sigils_count_as_tags() {
        for bare in ["#", "@", "http", "www."] {
            let tokens = tokenize(bare);
            assert_eq!(tokens.len(), 1);
            assert_eq!(tokens[0].kind, TokenKind::Tag, "expected {bare:?} tagged");
        }
    }

    #[test]
    fn hashtags_inside_words_stay_plain() {
        let tokens = tokenize("not#atag");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Plain);
    }

    #[test]
    fn newline_runs_are_preserved_whole() {
        let tokens = tokenize("a\n\n\nb");
        assert_eq!(texts(&tokens), vec!["a", "\n\n\n", "b"]);
    }
}
