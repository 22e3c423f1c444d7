//! Tokenizer for panel command lines.
//!
//! Splits an input line into words, `key=value` pairs and `--flags`. Quotes group
//! whitespace and suppress `key=value` splitting, so `"a=b"` stays a single word.
//! Every token records its byte span, which lets the router hand raw trailing input
//! (JSON bodies) through untouched.

use std::iter::Peekable;
use std::str::CharIndices;

/// A token parsed from command input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain or quoted word.
    Word(String),
    /// A `key=value` pair; the key is never quoted.
    KeyValue { key: String, value: String },
    /// A long flag (`--https`).
    Flag(String),
}

impl Token {
    /// Returns the token as a word if it is one.
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this is a flag with the given name.
    pub fn is_flag(&self, name: &str) -> bool {
        matches!(self, Token::Flag(n) if n.eq_ignore_ascii_case(name))
    }

    /// Renders the token back as text, with quotes removed.
    pub fn to_text(&self) -> String {
        match self {
            Token::Word(s) => s.clone(),
            Token::KeyValue { key, value } => format!("{key}={value}"),
            Token::Flag(name) => format!("--{name}"),
        }
    }
}

/// A token together with the byte range it occupied in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Tokenizes a command line, keeping each token's span.
///
/// - whitespace separates tokens unless quoted (`'...'` or `"..."`)
/// - inside quotes `\"`, `\'`, `\\`, `\n` and `\t` are unescaped
/// - `--name` is a flag; a bare `--` is a word
/// - the first unquoted `=` after a non-empty key makes a `KeyValue`
pub fn tokenize_spanned(input: &str) -> Vec<Spanned> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let word = collect_word(&mut chars);
        let end = chars.peek().map(|&(i, _)| i).unwrap_or(input.len());

        let token = match word.flag_name() {
            Some(name) => Token::Flag(name),
            None => word.into_token(),
        };
        tokens.push(Spanned { token, start, end });
    }

    tokens
}

/// Splits `input` on `;` outside quotes, using the same quoting rules as
/// [`tokenize_spanned`]. Pieces are trimmed; empty ones are dropped.
pub fn split_commands(input: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut quote = None;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ';' => {
                pieces.push(&input[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    pieces.push(&input[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Characters of one token plus where its first unquoted `=` sits.
struct RawWord {
    text: String,
    quoted: bool,
    split_at: Option<usize>,
}

impl RawWord {
    fn flag_name(&self) -> Option<String> {
        if self.quoted || self.split_at.is_some() {
            return None;
        }
        self.text
            .strip_prefix("--")
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    fn into_token(self) -> Token {
        match self.split_at {
            Some(eq) if eq > 0 => Token::KeyValue {
                key: self.text[..eq].to_string(),
                value: self.text[eq + 1..].to_string(),
            },
            _ => Token::Word(self.text),
        }
    }
}

fn collect_word(chars: &mut Peekable<CharIndices<'_>>) -> RawWord {
    let mut word = RawWord {
        text: String::new(),
        quoted: false,
        split_at: None,
    };

    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() {
            break;
        }
        chars.next();

        match c {
            '"' | '\'' => {
                word.quoted = true;
                collect_quoted(chars, c, &mut word.text);
            }
            '=' if word.split_at.is_none() && !word.quoted => {
                word.split_at = Some(word.text.len());
                word.text.push(c);
            }
            _ => word.text.push(c),
        }
    }

    word
}

/// Appends characters up to the closing `quote`. An unterminated quote runs to the end.
fn collect_quoted(chars: &mut Peekable<CharIndices<'_>>, quote: char, out: &mut String) {
    let mut escaped = false;

    for (_, c) in chars.by_ref() {
        if escaped {
            match c {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                '\\' | '"' | '\'' => out.push(c),
                _ => {
                    out.push('\\');
                    out.push(c);
                }
            }
            escaped = false;
            continue;
        }

        if c == '\\' {
            escaped = true;
        } else if c == quote {
            return;
        } else {
            out.push(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(input: &str) -> Vec<Token> {
        tokenize_spanned(input).into_iter().map(|s| s.token).collect()
    }

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    fn kv(key: &str, value: &str) -> Token {
        Token::KeyValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_simple_words() {
        assert_eq!(tokenize("led on"), vec![word("led"), word("on")]);
    }

    #[test]
    fn test_extra_whitespace() {
        assert_eq!(tokenize("  gpio   5\t1  "), vec![word("gpio"), word("5"), word("1")]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_quoted_word_keeps_spaces() {
        assert_eq!(
            tokenize(r#"oled text "Hello   world""#),
            vec![word("oled"), word("text"), word("Hello   world")]
        );
        assert_eq!(tokenize("'single quoted'"), vec![word("single quoted")]);
    }

    #[test]
    fn test_escaped_quotes() {
        assert_eq!(tokenize(r#""say \"hi\"""#), vec![word("say \"hi\"")]);
    }

    #[test]
    fn test_key_value() {
        assert_eq!(
            tokenize("connect host=10.0.0.2 port=8080"),
            vec![word("connect"), kv("host", "10.0.0.2"), kv("port", "8080")]
        );
    }

    #[test]
    fn test_key_value_with_quoted_value() {
        assert_eq!(tokenize(r#"host="my device""#), vec![kv("host", "my device")]);
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(tokenize("port="), vec![kv("port", "")]);
    }

    #[test]
    fn test_quoted_equals_is_a_word() {
        assert_eq!(tokenize(r#""a=b""#), vec![word("a=b")]);
        assert_eq!(tokenize("=x"), vec![word("=x")]);
    }

    #[test]
    fn test_flags() {
        assert_eq!(
            tokenize("connect dev --https"),
            vec![word("connect"), word("dev"), Token::Flag("https".to_string())]
        );
        assert!(tokenize("--HTTPS")[0].is_flag("https"));
        assert_eq!(tokenize("--"), vec![word("--")]);
        assert_eq!(tokenize("-5"), vec![word("-5")]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(tokenize(r#""open ended"#), vec![word("open ended")]);
    }

    #[test]
    fn test_split_commands_on_semicolons() {
        assert_eq!(
            split_commands(" connect dev ;led on;; status "),
            vec!["connect dev", "led on", "status"]
        );
        assert!(split_commands(" ; ").is_empty());
    }

    #[test]
    fn test_split_commands_ignores_quoted_semicolons() {
        assert_eq!(
            split_commands(r#"send POST /x {"a":"b;c"}; status"#),
            vec![r#"send POST /x {"a":"b;c"}"#, "status"]
        );
        assert_eq!(
            split_commands(r#"oled text 'x;y' ; oled text "q\";r"; joke"#),
            vec!["oled text 'x;y'", r#"oled text "q\";r""#, "joke"]
        );
    }

    #[test]
    fn test_spans_cover_raw_input() {
        let input = r#"send POST /api/x {"pin": 2}"#;
        let spans = tokenize_spanned(input);
        assert_eq!(&input[spans[0].start..spans[0].end], "send");
        assert_eq!(&input[spans[2].start..spans[2].end], "/api/x");
        assert_eq!(input[spans[2].end..].trim(), r#"{"pin": 2}"#);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(kv("a", "b").to_text(), "a=b");
        assert_eq!(Token::Flag("post".into()).to_text(), "--post");
    }
}
