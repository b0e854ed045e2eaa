//! Rule-table lexer for policy documents.
//!
//! The document is split into whitespace/line delimited fragments. Inside a
//! fragment the ordered rule table is tried at the current offset and the
//! first rule that matches produces the token, so `<method:` becomes three
//! tokens. A position no rule matches becomes a one character `Text` token;
//! lexing never fails, the parser is the validation layer.

use regex::Regex;

/// A classified fragment of a policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    /// Token category.
    pub kind: K,
    /// Matched text.
    pub text: String,
    /// 1-based source line.
    pub line: usize,
}

/// A named pattern rule. The pattern is anchored at the current offset.
#[derive(Debug, Clone)]
pub struct LexRule<K> {
    kind: K,
    pattern: Regex,
}

impl<K> LexRule<K> {
    /// Creates a rule from a regex pattern; the pattern is anchored to the
    /// start of the remaining input.
    pub fn new(kind: K, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            pattern: Regex::new(&format!("^(?:{pattern})"))?,
        })
    }
}

/// Lexer with an ordered rule table and a fallback kind.
#[derive(Debug, Clone)]
pub struct Lexer<K> {
    rules: Vec<LexRule<K>>,
    fallback: K,
}

impl<K: Copy> Lexer<K> {
    /// Creates an empty lexer; unmatched input is classified as `fallback`.
    pub fn new(fallback: K) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Appends a rule. Earlier rules win.
    pub fn add_rule(&mut self, rule: LexRule<K>) {
        self.rules.push(rule);
    }

    /// Tokenizes a whole document.
    pub fn lex(&self, source: &str) -> TokenStream<K> {
        let mut tokens = Vec::new();

        for (index, line) in source.lines().enumerate() {
            for fragment in line.split_whitespace() {
                self.lex_fragment(fragment, index + 1, &mut tokens);
            }
        }

        TokenStream::new(tokens)
    }

    fn lex_fragment(&self, fragment: &str, line: usize, out: &mut Vec<Token<K>>) {
        let mut rest = fragment;

        while !rest.is_empty() {
            let matched = self.rules.iter().find_map(|rule| {
                rule.pattern
                    .find(rest)
                    .filter(|m| !m.as_str().is_empty())
                    .map(|m| (rule.kind, m.end()))
            });

            let (kind, len) = match matched {
                Some(found) => found,
                None => {
                    let len = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
                    (self.fallback, len)
                }
            };

            out.push(Token {
                kind,
                text: rest[..len].to_string(),
                line,
            });
            rest = &rest[len..];
        }
    }
}

/// Sequential reader over lexed tokens with relative lookaround.
#[derive(Debug, Clone)]
pub struct TokenStream<K> {
    tokens: Vec<Token<K>>,
    position: usize,
}

impl<K> TokenStream<K> {
    /// Wraps an already classified token list.
    pub fn new(tokens: Vec<Token<K>>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Returns the token at the read position.
    pub fn current(&self) -> Option<&Token<K>> {
        self.tokens.get(self.position)
    }

    /// Moves the read position forward and returns the new current token.
    pub fn advance(&mut self) -> Option<&Token<K>> {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        self.tokens.get(self.position)
    }

    /// Looks at the token `offset` positions away without moving.
    pub fn peek(&self, offset: isize) -> Option<&Token<K>> {
        let index = self.position.checked_add_signed(offset)?;
        self.tokens.get(index)
    }

    /// Rewinds to the first token.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether every token has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Number of tokens in the stream.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the stream has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All tokens, independent of the read position.
    pub fn tokens(&self) -> &[Token<K>] {
        &self.tokens
    }
}
