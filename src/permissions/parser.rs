//! Policy document parser.
//!
//! Consumes the token stream of one document and builds a [`PolicyClass`].
//! The parser keeps a current scope, initially the class itself. Rule lines
//! are appended to the current scope; a `< ... >` bracket opens a new one.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use thiserror::Error;

use super::lexer::{LexRule, Lexer, Token, TokenStream};
use super::{PermissionRule, PolicyClass, PolicyGroup, RuleKind, ScopeKind, TargetKind};

/// Token categories of the policy grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyTokenKind {
    /// `method`, `group` or `class`.
    Type,
    /// `whitelist` or `blacklist`.
    TargetType,
    /// `guild`, `channel`, `user` or `role`.
    Group,
    /// `<` or `>`.
    Bracket,
    /// `=`.
    Operator,
    /// `:`.
    Colon,
    Number,
    Text,
}

/// Errors that abort loading of one policy document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyParseError {
    #[error("line {line}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: unexpected end of document, expected {expected}")]
    UnexpectedEnd { line: usize, expected: &'static str },

    #[error("line {line}: `{value}` is not a valid identifier")]
    InvalidId { line: usize, value: String },

    #[error("line {line}: group `{name}` is declared more than once")]
    DuplicateGroup { line: usize, name: String },
}

/// Returns the shared policy lexer.
pub fn policy_lexer() -> &'static Lexer<PolicyTokenKind> {
    static LEXER: OnceLock<Lexer<PolicyTokenKind>> = OnceLock::new();
    LEXER.get_or_init(|| {
        use PolicyTokenKind::*;

        let table: [(PolicyTokenKind, &str); 8] = [
            (Type, r"(?:method|group|class)\b"),
            (TargetType, r"(?:whitelist|blacklist)\b"),
            (Group, r"(?:channel|user|guild|role)\b"),
            (Bracket, r"[<>]"),
            (Operator, r"="),
            (Colon, r":"),
            (Number, r"[0-9]+\b"),
            (Text, r"[^\s<>=:]+"),
        ];

        let mut lexer = Lexer::new(Text);
        for (kind, pattern) in table {
            lexer.add_rule(LexRule::new(kind, pattern).expect("policy lexer pattern is valid"));
        }
        lexer
    })
}

/// Parses one policy document into the class named `name`.
pub fn parse_policy(name: &str, source: &str) -> Result<PolicyClass, PolicyParseError> {
    let mut stream = policy_lexer().lex(source);
    PolicyParser::new(name, &mut stream).parse()
}

struct PolicyParser<'a> {
    stream: &'a mut TokenStream<PolicyTokenKind>,
    class: PolicyClass,
    scope: ScopeKind,
}

impl<'a> PolicyParser<'a> {
    fn new(name: &str, stream: &'a mut TokenStream<PolicyTokenKind>) -> Self {
        Self {
            stream,
            class: PolicyClass::new(name),
            scope: ScopeKind::Class,
        }
    }

    fn parse(mut self) -> Result<PolicyClass, PolicyParseError> {
        while let Some(kind) = self.stream.current().map(|t| t.kind) {
            match kind {
                PolicyTokenKind::TargetType => {
                    let rule = self.parse_rule()?;
                    self.scope_rules().push(rule);
                }
                PolicyTokenKind::Bracket => self.parse_bracket()?,
                _ if self.next_is_operator() => {
                    let (key, value) = self.parse_property()?;
                    self.scope_properties().insert(key, value);
                }
                _ => {
                    self.stream.advance();
                }
            }
        }

        Ok(self.class)
    }

    fn scope_rules(&mut self) -> &mut Vec<PermissionRule> {
        let in_group = self.scope != ScopeKind::Class;
        self.class.scope_mut(in_group).0
    }

    fn scope_properties(&mut self) -> &mut BTreeMap<String, String> {
        let in_group = self.scope != ScopeKind::Class;
        self.class.scope_mut(in_group).1
    }

    fn next_is_operator(&self) -> bool {
        self.stream
            .peek(1)
            .is_some_and(|t| t.kind == PolicyTokenKind::Operator)
    }

    fn last_line(&self) -> usize {
        self.stream
            .current()
            .or_else(|| self.stream.peek(-1))
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn expect_current(&self, expected: &'static str) -> Result<Token<PolicyTokenKind>, PolicyParseError> {
        self.stream
            .current()
            .cloned()
            .ok_or_else(|| PolicyParseError::UnexpectedEnd {
                line: self.last_line(),
                expected,
            })
    }

    /// `("whitelist"|"blacklist") ("guild"|"channel"|"user"|"role") Number*`
    fn parse_rule(&mut self) -> Result<PermissionRule, PolicyParseError> {
        let token = self.expect_current("whitelist or blacklist")?;
        let kind = RuleKind::parse(&token.text).ok_or_else(|| unexpected(&token, "whitelist or blacklist"))?;
        self.stream.advance();

        let token = self.expect_current("guild, channel, user or role")?;
        let target = match token.kind {
            PolicyTokenKind::Group => TargetKind::parse(&token.text),
            _ => None,
        }
        .ok_or_else(|| unexpected(&token, "guild, channel, user or role"))?;
        self.stream.advance();

        let mut ids = Vec::new();
        while let Some(token) = self.stream.current() {
            if token.kind != PolicyTokenKind::Number {
                break;
            }
            let id = token.text.parse::<u64>().map_err(|_| PolicyParseError::InvalidId {
                line: token.line,
                value: token.text.clone(),
            })?;
            ids.push(id);
            self.stream.advance();
        }

        Ok(PermissionRule::new(kind, target, ids))
    }

    /// `"<" [Type] [":"] [Name] (Key "=" Value)* ">"`
    fn parse_bracket(&mut self) -> Result<(), PolicyParseError> {
        let open = self.expect_current("<")?;
        if open.text != "<" {
            return Err(unexpected(&open, "<"));
        }
        let mut token = self.advance_expect("scope type, name or >")?;

        let mut scope = ScopeKind::Method;
        if token.kind == PolicyTokenKind::Type {
            scope = ScopeKind::parse(&token.text).unwrap_or_default();
            token = self.advance_expect("name or >")?;
        }

        if token.kind == PolicyTokenKind::Colon {
            token = self.advance_expect("name or >")?;
        }

        let mut name = String::new();
        if is_word(token.kind) && !self.next_is_operator() {
            name = token.text.clone();
            self.stream.advance();
        }

        let mut properties = BTreeMap::new();
        loop {
            let token = self.expect_current(">")?;
            if token.kind == PolicyTokenKind::Bracket && token.text == ">" {
                self.stream.advance();
                break;
            }
            if !self.next_is_operator() {
                return Err(unexpected(&token, "`key=value` or >"));
            }
            let (key, value) = self.parse_property()?;
            properties.insert(key, value);
        }

        if scope == ScopeKind::Class {
            self.class.properties.extend(properties);
        } else {
            let group = PolicyGroup::new(self.class.name.clone(), name, scope, properties);
            self.class
                .add_group(group)
                .map_err(|group| PolicyParseError::DuplicateGroup {
                    line: open.line,
                    name: group.name,
                })?;
        }
        self.scope = scope;

        Ok(())
    }

    /// `Key "=" Value`, with the read position on the key.
    fn parse_property(&mut self) -> Result<(String, String), PolicyParseError> {
        let key = self.expect_current("property name")?;
        if !is_word(key.kind) {
            return Err(unexpected(&key, "property name"));
        }
        self.stream.advance();
        let value = self.advance_expect("property value")?;
        if !is_word(value.kind) {
            return Err(unexpected(&value, "property value"));
        }
        self.stream.advance();

        Ok((key.text, value.text))
    }

    fn advance_expect(&mut self, expected: &'static str) -> Result<Token<PolicyTokenKind>, PolicyParseError> {
        self.stream.advance();
        self.expect_current(expected)
    }
}

/// Tokens that may serve as a name, key or value.
fn is_word(kind: PolicyTokenKind) -> bool {
    !matches!(
        kind,
        PolicyTokenKind::Bracket | PolicyTokenKind::Operator | PolicyTokenKind::Colon
    )
}

fn unexpected(token: &Token<PolicyTokenKind>, expected: &'static str) -> PolicyParseError {
    PolicyParseError::UnexpectedToken {
        line: token.line,
        expected,
        found: token.text.clone(),
    }
}
