//! Command definitions.
//!
//! A [`CommandDef`] is the immutable description of one command: its literal
//! structure (`file list`), its typed parameters, the container that owns it
//! and the metadata shown by `help`. Definitions are produced with
//! [`CommandDef::builder`] at startup and handed to the catalog.

use std::fmt;
use std::sync::Arc;

use crate::commands::coerce::ArgValue;
use crate::permissions::PermissionRule;

/// What kind of container owns a command. Decides the default verdict when no
/// policy rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerKind {
    /// Commands contributed by a loaded module.
    #[default]
    Module,
    /// Built-in commands; denied unless a policy allows them.
    Internal,
    /// The built-in help command, open to everyone.
    Help,
}

impl ContainerKind {
    /// Verdict used when no policy rule applies.
    pub fn default_allow(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

/// Parser for a custom parameter type.
///
/// Implementations receive the raw token and either produce a value or
/// explain why the token is invalid.
pub trait Parseable: Send + Sync {
    fn parse(&self, token: &str) -> Result<serde_json::Value, String>;
}

impl<F> Parseable for F
where
    F: Fn(&str) -> Result<serde_json::Value, String> + Send + Sync,
{
    fn parse(&self, token: &str) -> Result<serde_json::Value, String> {
        self(token)
    }
}

/// A named set of case-insensitive variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, variants: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the declared spelling of `token`, if it names a variant.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(token))
            .map(String::as_str)
    }
}

/// A parameter type validated by a [`Parseable`] implementation.
#[derive(Clone)]
pub struct CustomType {
    pub name: String,
    pub parser: Arc<dyn Parseable>,
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .field("parser", &"<parser>")
            .finish()
    }
}

/// Declared type of a parameter.
#[derive(Debug, Clone)]
pub enum ParamType {
    String,
    Int,
    Bool,
    Enum(EnumType),
    Custom(CustomType),
}

impl ParamType {
    /// Short lowercase type name used in usage lines.
    pub fn shorthand(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Int => "int".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Enum(e) => e.name.to_lowercase(),
            Self::Custom(c) => c.name.to_lowercase(),
        }
    }
}

/// Definition of a command parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub summary: Option<String>,
    pub kind: ParamType,
    pub optional: bool,
    pub default: Option<ArgValue>,
    /// Absorbs every remaining token. Only valid as the last parameter.
    pub variadic: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            summary: None,
            kind,
            optional: false,
            default: None,
            variadic: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Bool)
    }

    pub fn enumeration(name: impl Into<String>, ty: EnumType) -> Self {
        Self::new(name, ParamType::Enum(ty))
    }

    pub fn custom(name: impl Into<String>, type_name: impl Into<String>, parser: impl Parseable + 'static) -> Self {
        Self::new(
            name,
            ParamType::Custom(CustomType {
                name: type_name.into(),
                parser: Arc::new(parser),
            }),
        )
    }

    /// Marks the parameter optional; a missing token yields its default or
    /// [`ArgValue::Unset`].
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets a default value. Implies optional.
    pub fn with_default(mut self, value: ArgValue) -> Self {
        self.optional = true;
        self.default = Some(value);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether the parameter may be left out of the input.
    pub fn accepts_missing(&self) -> bool {
        self.optional || self.has_default()
    }

    /// Usage fragment, e.g. `<params string words>`.
    pub fn usage(&self) -> String {
        let params = if self.variadic { "params " } else { "" };
        format!("<{params}{} {}>", self.kind.shorthand(), self.name.to_lowercase())
    }
}

/// Definition of a command.
#[derive(Debug, Clone)]
pub struct CommandDef {
    /// Literal path segments, matched case-sensitively.
    pub structure: Vec<String>,
    pub params: Vec<ParamSpec>,
    /// Display name shown in help.
    pub name: String,
    /// Command identity inside its container; selects the policy group.
    pub method: String,
    pub summary: Option<String>,
    pub examples: Vec<String>,
    /// Identity of the owning container; selects the policy class.
    pub owner: String,
    pub container: ContainerKind,
    pub dm_only: bool,
    /// Excluded from help listings.
    pub hidden: bool,
    /// Registration-time channel/role/guild/user filters.
    pub filters: Vec<PermissionRule>,
}

impl CommandDef {
    /// Starts a definition for the given literal structure.
    pub fn builder(structure: impl IntoIterator<Item = impl Into<String>>) -> CommandDefBuilder {
        CommandDefBuilder::new(structure.into_iter().map(Into::into).collect())
    }

    /// Number of literal segments.
    pub fn structure_len(&self) -> usize {
        self.structure.len()
    }

    /// Number of declared parameters; a variadic tail counts once.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Structure joined with spaces, e.g. `file list`.
    pub fn path(&self) -> String {
        self.structure.join(" ")
    }

    /// Full usage line without prefix, e.g. `file list <string path>`.
    pub fn usage(&self) -> String {
        let mut usage = self.path();
        for param in &self.params {
            if !usage.is_empty() {
                usage.push(' ');
            }
            usage.push_str(&param.usage());
        }
        usage
    }
}

/// Builder for [`CommandDef`].
#[derive(Debug, Clone)]
pub struct CommandDefBuilder {
    def: CommandDef,
    name_set: bool,
}

impl CommandDefBuilder {
    fn new(structure: Vec<String>) -> Self {
        let method = structure.last().cloned().unwrap_or_default();
        Self {
            def: CommandDef {
                structure,
                params: Vec::new(),
                name: method.clone(),
                method,
                summary: None,
                examples: Vec::new(),
                owner: String::new(),
                container: ContainerKind::Module,
                dm_only: false,
                hidden: false,
                filters: Vec::new(),
            },
            name_set: false,
        }
    }

    pub fn owner(mut self, owner: impl Into<String>, container: ContainerKind) -> Self {
        self.def.owner = owner.into();
        self.def.container = container;
        self
    }

    /// Sets the command identity. Also the display name unless one was set.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.def.method = method.into();
        if !self.name_set {
            self.def.name = self.def.method.clone();
        }
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.def.name = name.into();
        self.name_set = true;
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.def.summary = Some(summary.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.def.examples.push(example.into());
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.def.params.push(param);
        self
    }

    pub fn dm_only(mut self, dm_only: bool) -> Self {
        self.def.dm_only = dm_only;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.def.hidden = hidden;
        self
    }

    pub fn filter(mut self, rule: PermissionRule) -> Self {
        self.def.filters.push(rule);
        self
    }

    pub fn build(self) -> CommandDef {
        self.def
    }
}
