//! Permission policies.
//!
//! A policy document (`<container>.prm`) declares who may run the commands of
//! one command container. Documents are lexed and parsed into a
//! [`PolicyClass`]; the [`PermissionEvaluator`] answers allow/deny questions
//! against the loaded [`PolicySet`].
//!
//! ```text
//! whitelist guild 288626992373432320
//! <method: add>
//!   whitelist role 288627464450736128
//! blacklist channel 293381166365540353
//! <class>
//!   IgnoreAbove=true
//! ```

pub mod evaluator;
pub mod lexer;
pub mod loader;
pub mod parser;

pub use evaluator::{Decision, PermissionEvaluator, Status};
pub use loader::{load_policy_dir, LoadReport};
pub use parser::{parse_policy, PolicyParseError};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::context::ActorContext;

/// Property that makes a group skip class level rules when it has no verdict.
pub const IGNORE_ABOVE: &str = "IgnoreAbove";

/// Informational direct-message property.
pub const IS_DM: &str = "IsDM";

/// Whether a rule admits or excludes its identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Only listed identifiers pass.
    Whitelist,
    /// Listed identifiers are rejected, everyone else passes.
    Blacklist,
}

impl RuleKind {
    /// Parses a lexed TargetType keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "whitelist" => Some(Self::Whitelist),
            "blacklist" => Some(Self::Blacklist),
            _ => None,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitelist => write!(f, "whitelist"),
            Self::Blacklist => write!(f, "blacklist"),
        }
    }
}

/// The identifier space a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Guild,
    Channel,
    User,
    Role,
}

impl TargetKind {
    /// Parses a lexed Group keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "guild" => Some(Self::Guild),
            "channel" => Some(Self::Channel),
            "user" => Some(Self::User),
            "role" => Some(Self::Role),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guild => write!(f, "guild"),
            Self::Channel => write!(f, "channel"),
            Self::User => write!(f, "user"),
            Self::Role => write!(f, "role"),
        }
    }
}

/// Kind of a bracket scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeKind {
    Class,
    Group,
    #[default]
    Method,
}

impl ScopeKind {
    /// Parses a lexed Type keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "class" => Some(Self::Class),
            "group" => Some(Self::Group),
            "method" => Some(Self::Method),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Group => write!(f, "group"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// One `whitelist|blacklist <target> <id>*` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRule {
    pub kind: RuleKind,
    pub target: TargetKind,
    pub ids: Vec<u64>,
}

impl PermissionRule {
    pub fn new(kind: RuleKind, target: TargetKind, ids: impl Into<Vec<u64>>) -> Self {
        Self {
            kind,
            target,
            ids: ids.into(),
        }
    }

    pub fn whitelist(target: TargetKind, ids: impl Into<Vec<u64>>) -> Self {
        Self::new(RuleKind::Whitelist, target, ids)
    }

    pub fn blacklist(target: TargetKind, ids: impl Into<Vec<u64>>) -> Self {
        Self::new(RuleKind::Blacklist, target, ids)
    }

    /// Verdict of this rule for one identifier.
    pub fn check(&self, id: u64) -> Status {
        self.verdict(self.ids.contains(&id))
    }

    /// Verdict for an actor with no identifier of this kind, e.g. no guild in
    /// a direct message. A whitelist denies, a blacklist approves.
    pub fn check_absent(&self) -> Status {
        self.verdict(false)
    }

    fn verdict(&self, listed: bool) -> Status {
        match (self.kind, listed) {
            (RuleKind::Whitelist, true) | (RuleKind::Blacklist, false) => Status::Approved,
            (RuleKind::Whitelist, false) | (RuleKind::Blacklist, true) => Status::Denied,
        }
    }
}

impl fmt::Display for PermissionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target)?;
        for id in &self.ids {
            write!(f, " {id}")?;
        }
        Ok(())
    }
}

/// A set of rules and properties, either a whole class or a named group.
pub trait RuleScope {
    /// Rules in declaration order.
    fn rules(&self) -> &[PermissionRule];

    /// Scope properties.
    fn properties(&self) -> &BTreeMap<String, String>;

    /// Combined verdict of every rule for `target`. Any denying rule wins;
    /// no rule of that kind yields `NotFound`. `None` means the actor has no
    /// identifier of that kind and is a member of nothing.
    fn status_for(&self, target: TargetKind, id: Option<u64>) -> Status {
        let mut status = Status::NotFound;
        for rule in self.rules().iter().filter(|r| r.target == target) {
            let verdict = match id {
                Some(id) => rule.check(id),
                None => rule.check_absent(),
            };
            match verdict {
                Status::Denied => return Status::Denied,
                verdict => status = verdict,
            }
        }
        status
    }

    /// Resolves the scope for an actor in precedence User > Role > Channel > Guild.
    fn resolve(&self, actor: &ActorContext) -> Status {
        let user = self.status_for(TargetKind::User, Some(actor.user_id));
        if user != Status::NotFound {
            return user;
        }

        let mut role = Status::NotFound;
        for role_id in &actor.role_ids {
            match self.status_for(TargetKind::Role, Some(*role_id)) {
                Status::Approved => {
                    role = Status::Approved;
                    break;
                }
                Status::Denied => role = Status::Denied,
                Status::NotFound => {}
            }
        }
        if role != Status::NotFound {
            return role;
        }

        let channel = self.status_for(TargetKind::Channel, Some(actor.channel_id));
        if channel != Status::NotFound {
            return channel;
        }

        self.status_for(TargetKind::Guild, actor.guild_id)
    }

    /// Reads a boolean property, case-insensitively. Missing or malformed is `None`.
    fn flag(&self, key: &str) -> Option<bool> {
        self.properties()
            .get(key)
            .and_then(|value| match value.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            })
    }
}

/// A named sub-scope of a policy class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyGroup {
    /// Name of the owning class.
    pub class: String,
    pub name: String,
    pub scope: ScopeKind,
    pub rules: Vec<PermissionRule>,
    pub properties: BTreeMap<String, String>,
}

impl PolicyGroup {
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        scope: ScopeKind,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            scope,
            rules: Vec::new(),
            properties,
        }
    }

    /// Whether class level rules are skipped when this group has no verdict.
    pub fn ignores_above(&self) -> bool {
        self.flag(IGNORE_ABOVE).unwrap_or(false)
    }
}

impl RuleScope for PolicyGroup {
    fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// The parsed policy document of one command container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyClass {
    pub name: String,
    pub rules: Vec<PermissionRule>,
    pub properties: BTreeMap<String, String>,
    groups: Vec<PolicyGroup>,
}

impl PolicyClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Looks up a group by name.
    pub fn group(&self, name: &str) -> Option<&PolicyGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Groups in declaration order.
    pub fn groups(&self) -> &[PolicyGroup] {
        &self.groups
    }

    /// Adds a group. Returns the group back if the name is taken.
    pub fn add_group(&mut self, group: PolicyGroup) -> Result<(), PolicyGroup> {
        if self.group(&group.name).is_some() {
            return Err(group);
        }
        self.groups.push(group);
        Ok(())
    }

    /// Rules and properties that new lines are added to: the class itself, or
    /// the most recently opened group when `in_group` is set.
    pub(crate) fn scope_mut(&mut self, in_group: bool) -> (&mut Vec<PermissionRule>, &mut BTreeMap<String, String>) {
        match self.groups.last_mut() {
            Some(group) if in_group => (&mut group.rules, &mut group.properties),
            _ => (&mut self.rules, &mut self.properties),
        }
    }
}

impl RuleScope for PolicyClass {
    fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

fn write_bracket(
    f: &mut fmt::Formatter<'_>,
    scope: ScopeKind,
    name: &str,
    properties: &BTreeMap<String, String>,
) -> fmt::Result {
    write!(f, "<{scope}")?;
    if !name.is_empty() {
        write!(f, ": {name}")?;
    }
    for (key, value) in properties {
        write!(f, " {key}={value}")?;
    }
    writeln!(f, ">")
}

/// Canonical document form. Parsing the output yields an equal class.
impl fmt::Display for PolicyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        for group in &self.groups {
            write_bracket(f, group.scope, &group.name, &group.properties)?;
            for rule in &group.rules {
                writeln!(f, "  {rule}")?;
            }
        }
        if !self.properties.is_empty() {
            write_bracket(f, ScopeKind::Class, "", &self.properties)?;
        }
        Ok(())
    }
}

/// All loaded policy classes, keyed by container identity.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    classes: HashMap<String, Arc<PolicyClass>>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a class, replacing any previous class of the same name.
    pub fn insert(&mut self, class: PolicyClass) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    pub fn get(&self, container: &str) -> Option<&Arc<PolicyClass>> {
        self.classes.get(container)
    }

    /// Class names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<PolicyClass> for PolicySet {
    fn from_iter<I: IntoIterator<Item = PolicyClass>>(iter: I) -> Self {
        let mut set = Self::new();
        for class in iter {
            set.insert(class);
        }
        set
    }
}
