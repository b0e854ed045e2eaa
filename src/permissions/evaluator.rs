//! Permission evaluation.
//!
//! Decides whether an actor may run a command, given the loaded policy set.
//! Evaluation is a pure read over an immutable snapshot.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{PermissionRule, PolicySet, RuleScope, IS_DM};
use crate::commands::definitions::CommandDef;
use crate::context::ActorContext;

/// Verdict of a single scope or target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Approved,
    Denied,
    /// No rule applied; the next scope decides.
    NotFound,
}

impl Status {
    /// Collapses to a decision, using `default_allow` when nothing applied.
    pub fn or_default(self, default_allow: bool) -> Decision {
        match self {
            Self::Approved => Decision::Approved,
            Self::Denied => Decision::Denied,
            Self::NotFound => Decision::from_bool(default_allow),
        }
    }
}

/// Final allow/deny answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Approved
        } else {
            Self::Denied
        }
    }

    pub fn is_approved(self) -> bool {
        self == Self::Approved
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

/// Rules declared on a command definition at registration time.
struct DeclaredFilters<'a>(&'a [PermissionRule]);

static NO_PROPERTIES: BTreeMap<String, String> = BTreeMap::new();

impl RuleScope for DeclaredFilters<'_> {
    fn rules(&self) -> &[PermissionRule] {
        self.0
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &NO_PROPERTIES
    }
}

/// Answers `can_run` questions against one policy set.
#[derive(Debug, Clone, Copy)]
pub struct PermissionEvaluator<'a> {
    policies: &'a PolicySet,
}

impl<'a> PermissionEvaluator<'a> {
    pub fn new(policies: &'a PolicySet) -> Self {
        Self { policies }
    }

    /// Decides whether `actor` may run `command`.
    ///
    /// Maintainers always pass. Otherwise the command's method group is
    /// consulted first (user, then roles, then channel, then guild), then the
    /// class level rules, then the container default.
    pub fn can_run(&self, command: &CommandDef, actor: &ActorContext) -> Decision {
        if actor.is_maintainer {
            return Decision::Approved;
        }

        if DeclaredFilters(&command.filters).resolve(actor) == Status::Denied {
            tracing::debug!(command = %command.name, "Rejected by declared filter");
            return Decision::Denied;
        }

        if command.dm_only && !actor.is_direct_message {
            return Decision::Denied;
        }

        let default_allow = command.container.default_allow();

        let Some(class) = self.policies.get(&command.owner) else {
            return Decision::from_bool(default_allow);
        };

        if let Some(group) = class.group(&command.method) {
            if let Some(is_dm) = group.flag(IS_DM).or_else(|| class.flag(IS_DM)) {
                // Informational only; channel type is not enforced here.
                tracing::debug!(
                    command = %command.name,
                    is_dm,
                    direct_message = actor.is_direct_message,
                    "IsDM property present"
                );
            }

            let status = group.resolve(actor);
            if status != Status::NotFound {
                return status.or_default(default_allow);
            }

            if group.ignores_above() {
                return Decision::from_bool(default_allow);
            }
        }

        class.resolve(actor).or_default(default_allow)
    }
}
