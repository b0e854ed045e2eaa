//! The command catalog.
//!
//! Definitions are indexed by structure length, then by declared parameter
//! count. A [`CatalogBuilder`] validates each definition as it is registered;
//! [`CatalogBuilder::build`] freezes the result into a read-only [`Catalog`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::coerce::ArgValue;
use super::definitions::{CommandDef, ParamType};
use super::handlers::CommandHandler;

/// A definition was rejected by [`CatalogBuilder::register`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("command `{command}` has an empty display name")]
    EmptyName { command: String },

    #[error("command `{command}` has an empty structure segment at {index}")]
    EmptySegment { command: String, index: usize },

    #[error("command `{command}`: variadic parameter `{param}` must be the last parameter")]
    VariadicNotLast { command: String, param: String },

    #[error("command `{command}` declares parameter `{param}` more than once")]
    DuplicateParam { command: String, param: String },

    #[error("command `{command}`: default of `{param}` is not a valid value")]
    InvalidDefault { command: String, param: String },

    #[error("command `{command}` is already registered by `{owner}`")]
    Duplicate { command: String, owner: String },
}

/// A registered command together with its handler.
pub struct CatalogEntry {
    pub def: Arc<CommandDef>,
    pub handler: Arc<dyn CommandHandler>,
    /// Registration order, used to break ties between equal scores.
    pub seq: usize,
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("def", &self.def.path())
            .field("owner", &self.def.owner)
            .field("seq", &self.seq)
            .finish()
    }
}

type Buckets = BTreeMap<usize, BTreeMap<usize, Vec<Arc<CatalogEntry>>>>;

/// Read-only command index.
#[derive(Debug, Default)]
pub struct Catalog {
    buckets: Buckets,
    entries: Vec<Arc<CatalogEntry>>,
}

impl Catalog {
    /// Entries whose structure fits into `token_count` tokens, shortest
    /// structures first.
    pub fn candidates(&self, token_count: usize) -> impl Iterator<Item = &Arc<CatalogEntry>> {
        self.buckets
            .range(..=token_count)
            .flat_map(|(_, by_params)| by_params.values())
            .flatten()
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[Arc<CatalogEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects and validates registrations before publishing a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
    keys: HashSet<(String, String, Vec<String>, usize)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `def` and appends it to its bucket.
    pub fn register(
        &mut self,
        def: CommandDef,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistrationError> {
        validate(&def)?;

        let key = (
            def.owner.clone(),
            def.method.clone(),
            def.structure.clone(),
            def.param_count(),
        );
        if self.keys.contains(&key) {
            return Err(RegistrationError::Duplicate {
                command: def.path(),
                owner: def.owner.clone(),
            });
        }
        self.keys.insert(key);

        let entry = Arc::new(CatalogEntry {
            seq: self.catalog.entries.len(),
            def: Arc::new(def),
            handler,
        });
        tracing::debug!(
            command = %entry.def.path(),
            owner = %entry.def.owner,
            params = entry.def.param_count(),
            "Registered command"
        );

        self.catalog
            .buckets
            .entry(entry.def.structure_len())
            .or_default()
            .entry(entry.def.param_count())
            .or_default()
            .push(Arc::clone(&entry));
        self.catalog.entries.push(entry);

        Ok(())
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}

fn validate(def: &CommandDef) -> Result<(), RegistrationError> {
    let command = def.path();

    if def.name.trim().is_empty() {
        return Err(RegistrationError::EmptyName { command });
    }

    if let Some(index) = def.structure.iter().position(|s| s.trim().is_empty()) {
        return Err(RegistrationError::EmptySegment { command, index });
    }

    let mut seen = HashSet::new();
    for (i, param) in def.params.iter().enumerate() {
        if param.variadic && i + 1 != def.params.len() {
            return Err(RegistrationError::VariadicNotLast {
                command,
                param: param.name.clone(),
            });
        }
        if !seen.insert(param.name.as_str()) {
            return Err(RegistrationError::DuplicateParam {
                command,
                param: param.name.clone(),
            });
        }
        if let (ParamType::Enum(ty), Some(ArgValue::Enum { variant, .. })) = (&param.kind, &param.default) {
            if ty.resolve(variant).is_none() {
                return Err(RegistrationError::InvalidDefault {
                    command,
                    param: param.name.clone(),
                });
            }
        }
    }

    Ok(())
}
