//! Best-match command selection.
//!
//! A candidate matches when its literal structure equals the leading input
//! tokens and every parameter is satisfied by the remaining tokens. The
//! specificity score is `2 * structure_len + param_count`, so a longer literal
//! path always outranks a shorter one with a single extra parameter. Equal
//! scores go to the command registered first.

use std::sync::Arc;

use super::catalog::{Catalog, CatalogEntry};
use super::coerce::shape_matches;
use super::definitions::{CommandDef, ParamSpec};

/// The selected command and its score.
#[derive(Debug, Clone)]
pub struct Match {
    pub entry: Arc<CatalogEntry>,
    pub score: usize,
}

impl Match {
    /// Tokens following the literal structure.
    pub fn arguments<'t>(&self, tokens: &'t [String]) -> &'t [String] {
        tokens
            .get(self.entry.def.structure_len()..)
            .unwrap_or_default()
    }
}

/// Finds the best command for `tokens` (prefix already stripped).
pub fn find(catalog: &Catalog, tokens: &[String]) -> Option<Match> {
    let mut best: Option<Match> = None;

    for entry in catalog.candidates(tokens.len()) {
        let Some(score) = score(&entry.def, tokens) else {
            continue;
        };

        let better = match &best {
            None => true,
            Some(current) => {
                score > current.score || (score == current.score && entry.seq < current.entry.seq)
            }
        };
        if better {
            best = Some(Match {
                entry: Arc::clone(entry),
                score,
            });
        }
    }

    best
}

/// Specificity score of `def` for `tokens`, or `None` if it does not match.
pub fn score(def: &CommandDef, tokens: &[String]) -> Option<usize> {
    let len = def.structure_len();
    if tokens.len() < len || tokens[..len] != def.structure[..] {
        return None;
    }

    params_match(&def.params, &tokens[len..]).then(|| 2 * len + def.param_count())
}

/// Every entry whose structure agrees with `tokens`, in registration order.
///
/// Input shorter than a structure matches as a prefix, so `file` finds both
/// `file list` and `file read`. With `validate_params` the remaining tokens
/// must also satisfy the parameters.
pub fn find_matches(catalog: &Catalog, tokens: &[String], validate_params: bool) -> Vec<Arc<CatalogEntry>> {
    catalog
        .entries()
        .iter()
        .filter(|entry| {
            let def = &entry.def;
            let shared = def.structure_len().min(tokens.len());
            if tokens[..shared] != def.structure[..shared] {
                return false;
            }
            !validate_params || score(def, tokens).is_some()
        })
        .cloned()
        .collect()
}

/// The command whose literal structure matches `tokens` although its
/// parameters do not; the longest structure wins, then the first registered.
///
/// Used to report an argument error instead of "not found" for a near miss.
pub fn closest(catalog: &Catalog, tokens: &[String]) -> Option<Arc<CatalogEntry>> {
    catalog
        .candidates(tokens.len())
        .filter(|entry| {
            let len = entry.def.structure_len();
            len > 0 && tokens[..len] == entry.def.structure[..]
        })
        .max_by(|a, b| {
            a.def
                .structure_len()
                .cmp(&b.def.structure_len())
                .then(b.seq.cmp(&a.seq))
        })
        .cloned()
}

fn params_match(params: &[ParamSpec], rest: &[String]) -> bool {
    for (i, param) in params.iter().enumerate() {
        if param.variadic {
            return true;
        }
        match rest.get(i) {
            Some(token) if !shape_matches(&param.kind, token) => return false,
            Some(_) => {}
            None if !param.accepts_missing() => return false,
            None => {}
        }
    }
    true
}
