//! Help text rendering.

use std::sync::Arc;

use super::catalog::CatalogEntry;
use super::definitions::CommandDef;

const NO_DESCRIPTION: &str = "No description.";

/// Number of pages needed for `count` commands, at least one.
pub fn page_count(count: usize, per_page: usize) -> usize {
    count.div_ceil(per_page.max(1)).max(1)
}

/// Renders one page of the command listing. `page` is 1-based and already
/// clamped by the caller.
pub fn render_listing(entries: &[Arc<CatalogEntry>], page: usize, per_page: usize, prefix: char) -> String {
    let per_page = per_page.max(1);
    let pages = page_count(entries.len(), per_page);

    let mut out = String::new();
    out.push_str(&format!("{prefix}help <page> -- To change page.\n"));
    out.push_str(&format!(
        "{prefix}help <command> -- To view a command in more detail.\n\n"
    ));
    out.push_str(&format!("Page {page}/{pages}:\n"));

    for entry in entries.iter().skip((page - 1) * per_page).take(per_page) {
        let summary = entry.def.summary.as_deref().unwrap_or(NO_DESCRIPTION);
        out.push_str(&format!("  {prefix}{} -- {summary}\n", entry.def.path()));
    }

    out.trim_end().to_string()
}

/// Detail view of one command.
pub fn render_detail(def: &CommandDef, prefix: char) -> String {
    let mut out = format!("{} command:\n", def.name);
    out.push_str(def.summary.as_deref().unwrap_or(NO_DESCRIPTION));
    out.push('\n');
    out.push_str(&format!("  {prefix}{}\n", def.usage()));

    for (i, param) in def.params.iter().enumerate() {
        let summary = param.summary.as_deref().unwrap_or(NO_DESCRIPTION);
        out.push_str(&format!("   {}: {} -- {summary}\n", i + 1, param.name));
    }

    if !def.examples.is_empty() {
        out.push_str("\nExample:");
        for example in &def.examples {
            out.push('\n');
            out.push_str(example);
        }
    }

    out.trim_end().to_string()
}

/// Numbered list shown when a help query is ambiguous.
pub fn render_choices(entries: &[Arc<CatalogEntry>], prefix: char) -> String {
    let mut out = format!(
        "{} commands found, please be more specific or add an index to the end of the help command\n",
        entries.len()
    );
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!("  {} {prefix}{}\n", i + 1, entry.def.path()));
    }
    out.trim_end().to_string()
}
