//! The built-in `help` command.
//!
//! `help [page]` lists the commands the caller may run; `help <command...>
//! [index]` shows one command in detail.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, InvocationContext};
use crate::commands::catalog::CatalogEntry;
use crate::commands::definitions::{CommandDef, ContainerKind, ParamSpec};
use crate::commands::help::{page_count, render_choices, render_detail, render_listing};
use crate::commands::matcher::find_matches;
use crate::commands::output::CommandOutput;
use crate::permissions::PermissionEvaluator;

pub fn definition() -> CommandDef {
    CommandDef::builder(["help"])
        .owner("help", ContainerKind::Help)
        .summary("Lists available commands or shows one command in detail.")
        .param(
            ParamSpec::string("query")
                .variadic()
                .summary("Page number, or the command to describe with an optional index."),
        )
        .example("!help 2")
        .example("!help file list")
        .build()
}

pub struct HelpHandler {
    per_page: usize,
}

impl HelpHandler {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Catalog entries the caller may see, in registration order.
    fn visible(ctx: &InvocationContext, entries: &[Arc<CatalogEntry>]) -> Vec<Arc<CatalogEntry>> {
        let evaluator = PermissionEvaluator::new(&ctx.snapshot.policies);
        entries
            .iter()
            .filter(|entry| !entry.def.hidden && evaluator.can_run(&entry.def, &ctx.actor).is_approved())
            .cloned()
            .collect()
    }

    fn listing(&self, ctx: &InvocationContext, requested: i64) -> String {
        let entries = Self::visible(ctx, ctx.snapshot.catalog.entries());
        let pages = page_count(entries.len(), self.per_page);
        let page = requested.clamp(1, pages as i64) as usize;
        render_listing(&entries, page, self.per_page, ctx.prefix)
    }

    fn detail(&self, ctx: &InvocationContext, mut query: Vec<String>) -> String {
        let selector = query.last().and_then(|last| last.parse::<usize>().ok());
        if selector.is_some() {
            query.pop();
        }

        let found = find_matches(&ctx.snapshot.catalog, &query, false);
        let matches = Self::visible(ctx, &found);

        match (matches.len(), selector) {
            (0, _) => "Unknown command.".to_string(),
            (1, _) => render_detail(&matches[0].def, ctx.prefix),
            (n, Some(index)) if (1..=n).contains(&index) => render_detail(&matches[index - 1].def, ctx.prefix),
            _ => render_choices(&matches, ctx.prefix),
        }
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn handle(&self, ctx: InvocationContext) -> anyhow::Result<CommandOutput> {
        let query: Vec<String> = ctx
            .args
            .list("query")
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect();

        let text = match query.first() {
            None => self.listing(&ctx, 1),
            Some(first) => match first.parse::<i64>() {
                Ok(page) if query.len() == 1 => self.listing(&ctx, page),
                _ => self.detail(&ctx, query),
            },
        };

        Ok(CommandOutput::info(text))
    }
}
