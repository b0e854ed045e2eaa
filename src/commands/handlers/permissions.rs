//! The built-in `permissions` command.

use async_trait::async_trait;

use super::{CommandHandler, InvocationContext};
use crate::commands::definitions::{CommandDef, ContainerKind, ParamSpec};
use crate::commands::output::CommandOutput;

pub fn definition() -> CommandDef {
    CommandDef::builder(["permissions"])
        .owner("permissions", ContainerKind::Internal)
        .summary("Shows the loaded permission policy of a command container.")
        .param(
            ParamSpec::string("container")
                .optional()
                .summary("Container to show. Lists every loaded policy when left out."),
        )
        .example("!permissions Music")
        .build()
}

pub struct PermissionsHandler;

#[async_trait]
impl CommandHandler for PermissionsHandler {
    async fn handle(&self, ctx: InvocationContext) -> anyhow::Result<CommandOutput> {
        let policies = &ctx.snapshot.policies;

        if let Some(name) = ctx.args.str("container") {
            return Ok(match policies.get(name) {
                Some(class) => CommandOutput::info(class.to_string().trim_end().to_string()),
                None => CommandOutput::error(format!("No permission policy loaded for {name}.")),
            });
        }

        if policies.is_empty() {
            return Ok(CommandOutput::info("No permission policies loaded."));
        }

        let rows = policies
            .names()
            .into_iter()
            .filter_map(|name| policies.get(name))
            .map(|class| {
                vec![
                    class.name.clone(),
                    class.rules.len().to_string(),
                    class.groups().len().to_string(),
                ]
            })
            .collect();

        Ok(CommandOutput::table(
            vec!["Class".to_string(), "Rules".to_string(), "Groups".to_string()],
            rows,
        ))
    }
}
