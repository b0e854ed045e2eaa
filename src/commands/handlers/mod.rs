//! Command handlers.
//!
//! A handler is registered together with its [`CommandDef`] and invoked by the
//! dispatcher with an explicit [`InvocationContext`]. Handlers never look up
//! ambient state; everything they may read is in the context.

pub mod help;
pub mod permissions;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::catalog::{CatalogBuilder, RegistrationError};
use super::coerce::Arguments;
use super::definitions::CommandDef;
use super::output::CommandOutput;
use crate::context::ActorContext;
use crate::engine::Snapshot;

/// Context provided to command handlers.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Who sent the command.
    pub actor: ActorContext,
    /// The matched definition.
    pub command: Arc<CommandDef>,
    /// Coerced arguments, in declaration order.
    pub args: Arguments,
    /// Snapshot the command was resolved against.
    pub snapshot: Arc<Snapshot>,
    /// Prefix character used to invoke commands.
    pub prefix: char,
}

/// Executes a matched command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: InvocationContext) -> anyhow::Result<CommandOutput>;
}

/// Adapts an async closure into a [`CommandHandler`].
pub struct FnHandler<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(InvocationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<CommandOutput>> + Send + 'static,
{
    async fn handle(&self, ctx: InvocationContext) -> anyhow::Result<CommandOutput> {
        (self.func)(ctx).await
    }
}

/// Wraps an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(func: F) -> Arc<dyn CommandHandler>
where
    F: Fn(InvocationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<CommandOutput>> + Send + 'static,
{
    Arc::new(FnHandler { func })
}

/// Registers the built-in `help` and `permissions` commands.
pub fn register_builtins(builder: &mut CatalogBuilder, per_page: usize) -> Result<(), RegistrationError> {
    builder.register(help::definition(), Arc::new(help::HelpHandler::new(per_page)))?;
    builder.register(permissions::definition(), Arc::new(permissions::PermissionsHandler))?;
    Ok(())
}
