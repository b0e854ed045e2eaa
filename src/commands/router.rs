//! Command dispatch.
//!
//! Turns raw message text into a handler call: extract the invocation, match
//! it against the catalog, check permissions, coerce arguments and run the
//! handler. When no command matches but one agrees on its literal structure,
//! that command's argument error is reported instead of "not found". Silent
//! invocations never report near misses.
//!
//! Every rejection is answered through the [`Responder`]; nothing that happens
//! inside a handler escapes [`Dispatcher::dispatch`].

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::coerce::{coerce_arguments, CoercionError};
use super::handlers::InvocationContext;
use super::matcher;
use crate::context::ActorContext;
use crate::engine::Engine;
use crate::error::{GateError, Result};
use crate::permissions::PermissionEvaluator;

pub const NOT_FOUND_REPLY: &str = "Command not found.";
pub const DENIED_REPLY: &str = "You do not have permission to run this command.";
pub const FAILURE_REPLY: &str = "Something went wrong while running this command.";

/// Delivers reply text to the channel a command came from.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, channel_id: u64, text: &str) -> Result<()>;
}

/// Responder that keeps replies in memory.
#[derive(Debug, Default)]
pub struct BufferResponder {
    replies: Mutex<Vec<(u64, String)>>,
}

impl BufferResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every reply sent so far.
    pub fn take(&self) -> Vec<(u64, String)> {
        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *replies)
    }
}

#[async_trait]
impl Responder for BufferResponder {
    async fn send(&self, channel_id: u64, text: &str) -> Result<()> {
        self.replies
            .lock()
            .map_err(|_| GateError::delivery("reply buffer poisoned"))?
            .push((channel_id, text.to_string()));
        Ok(())
    }
}

/// A command invocation found in message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Command text without prefix or braces.
    pub text: &'a str,
    /// Silent invocations get no "not found" reply.
    pub silent: bool,
}

/// Finds the command in `message`, if any.
///
/// `!cmd args` is a normal invocation. Otherwise the first `{...}` span is a
/// silent invocation, with an optional prefix inside the braces.
pub fn extract_invocation(message: &str, prefix: char) -> Option<Invocation<'_>> {
    if let Some(text) = message.strip_prefix(prefix) {
        return Some(Invocation { text, silent: false });
    }

    let start = message.find('{')?;
    let end = start + message[start..].find('}')?;
    let inner = &message[start + 1..end];

    Some(Invocation {
        text: inner.strip_prefix(prefix).unwrap_or(inner),
        silent: true,
    })
}

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The message holds no invocation.
    NotACommand,
    NotFound {
        silent: bool,
    },
    Denied {
        command: String,
    },
    InvalidArguments {
        command: String,
        #[serde(serialize_with = "serialize_display")]
        error: CoercionError,
    },
    Completed {
        command: String,
    },
    /// The handler returned an error or panicked.
    Failed {
        command: String,
        reason: String,
    },
}

fn serialize_display<S: serde::Serializer>(err: &CoercionError, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(err)
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Resolves and runs commands against the engine's current snapshot.
pub struct Dispatcher {
    engine: Arc<Engine>,
    prefix: char,
}

impl Dispatcher {
    pub fn new(engine: Arc<Engine>, prefix: char) -> Self {
        Self { engine, prefix }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Dispatches one message sent by `actor`.
    pub async fn dispatch(&self, message: &str, actor: &ActorContext, responder: &dyn Responder) -> DispatchOutcome {
        let Some(invocation) = extract_invocation(message, self.prefix) else {
            return DispatchOutcome::NotACommand;
        };

        let tokens: Vec<String> = invocation.text.split_whitespace().map(String::from).collect();
        let snapshot = self.engine.snapshot();

        let entry = match matcher::find(&snapshot.catalog, &tokens) {
            Some(found) => found.entry,
            None => match matcher::closest(&snapshot.catalog, &tokens).filter(|_| !invocation.silent) {
                Some(entry) => entry,
                None => {
                    debug!(input = invocation.text, silent = invocation.silent, "No matching command");
                    if !invocation.silent {
                        reply(responder, actor, NOT_FOUND_REPLY).await;
                    }
                    return DispatchOutcome::NotFound {
                        silent: invocation.silent,
                    };
                }
            },
        };

        let def = Arc::clone(&entry.def);
        let command = def.path();

        let decision = PermissionEvaluator::new(&snapshot.policies).can_run(&def, actor);
        if !decision.is_approved() {
            debug!(command = %command, user = actor.user_id, "Permission denied");
            reply(responder, actor, DENIED_REPLY).await;
            return DispatchOutcome::Denied { command };
        }

        let arg_tokens = tokens.get(def.structure_len()..).unwrap_or_default();
        let args = match coerce_arguments(&def.params, arg_tokens) {
            Ok(args) => args,
            Err(err) => {
                debug!(command = %command, error = %err, "Argument coercion failed");
                reply(responder, actor, &err.to_string()).await;
                return DispatchOutcome::InvalidArguments { command, error: err };
            }
        };

        let ctx = InvocationContext {
            actor: actor.clone(),
            command: def,
            args,
            snapshot: Arc::clone(&snapshot),
            prefix: self.prefix,
        };

        let result = AssertUnwindSafe(entry.handler.handle(ctx))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(output)) => {
                if let Some(text) = output.render() {
                    reply(responder, actor, &text).await;
                }
                DispatchOutcome::Completed { command }
            }
            Ok(Err(err)) => {
                error!(command = %command, error = %err, "Unable to run command");
                reply(responder, actor, FAILURE_REPLY).await;
                DispatchOutcome::Failed {
                    command,
                    reason: err.to_string(),
                }
            }
            Err(panic) => {
                let reason = panic_message(&*panic);
                error!(command = %command, panic = %reason, "Command handler panicked");
                reply(responder, actor, FAILURE_REPLY).await;
                DispatchOutcome::Failed { command, reason }
            }
        }
    }
}

async fn reply(responder: &dyn Responder, actor: &ActorContext, text: &str) {
    if let Err(err) = responder.send(actor.channel_id, text).await {
        warn!(channel = actor.channel_id, error = %err, "Failed to deliver reply");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
