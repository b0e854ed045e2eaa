//! Dispatch integration tests.
//!
//! Registers a small file module next to the built-ins and drives messages
//! through the dispatcher.

use std::sync::Arc;

use cmdgate::commands::router::{DENIED_REPLY, FAILURE_REPLY, NOT_FOUND_REPLY};
use cmdgate::commands::{
    handler_fn, register_builtins, ArgValue, BufferResponder, CatalogBuilder, CoercionError, CommandDef,
    CommandOutput, ContainerKind, DispatchOutcome, Dispatcher, ParamSpec,
};
use cmdgate::permissions::{parse_policy, PolicySet};
use cmdgate::{ActorContext, Engine, Snapshot};
use pretty_assertions::assert_eq;

fn file_commands(builder: &mut CatalogBuilder) {
    builder
        .register(
            CommandDef::builder(["file", "list"])
                .owner("Files", ContainerKind::Module)
                .summary("Lists a directory.")
                .param(ParamSpec::string("path"))
                .build(),
            handler_fn(|ctx| async move {
                let path = ctx.args.str("path").unwrap_or_default().to_string();
                Ok(CommandOutput::info(format!("Listing {path}")))
            }),
        )
        .unwrap();

    builder
        .register(
            CommandDef::builder(["roll"])
                .owner("Dice", ContainerKind::Module)
                .param(ParamSpec::int("sides").with_default(ArgValue::Int(6)))
                .build(),
            handler_fn(|ctx| async move {
                Ok(CommandOutput::info(format!("d{}", ctx.args.int("sides").unwrap_or_default())))
            }),
        )
        .unwrap();

    builder
        .register(
            CommandDef::builder(["fail"]).owner("Debug", ContainerKind::Module).build(),
            handler_fn(|_ctx| async { Err(anyhow::anyhow!("disk on fire")) }),
        )
        .unwrap();

    builder
        .register(
            CommandDef::builder(["boom"]).owner("Debug", ContainerKind::Module).build(),
            handler_fn(|_ctx| async { panic!("kaboom") }),
        )
        .unwrap();

    builder
        .register(
            CommandDef::builder(["whisper"])
                .owner("Debug", ContainerKind::Module)
                .dm_only(true)
                .build(),
            handler_fn(|_ctx| async { Ok(CommandOutput::info("psst")) }),
        )
        .unwrap();
}

fn dispatcher(policies: PolicySet) -> Dispatcher {
    let mut builder = CatalogBuilder::new();
    register_builtins(&mut builder, 20).unwrap();
    file_commands(&mut builder);
    let engine = Engine::new(Snapshot::new(builder.build(), policies));
    Dispatcher::new(Arc::new(engine), '!')
}

fn policies(docs: &[(&str, &str)]) -> PolicySet {
    docs.iter()
        .map(|(name, source)| parse_policy(name, source).unwrap())
        .collect()
}

fn member() -> ActorContext {
    ActorContext::new(10, 5).in_guild(9)
}

fn replies(responder: &BufferResponder) -> Vec<String> {
    responder.take().into_iter().map(|(_, text)| text).collect()
}

#[tokio::test]
async fn test_file_list_coerces_argument() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!file list Modules", &member(), &responder).await;

    assert_eq!(
        outcome,
        DispatchOutcome::Completed {
            command: "file list".to_string()
        }
    );
    assert_eq!(replies(&responder), vec!["Listing Modules".to_string()]);
}

#[tokio::test]
async fn test_missing_required_argument_is_an_error() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!file list", &member(), &responder).await;

    assert_eq!(
        outcome,
        DispatchOutcome::InvalidArguments {
            command: "file list".to_string(),
            error: CoercionError::MissingArgument {
                position: 0,
                name: "path".to_string(),
            },
        }
    );
    let sent = replies(&responder);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("path"));
}

#[tokio::test]
async fn test_default_fills_missing_argument() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    dispatcher.dispatch("!roll", &member(), &responder).await;
    dispatcher.dispatch("!roll 20", &member(), &responder).await;

    assert_eq!(replies(&responder), vec!["d6".to_string(), "d20".to_string()]);
}

#[tokio::test]
async fn test_unknown_command_replies_not_found() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!dance", &member(), &responder).await;

    assert_eq!(outcome, DispatchOutcome::NotFound { silent: false });
    assert_eq!(replies(&responder), vec![NOT_FOUND_REPLY.to_string()]);
}

#[tokio::test]
async fn test_silent_invocation_suppresses_not_found() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("maybe {dance} later", &member(), &responder).await;
    assert_eq!(outcome, DispatchOutcome::NotFound { silent: true });
    assert!(replies(&responder).is_empty());

    let outcome = dispatcher.dispatch("try {!file list docs}", &member(), &responder).await;
    assert!(outcome.is_completed());
    assert_eq!(replies(&responder), vec!["Listing docs".to_string()]);
}

#[tokio::test]
async fn test_silent_near_miss_stays_quiet() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher
        .dispatch("yesterday I ran {file list} by hand", &member(), &responder)
        .await;
    assert_eq!(outcome, DispatchOutcome::NotFound { silent: true });
    assert!(replies(&responder).is_empty());

    let outcome = dispatcher.dispatch("!file list", &member(), &responder).await;
    assert!(matches!(outcome, DispatchOutcome::InvalidArguments { .. }));
    assert_eq!(replies(&responder).len(), 1);
}

#[tokio::test]
async fn test_plain_text_is_not_a_command() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("hello everyone", &member(), &responder).await;

    assert_eq!(outcome, DispatchOutcome::NotACommand);
    assert!(replies(&responder).is_empty());
}

#[tokio::test]
async fn test_denied_command_never_runs_handler() {
    let dispatcher = dispatcher(policies(&[("Files", "whitelist guild 1")]));
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!file list Modules", &member(), &responder).await;

    assert_eq!(
        outcome,
        DispatchOutcome::Denied {
            command: "file list".to_string()
        }
    );
    assert_eq!(replies(&responder), vec![DENIED_REPLY.to_string()]);
}

#[tokio::test]
async fn test_group_channel_rule_outranks_class_guild_rule() {
    let dispatcher = dispatcher(policies(&[(
        "Files",
        "whitelist guild 9\n<method: list>\nblacklist channel 5\n",
    )]));
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!file list Modules", &member(), &responder).await;

    assert!(matches!(outcome, DispatchOutcome::Denied { .. }));
}

#[tokio::test]
async fn test_maintainer_bypasses_policies() {
    let dispatcher = dispatcher(policies(&[("Files", "blacklist user 10\n")]));
    let responder = BufferResponder::new();

    let outcome = dispatcher
        .dispatch("!file list Modules", &member().maintainer(true), &responder)
        .await;

    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_dm_only_command() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!whisper", &member(), &responder).await;
    assert!(matches!(outcome, DispatchOutcome::Denied { .. }));

    let outcome = dispatcher
        .dispatch("!whisper", &ActorContext::new(10, 77).direct_message(), &responder)
        .await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_handler_error_is_contained() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!fail", &member(), &responder).await;

    assert_eq!(
        outcome,
        DispatchOutcome::Failed {
            command: "fail".to_string(),
            reason: "disk on fire".to_string(),
        }
    );
    assert_eq!(replies(&responder), vec![FAILURE_REPLY.to_string()]);
}

#[tokio::test]
async fn test_handler_panic_is_contained() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!boom", &member(), &responder).await;
    assert_eq!(
        outcome,
        DispatchOutcome::Failed {
            command: "boom".to_string(),
            reason: "kaboom".to_string(),
        }
    );

    // The dispatcher keeps working afterwards.
    let outcome = dispatcher.dispatch("!roll", &member(), &responder).await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_help_lists_only_permitted_commands() {
    let dispatcher = dispatcher(policies(&[("Debug", "blacklist user 10\n")]));
    let responder = BufferResponder::new();

    let outcome = dispatcher.dispatch("!help", &member(), &responder).await;
    assert!(outcome.is_completed());

    let text = replies(&responder).join("\n");
    assert!(text.contains("file list"));
    assert!(text.contains("roll"));
    assert!(!text.contains("boom"));
    // Internal commands are denied by default.
    assert!(!text.contains("permissions"));
}

#[tokio::test]
async fn test_help_detail() {
    let dispatcher = dispatcher(PolicySet::new());
    let responder = BufferResponder::new();

    dispatcher.dispatch("!help file list", &member(), &responder).await;

    let text = replies(&responder).join("\n");
    assert!(text.starts_with("list command:"));
    assert!(text.contains("Lists a directory."));
    assert!(text.contains("!file list <string path>"));
}

#[tokio::test]
async fn test_permissions_command_for_maintainer() {
    let dispatcher = dispatcher(policies(&[("Files", "whitelist guild 9\n")]));
    let responder = BufferResponder::new();

    let denied = dispatcher.dispatch("!permissions Files", &member(), &responder).await;
    assert!(matches!(denied, DispatchOutcome::Denied { .. }));
    responder.take();

    let outcome = dispatcher
        .dispatch("!permissions Files", &member().maintainer(true), &responder)
        .await;
    assert!(outcome.is_completed());
    assert_eq!(replies(&responder), vec!["whitelist guild 9".to_string()]);
}
