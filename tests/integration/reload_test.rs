//! Policy directory loading and engine reload.

use std::fs;
use std::sync::Arc;

use cmdgate::commands::{
    handler_fn, BufferResponder, CatalogBuilder, CommandDef, CommandOutput, ContainerKind, DispatchOutcome,
    Dispatcher,
};
use cmdgate::permissions::load_policy_dir;
use cmdgate::{ActorContext, Engine, GateError, Snapshot};
use tempfile::TempDir;

fn engine_with_ping() -> Arc<Engine> {
    let mut builder = CatalogBuilder::new();
    builder
        .register(
            CommandDef::builder(["ping"]).owner("Net", ContainerKind::Module).build(),
            handler_fn(|_ctx| async { Ok(CommandOutput::info("pong")) }),
        )
        .unwrap();
    Arc::new(Engine::new(Snapshot::new(builder.build(), cmdgate::permissions::PolicySet::new())))
}

#[test]
fn test_broken_document_does_not_block_others() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Good.prm"), "whitelist guild 1\n").unwrap();
    fs::write(dir.path().join("Bad.prm"), "<method: add\nwhitelist user 1\n").unwrap();
    fs::write(dir.path().join("Other.PRM"), "<method: x>\nblacklist user 2\n").unwrap();

    let report = load_policy_dir(dir.path(), "prm").unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.loaded(), 2);
    assert_eq!(report.policies.names(), vec!["Good", "Other"]);
    assert_eq!(report.failures.len(), 1);

    let (path, err) = &report.failures[0];
    assert!(path.ends_with("Bad.prm"));
    assert!(matches!(err, GateError::Policy { name, .. } if name == "Bad"));
}

#[tokio::test]
async fn test_reload_publishes_new_policies() {
    let engine = engine_with_ping();
    let dispatcher = Dispatcher::new(Arc::clone(&engine), '!');
    let responder = BufferResponder::new();
    let actor = ActorContext::new(4, 1).in_guild(2);

    assert!(dispatcher.dispatch("!ping", &actor, &responder).await.is_completed());

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Net.prm"), "blacklist user 4\n").unwrap();
    let report = engine.reload_policies(dir.path(), "prm").unwrap();
    assert!(report.is_clean());

    let outcome = dispatcher.dispatch("!ping", &actor, &responder).await;
    assert!(matches!(outcome, DispatchOutcome::Denied { .. }));

    // The catalog survives a policy reload.
    assert_eq!(engine.snapshot().catalog.len(), 1);
}

#[test]
fn test_snapshot_held_by_reader_is_unchanged_by_reload() {
    let engine = engine_with_ping();
    let before = engine.snapshot();

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Net.prm"), "whitelist user 1\n").unwrap();
    engine.reload_policies(dir.path(), "prm").unwrap();

    assert!(before.policies.is_empty());
    assert_eq!(engine.snapshot().policies.len(), 1);
    assert!(Arc::ptr_eq(&before.catalog, &engine.snapshot().catalog));
}

#[test]
fn test_reload_from_missing_directory_clears_policies() {
    let engine = engine_with_ping();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Net.prm"), "whitelist user 1\n").unwrap();
    engine.reload_policies(dir.path(), "prm").unwrap();

    let report = engine.reload_policies(&dir.path().join("gone"), "prm").unwrap();
    assert_eq!(report.total, 0);
    assert!(engine.snapshot().policies.is_empty());
}
