//! Policy parsing and evaluation through the public API.

use cmdgate::commands::{CommandDef, ContainerKind};
use cmdgate::permissions::{
    parse_policy, Decision, PermissionEvaluator, PolicyParseError, PolicySet, RuleKind, RuleScope, ScopeKind,
    TargetKind,
};
use cmdgate::ActorContext;
use pretty_assertions::assert_eq;

const MUSIC: &str = "\
whitelist guild 288626992373432320
<method: add>
  whitelist role 288627464450736128
blacklist channel 293381166365540353
<class>
  IgnoreAbove=true
";

fn music_command(method: &str) -> CommandDef {
    CommandDef::builder(["music", method])
        .owner("Music", ContainerKind::Module)
        .build()
}

fn music_policies() -> PolicySet {
    std::iter::once(parse_policy("Music", MUSIC).unwrap()).collect()
}

#[test]
fn test_example_document_structure() {
    let class = parse_policy("Music", MUSIC).unwrap();

    assert_eq!(class.rules.len(), 1);
    assert_eq!(class.rules[0].kind, RuleKind::Whitelist);
    assert_eq!(class.rules[0].target, TargetKind::Guild);
    assert_eq!(class.properties.get("IgnoreAbove").map(String::as_str), Some("true"));

    let add = class.group("add").unwrap();
    assert_eq!(add.scope, ScopeKind::Method);
    assert_eq!(add.rules.len(), 2);
    assert_eq!(add.rules[1].target, TargetKind::Channel);
}

#[test]
fn test_round_trip_is_stable() {
    let class = parse_policy("Music", MUSIC).unwrap();
    let reparsed = parse_policy("Music", &class.to_string()).unwrap();
    assert_eq!(reparsed, class);
    assert_eq!(reparsed.to_string(), class.to_string());
}

#[test]
fn test_role_grants_group_access() {
    let policies = music_policies();
    let eval = PermissionEvaluator::new(&policies);

    let dj = ActorContext::new(1, 2)
        .in_guild(5)
        .with_roles([11, 288627464450736128]);
    assert_eq!(eval.can_run(&music_command("add"), &dj), Decision::Approved);

    let listener = ActorContext::new(1, 2).in_guild(288626992373432320).with_roles([11]);
    assert_eq!(eval.can_run(&music_command("add"), &listener), Decision::Denied);
}

#[test]
fn test_class_rule_applies_to_commands_without_group() {
    let policies = music_policies();
    let eval = PermissionEvaluator::new(&policies);

    let home = ActorContext::new(1, 2).in_guild(288626992373432320);
    let elsewhere = ActorContext::new(1, 2).in_guild(3);

    assert_eq!(eval.can_run(&music_command("skip"), &home), Decision::Approved);
    assert_eq!(eval.can_run(&music_command("skip"), &elsewhere), Decision::Denied);
}

#[test]
fn test_group_channel_outranks_class_guild() {
    let policies: PolicySet = std::iter::once(
        parse_policy("Files", "whitelist guild 9\n<method: list>\nblacklist channel 5\n").unwrap(),
    )
    .collect();
    let eval = PermissionEvaluator::new(&policies);
    let command = CommandDef::builder(["file", "list"])
        .owner("Files", ContainerKind::Module)
        .build();

    let actor = ActorContext::new(1, 5).in_guild(9);
    assert_eq!(eval.can_run(&command, &actor), Decision::Denied);
}

#[test]
fn test_ignore_above_returns_default() {
    let source = "blacklist guild 9\n<method: list IgnoreAbove=true>\nwhitelist user 1\n";
    let policies: PolicySet = std::iter::once(parse_policy("Files", source).unwrap()).collect();
    let eval = PermissionEvaluator::new(&policies);
    let command = CommandDef::builder(["file", "list"])
        .owner("Files", ContainerKind::Module)
        .build();

    // A whitelist denies non-members, so the group still has a verdict.
    let actor = ActorContext::new(2, 5).in_guild(9);
    assert_eq!(eval.can_run(&command, &actor), Decision::Denied);

    let source = "blacklist guild 9\n<method: list IgnoreAbove=true>\n";
    let policies: PolicySet = std::iter::once(parse_policy("Files", source).unwrap()).collect();
    let eval = PermissionEvaluator::new(&policies);
    assert_eq!(eval.can_run(&command, &actor), Decision::Approved);

    let source = "blacklist guild 9\n<method: list>\n";
    let policies: PolicySet = std::iter::once(parse_policy("Files", source).unwrap()).collect();
    let eval = PermissionEvaluator::new(&policies);
    assert_eq!(eval.can_run(&command, &actor), Decision::Denied);
}

#[test]
fn test_maintainer_is_always_approved() {
    let policies = music_policies();
    let eval = PermissionEvaluator::new(&policies);
    let actor = ActorContext::new(1, 293381166365540353).in_guild(3).maintainer(true);

    assert_eq!(eval.can_run(&music_command("add"), &actor), Decision::Approved);
}

#[test]
fn test_internal_container_defaults_to_deny() {
    let policies = PolicySet::new();
    let eval = PermissionEvaluator::new(&policies);
    let command = CommandDef::builder(["reload"])
        .owner("admin", ContainerKind::Internal)
        .build();

    assert_eq!(eval.can_run(&command, &ActorContext::new(1, 2)), Decision::Denied);

    let policies: PolicySet = std::iter::once(parse_policy("admin", "whitelist user 1\n").unwrap()).collect();
    let eval = PermissionEvaluator::new(&policies);
    assert_eq!(eval.can_run(&command, &ActorContext::new(1, 2)), Decision::Approved);
}

#[test]
fn test_class_scope_resolution() {
    let class = parse_policy("Music", MUSIC).unwrap();
    let actor = ActorContext::new(1, 2).in_guild(288626992373432320);
    assert_eq!(class.resolve(&actor), cmdgate::permissions::Status::Approved);
}

#[test]
fn test_malformed_bracket_is_reported_with_line() {
    let err = parse_policy("Broken", "whitelist user 1\n<method: add\nwhitelist role 2\n").unwrap_err();
    assert!(matches!(
        err,
        PolicyParseError::UnexpectedToken { .. } | PolicyParseError::UnexpectedEnd { .. }
    ));
}
