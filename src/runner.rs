//! Command-line driver.
//!
//! Builds an engine with the built-in commands and the configured policy
//! directory, then either checks the policies or dispatches messages given on
//! the command line or in a script.

use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, OutputFormat};
use crate::commands::catalog::CatalogBuilder;
use crate::commands::handlers::register_builtins;
use crate::commands::router::{BufferResponder, DispatchOutcome, Dispatcher};
use crate::config::Config;
use crate::context::ActorContext;
use crate::engine::{Engine, Snapshot};
use crate::error::{GateError, Result};
use crate::permissions::{load_policy_dir, LoadReport};

/// Result of dispatching one message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
    pub input: String,
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
    pub replies: Vec<String>,
}

/// Applies command-line overrides to the loaded configuration.
pub fn apply_overrides(mut config: Config, cli: &Cli) -> Result<Config> {
    if let Some(prefix) = cli.prefix {
        config.prefix = prefix;
    }
    if let Some(maintainer) = cli.maintainer {
        config.maintainer = Some(maintainer);
    }
    if let Some(dir) = &cli.permissions {
        config.permissions.directory = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Builds an engine holding the built-in commands and the policies of the
/// configured directory.
pub fn build_engine(config: &Config) -> Result<(Engine, LoadReport)> {
    let mut catalog = CatalogBuilder::new();
    register_builtins(&mut catalog, config.help.per_page)?;

    let report = load_policy_dir(&config.permissions.directory, &config.permissions.extension)?;
    let engine = Engine::new(Snapshot::new(catalog.build(), report.policies.clone()));

    Ok((engine, report))
}

/// Reads messages from a script file, one per line. Blank lines and lines
/// starting with `#` are skipped.
pub fn load_script(path: &str) -> Result<Vec<String>> {
    let content = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| GateError::io("<stdin>", e))?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| GateError::io(path, e))?
    };

    Ok(parse_script(&content))
}

fn parse_script(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Dispatches `messages` in order, collecting replies per message.
pub async fn dispatch_all(dispatcher: &Dispatcher, actor: &ActorContext, messages: &[String]) -> Vec<MessageReport> {
    let responder = BufferResponder::new();
    let mut reports = Vec::with_capacity(messages.len());

    for input in messages {
        let outcome = dispatcher.dispatch(input, actor, &responder).await;
        let replies = responder.take().into_iter().map(|(_, text)| text).collect();
        reports.push(MessageReport {
            input: input.clone(),
            outcome,
            replies,
        });
    }

    reports
}

/// Formats dispatch reports for stdout.
pub fn format_reports(reports: &[MessageReport], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for report in reports {
                out.push_str(&format!("> {}\n", report.input));
                for reply in &report.replies {
                    out.push_str(reply);
                    out.push('\n');
                }
            }
            out
        }
        OutputFormat::Json => serde_json::to_string_pretty(reports)
            .map(|json| format!("{json}\n"))
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}\n")),
    }
}

/// Prints every loaded policy in canonical form. Returns the exit code.
fn check_policies(report: &LoadReport) -> i32 {
    for name in report.policies.names() {
        if let Some(class) = report.policies.get(name) {
            println!("# {name}");
            print!("{class}");
            println!();
        }
    }
    for (path, err) in &report.failures {
        eprintln!("{}: {err}", path.display());
    }
    println!("Parsed {}/{} permission files", report.loaded(), report.total);

    if report.is_clean() {
        0
    } else {
        1
    }
}

/// Runs the driver from CLI arguments and returns the process exit code.
pub async fn run(cli: &Cli) -> Result<i32> {
    cli.validate().map_err(GateError::config)?;
    let format = cli.parse_output_format().map_err(GateError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = apply_overrides(Config::load_from_file(&config_path)?, cli)?;

    let (engine, report) = build_engine(&config)?;
    if cli.check {
        return Ok(check_policies(&report));
    }

    let mut messages = cli.send.clone();
    if let Some(path) = &cli.script {
        messages.extend(load_script(path)?);
    }

    let dispatcher = Dispatcher::new(Arc::new(engine), config.prefix);
    let actor = cli.actor(config.maintainer);
    let reports = dispatch_all(&dispatcher, &actor, &messages).await;

    print!("{}", format_reports(&reports, format));
    Ok(0)
}
