//! Command-line argument parsing for cmdgate.

use crate::context::ActorContext;
use clap::Parser;
use std::path::PathBuf;

/// Output format for dispatch results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Replies as plain text.
    #[default]
    Text,
    /// One JSON object per message with outcome and replies.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Resolve chat commands and check them against permission policies.
#[derive(Parser, Debug)]
#[command(name = "cmdgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory with permission policy documents (overrides config)
    #[arg(short = 'p', long, value_name = "DIR")]
    pub permissions: Option<PathBuf>,

    /// Command prefix character (overrides config)
    #[arg(long, value_name = "CHAR")]
    pub prefix: Option<char>,

    /// Maintainer user id (overrides config)
    #[arg(long, value_name = "ID", env = "CMDGATE_MAINTAINER")]
    pub maintainer: Option<u64>,

    /// Parse every policy document, print it in canonical form and exit
    #[arg(long)]
    pub check: bool,

    /// Message to dispatch (repeatable)
    #[arg(short = 's', long, value_name = "TEXT")]
    pub send: Vec<String>,

    /// File with one message per line (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Sender user id
    #[arg(short = 'u', long, value_name = "ID", default_value_t = 1)]
    pub user: u64,

    /// Channel id the messages are sent in
    #[arg(short = 'c', long, value_name = "ID", default_value_t = 1)]
    pub channel: u64,

    /// Guild id the channel belongs to
    #[arg(short = 'g', long, value_name = "ID")]
    pub guild: Option<u64>,

    /// Role id held by the sender (repeatable)
    #[arg(short = 'r', long, value_name = "ID")]
    pub role: Vec<u64>,

    /// Send as a direct message
    #[arg(long, conflicts_with = "guild")]
    pub dm: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Only log warnings and errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Builds the sender context. `maintainer` is the configured maintainer id.
    pub fn actor(&self, maintainer: Option<u64>) -> ActorContext {
        let actor = ActorContext::new(self.user, self.channel).with_roles(self.role.iter().copied());
        let actor = match self.guild {
            Some(guild) if !self.dm => actor.in_guild(guild),
            _ if self.dm => actor.direct_message(),
            _ => actor,
        };
        actor.maintainer(maintainer == Some(self.user))
    }

    /// Validates argument combinations clap cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.check && self.send.is_empty() && self.script.is_none() {
            return Err("Nothing to do: pass --check, --send or --script".to_string());
        }
        self.parse_output_format()?;
        Ok(())
    }
}
