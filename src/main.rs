//! cmdgate - command resolution and permission gating for chat bots.

use cmdgate::cli::Cli;
use cmdgate::{logging, runner};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.quiet);

    match runner::run(&cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}
