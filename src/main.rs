use clap::Parser;
use tracing::debug;

use sharepool::cli::{self, output, Cli};
use sharepool::config::Config;

fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));
    output::set_color(cli.color.forced());

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("Failed to load config: {e}"));
            std::process::exit(cli::exit_code(&e));
        }
    };

    config.init_logging();
    debug!(pool = %config.pool.name, command = ?cli.command, "sharepool starting");

    if let Err(e) = cli::execute(&cli, &config) {
        debug!(error = %e, "Command failed");
        output::error(&e.to_string());
        std::process::exit(cli::exit_code(&e));
    }
}
