//! cmdtree - Run subcommands discovered from a plugin directory tree
//!
//! Usage:
//!   cmdtree <command> <subcommand> [args...]   - Run a plugin
//!   cmdtree <command> --help                   - List a group's subcommands
//!   cmdtree dev new-plugin <command> <sub>     - Scaffold a new plugin
//!   cmdtree dev list | check | info            - Inspect the plugin tree

use cli::{run, GlobalArgs};
use console::style;
use shared::{AppConfig, LOG_ENV};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    let argv: Vec<String> = std::env::args().collect();
    let globals = GlobalArgs::from_argv(&argv);
    init_logging(globals.verbose);

    let config = AppConfig::resolve(globals.commands_dir);
    let code = match run(&argv, &config) {
        Ok(code) => code,
        Err(err) => match err.downcast_ref::<clap::Error>() {
            Some(clap_err) => clap_err.exit(),
            None => {
                eprintln!("{} {:#}", style("Error:").red().bold().for_stderr(), err);
                1
            }
        },
    };

    std::process::exit(code);
}
