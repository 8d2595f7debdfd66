//! Root dispatcher - builds the command tree from the registry and runs one invocation

use crate::commands::DevCommand;
use crate::params;
use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches, Parser};
use plugins::{Invocable, Registry};
use shared::{AppConfig, CmdtreeError, CommandGroup, APP_NAME, RESERVED_GROUP};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Raw arguments captured by placeholder commands
const REST_ARG: &str = "args";

/// Options read before the command tree exists
#[derive(Debug, Default, Parser)]
#[command(name = APP_NAME, disable_help_flag = true, disable_version_flag = true)]
pub struct GlobalArgs {
    /// Root of the plugin tree
    #[arg(long, value_name = "DIR")]
    pub commands_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    // Accepted so `--commands-dir DIR --help` still yields the directory
    #[arg(short = 'h', long = "help", hide = true)]
    show_help: bool,

    #[arg(short = 'V', long = "version", hide = true)]
    show_version: bool,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    rest: Vec<String>,
}

impl GlobalArgs {
    /// Best-effort parse; anything unexpected is left for the real parser to report
    pub fn from_argv(argv: &[String]) -> Self {
        Self::try_parse_from(argv).unwrap_or_default()
    }
}

/// A command whose arguments are collected verbatim for a later parse
fn passthrough(cmd: Command) -> Command {
    cmd.disable_help_flag(true).arg(
        Arg::new(REST_ARG)
            .num_args(0..)
            .trailing_var_arg(true)
            .allow_hyphen_values(true),
    )
}

fn rest_args(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(REST_ARG)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Open the registry, treating a missing commands root as an empty tree
pub fn open_registry(config: &AppConfig) -> Registry {
    match Registry::open(&config.commands_dir) {
        Ok(registry) => registry,
        Err(err) => {
            warn!(error = %err, "No command groups available");
            Registry::empty(&config.commands_dir)
        }
    }
}

/// Top-level command: global options, `dev`, and one lazy placeholder per group
pub fn root_command(registry: &Registry) -> Command {
    let root = Command::new(APP_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run commands discovered from a plugin directory tree")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("commands-dir")
                .long("commands-dir")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Root of the plugin tree"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .subcommand(DevCommand::augment_args(
            Command::new(RESERVED_GROUP).about("Developer utilities"),
        ));

    registry
        .groups()
        .fold(root, |root, group| register_lazy_group(root, group, registry))
}

/// Attach a group whose subcommands are only discovered when it is addressed
pub fn register_lazy_group(root: Command, group: &str, registry: &Registry) -> Command {
    let mut placeholder = passthrough(Command::new(group.to_string()));
    if let Some(help) = registry.group_help(group) {
        placeholder = placeholder.about(help);
    }
    root.subcommand(placeholder)
}

/// Group command listing valid subcommands from descriptor metadata only
pub fn group_command(group: &CommandGroup) -> Command {
    let mut cmd = Command::new(group.name.clone())
        .bin_name(format!("{} {}", APP_NAME, group.name))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .disable_help_subcommand(true);
    if let Some(help) = &group.short_help {
        cmd = cmd.about(help.clone());
    }
    for plugin in &group.plugins {
        cmd = cmd.subcommand(passthrough(
            Command::new(plugin.subcommand_name.clone()).about(plugin.short_help.clone()),
        ));
    }

    // Rejected plugins stay addressable so invoking one reports why it was rejected
    let mut hidden = BTreeSet::new();
    for rejected in &group.rejected {
        if group.get(&rejected.subcommand).is_none() && hidden.insert(rejected.subcommand.as_str()) {
            cmd = cmd.subcommand(passthrough(
                Command::new(rejected.subcommand.clone()).hide(true),
            ));
        }
    }
    cmd
}

/// Run one invocation and return the process exit code
///
/// Help and usage errors come back as `clap::Error` inside the `anyhow::Error`.
pub fn run(argv: &[String], config: &AppConfig) -> anyhow::Result<i32> {
    let registry = open_registry(config);
    let matches = root_command(&registry).try_get_matches_from(argv)?;

    match matches.subcommand() {
        Some((RESERVED_GROUP, sub_matches)) => {
            let dev = DevCommand::from_arg_matches(sub_matches)?;
            dev.run(config, &registry)
        }
        Some((group, sub_matches)) => run_group(&registry, config, group, rest_args(sub_matches)),
        None => Err(anyhow::anyhow!("no command given")),
    }
}

/// Resolve `<group> <subcommand> [args...]`, loading only the selected plugin
pub fn run_group(
    registry: &Registry,
    config: &AppConfig,
    group: &str,
    rest: Vec<String>,
) -> anyhow::Result<i32> {
    let found = registry.group(group).map_err(CmdtreeError::from)?;

    let matches = group_command(&found)
        .try_get_matches_from(std::iter::once(group.to_string()).chain(rest))?;
    let Some((subcommand, sub_matches)) = matches.subcommand() else {
        return Err(anyhow::anyhow!("no subcommand given for '{}'", group));
    };
    let Some(descriptor) = found.get(subcommand) else {
        return match found.rejected(subcommand) {
            Some(rejected) => Err(CmdtreeError::PluginValidation(rejected.clone()).into()),
            None => Err(anyhow::anyhow!("unknown subcommand '{} {}'", group, subcommand)),
        };
    };

    let loaded = registry.load(descriptor).map_err(CmdtreeError::from)?;
    debug!(plugin = %descriptor.qualified_name(), "Plugin loaded");
    run_loaded(&loaded, group, subcommand, rest_args(sub_matches), config)
}

/// Validate arguments against the loaded command's parameters and run it
pub fn run_loaded(
    loaded: &dyn Invocable,
    group: &str,
    subcommand: &str,
    rest: Vec<String>,
    config: &AppConfig,
) -> anyhow::Result<i32> {
    let matches = params::command_for(subcommand, loaded)
        .bin_name(format!("{} {} {}", APP_NAME, group, subcommand))
        .try_get_matches_from(std::iter::once(subcommand.to_string()).chain(rest))?;
    let argv = params::to_argv(loaded.params(), &matches);
    Ok(loaded.invoke(&argv, &config.plugin_env())?)
}
