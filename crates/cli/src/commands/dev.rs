//! cmdtree dev command

use clap::{Args, Subcommand};
use console::style;
use plugins::{Registry, ScaffoldRequest, Scaffolder};
use shared::AppConfig;
use std::io::{self, Write};

#[derive(Debug, Args)]
pub struct DevCommand {
    #[command(subcommand)]
    pub command: DevSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum DevSubcommand {
    /// Create a new plugin skeleton
    NewPlugin {
        /// Command group name
        command: String,
        /// Subcommand name
        subcommand: String,
        /// Short help shown under `cmdtree <command> --help`
        #[arg(long)]
        short_help: Option<String>,
        /// Short help for the command group, written when the group has none
        #[arg(long)]
        group_help: Option<String>,
        /// Overwrite an existing entry and meta.yaml
        #[arg(long)]
        force: bool,
    },
    /// List command groups and subcommands, including invalid plugins
    List,
    /// Validate every plugin and fail if any is invalid
    Check,
    /// Show version and directories
    Info,
}

impl DevCommand {
    pub fn run(&self, config: &AppConfig, registry: &Registry) -> anyhow::Result<i32> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.execute(config, registry, &mut out)
    }

    /// Run with output written to `out`
    pub fn execute(
        &self,
        config: &AppConfig,
        registry: &Registry,
        out: &mut dyn Write,
    ) -> anyhow::Result<i32> {
        match &self.command {
            DevSubcommand::NewPlugin {
                command,
                subcommand,
                short_help,
                group_help,
                force,
            } => {
                let mut request = ScaffoldRequest::new(command, subcommand).force(*force);
                request.short_help = short_help.clone();
                request.group_help = group_help.clone();

                let written = Scaffolder::new(&config.scaffold_dir).create(&request)?;
                for path in written {
                    writeln!(out, "{}", path.display())?;
                }
                Ok(0)
            }
            DevSubcommand::List => {
                for group in registry.scan_all() {
                    match &group.short_help {
                        Some(help) => writeln!(out, "{}  {}", style(&group.name).bold(), help)?,
                        None => writeln!(out, "{}", style(&group.name).bold())?,
                    }
                    for plugin in &group.plugins {
                        writeln!(out, "  {}  {}", plugin.subcommand_name, plugin.short_help)?;
                    }
                    for rejected in &group.rejected {
                        writeln!(
                            out,
                            "  {} {}  {}",
                            style("✗").red(),
                            rejected.subcommand,
                            rejected.reason
                        )?;
                    }
                }
                Ok(0)
            }
            DevSubcommand::Check => {
                // A missing root is an error here even though listing tolerates it
                let strict = Registry::open(registry.root())?;
                let groups = strict.scan_all();
                let valid: usize = groups.iter().map(|g| g.plugins.len()).sum();
                let rejected: Vec<_> = groups.iter().flat_map(|g| g.rejected.iter()).collect();

                for err in &rejected {
                    writeln!(out, "{} {}", style("✗").red(), err)?;
                }
                if rejected.is_empty() {
                    writeln!(out, "{} {} plugins valid", style("✓").green(), valid)?;
                    Ok(0)
                } else {
                    writeln!(
                        out,
                        "{} valid, {} invalid plugins detected",
                        valid,
                        rejected.len()
                    )?;
                    Ok(1)
                }
            }
            DevSubcommand::Info => {
                writeln!(out, "{}", config.banner())?;
                writeln!(out, "Commands directory: {}", config.commands_dir.display())?;
                writeln!(out, "Scaffold directory: {}", config.scaffold_dir.display())?;
                writeln!(out, "Command groups: {}", registry.groups().count())?;
                Ok(0)
            }
        }
    }
}
