//! Map declared plugin parameters onto clap

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use plugins::Invocable;
use shared::{ParamKind, ParamSpec, ValueType};

/// Build the clap command that validates arguments for a loaded plugin
pub fn command_for(name: &str, loaded: &dyn Invocable) -> Command {
    loaded.params().iter().fold(
        Command::new(name.to_string()).about(loaded.about().to_string()),
        |cmd, param| cmd.arg(to_arg(param)),
    )
}

fn to_arg(param: &ParamSpec) -> Arg {
    let mut arg = Arg::new(param.name.clone());
    arg = match param.kind {
        ParamKind::Argument => arg.action(ArgAction::Set).required(param.is_required()),
        ParamKind::Option => arg
            .long(param.name.clone())
            .value_name(param.name.to_uppercase())
            .action(ArgAction::Set)
            .required(param.is_required()),
        ParamKind::Flag => arg.long(param.name.clone()).action(ArgAction::SetTrue),
    };

    if param.kind != ParamKind::Flag {
        arg = match param.value_type {
            ValueType::String => arg.value_parser(value_parser!(String)),
            ValueType::Int => arg
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
            ValueType::Float => arg
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
        };
        if let Some(default) = &param.default {
            arg = arg.default_value(default.clone());
        }
    }

    if let Some(help) = &param.help {
        arg = arg.help(help.clone());
    }
    arg
}

fn value_of(param: &ParamSpec, matches: &ArgMatches) -> Option<String> {
    let id = param.name.as_str();
    match param.value_type {
        ValueType::String => matches.get_one::<String>(id).cloned(),
        ValueType::Int => matches.get_one::<i64>(id).map(i64::to_string),
        ValueType::Float => matches.get_one::<f64>(id).map(f64::to_string),
    }
}

/// Arguments for the entry point: positionals, then options, then flags
pub fn to_argv(params: &[ParamSpec], matches: &ArgMatches) -> Vec<String> {
    let mut argv = Vec::new();

    for param in params.iter().filter(|p| p.kind == ParamKind::Argument) {
        if let Some(value) = value_of(param, matches) {
            argv.push(value);
        }
    }

    for param in params.iter().filter(|p| p.kind == ParamKind::Option) {
        if let Some(value) = value_of(param, matches) {
            argv.push(format!("--{}", param.name));
            argv.push(value);
        }
    }

    for param in params.iter().filter(|p| p.kind == ParamKind::Flag) {
        if matches.get_flag(&param.name) {
            argv.push(format!("--{}", param.name));
        }
    }

    argv
}
