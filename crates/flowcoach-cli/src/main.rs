//! `flowcoach` command line

mod args;
mod commands;
mod render;

use args::scope_args;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Pipeline configuration (TOML)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn corpus_dir_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_parser(value_parser!(PathBuf))
        .help("Knowledge corpus directory (defaults to the built-in corpus)")
}

fn cli() -> Command {
    Command::new("flowcoach")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Flow metrics, pattern detection and coaching insights")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            scope_args(Command::new("analyze").about("Run the insight pipeline for a scope"))
                .arg(
                    Arg::new("records")
                        .long("records")
                        .value_parser(value_parser!(PathBuf))
                        .conflicts_with("url")
                        .help("JSON file with records and optional history"),
                )
                .arg(
                    Arg::new("url")
                        .long("url")
                        .help("Base URL of the flow data service"),
                )
                .arg(config_arg())
                .arg(corpus_dir_arg("corpus"))
                .arg(
                    Arg::new("scenarios")
                        .long("scenarios")
                        .action(ArgAction::SetTrue)
                        .help("Append throughput and WIP scenarios to each insight"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            scope_args(Command::new("metrics").about("Compute flow metrics only"))
                .arg(
                    Arg::new("records")
                        .long("records")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with records and optional history"),
                )
                .arg(config_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("corpus")
                .about("Inspect a knowledge corpus")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List documents")
                        .arg(corpus_dir_arg("dir")),
                )
                .subcommand(
                    Command::new("validate")
                        .about("Parse every document and report gaps")
                        .arg(corpus_dir_arg("dir")),
                ),
        )
        .subcommand(Command::new("schema").about("Print the JSON Schema of an insight"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let result = match matches.subcommand() {
        Some(("analyze", args)) => commands::analyze(args).await,
        Some(("metrics", args)) => commands::metrics(args).await,
        Some(("corpus", args)) => commands::corpus(args).await,
        Some(("schema", _)) => commands::schema(),
        _ => Ok(0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
