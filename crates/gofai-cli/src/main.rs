//! `gofai` command-line entry point

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use gofai_cli::commands::{self, Report};
use gofai_cli::input;
use gofai_entity::UnresolvedRef;
use gofai_resolve::{InteractionContext, Resolver};
use gofai_select::Selector;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn file_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn context_arg() -> Arg {
    Arg::new("context")
        .long("context")
        .value_parser(value_parser!(PathBuf))
        .help("Interaction context (selection, focus, discourse, playhead)")
}

fn selector_arg() -> Arg {
    Arg::new("selector")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Selector file (JSON or YAML)")
}

fn cli() -> Command {
    Command::new("gofai")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve musical references and evaluate event selectors")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Resolver configuration (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("describe")
                .about("Describe a selector in words")
                .arg(selector_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a selector for errors")
                .arg(selector_arg()),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve a reference against a project")
                .arg(file_arg("project", "Project file (JSON or YAML)"))
                .arg(file_arg("reference", "Reference file (JSON or YAML)"))
                .arg(context_arg()),
        )
        .subcommand(
            Command::new("select")
                .about("Evaluate a selector against a project's events")
                .arg(file_arg("project", "Project file (JSON or YAML)"))
                .arg(file_arg("selector", "Selector file (JSON or YAML)"))
                .arg(context_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a Path> {
    args.get_one::<PathBuf>(name).map(PathBuf::as_path)
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a Path> {
    path(args, name).ok_or_else(|| anyhow::anyhow!("missing --{name}"))
}

fn context(args: &ArgMatches) -> anyhow::Result<InteractionContext> {
    path(args, "context").map_or_else(|| Ok(InteractionContext::new()), input::load)
}

fn run(matches: &ArgMatches) -> anyhow::Result<Report> {
    let config = input::load_config(path(matches, "config"))?;
    let max_depth = config.max_selector_depth;
    let resolver = Resolver::new(config);

    match matches.subcommand() {
        Some(("describe", args)) => {
            let selector: Selector = input::load(required(args, "selector")?)?;
            Ok(commands::describe(&selector))
        }
        Some(("validate", args)) => {
            let selector: Selector = input::load(required(args, "selector")?)?;
            Ok(commands::validate(&selector, max_depth))
        }
        Some(("resolve", args)) => {
            let project = input::load_project(required(args, "project")?)?;
            let reference: UnresolvedRef = input::load(required(args, "reference")?)?;
            commands::resolve(&resolver, &project, &reference, &context(args)?)
        }
        Some(("select", args)) => {
            let project = input::load_project(required(args, "project")?)?;
            let selector: Selector = input::load(required(args, "selector")?)?;
            commands::select(&resolver, &project, &selector, &context(args)?)
        }
        _ => anyhow::bail!("no command given"),
    }
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(report) => {
            println!("{}", report.text);
            std::process::exit(if report.success { 0 } else { 1 });
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
