//! `cfgkit` command line
//!
//! - `cfgkit lint <FILE>`: parse a JSON or YAML config, refusing repeated keys
//! - `cfgkit dump <FILE> [--indent N]`: print a config with large numbers in
//!   scientific notation

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use cfgkit_encode::{ScientificEncoder, DEFAULT_INDENT};
use cfgkit_model::parse_json_strict;
use clap::{value_parser, Arg, ArgMatches, Command};
use serde_json::Value;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("cfgkit")
        .version(cfgkit_model::VERSION)
        .about("Lint and dump config files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter, overrides RUST_LOG (default: warn)"),
        )
        .subcommand(
            Command::new("lint")
                .about("Check that a config file parses without repeated keys")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .help("JSON or YAML config file"),
                ),
        )
        .subcommand(
            Command::new("dump")
                .about("Print a config file with large numbers in scientific notation")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .help("JSON or YAML config file"),
                )
                .arg(
                    Arg::new("indent")
                        .long("indent")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Spaces per nesting level"),
                ),
        )
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Whether a path names a YAML file
fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Read a config file into a JSON tree
fn load(path: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = if is_yaml(path) {
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    } else {
        parse_json_strict(&text).with_context(|| format!("parsing {}", path.display()))?
    };
    tracing::debug!("Loaded {}", path.display());
    Ok(value)
}

fn lint(path: &Path) -> anyhow::Result<String> {
    let value = load(path)?;
    let Value::Object(map) = value else {
        bail!("{}: top level must be a mapping", path.display());
    };
    Ok(format!("{}: ok ({} top-level keys)", path.display(), map.len()))
}

fn dump(path: &Path, indent: usize) -> anyhow::Result<String> {
    let value = load(path)?;
    Ok(ScientificEncoder::with_indent(indent).encode(&value))
}

fn run(matches: &ArgMatches) -> anyhow::Result<String> {
    match matches.subcommand() {
        Some(("lint", args)) => {
            let file = args
                .get_one::<String>("file")
                .context("missing file argument")?;
            lint(Path::new(file))
        }
        Some(("dump", args)) => {
            let file = args
                .get_one::<String>("file")
                .context("missing file argument")?;
            let indent = args
                .get_one::<usize>("indent")
                .copied()
                .unwrap_or(DEFAULT_INDENT);
            dump(Path::new(file), indent)
        }
        _ => bail!("no subcommand given"),
    }
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_one::<String>("log-level").map(String::as_str));

    let output = run(&matches)?;
    println!("{output}");
    Ok(())
}
