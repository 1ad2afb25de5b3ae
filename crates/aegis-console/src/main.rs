//! Aegis console operator CLI
//!
//! - `watch notifications` / `watch scan <ID>`: stream a real-time channel
//! - `palette [QUERY]`: print the command palette for a query

mod config;
mod palette;
mod watch;

use aegis_channel::Subscription;
use aegis_palette::RecentList;
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::ConsoleConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("aegis-console")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Aegis security console: real-time channels and command palette")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .env("AEGIS_BASE_URL")
                .help("Backend HTTP base URL"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .env("AEGIS_TOKEN")
                .hide_env_values(true)
                .help("Bearer token"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("watch")
                .about("Stream a real-time channel to the log")
                .subcommand_required(true)
                .subcommand(Command::new("notifications").about("Notifications for the current user"))
                .subcommand(
                    Command::new("scan")
                        .about("Progress of one scan; exits when the scan finishes")
                        .arg(Arg::new("id").required(true).help("Scan id")),
                ),
        )
        .subcommand(
            Command::new("palette")
                .about("Print the command palette for a query")
                .arg(Arg::new("query").help("Search text; omit to browse"))
                .arg(
                    Arg::new("recent")
                        .long("recent")
                        .action(ArgAction::Append)
                        .help("Recently visited page, oldest first; repeatable"),
                ),
        )
}

/// Innermost subcommand matches; global flags are always visible there
fn leaf(matches: &ArgMatches) -> &ArgMatches {
    match matches.subcommand() {
        Some((_, sub)) => leaf(sub),
        None => matches,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn watch(matches: &ArgMatches, config: ConsoleConfig) -> anyhow::Result<ExitCode> {
    let subscription = match matches.subcommand() {
        Some(("notifications", _)) => Subscription::Notifications,
        Some(("scan", args)) => {
            let id = args
                .get_one::<String>("id")
                .context("scan id is required")?;
            Subscription::scan(id.clone())
        }
        _ => anyhow::bail!("unknown watch target"),
    };

    let globals = leaf(matches);
    let base_url = config.base_url(globals.get_one::<String>("base-url").map(String::as_str));
    let token = config
        .token(globals.get_one::<String>("token").map(String::as_str))
        .context("no token: pass --token, set AEGIS_TOKEN, or add `token` to the config file")?;

    watch::run(&base_url, token, subscription, config.channel).await
}

fn palette(matches: &ArgMatches, config: &ConsoleConfig) -> anyhow::Result<ExitCode> {
    let query = matches
        .get_one::<String>("query")
        .map_or("", String::as_str);

    let mut recent = RecentList::from(config.recent.clone());
    if let Some(visits) = matches.get_many::<String>("recent") {
        for visit in visits {
            recent.push(visit.clone());
        }
    }

    print!("{}", palette::run(query, &recent)?);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    let globals = leaf(&matches);
    init_tracing(globals.get_flag("log-json"));

    let config = match globals.get_one::<PathBuf>("config") {
        Some(path) => ConsoleConfig::load(path)?,
        None => ConsoleConfig::default(),
    };

    match matches.subcommand() {
        Some(("watch", args)) => watch(args, config).await,
        Some(("palette", args)) => palette(args, &config),
        _ => anyhow::bail!("no command given"),
    }
}
