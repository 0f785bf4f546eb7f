use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use sitemapper::handlers::{MapOptions, ReportFormat, forward_signals, handle_map, init_tracing};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod commands;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    init_tracing();

    let options = map_options(&matches);
    let interrupt = CancellationToken::new();
    let shutdown = CancellationToken::new();
    tokio::spawn(forward_signals(vec![interrupt.clone(), shutdown.clone()]));

    match handle_map(options, interrupt, shutdown).await {
        Ok(outcome) => {
            let status = if outcome.completed {
                "✓".green().bold()
            } else {
                "!".yellow().bold()
            };
            eprintln!(
                "{} {} pages mapped, {} broken",
                status, outcome.pages, outcome.broken
            );
        }
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn map_options(matches: &ArgMatches) -> MapOptions {
    let format = matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let listen = if matches.get_flag("no-serve") {
        None
    } else {
        matches.get_one::<SocketAddr>("listen").copied()
    };

    MapOptions {
        url: matches.get_one::<String>("URL").cloned().unwrap_or_default(),
        workers: matches.get_one::<usize>("workers").copied().unwrap_or(4),
        timeout: Duration::from_secs(matches.get_one::<u64>("timeout").copied().unwrap_or(5)),
        listen,
        serve_after_crawl: !matches.get_flag("exit"),
        format,
        output: matches.get_one::<PathBuf>("output").cloned(),
        quiet: matches.get_flag("quiet"),
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
