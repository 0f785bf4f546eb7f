use crate::CLAP_STYLING;
use clap::arg;
use std::net::SocketAddr;
use std::path::PathBuf;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitemapper")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitemapper")
        .styles(CLAP_STYLING)
        .about(
            "Crawl a website, map the links between its pages and serve the map as JSON for \
            visualization.",
        )
        .arg(
            arg!(<URL>)
                .required(true)
                .help("The URL to begin the site mapping from, the scheme defaults to http"),
        )
        .arg(
            arg!(-w --"workers" <NUM_WORKERS>)
                .required(false)
                .help("The number of workers connecting to the site simultaneously")
                .value_parser(clap::value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            arg!(-t --"timeout" <SECS>)
                .required(false)
                .help("Timeout for each page request in seconds")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("5"),
        )
        .arg(
            arg!(-l --"listen" <ADDR>)
                .required(false)
                .help("The listen address and port for the embedded webserver")
                .value_parser(clap::value_parser!(SocketAddr))
                .default_value("0.0.0.0:8080"),
        )
        .arg(
            arg!(--"no-serve")
                .required(false)
                .help("Do not start the embedded webserver")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"exit")
                .required(false)
                .help("Exit once the crawl finishes instead of serving until interrupted")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Report format: text, json, dot")
                .value_parser(["text", "json", "dot"])
                .default_value("text"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Save report to file (default: display to screen)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-q --"quiet")
                .required(false)
                .help("Suppress the progress bar")
                .action(clap::ArgAction::SetTrue),
        )
}
