use std::path::PathBuf;

use anyhow::Context as _;
use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use jirastats_core::constants::STATUS_DEVELOPMENT;
use jirastats_core::{logging, Context, OutputFormat, ReportData, ReportKind, SearchStore};
use serde::Serialize;
use tracing::{debug, info};

fn cli() -> Command {
    Command::new("jira_report")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Workload and flow reports from the latest saved JIRA search result")
        .author("jirastats developers")
        .arg(
            Arg::new("report")
                .short('r')
                .long("report")
                .help("Which report to print")
                .value_parser(PossibleValuesParser::new(ReportKind::NAMES))
                .default_value("assignee"),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .value_name("NAME")
                .help("Status whose time is measured, a configured name or a numeric status id")
                .default_value(STATUS_DEVELOPMENT),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Output format")
                .value_parser(PossibleValuesParser::new(OutputFormat::NAMES))
                .default_value("text"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Write the report to a file instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("PATH")
                .help("Search result to read")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Debug logging, including the intermediate data")
                .action(ArgAction::SetTrue),
        )
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = cli().get_matches();
    // a broken .env is reported by Context::from_env below
    let _ = Context::load_dotenv();
    logging::init(matches.get_flag("verbose"));

    if let Err(err) = run(&matches).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let ctx = Context::from_env()?;
    if ctx.ctx_out {
        info!("Context: {:?}", ctx);
    }

    let kind: ReportKind = arg(matches, "report", "assignee").parse()?;
    let format: OutputFormat = arg(matches, "format", "text").parse()?;
    let status_id = ctx.status_id(arg(matches, "status", STATUS_DEVELOPMENT))?;

    let store = SearchStore::new(
        matches
            .get_one::<PathBuf>("file")
            .cloned()
            .unwrap_or_else(|| ctx.search_file.clone()),
    );
    let result = store.load().await?;
    info!(
        "Loaded {} issues ({}) from {}",
        result.issues.len(),
        result.query.describe(),
        store.path().display()
    );

    let data = ReportData::build(&result, &status_id);
    if matches.get_flag("verbose") || ctx.debug {
        dump("Issues", &data.issues)?;
        dump("Assignees", &data.assignees)?;
        dump("Timelines", &data.timelines)?;
        dump(&format!("Workload in status {}", data.status_id), &data.workload)?;
    }

    let report = data.render(kind, format);
    match matches.get_one::<PathBuf>("output") {
        Some(path) => {
            tokio::fs::write(path, report.as_bytes())
                .await
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => print!("{}", report),
    }
    Ok(())
}

fn arg<'a>(matches: &'a ArgMatches, id: &str, default: &'a str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or(default)
}

fn dump<T: Serialize>(label: &str, value: &T) -> anyhow::Result<()> {
    debug!("{}:\n{}", label, serde_json::to_string_pretty(value)?);
    Ok(())
}
