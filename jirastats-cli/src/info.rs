use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use jirastats_core::{logging, Context, SearchStore, Summary};
use tracing::info;

fn cli() -> Command {
    Command::new("jira_info")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Summarize the latest saved JIRA search result")
        .author("jirastats developers")
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
                .help("Debug logging")
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

    let path = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .unwrap_or(ctx.search_file);
    let result = SearchStore::new(path).load().await?;

    print!("{}", Summary::analyze(&result).render());
    Ok(())
}
