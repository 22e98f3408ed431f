use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use jirastats_core::constants::{DEFAULT_EXPAND, DEFAULT_FIELDS, MAX_PAGE_SIZE};
use jirastats_core::jira::{self, JiraClient, SearchRequest};
use jirastats_core::query::parse_date;
use jirastats_core::{logging, Context, SearchQuery, SearchStore};
use tracing::info;

fn cli() -> Command {
    Command::new("jira_search")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Search JIRA issues and save the result for jira_info and jira_report")
        .author("jirastats developers")
        .arg(
            Arg::new("start-date")
                .short('s')
                .long("start-date")
                .value_name("YYYY-MM-DD")
                .help("First day of the updated range")
                .value_parser(date_arg)
                .required_unless_present("issue-keys"),
        )
        .arg(
            Arg::new("end-date")
                .short('e')
                .long("end-date")
                .value_name("YYYY-MM-DD")
                .help("Last day of the updated range, inclusive")
                .value_parser(date_arg)
                .required_unless_present("issue-keys"),
        )
        .arg(
            Arg::new("issue-keys")
                .short('i')
                .long("issue-keys")
                .value_name("KEY")
                .help("Fetch these issues instead of a date range")
                .num_args(1..)
                .action(ArgAction::Append)
                .conflicts_with_all(["start-date", "end-date"]),
        )
        .arg(
            Arg::new("max-results")
                .long("max-results")
                .value_name("N")
                .help("Page size requested from JIRA")
                .value_parser(value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64))
                .default_value("100"),
        )
        .arg(
            Arg::new("fields")
                .long("fields")
                .help("Issue fields to return; the fields the reports need are always added")
                .default_value(DEFAULT_FIELDS),
        )
        .arg(
            Arg::new("expand")
                .long("expand")
                .help("Issue sections to expand")
                .default_value(DEFAULT_EXPAND),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("PATH")
                .help("Where to save the search result")
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

fn date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|err| err.to_string())
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

    let query = build_query(&ctx, matches)?;
    info!("Searching {}", query.describe());
    info!("JQL: {}", query.jql);

    let mut request = SearchRequest::new(query.jql.clone());
    if let Some(max_results) = matches.get_one::<u32>("max-results") {
        request.max_results = *max_results;
    }
    if let Some(fields) = matches.get_one::<String>("fields") {
        request.fields = fields.clone();
    }
    if let Some(expand) = matches.get_one::<String>("expand") {
        request.expand = expand.clone();
    }

    let client = JiraClient::new(&ctx)?;
    let result = jira::search(&client, query, &request)
        .await
        .context("JIRA search failed")?;

    let store = SearchStore::new(
        matches
            .get_one::<PathBuf>("file")
            .cloned()
            .unwrap_or_else(|| ctx.search_file.clone()),
    );
    store
        .save(&result)
        .await
        .with_context(|| format!("failed to save {}", store.path().display()))?;

    println!(
        "Saved {} issues ({} resolved) to {}",
        result.issues.len(),
        result.resolved_count(),
        store.path().display()
    );
    Ok(())
}

fn build_query(ctx: &Context, matches: &ArgMatches) -> anyhow::Result<SearchQuery> {
    if let Some(keys) = matches.get_many::<String>("issue-keys") {
        let keys: Vec<String> = keys.cloned().collect();
        return Ok(SearchQuery::issue_keys(&keys)?);
    }

    let start = matches
        .get_one::<NaiveDate>("start-date")
        .copied()
        .context("--start-date is required without --issue-keys")?;
    let end = matches
        .get_one::<NaiveDate>("end-date")
        .copied()
        .context("--end-date is required without --issue-keys")?;

    Ok(SearchQuery::date_range(
        ctx.require_project()?,
        start,
        end,
        &ctx.excluded_statuses,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_ctx() -> Context {
        let mut ctx = Context::new();
        ctx.project = "ACME".to_string();
        ctx
    }

    #[test]
    fn command_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn date_range_needs_both_ends() {
        assert!(cli()
            .try_get_matches_from(["jira_search", "-s", "2024-01-01"])
            .is_err());
        assert!(cli().try_get_matches_from(["jira_search"]).is_err());
    }

    #[test]
    fn rejects_malformed_dates_and_page_sizes() {
        assert!(cli()
            .try_get_matches_from(["jira_search", "-s", "2024-13-01", "-e", "2024-12-31"])
            .is_err());
        assert!(cli()
            .try_get_matches_from(["jira_search", "-i", "ACME-1", "--max-results", "0"])
            .is_err());
        assert!(cli()
            .try_get_matches_from(["jira_search", "-i", "ACME-1", "--max-results", "5001"])
            .is_err());
    }

    #[test]
    fn issue_keys_replace_the_date_range() {
        let matches = cli()
            .try_get_matches_from(["jira_search", "-i", "acme-2", "ACME-1", "-f", "out.json"])
            .unwrap();
        let query = build_query(&project_ctx(), &matches).unwrap();

        assert_eq!(query.issue_keys, vec!["ACME-2", "ACME-1"]);
        assert_eq!(query.jql, "key IN (ACME-2, ACME-1)");
        assert_eq!(
            matches.get_one::<PathBuf>("file"),
            Some(&PathBuf::from("out.json"))
        );
        assert_eq!(matches.get_one::<u32>("max-results"), Some(&100));
    }

    #[test]
    fn start_after_end_is_rejected() {
        let matches = cli()
            .try_get_matches_from(["jira_search", "-s", "2024-02-01", "-e", "2024-01-01"])
            .unwrap();
        assert!(build_query(&project_ctx(), &matches).is_err());
    }

    #[test]
    fn date_range_needs_a_project() {
        let matches = cli()
            .try_get_matches_from(["jira_search", "-s", "2024-01-01", "-e", "2024-01-31"])
            .unwrap();
        assert!(build_query(&Context::new(), &matches).is_err());
        assert!(build_query(&project_ctx(), &matches)
            .unwrap()
            .jql
            .starts_with("project = \"ACME\""));
    }
}
