use anyhow::Result;
use clap::Parser;
use locq::config::Config;
use locq::dataset::{Dataset, FinderKind, FinderSet};
use locq::locator::Locator;
use locq::{cli, logging, rpc, scope, util};
use serde::Serialize;
use serde_json::json;
use std::io;
use std::path::Path;

fn load_finders(path: &Path, config: &Config) -> Result<FinderSet> {
    let dataset = Dataset::load(path)?;
    Ok(FinderSet::new(dataset, config.finder_settings()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = cli::Args::parse();
    let config = Config::from_env();
    logging::init_logging(&config.log_level);

    match args.command {
        cli::Command::Parse { locator } => {
            let parsed = Locator::parse(&locator)?;
            print_json(&json!({
                "locator": parsed.view(),
                "canonical": parsed.to_string(),
            }))
        }
        cli::Command::Find {
            data,
            finder,
            locator,
            one,
        } => {
            let finders = load_finders(&data, &config)?;
            let locator = locator.as_deref();
            if one {
                let text = locator.unwrap_or_default();
                return match finder {
                    FinderKind::Builds => print_json(&finders.builds.get_item(text)?),
                    FinderKind::TestOccurrences => print_json(&finders.tests.get_item(text)?),
                    FinderKind::ProblemOccurrences => print_json(&finders.problems.get_item(text)?),
                };
            }
            match finder {
                FinderKind::Builds => print_json(&finders.builds.get_items(locator)?),
                FinderKind::TestOccurrences => print_json(&finders.tests.get_items(locator)?),
                FinderKind::ProblemOccurrences => print_json(&finders.problems.get_items(locator)?),
            }
        }
        cli::Command::Group {
            data,
            scope: scope_name,
            locator,
            filter,
        } => {
            let finders = load_finders(&data, &config)?;
            let mut locator = match locator.as_deref() {
                Some(text) => Locator::parse(text)?,
                None => Locator::empty(),
            };
            let runs = finders.tests.evaluate_with(&mut locator, None)?.entries;
            let scopes = scope::group_into(&scope_name, runs, filter.as_deref())?;
            print_json(&scopes)
        }
        cli::Command::Request {
            data,
            method,
            params,
            params_file,
            id,
        } => {
            let finders = load_finders(&data, &config)?;
            let params_raw = if let Some(path) = params_file {
                util::read_to_string(&path)?
            } else {
                params
            };
            let response = rpc::call(&finders, method, &params_raw, &id)?;
            println!("{response}");
            Ok(())
        }
        cli::Command::Serve { data } => {
            let finders = load_finders(&data, &config)?;
            tracing::info!(path = %data.display(), "serving JSONL requests on stdin");
            let stdin = io::stdin();
            rpc::serve(&finders, stdin.lock(), io::stdout())
        }
    }
}
