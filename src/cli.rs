use crate::dataset::FinderKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "locq",
    version,
    about = "Locator query engine over builds, test occurrences and build problems",
    after_help = r#"Examples:
  locq parse 'buildType:Core,status:FAILURE,count:5'
  locq find --data dataset.json --finder builds --locator 'branch:default'
  locq find --data dataset.json --finder tests --locator 'id:42' --one
  locq group --data dataset.json --scope class --locator 'build:(number:1.2)' --filter 'failed:(condition:more-than,value:0)'
  locq request --data dataset.json --method test_scopes --params '{"locator":"build:42,scope:(type:suite)"}'
  locq serve --data dataset.json
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a locator and print its dimensions.
    Parse {
        locator: String,
    },
    /// Evaluate a locator against one finder.
    Find {
        /// Dataset file (JSON or YAML).
        #[arg(long)]
        data: PathBuf,
        /// builds|testOccurrences|problemOccurrences (short forms accepted).
        #[arg(long)]
        finder: FinderKind,
        /// Collection locator; the finder's default when omitted.
        #[arg(long)]
        locator: Option<String>,
        /// Require exactly one match.
        #[arg(long)]
        one: bool,
    },
    /// Group test occurrences into scopes.
    Group {
        #[arg(long)]
        data: PathBuf,
        /// package|suite|class.
        #[arg(long)]
        scope: String,
        /// Test-occurrence locator selecting the runs to group.
        #[arg(long)]
        locator: Option<String>,
        /// Scope filter, e.g. 'failed:(condition:more-than,value:0)'.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Run a single JSONL request and exit.
    Request {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        method: String,
        #[arg(long, default_value = "{}")]
        params: String,
        #[arg(long, value_name = "PATH")]
        params_file: Option<PathBuf>,
        #[arg(long, default_value = "1")]
        id: String,
    },
    /// Run JSONL RPC server over stdin/stdout.
    Serve {
        #[arg(long)]
        data: PathBuf,
    },
}
