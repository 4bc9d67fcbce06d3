//! Item datasets and the finder set wired over them.
//!
//! A dataset file holds three top-level lists, `builds`, `test_runs` (alias
//! `tests`) and `problems`, in JSON or YAML. The list order is the source
//! order every finder pages through.

use crate::finder::{Finder, FinderSettings};
use crate::finders::{build_finder, problem_finder, test_occurrence_finder};
use crate::model::{Build, ProblemOccurrence, TestRun};
use crate::util;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub builds: Vec<Build>,
    #[serde(default, alias = "tests")]
    pub test_runs: Vec<TestRun>,
    #[serde(default)]
    pub problems: Vec<ProblemOccurrence>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let content = util::read_to_string(path)?;
        let dataset = match util::extension_of(path).as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" | "" => Self::from_json(&content),
            other => bail!("unsupported dataset format '{other}' for {}", path.display()),
        }
        .with_context(|| format!("load dataset {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            builds = dataset.builds.len(),
            test_runs = dataset.test_runs.len(),
            problems = dataset.problems.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("parse dataset JSON")
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("parse dataset YAML")
    }
}

/// Which finder a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderKind {
    Builds,
    TestOccurrences,
    ProblemOccurrences,
}

impl FinderKind {
    pub const ALL: [FinderKind; 3] = [
        FinderKind::Builds,
        FinderKind::TestOccurrences,
        FinderKind::ProblemOccurrences,
    ];
    pub const NAMES: [&'static str; 3] = ["builds", "testOccurrences", "problemOccurrences"];

    pub fn name(self) -> &'static str {
        match self {
            FinderKind::Builds => "builds",
            FinderKind::TestOccurrences => "testOccurrences",
            FinderKind::ProblemOccurrences => "problemOccurrences",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let kind = match raw.trim() {
            "builds" | "build" => FinderKind::Builds,
            "testOccurrences" | "tests" | "test" => FinderKind::TestOccurrences,
            "problemOccurrences" | "problems" | "problem" => FinderKind::ProblemOccurrences,
            other => bail!(
                "unknown finder '{other}' (supported: {})",
                Self::NAMES.join(", ")
            ),
        };
        Ok(kind)
    }
}

impl std::str::FromStr for FinderKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

/// The three finders over one dataset. Test and problem finders resolve
/// their `build` dimensions through the shared builds finder.
#[derive(Debug, Clone)]
pub struct FinderSet {
    pub builds: Arc<Finder<Build>>,
    pub tests: Arc<Finder<TestRun>>,
    pub problems: Arc<Finder<ProblemOccurrence>>,
}

impl FinderSet {
    pub fn new(dataset: Dataset, settings: FinderSettings) -> Self {
        let builds = Arc::new(build_finder(Arc::new(dataset.builds), settings));
        let tests = Arc::new(test_occurrence_finder(
            Arc::new(dataset.test_runs),
            Arc::clone(&builds),
            settings,
        ));
        let problems = Arc::new(problem_finder(
            Arc::new(dataset.problems),
            Arc::clone(&builds),
            settings,
        ));
        Self {
            builds,
            tests,
            problems,
        }
    }

    /// Supported dimensions per finder, in evaluation order.
    pub fn describe(&self, kind: FinderKind) -> Vec<(&'static str, &'static str)> {
        match kind {
            FinderKind::Builds => self.builds.describe(),
            FinderKind::TestOccurrences => self.tests.describe(),
            FinderKind::ProblemOccurrences => self.problems.describe(),
        }
    }
}
