//! Build problem occurrences finder.
//!
//! Evaluation order: `id`, `type`, `identity`, `muted`, `problem`, `build`.
//! Collection queries must name a build or a problem.

use super::{flag_equals, text_equals};
use crate::error::{LocatorError, Result};
use crate::finder::{Finder, FinderSettings, ItemSource, Predicate, predicate};
use crate::locator::Locator;
use crate::model::{Build, ProblemOccurrence};
use std::collections::HashSet;
use std::sync::Arc;

pub fn problem_finder(
    source: Arc<dyn ItemSource<ProblemOccurrence>>,
    builds: Arc<Finder<Build>>,
    settings: FinderSettings,
) -> Finder<ProblemOccurrence> {
    Finder::<ProblemOccurrence>::builder("problemOccurrences", source, |problem: &ProblemOccurrence| {
        problem.id.to_string()
    })
    .dimension(
        "type",
        "problem type, e.g. TC_COMPILATION_ERROR",
        text_equals::<ProblemOccurrence>(|problem: &ProblemOccurrence| problem.problem_type.as_str()),
    )
    .dimension(
        "identity",
        "problem identity within its type",
        text_equals::<ProblemOccurrence>(|problem: &ProblemOccurrence| problem.identity.as_str()),
    )
    .dimension(
        "muted",
        "true, false or any",
        flag_equals::<ProblemOccurrence>("muted", |problem: &ProblemOccurrence| problem.muted),
    )
    .dimension("problem", "(type:..,identity:..)", problem_predicate)
    .dimension("build", "build id or nested build locator", move |raw| {
        let mut locator = Locator::parse(raw)?;
        let ids: HashSet<u64> = builds
            .evaluate_with(&mut locator, None)?
            .into_iter()
            .map(|build| build.id)
            .collect();
        Ok(predicate(move |problem: &ProblemOccurrence| ids.contains(&problem.build_id)))
    })
    .require_any(&["build", "problem", "type", "identity"])
    .settings(settings)
    .build()
}

fn problem_predicate(raw: &str) -> Result<Option<Predicate<ProblemOccurrence>>> {
    let mut nested = Locator::parse(raw)?;
    if nested.is_single_value() {
        return Err(LocatorError::bad_value(
            "problem",
            raw,
            "expected (type:<type>,identity:<identity>)",
        ));
    }
    let problem_type = nested.get_dimension("type");
    let identity = nested.get_dimension("identity");
    nested.assert_consumed_against(&["type", "identity"])?;
    if problem_type.is_none() && identity.is_none() {
        return Ok(None);
    }
    Ok(predicate(move |problem: &ProblemOccurrence| {
        problem_type.as_deref().is_none_or(|value| problem.problem_type == value)
            && identity.as_deref().is_none_or(|value| problem.identity == value)
    }))
}
