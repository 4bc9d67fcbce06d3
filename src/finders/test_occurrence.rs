//! Test occurrences finder.
//!
//! Evaluation order: `id`, `status`, `muted`, `ignored`, `newFailure`, `name`,
//! `test`, `duration`, `build`, `buildType`. The last two resolve nested build
//! locators through the builds finder, so they run after every cheap check.

use super::{flag_equals, parse_id, status_equals, text_equals};
use crate::error::{LocatorError, Result};
use crate::finder::{Finder, FinderSettings, ItemSource, Predicate, ValueCondition, predicate};
use crate::locator::Locator;
use crate::model::{Build, Status, TestRun};
use std::collections::HashSet;
use std::sync::Arc;

pub fn test_occurrence_finder(
    source: Arc<dyn ItemSource<TestRun>>,
    builds: Arc<Finder<Build>>,
    settings: FinderSettings,
) -> Finder<TestRun> {
    let by_build = Arc::clone(&builds);
    let by_build_type = builds;
    Finder::<TestRun>::builder("testOccurrences", source, |run: &TestRun| run.id.to_string())
        .dimension(
            "status",
            "SUCCESS, FAILURE or UNKNOWN",
            status_equals::<TestRun>("status", |run: &TestRun| run.status),
        )
        .dimension(
            "muted",
            "true, false or any",
            flag_equals::<TestRun>("muted", |run: &TestRun| run.muted),
        )
        .dimension(
            "ignored",
            "true, false or any",
            flag_equals::<TestRun>("ignored", |run: &TestRun| run.status == Status::Unknown),
        )
        .dimension(
            "newFailure",
            "true, false or any",
            flag_equals::<TestRun>("newFailure", |run: &TestRun| run.new_failure),
        )
        .dimension(
            "name",
            "full test name",
            text_equals::<TestRun>(|run: &TestRun| run.name.as_str()),
        )
        .dimension("test", "test id or (id:..,name:..)", test_predicate)
        .dimension("duration", "duration in ms: n, any or (condition:..,value:..)", |raw| {
            Ok(ValueCondition::parse("duration", raw)?.and_then(|condition| {
                predicate(move |run: &TestRun| condition.matches(run.duration_ms as i64))
            }))
        })
        .dimension("build", "build id or nested build locator", move |raw| {
            let ids = build_ids(&by_build, Locator::parse(raw)?)?;
            Ok(predicate(move |run: &TestRun| ids.contains(&run.build_id)))
        })
        .dimension("buildType", "build configuration id", move |raw| {
            let locator = Locator::from_pairs([("buildType", raw), ("finished", "any")])?;
            let ids = build_ids(&by_build_type, locator)?;
            Ok(predicate(move |run: &TestRun| ids.contains(&run.build_id)))
        })
        .settings(settings)
        .build()
}

fn build_ids(builds: &Finder<Build>, mut locator: Locator) -> Result<HashSet<u64>> {
    Ok(builds
        .evaluate_with(&mut locator, None)?
        .into_iter()
        .map(|build| build.id)
        .collect())
}

fn test_predicate(raw: &str) -> Result<Option<Predicate<TestRun>>> {
    if let Ok(test_id) = raw.parse::<u64>() {
        return Ok(predicate(move |run: &TestRun| run.test_id == test_id));
    }
    let mut nested = Locator::parse(raw)?;
    if nested.is_single_value() {
        return Err(LocatorError::bad_value("test", raw, "expected a numeric test id"));
    }
    let test_id = nested
        .get_dimension("id")
        .map(|id| parse_id("test", &id))
        .transpose()?;
    let name = nested.get_dimension("name");
    nested.assert_consumed_against(&["id", "name"])?;
    Ok(predicate(move |run: &TestRun| {
        test_id.is_none_or(|id| run.test_id == id)
            && name.as_deref().is_none_or(|name| run.name == name)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::build_finder;

    fn run(id: u64, test_id: u64, build_id: u64, status: Status, muted: bool) -> TestRun {
        TestRun {
            id,
            test_id,
            name: format!("unit: com.acme.Test{test_id}.check"),
            build_id,
            status,
            muted,
            new_failure: id % 2 == 0,
            duration_ms: id * 100,
        }
    }

    fn finder() -> Finder<TestRun> {
        let builds = vec![
            Build {
                id: 10,
                build_type: "Core".to_string(),
                number: "1".to_string(),
                branch: None,
                status: Status::Failure,
                finished: true,
                tags: Vec::new(),
            },
            Build {
                id: 11,
                build_type: "Ui".to_string(),
                number: "2".to_string(),
                branch: Some("feature".to_string()),
                status: Status::Success,
                finished: false,
                tags: Vec::new(),
            },
        ];
        let builds = Arc::new(build_finder(Arc::new(builds), FinderSettings::default()));
        let runs = vec![
            run(1, 100, 10, Status::Failure, false),
            run(2, 101, 10, Status::Success, false),
            run(3, 100, 11, Status::Failure, true),
            run(4, 102, 11, Status::Unknown, false),
            run(5, 101, 11, Status::Success, false),
        ];
        test_occurrence_finder(Arc::new(runs), builds, FinderSettings::default())
    }

    fn ids(runs: &[TestRun]) -> Vec<u64> {
        runs.iter().map(|run| run.id).collect()
    }

    #[test]
    fn filters_by_nested_build_locator() {
        let finder = finder();
        let by_id = finder.get_items(Some("build:10")).unwrap();
        assert_eq!(ids(&by_id.entries), vec![1, 2]);
        let nested = finder
            .get_items(Some("build:(branch:feature,finished:false),status:FAILURE"))
            .unwrap();
        assert_eq!(ids(&nested.entries), vec![3]);
        let by_type = finder.get_items(Some("buildType:Ui")).unwrap();
        assert_eq!(ids(&by_type.entries), vec![3, 4, 5]);
    }

    #[test]
    fn nested_build_errors_surface() {
        let err = finder().get_items(Some("build:(bogus:1)")).unwrap_err();
        assert!(matches!(err, LocatorError::UnusedDimensions { ref names, .. } if names == &["bogus"]));
    }

    #[test]
    fn flags_and_conditions() {
        let finder = finder();
        assert_eq!(ids(&finder.get_items(Some("muted:true")).unwrap().entries), vec![3]);
        assert_eq!(ids(&finder.get_items(Some("ignored:true")).unwrap().entries), vec![4]);
        assert_eq!(
            ids(&finder.get_items(Some("duration:(condition:more-than,value:300)")).unwrap().entries),
            vec![4, 5]
        );
        assert_eq!(
            ids(&finder.get_items(Some("newFailure:true,muted:any")).unwrap().entries),
            vec![2, 4]
        );
    }

    #[test]
    fn test_dimension_accepts_id_or_nested() {
        let finder = finder();
        assert_eq!(ids(&finder.get_items(Some("test:100")).unwrap().entries), vec![1, 3]);
        assert_eq!(
            ids(&finder
                .get_items(Some("test:(name:unit: com.acme.Test101.check)"))
                .unwrap()
                .entries),
            vec![2, 5]
        );
        assert!(matches!(
            finder.get_items(Some("test:abc")),
            Err(LocatorError::BadValue { .. })
        ));
    }
}
