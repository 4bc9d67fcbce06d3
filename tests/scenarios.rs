use locq::dataset::{Dataset, FinderSet};
use locq::finder::FinderSettings;
use locq::model::{Build, Status, TestRun};
use locq::scope;
use locq::LocatorError;
use pretty_assertions::assert_eq;

fn build(id: u64) -> Build {
    Build {
        id,
        build_type: "Core_Tests".to_string(),
        number: id.to_string(),
        branch: None,
        status: Status::Success,
        finished: true,
        tags: Vec::new(),
    }
}

fn run(id: u64, name: &str, status: Status) -> TestRun {
    TestRun {
        id,
        test_id: id,
        name: name.to_string(),
        build_id: 1,
        status,
        muted: false,
        new_failure: false,
        duration_ms: 10,
    }
}

fn finders(builds: Vec<Build>, test_runs: Vec<TestRun>) -> FinderSet {
    let dataset = Dataset {
        builds,
        test_runs,
        problems: Vec::new(),
    };
    FinderSet::new(dataset, FinderSettings::default())
}

/// 25 runs; every second one of the first 24 fails, the 25th does not.
fn mixed_runs() -> Vec<TestRun> {
    (1..=25)
        .map(|id| {
            let status = if id % 2 == 0 { Status::Failure } else { Status::Success };
            run(id, &format!("unit: com.acme.Case{id}.check"), status)
        })
        .collect()
}

#[test]
fn scenario_a_count_bounds_filtered_results() {
    let runs = mixed_runs();
    assert_eq!(runs.iter().filter(|run| run.status == Status::Failure).count(), 12);
    let finders = finders(vec![build(1)], runs);

    let page = finders.tests.get_items(Some("status:FAILURE,count:10")).unwrap();
    assert_eq!(page.len(), 10);
    assert!(page.entries.iter().all(|run| run.status == Status::Failure));
    let ids: Vec<u64> = page.entries.iter().map(|run| run.id).collect();
    assert_eq!(ids, vec![2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);
    assert_eq!(page.matched, 12);
    assert_eq!(page.next_start, Some(10));
}

#[test]
fn scenario_b_default_dimension_equals_single_value() {
    let finders = finders((120..130).map(build).collect(), Vec::new());
    let by_dimension = finders.builds.get_item("id:123").unwrap();
    let by_value = finders.builds.get_item("123").unwrap();
    assert_eq!(by_dimension, by_value);
    assert_eq!(by_value.id, 123);

    let many_by_dimension = finders.builds.get_items(Some("id:123")).unwrap();
    let many_by_value = finders.builds.get_items(Some("123")).unwrap();
    assert_eq!(many_by_dimension.entries, many_by_value.entries);
}

#[test]
fn scenario_c_unknown_scope_value_is_empty_not_an_error() {
    let finders = finders(vec![build(1)], mixed_runs());
    let scopes =
        scope::test_scopes(&finders.tests, "scope:(type:suite,value:NonExistentSuite)").unwrap();
    assert!(scopes.is_empty());

    let grouped = scope::group_into("suite", mixed_runs(), Some("value:NonExistentSuite")).unwrap();
    assert!(grouped.is_empty());
}

#[test]
fn scenario_d_unknown_dimension_is_named() {
    let finders = finders(vec![build(1)], Vec::new());
    let err = finders.builds.get_items(Some("bogus:value")).unwrap_err();
    match &err {
        LocatorError::UnusedDimensions { names, .. } => assert_eq!(names, &["bogus".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("bogus"));
    assert_eq!(err.kind().as_str(), "bad_request");
}

#[test]
fn scenario_e_failed_filter_keeps_failing_package() {
    let runs = vec![
        run(1, "unit: pkg.a.First.one", Status::Success),
        run(2, "unit: pkg.b.Second.one", Status::Success),
        run(3, "unit: pkg.a.First.two", Status::Failure),
        run(4, "unit: pkg.b.Second.two", Status::Success),
        run(5, "unit: pkg.b.Third.one", Status::Unknown),
    ];
    let unfiltered = scope::group_into("package", runs.clone(), None).unwrap();
    assert_eq!(unfiltered.len(), 2);

    let scopes =
        scope::group_into("package", runs, Some("failed:(condition:more-than,value:0)")).unwrap();
    assert_eq!(scopes.len(), 1);
    assert_eq!(scopes[0].key, "pkg.a");
    assert_eq!(scopes[0].counters.failed, 1);
    assert_eq!(scopes[0].counters.total, 2);
}

#[test]
fn test_scopes_groups_the_selected_runs() {
    let mut runs = mixed_runs();
    runs[0].build_id = 2;
    let finders = finders(vec![build(1), build(2)], runs);
    let scopes = scope::test_scopes(
        &finders.tests,
        "build:1,scope:(type:class,failed:(condition:more-than,value:0))",
    )
    .unwrap();
    assert_eq!(scopes.len(), 12);
    assert!(scopes.iter().all(|scope| scope.path == vec!["com.acme".to_string(), "unit".to_string()]));

    let err = scope::test_scopes(&finders.tests, "build:1").unwrap_err();
    assert!(matches!(err, LocatorError::MissingDimension { .. }));
}

#[test]
fn repeated_scope_fragments_are_rejected() {
    let finders = finders(vec![build(1)], mixed_runs());
    let err = scope::test_scopes(
        &finders.tests,
        "build:1,scope:(type:class),scope:(type:package,bogus:1)",
    )
    .unwrap_err();
    match err {
        LocatorError::UnusedDimensions { names, supported } => {
            assert_eq!(names, vec!["scope".to_string()]);
            assert!(supported.contains(&"scope".to_string()));
            assert!(supported.contains(&"build".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
