use criterion::{black_box, criterion_group, criterion_main, Criterion};
use locq::dataset::{Dataset, FinderSet};
use locq::finder::FinderSettings;
use locq::locator::Locator;
use locq::model::{Build, Status, TestRun};
use locq::scope;

const NESTED: &str = "build:(buildType:Core_Tests,branch:(feature/x),status:FAILURE,count:50),\
status:FAILURE,muted:false,test:(name:unit: com.acme.CartTest.addsItem),start:10,count:25";

fn fixture_finders(runs_per_build: u64) -> FinderSet {
    let builds: Vec<Build> = (1..=200)
        .map(|id| Build {
            id,
            build_type: if id % 3 == 0 { "Ui_Tests" } else { "Core_Tests" }.to_string(),
            number: id.to_string(),
            branch: (id % 5 == 0).then(|| "feature/x".to_string()),
            status: if id % 4 == 0 { Status::Failure } else { Status::Success },
            finished: true,
            tags: Vec::new(),
        })
        .collect();
    let test_runs: Vec<TestRun> = builds
        .iter()
        .flat_map(|build| {
            (0..runs_per_build).map(move |idx| TestRun {
                id: build.id * 1000 + idx,
                test_id: idx,
                name: format!("unit: com.acme.pkg{}.Case{}.check", idx % 7, idx % 13),
                build_id: build.id,
                status: if idx % 9 == 0 { Status::Failure } else { Status::Success },
                muted: idx % 27 == 0,
                new_failure: false,
                duration_ms: idx * 3,
            })
        })
        .collect();
    let dataset = Dataset {
        builds,
        test_runs,
        problems: Vec::new(),
    };
    FinderSet::new(dataset, FinderSettings::default())
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_nested_locator", |b| {
        b.iter(|| Locator::parse(black_box(NESTED)).unwrap())
    });
    let locator = Locator::parse(NESTED).unwrap();
    c.bench_function("render_locator", |b| b.iter(|| black_box(&locator).to_string()));
}

fn bench_evaluate(c: &mut Criterion) {
    let finders = fixture_finders(50);
    c.bench_function("evaluate_status_page", |b| {
        b.iter(|| {
            finders
                .tests
                .get_items(black_box(Some("status:FAILURE,start:100,count:50")))
                .unwrap()
        })
    });
    c.bench_function("evaluate_nested_build", |b| {
        b.iter(|| {
            finders
                .tests
                .get_items(black_box(Some("build:(branch:feature/x,status:FAILURE),muted:false")))
                .unwrap()
        })
    });
    c.bench_function("test_scopes_class", |b| {
        b.iter(|| {
            scope::test_scopes(
                &finders.tests,
                black_box("buildType:Core_Tests,scope:(type:class,failed:(condition:more-than,value:0))"),
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
