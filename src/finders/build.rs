//! Builds finder.
//!
//! Evaluation order: `id`, `number`, `buildType`, `status`, `branch`,
//! `finished`, `tag`. Without a locator only finished builds are listed.

use super::{flag_equals, status_equals, text_equals};
use crate::finder::{Finder, FinderSettings, ItemSource, predicate};
use crate::model::Build;
use std::sync::Arc;

pub fn build_finder(source: Arc<dyn ItemSource<Build>>, settings: FinderSettings) -> Finder<Build> {
    Finder::<Build>::builder("builds", source, |build: &Build| build.id.to_string())
        .dimension(
            "number",
            "build number",
            text_equals::<Build>(|build: &Build| build.number.as_str()),
        )
        .dimension(
            "buildType",
            "build configuration id",
            text_equals::<Build>(|build: &Build| build.build_type.as_str()),
        )
        .dimension(
            "status",
            "SUCCESS, FAILURE or UNKNOWN",
            status_equals::<Build>("status", |build: &Build| build.status),
        )
        .dimension("branch", "branch name, 'default' for builds without one", |raw| {
            let expected = raw.to_string();
            Ok(predicate(move |build: &Build| match build.branch.as_deref() {
                Some(branch) => branch == expected,
                None => expected == "default",
            }))
        })
        .dimension(
            "finished",
            "true, false or any",
            flag_equals::<Build>("finished", |build: &Build| build.finished),
        )
        .multi_dimension("tag", "tag the build carries; repeatable", |raw| {
            let expected = raw.to_string();
            Ok(predicate(move |build: &Build| build.tags.iter().any(|tag| *tag == expected)))
        })
        .default_locator("finished:true")
        .settings(settings)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocatorError;
    use crate::model::Status;

    fn build(id: u64, build_type: &str, branch: Option<&str>, status: Status, tags: &[&str]) -> Build {
        Build {
            id,
            build_type: build_type.to_string(),
            number: format!("1.{id}"),
            branch: branch.map(str::to_string),
            status,
            finished: id != 5,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn finder() -> Finder<Build> {
        let builds = vec![
            build(1, "Core_Tests", None, Status::Success, &["nightly"]),
            build(2, "Core_Tests", Some("feature/x"), Status::Failure, &["nightly", "release"]),
            build(3, "Ui_Tests", None, Status::Failure, &[]),
            build(4, "Core_Tests", Some("feature/x"), Status::Success, &["release"]),
            build(5, "Core_Tests", None, Status::Unknown, &[]),
        ];
        build_finder(Arc::new(builds), FinderSettings::default())
    }

    fn ids(builds: &[Build]) -> Vec<u64> {
        builds.iter().map(|build| build.id).collect()
    }

    #[test]
    fn default_locator_hides_running_builds() {
        let result = finder().get_items(None).unwrap();
        assert_eq!(ids(&result.entries), vec![1, 2, 3, 4]);
        let all = finder().get_items(Some("finished:any")).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn combines_dimensions() {
        let result = finder()
            .get_items(Some("buildType:Core_Tests,branch:feature/x,status:FAILURE"))
            .unwrap();
        assert_eq!(ids(&result.entries), vec![2]);
        let default_branch = finder().get_items(Some("branch:default,finished:any")).unwrap();
        assert_eq!(ids(&default_branch.entries), vec![1, 3, 5]);
    }

    #[test]
    fn repeated_tags_must_all_be_present() {
        let result = finder().get_items(Some("tag:nightly,tag:release")).unwrap();
        assert_eq!(ids(&result.entries), vec![2]);
    }

    #[test]
    fn bad_status_names_the_dimension() {
        let err = finder().get_items(Some("status:flaky")).unwrap_err();
        assert!(matches!(err, LocatorError::BadValue { ref dimension, .. } if dimension == "status"));
    }
}
