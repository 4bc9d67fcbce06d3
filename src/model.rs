use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome shared by builds and test runs. `Unknown` is the ignored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failure,
    Unknown,
}

impl Status {
    pub fn parse(raw: &str) -> Option<Self> {
        let status = match raw.trim().to_ascii_lowercase().as_str() {
            "success" | "passed" | "ok" => Status::Success,
            "failure" | "failed" | "error" => Status::Failure,
            "unknown" | "ignored" => Status::Unknown,
            _ => return None,
        };
        Some(status)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failure => "FAILURE",
            Status::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: u64,
    pub build_type: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub status: Status,
    #[serde(default = "default_true")]
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// One execution of a test within a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: u64,
    pub test_id: u64,
    /// Full name in the `suite: package.Class.method` convention.
    pub name: String,
    pub build_id: u64,
    pub status: Status,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub new_failure: bool,
    #[serde(default)]
    pub duration_ms: u64,
}

impl TestRun {
    pub fn test_name(&self) -> TestName {
        TestName::parse(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemOccurrence {
    pub id: u64,
    pub build_id: u64,
    #[serde(rename = "type")]
    pub problem_type: String,
    pub identity: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub muted: bool,
}

pub const DEFAULT_PACKAGE: &str = "<default>";

/// Structured view of a test name such as `unit: com.acme.CartTest.addsItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestName {
    pub suite: String,
    pub package: String,
    pub class: String,
    pub method: String,
}

impl TestName {
    pub fn parse(full: &str) -> Self {
        let head_end = full.find('(').unwrap_or(full.len());
        let (suite, rest) = match full[..head_end].find(": ") {
            Some(pos) => (full[..pos].trim(), full[pos + 2..].trim()),
            None => ("", full.trim()),
        };
        let (head, parameters) = split_parameters(rest);
        let (class_path, method) = match head.rsplit_once('.') {
            Some((class_path, method)) => (class_path, method),
            None => ("", head),
        };
        let (package, class) = match class_path.rsplit_once('.') {
            Some((package, class)) => (package, class),
            None => ("", class_path),
        };
        Self {
            suite: suite.to_string(),
            package: if package.is_empty() {
                DEFAULT_PACKAGE.to_string()
            } else {
                package.to_string()
            },
            class: class.to_string(),
            method: format!("{method}{parameters}"),
        }
    }
}

/// Splits a trailing balanced `(...)` parameter list off a test name.
fn split_parameters(text: &str) -> (&str, &str) {
    if !text.ends_with(')') {
        return (text, "");
    }
    let mut depth = 0usize;
    for (pos, ch) in text.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (&text[..pos], &text[pos..]);
                }
            }
            _ => {}
        }
    }
    (text, "")
}
