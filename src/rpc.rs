use crate::dataset::{FinderKind, FinderSet};
use crate::error::{ErrorKind, LocatorError};
use crate::locator::Locator;
use crate::{scope, util};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, Write};

#[derive(Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Serialize)]
struct RpcResponse {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Serialize)]
struct RpcError {
    kind: &'static str,
    message: String,
}

#[derive(Deserialize, Default)]
struct ListMethodsParams {
    format: Option<String>,
}

#[derive(Deserialize)]
struct ParseLocatorParams {
    locator: String,
}

#[derive(Deserialize)]
struct FindOneParams {
    finder: String,
    locator: String,
}

#[derive(Deserialize)]
struct FindManyParams {
    finder: String,
    locator: Option<String>,
}

#[derive(Deserialize)]
struct GroupIntoParams {
    scope: String,
    /// Test-occurrence locator selecting the runs to group; all runs if absent.
    locator: Option<String>,
    filter: Option<String>,
}

#[derive(Deserialize)]
struct TestScopesParams {
    locator: String,
}

/// Longest request line echoed into the log when it cannot be parsed.
const LOGGED_LINE_BYTES: usize = 200;

const METHOD_LIST: &[&str] = &[
    "help",
    "list_methods",
    "parse_locator",
    "find_one",
    "find_many",
    "group_into",
    "test_scopes",
];

struct MethodDoc {
    name: &'static str,
    summary: &'static str,
    key_params: &'static [&'static str],
}

const METHOD_DOCS: &[MethodDoc] = &[
    MethodDoc {
        name: "help",
        summary: "Show RPC help, finder dimensions, and examples.",
        key_params: &[],
    },
    MethodDoc {
        name: "list_methods",
        summary: "List supported methods with short descriptions.",
        key_params: &["format (details|names)"],
    },
    MethodDoc {
        name: "parse_locator",
        summary: "Parse a locator and echo its dimensions and canonical form.",
        key_params: &["locator"],
    },
    MethodDoc {
        name: "find_one",
        summary: "Resolve a locator that must match exactly one item.",
        key_params: &["finder", "locator"],
    },
    MethodDoc {
        name: "find_many",
        summary: "Evaluate a collection locator and return one page of matches.",
        key_params: &["finder", "locator"],
    },
    MethodDoc {
        name: "group_into",
        summary: "Group test occurrences into package, suite or class scopes.",
        key_params: &["scope", "locator", "filter"],
    },
    MethodDoc {
        name: "test_scopes",
        summary: "Test-occurrence locator with a scope:(type:..) dimension, grouped.",
        key_params: &["locator"],
    },
];

fn method_docs_json() -> Vec<Value> {
    METHOD_DOCS
        .iter()
        .map(|doc| {
            let mut entry = serde_json::Map::new();
            entry.insert("name".to_string(), Value::String(doc.name.to_string()));
            entry.insert(
                "summary".to_string(),
                Value::String(doc.summary.to_string()),
            );
            if !doc.key_params.is_empty() {
                entry.insert("key_params".to_string(), json!(doc.key_params));
            }
            Value::Object(entry)
        })
        .collect()
}

fn finder_dimensions_json(finders: &FinderSet) -> Value {
    let mut map = serde_json::Map::new();
    for kind in FinderKind::ALL {
        let dimensions: Vec<Value> = finders
            .describe(kind)
            .into_iter()
            .map(|(name, description)| json!({ "name": name, "description": description }))
            .collect();
        map.insert(kind.name().to_string(), Value::Array(dimensions));
    }
    Value::Object(map)
}

fn method_help(finders: &FinderSet) -> Value {
    json!({
        "summary": "locq evaluates locator strings against builds, test occurrences and build problems, and serves JSONL RPC over stdin/stdout.",
        "locator_syntax": "name:value,name:(nested:value,...); a bare value is an id; $base64:<url-safe> escapes values with unbalanced parentheses",
        "paging": "start, count (-1 for unbounded), lookupLimit; results carry next_start when more matches exist",
        "methods": METHOD_LIST,
        "method_docs": method_docs_json(),
        "finders": finder_dimensions_json(finders),
        "scopes": scope::ScopeType::SUPPORTED,
        "examples": [
            { "method": "parse_locator", "params": { "locator": "buildType:Core,status:FAILURE,count:5" } },
            { "method": "find_one", "params": { "finder": "builds", "locator": "42" } },
            { "method": "find_many", "params": { "finder": "testOccurrences", "locator": "build:(buildType:Core),status:FAILURE,start:0,count:20" } },
            { "method": "group_into", "params": { "scope": "package", "locator": "build:42", "filter": "failed:(condition:more-than,value:0)" } },
            { "method": "test_scopes", "params": { "locator": "build:42,scope:(type:class,failed:(condition:more-than,value:0))" } }
        ],
        "cli_examples": [
            "locq parse 'buildType:Core,tag:(nightly)'",
            "locq find --data dataset.json --finder builds --locator 'status:FAILURE'",
            "locq group --data dataset.json --scope suite --locator 'build:42'",
            r#"locq request --data dataset.json --method find_one --params '{"finder":"builds","locator":"42"}'"#,
            "locq serve --data dataset.json"
        ]
    })
}

fn method_list(params: Value) -> Result<Value> {
    let params = if params.is_null() {
        ListMethodsParams::default()
    } else {
        serde_json::from_value(params)?
    };
    let format = params
        .format
        .as_deref()
        .unwrap_or("details")
        .trim()
        .to_ascii_lowercase();
    if format == "names" || format == "name" || format == "list" {
        return Ok(json!(METHOD_LIST));
    }
    Ok(json!({
        "methods": method_docs_json(),
        "names": METHOD_LIST,
    }))
}

pub fn serve<R: BufRead, W: Write>(finders: &FinderSet, reader: R, mut writer: W) -> Result<()> {
    for line in reader.lines() {
        let line = match line {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(error = %err, "stdin error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => handle_request(finders, request),
            Err(err) => {
                tracing::warn!(
                    line = %util::truncate_str_bytes(&line, LOGGED_LINE_BYTES),
                    "invalid request"
                );
                let err = anyhow::Error::new(err).context("invalid request");
                error_response(Value::Null, &err)
            }
        };

        writeln!(writer, "{}", serde_json::to_string(&response)?)?;
        writer.flush()?;
    }

    Ok(())
}

pub fn call(finders: &FinderSet, method: String, params_raw: &str, id_raw: &str) -> Result<String> {
    let params: Value = serde_json::from_str(params_raw).with_context(|| "parse params JSON")?;
    let id = parse_value(id_raw);
    let request = RpcRequest { id, method, params };
    let response = handle_request(finders, request);
    Ok(serde_json::to_string(&response)?)
}

fn handle_request(finders: &FinderSet, req: RpcRequest) -> RpcResponse {
    let id = req.id.clone();
    match handle_method(finders, &req.method, req.params) {
        Ok(value) => RpcResponse {
            id,
            result: Some(value),
            error: None,
        },
        Err(err) => {
            tracing::debug!(method = %req.method, error = %err, "request failed");
            error_response(id, &err)
        }
    }
}

pub fn handle_method(finders: &FinderSet, method: &str, params: Value) -> Result<Value> {
    let value = match method {
        "help" => method_help(finders),
        "list_methods" => method_list(params)?,
        "parse_locator" => {
            let params: ParseLocatorParams = parse_params(method, params)?;
            let locator = Locator::parse(&params.locator)?;
            json!({
                "locator": locator.view(),
                "canonical": locator.to_string(),
            })
        }
        "find_one" => {
            let params: FindOneParams = parse_params(method, params)?;
            match FinderKind::parse(&params.finder)? {
                FinderKind::Builds => json!(finders.builds.get_item(&params.locator)?),
                FinderKind::TestOccurrences => json!(finders.tests.get_item(&params.locator)?),
                FinderKind::ProblemOccurrences => {
                    json!(finders.problems.get_item(&params.locator)?)
                }
            }
        }
        "find_many" => {
            let params: FindManyParams = parse_params(method, params)?;
            let locator = params.locator.as_deref();
            match FinderKind::parse(&params.finder)? {
                FinderKind::Builds => json!(finders.builds.get_items(locator)?),
                FinderKind::TestOccurrences => json!(finders.tests.get_items(locator)?),
                FinderKind::ProblemOccurrences => json!(finders.problems.get_items(locator)?),
            }
        }
        "group_into" => {
            let params: GroupIntoParams = parse_params(method, params)?;
            let mut locator = match params.locator.as_deref() {
                Some(text) => Locator::parse(text)?,
                None => Locator::empty(),
            };
            let runs = finders.tests.evaluate_with(&mut locator, None)?.entries;
            json!(scope::group_into(&params.scope, runs, params.filter.as_deref())?)
        }
        "test_scopes" => {
            let params: TestScopesParams = parse_params(method, params)?;
            json!(scope::test_scopes(&finders.tests, &params.locator)?)
        }
        other => anyhow::bail!(
            "unknown method '{other}' (supported: {})",
            METHOD_LIST.join(", ")
        ),
    };
    Ok(value)
}

fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> Result<T> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).with_context(|| format!("invalid params for {method}"))
}

/// Client errors are `bad_request` unless the core says the target was
/// simply not there.
fn error_kind(err: &anyhow::Error) -> ErrorKind {
    err.downcast_ref::<LocatorError>()
        .map(LocatorError::kind)
        .unwrap_or(ErrorKind::BadRequest)
}

fn error_response(id: Value, err: &anyhow::Error) -> RpcResponse {
    RpcResponse {
        id,
        result: None,
        error: Some(RpcError {
            kind: error_kind(err).as_str(),
            message: format!("{err:#}"),
        }),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
