//! Job descriptors and results for the HTTP job type.
//!
//! A job document looks like:
//! ```json
//! {
//!   "key": "http",
//!   "input": {
//!     "method": "POST",
//!     "url": "https://example.com/hook",
//!     "parameters": { "page": "2" },
//!     "headers": { "Content-Type": "application/json" },
//!     "body": "{\"hello\":\"world\"}"
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;

/// Job key that marks a descriptor as an HTTP job.
pub const HTTP_JOB_KEY: &str = "http";

/// Body stored in a [`JobResult`] when the response body could not be read.
pub const BODY_READ_PLACEHOLDER: &str = "Error while reading the body";

/// One HTTP request to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpJob {
    pub key: String,
    pub input: HttpJobInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpJobInput {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl HttpJob {
    /// Builds an HTTP-keyed job with no parameters, headers or body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: HTTP_JOB_KEY.to_string(),
            input: HttpJobInput {
                method: method.into(),
                url: url.into(),
                ..Default::default()
            },
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.input.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.input.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.input.body = body.into();
        self
    }

    /// Parses a job from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid job document")
    }

    /// Loads a job document from `path`, or from stdin when `path` is `-`.
    pub fn load(path: &str) -> Result<Self> {
        let content = if path == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read job document from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read job document '{path}'"))?
        };
        Self::from_json(&content)
    }

    pub fn method(&self) -> Option<JobMethod> {
        JobMethod::parse(&self.input.method)
    }
}

/// The request methods an HTTP job may declare. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMethod {
    Get,
    Post,
}

impl JobMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(JobMethod::Get),
            "POST" => Some(JobMethod::Post),
            _ => None,
        }
    }

    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            JobMethod::Get => reqwest::Method::GET,
            JobMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Captured response of a sent request.
///
/// `headers` maps canonical header names to every value received for them,
/// in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

impl JobResult {
    pub fn push_header(&mut self, name: &str, value: String) {
        self.headers
            .entry(canonical_header_key(name))
            .or_default()
            .push(value);
    }
}

/// Converts a header name to canonical MIME form: the first letter and every
/// letter following a hyphen are upper-cased, the rest lower-cased.
///
/// Names containing bytes that are not valid in a header token are returned
/// unchanged.
pub fn canonical_header_key(name: &str) -> String {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !valid {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_json_full_document() {
        let job = HttpJob::from_json(
            r#"{
                "key": "http",
                "input": {
                    "method": "POST",
                    "url": "https://example.com/hook",
                    "parameters": { "page": "2" },
                    "headers": { "X-Token": "abc" },
                    "body": "payload"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(job.key, "http");
        assert_eq!(job.method(), Some(JobMethod::Post));
        assert_eq!(job.input.parameters.get("page").map(String::as_str), Some("2"));
        assert_eq!(job.input.headers.get("X-Token").map(String::as_str), Some("abc"));
        assert_eq!(job.input.body, "payload");
    }

    #[test]
    fn test_from_json_defaults_optional_fields() {
        let job = HttpJob::from_json(
            r#"{"key": "http", "input": {"method": "GET", "url": "http://localhost/"}}"#,
        )
        .unwrap();

        assert!(job.input.parameters.is_empty());
        assert!(job.input.headers.is_empty());
        assert_eq!(job.input.body, "");
    }

    #[test]
    fn test_from_json_missing_url_fails() {
        assert!(HttpJob::from_json(r#"{"key": "http", "input": {"method": "GET"}}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"key": "http", "input": {{"method": "GET", "url": "http://localhost/x"}}}}"#
        )
        .unwrap();

        let job = HttpJob::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(job, HttpJob::new("GET", "http://localhost/x"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(HttpJob::load("/nonexistent/job.json").is_err());
    }

    #[test]
    fn test_method_parse_is_case_sensitive() {
        assert_eq!(JobMethod::parse("GET"), Some(JobMethod::Get));
        assert_eq!(JobMethod::parse("POST"), Some(JobMethod::Post));
        assert_eq!(JobMethod::parse("get"), None);
        assert_eq!(JobMethod::parse("DELETE"), None);
        assert_eq!(JobMethod::parse(""), None);
    }

    #[test]
    fn test_canonical_header_key() {
        assert_eq!(canonical_header_key("x-test"), "X-Test");
        assert_eq!(canonical_header_key("content-type"), "Content-Type");
        assert_eq!(canonical_header_key("ETAG"), "Etag");
        assert_eq!(canonical_header_key("x--double"), "X--Double");
        assert_eq!(canonical_header_key("bad header"), "bad header");
    }

    #[test]
    fn test_push_header_keeps_duplicates_in_order() {
        let mut result = JobResult::default();
        result.push_header("set-cookie", "a=1".to_string());
        result.push_header("Set-Cookie", "b=2".to_string());

        assert_eq!(result.headers["Set-Cookie"], vec!["a=1", "b=2"]);
    }
}
