//! Request executor for HTTP jobs.
//!
//! [`execute`] turns an [`HttpJob`] into one outbound request, sends it
//! through the injected [`HttpClient`] and captures the response as a tagged
//! [`Outcome`]. Printing is left to [`crate::output`].

use crate::fetch::HttpClient;
use crate::job::{BODY_READ_PLACEHOLDER, HTTP_JOB_KEY, HttpJob, JobMethod, JobResult};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Request, Url};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, warn};

/// The outbound request could not be constructed from the job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),
}

/// What happened to a job once it reached the executor.
#[derive(Debug)]
pub enum Outcome {
    /// A response was received and its body read in full.
    Completed(JobResult),
    /// A response was received but its body could not be read; the result
    /// body holds [`BODY_READ_PLACEHOLDER`].
    BodyUnreadable {
        result: JobResult,
        error: reqwest::Error,
    },
    /// No response was received (DNS, connect, timeout...).
    TransportFailed(reqwest::Error),
    /// The job declared a method other than `GET` or `POST`.
    UnrecognisedMethod(String),
    /// The job is not keyed as an HTTP job and was ignored.
    Skipped { key: String },
}

impl Outcome {
    /// The captured response, if one was received.
    pub fn result(&self) -> Option<&JobResult> {
        match self {
            Outcome::Completed(result) | Outcome::BodyUnreadable { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Outcome::TransportFailed(_))
    }
}

/// Executes `job` with `client`.
///
/// # Errors
///
/// Returns a [`JobError`] only when the request cannot be built. Transport
/// and body-read failures are reported through [`Outcome`].
#[tracing::instrument(
    skip_all,
    fields(key = %job.key, method = %job.input.method, url = %job.input.url)
)]
pub async fn execute<C: HttpClient>(client: &C, job: &HttpJob) -> Result<Outcome, JobError> {
    let Some(method) = job.method() else {
        warn!("Unrecognised job method");
        return Ok(Outcome::UnrecognisedMethod(job.input.method.clone()));
    };

    if job.key != HTTP_JOB_KEY {
        debug!("Job is not keyed as an HTTP job, skipping");
        return Ok(Outcome::Skipped {
            key: job.key.clone(),
        });
    }

    let req = build_request(method, job)
        .inspect_err(|e| error!(error = %e, "Failed to build request"))?;
    debug!(final_url = %req.url(), "Sending request");

    let response = match client.execute(req).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Error while making request");
            return Ok(Outcome::TransportFailed(e));
        }
    };

    let mut result = JobResult {
        status_code: response.status().as_u16(),
        ..Default::default()
    };
    for (name, value) in response.headers() {
        result.push_header(
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }

    match response.text().await {
        Ok(body) => {
            info!(status = result.status_code, bytes = body.len(), "Response received");
            result.body = body;
            Ok(Outcome::Completed(result))
        }
        Err(e) => {
            warn!(status = result.status_code, error = %e, "Error while reading the body");
            result.body = BODY_READ_PLACEHOLDER.to_string();
            Ok(Outcome::BodyUnreadable { result, error: e })
        }
    }
}

/// Builds the outbound request for `job` using `method`.
///
/// Query parameters are merged into the URL, job headers replace any
/// existing header of the same name, and the job body is attached for POST
/// only.
pub fn build_request(method: JobMethod, job: &HttpJob) -> Result<Request, JobError> {
    let input = &job.input;

    let mut url = Url::parse(&input.url).map_err(|source| JobError::InvalidUrl {
        url: input.url.clone(),
        source,
    })?;
    merge_query(&mut url, &input.parameters);

    let mut req = Request::new(method.as_reqwest(), url);

    for (name, value) in &input.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| JobError::InvalidHeaderName(name.clone()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| JobError::InvalidHeaderValue(name.clone()))?;
        req.headers_mut().insert(header_name, header_value);
    }

    if method == JobMethod::Post {
        *req.body_mut() = Some(input.body.clone().into());
    }

    Ok(req)
}

/// Merges `parameters` into the query string of `url`. A parameter replaces
/// every existing value under the same key. Pairs are written sorted by key.
fn merge_query(url: &mut Url, parameters: &HashMap<String, String>) {
    if parameters.is_empty() {
        return;
    }

    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in url.query_pairs() {
        merged
            .entry(k.into_owned())
            .or_default()
            .push(v.into_owned());
    }
    for (k, v) in parameters {
        merged.insert(k.clone(), vec![v.clone()]);
    }

    url.query_pairs_mut()
        .clear()
        .extend_pairs(merged.iter().flat_map(|(k, vs)| vs.iter().map(move |v| (k, v))));
}
