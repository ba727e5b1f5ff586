//! Console rendering of executor outcomes.
//!
//! A received response is written as a fixed label sequence: status code,
//! headers as indented JSON, then the raw body.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::error;

use crate::executor::Outcome;
use crate::job::JobResult;

pub const UNRECOGNISED_METHOD_LINE: &str = "Unrecognised method.";
pub const HEADER_SERIALIZE_ERROR_LINE: &str = "error while marshaling the response headers";

/// Writes `outcome` to `out`.
///
/// A transport failure is rendered as a zero-valued [`JobResult`]. A job that
/// was skipped writes nothing.
pub fn render<W: Write>(outcome: &Outcome, out: &mut W) -> Result<()> {
    match outcome {
        Outcome::Completed(result) | Outcome::BodyUnreadable { result, .. } => {
            write_result(result, out)
        }
        Outcome::TransportFailed(_) => write_result(&JobResult::default(), out),
        Outcome::UnrecognisedMethod(_) => {
            writeln!(out, "{UNRECOGNISED_METHOD_LINE}")?;
            Ok(())
        }
        Outcome::Skipped { .. } => Ok(()),
    }
}

/// Writes the status, headers and body of `result`.
pub fn write_result<W: Write>(result: &JobResult, out: &mut W) -> Result<()> {
    writeln!(out, "Response Status Code")?;
    writeln!(out, "{}", result.status_code)?;
    writeln!(out, "Response Headers")?;
    write_headers(&result.headers, out)?;
    writeln!(out, "Response Body:")?;
    writeln!(out, "{}", result.body)?;
    Ok(())
}

/// Writes `headers` as 2-space indented JSON. A serialization failure is
/// logged and replaced by [`HEADER_SERIALIZE_ERROR_LINE`].
fn write_headers<W: Write, H: Serialize + ?Sized>(headers: &H, out: &mut W) -> Result<()> {
    match serde_json::to_string_pretty(headers) {
        Ok(json) => writeln!(out, "{json}")?,
        Err(e) => {
            error!(error = %e, "Failed to serialize response headers");
            writeln!(out, "{HEADER_SERIALIZE_ERROR_LINE}")?;
        }
    }
    Ok(())
}
