//! CLI entry point for the HTTP job runner.
//!
//! Runs one HTTP job, either from a job document or from flags, and prints
//! the response to stdout. Diagnostics go to stderr and a JSON log file.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use http_job_runner::{
    config::Settings,
    executor::execute,
    fetch::BasicClient,
    job::{HTTP_JOB_KEY, HttpJob},
    output::render,
};
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "http_job_runner")]
#[command(about = "Execute a single HTTP job and print the response", long_about = None)]
struct Cli {
    /// Total request deadline in seconds (0 disables it)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Connect deadline in seconds (0 disables it)
    #[arg(long, global = true, value_name = "SECS")]
    connect_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a job document
    Run {
        /// Path to a JSON job document, or `-` for stdin
        #[arg(value_name = "JOB_FILE")]
        job: String,
    },
    /// Execute a job described by flags
    Request {
        /// Request method (GET or POST)
        #[arg(short = 'X', long)]
        method: String,

        /// Target URL
        #[arg(short, long)]
        url: String,

        /// Query parameter, repeatable
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Request header, repeatable
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// Request body, sent on POST
        #[arg(short, long, default_value = "")]
        body: String,

        /// Job key
        #[arg(long, default_value = HTTP_JOB_KEY)]
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/http_job_runner.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("http_job_runner.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_env()?.with_overrides(cli.timeout, cli.connect_timeout);
    info!(
        timeout = ?settings.timeout,
        connect_timeout = ?settings.connect_timeout,
        "Client settings loaded"
    );
    let client = BasicClient::from_settings(&settings)?;

    let job = match cli.command {
        Commands::Run { job } => HttpJob::load(&job)?,
        Commands::Request {
            method,
            url,
            params,
            headers,
            body,
            key,
        } => {
            let mut job = HttpJob::new(method, url).with_key(key).with_body(body);
            job.input.parameters.extend(params);
            job.input.headers.extend(headers);
            job
        }
    };

    let outcome = execute(&client, &job).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(&outcome, &mut out)?;
    out.flush()?;

    if outcome.is_transport_failure() {
        error!(url = %job.input.url, "Job finished without a response");
        bail!("request to {} failed", job.input.url);
    }

    Ok(())
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    split_pair(raw, '=')
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    split_pair(raw, ':').map(|(name, value)| (name, value.trim_start().to_string()))
}

fn split_pair(raw: &str, sep: char) -> Result<(String, String), String> {
    match raw.split_once(sep) {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected `KEY{sep}VALUE`, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_param("empty=").unwrap(), ("empty".to_string(), String::new()));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_parse_header_trims_leading_space() {
        assert_eq!(
            parse_header("Accept: text/plain").unwrap(),
            ("Accept".to_string(), "text/plain".to_string())
        );
        assert!(parse_header("Accept").is_err());
    }

    #[test]
    fn test_request_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "http_job_runner",
            "--timeout",
            "5",
            "request",
            "-X",
            "POST",
            "-u",
            "http://localhost/hook",
            "-p",
            "page=2",
            "-H",
            "X-Test: abc",
            "-b",
            "payload",
        ])
        .unwrap();

        assert_eq!(cli.timeout, Some(5));
        let Commands::Request {
            method,
            params,
            headers,
            body,
            key,
            ..
        } = cli.command
        else {
            panic!("expected the request subcommand");
        };
        assert_eq!(method, "POST");
        assert_eq!(params, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(headers, vec![("X-Test".to_string(), "abc".to_string())]);
        assert_eq!(body, "payload");
        assert_eq!(key, "http");
    }
}
