//! Command implementations for jenq.

use std::io::{self, Write};

use jenkins::config::normalize_host;
use jenkins::credentials;
use jenkins::{compile, parse_query, tokenize, BuildFields, Client, Config, CredentialProvider, Error, QueryError};
use tracing::{debug, warn};

use crate::render;

/// List the builds of a job, keeping those that match `filter`.
///
/// Builds that could not be fetched are reported on stderr and the listing
/// continues; the process then exits with status 1.
pub fn builds(job: Option<&str>, filter: &str, format: &str, workers: Option<usize>) -> jenkins::Result<()> {
    let mut config = Config::load()?;
    if let Some(workers) = workers {
        config.workers = workers;
    }
    let job = config.job(job)?.to_string();

    // A bad filter is reported before any network traffic
    let expr = parse_query(filter).inspect_err(|e| report_query_error(filter, e))?;
    debug!(filter = %expr, "compiled filter");
    let predicate = compile(&expr, BuildFields);

    let credentials = credentials::default_provider(&config.username).credentials()?;
    let client = Client::from_config(&config, credentials)?;
    let builds = client.job_builds(&job)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if format == "table" {
        writeln!(out, "{}", render::table_header())?;
    }

    let mut failed = 0usize;
    let mut shown = 0usize;
    for item in builds {
        // Ordering faults end the listing; per-build failures do not
        let item = item?;
        let build = match item.outcome {
            Ok(build) => build,
            Err(e) => {
                failed += 1;
                eprintln!("Error: {}", e);
                continue;
            }
        };

        if !predicate.matches(&build) {
            continue;
        }
        shown += 1;

        match format {
            "json" => writeln!(out, "{}", render::json_line(&build)?)?,
            "table" => writeln!(out, "{}", render::table_line(&build))?,
            _ => writeln!(out, "{}", render::compact_line(&build))?,
        }
    }
    out.flush()?;

    debug!(job = %job, shown, failed, "listing complete");
    if failed > 0 {
        warn!(failed, "some builds could not be fetched");
        std::process::exit(1);
    }
    Ok(())
}

/// Parse a filter and print its canonical grouping.
pub fn parse(expr: &str, show_tokens: bool) -> jenkins::Result<()> {
    if show_tokens {
        let tokens = tokenize(expr).inspect_err(|e| report_query_error(expr, e))?;
        for token in &tokens {
            println!("{:>4}  {:<9} {}", token.offset, format!("{:?}", token.kind), token);
        }
    }

    let parsed = parse_query(expr).inspect_err(|e| report_query_error(expr, e))?;
    println!("{}", parsed);
    Ok(())
}

/// Point at the offending character of a filter that failed to tokenize.
fn report_query_error(input: &str, err: &QueryError) {
    if let QueryError::Syntax { offset } = err {
        let column = input[..*offset].chars().count();
        eprintln!("  {}", input);
        eprintln!("  {}^", " ".repeat(column));
    }
}

/// Show the effective configuration.
pub fn config_show() -> jenkins::Result<()> {
    let config = Config::load()?;
    let host = config.host_url().unwrap_or_else(|_| "(not set)".to_string());

    println!("Config:        {}", config.config_path().display());
    println!("Host:          {}", host);
    println!("Default job:   {}", config.default_job.as_deref().unwrap_or("(not set)"));
    println!("User:          {}", config.username);
    println!("Workers:       {}", config.workers);
    println!("Channel:       {}", config.channel_capacity);
    println!("Timeout:       {}s", config.timeout_secs);
    Ok(())
}

pub fn config_set_host(url: &str) -> jenkins::Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Config("Host URL cannot be empty".to_string()));
    }

    let mut config = Config::load_stored()?;
    config.host_url = Some(normalize_host(url));
    config.save()?;
    println!("Host set to {}", normalize_host(url));
    Ok(())
}

pub fn config_set_job(name: &str) -> jenkins::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config("Job name cannot be empty".to_string()));
    }

    let mut config = Config::load_stored()?;
    config.default_job = Some(name.to_string());
    config.save()?;
    println!("Default job set to {}", name);
    Ok(())
}
