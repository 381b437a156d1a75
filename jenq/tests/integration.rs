//! Integration tests for the jenq CLI.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

fn jenq_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jenq"));
    cmd.env("JENQ_ROOT", root);
    for key in [
        "JENKINS_HOST_URL",
        "JENKINS_DEFAULT_JOB",
        "JENKINS_PASSWORD",
        "JENKINS_API_TOKEN",
        "JENQ_LOG",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("JENKINS_USER", "ci-bot");
    cmd.env("NO_COLOR", "1");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run jenq")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

type Routes = HashMap<String, (u16, String)>;

/// Minimal HTTP server answering GETs from a path -> (status, body) table.
/// Listings carry absolute URLs, so routes are built once the host is known.
fn serve(routes: impl FnOnce(&str) -> Routes) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    let routes = Arc::new(routes(&host));

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || respond(stream, &routes));
        }
    });
    host
}

fn respond(mut stream: TcpStream, routes: &Routes) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    // Drain headers
    let mut line = String::new();
    while reader.read_line(&mut line).unwrap() > 2 {
        line.clear();
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = routes
        .get(path)
        .cloned()
        .unwrap_or((404, "not found".to_string()));
    let response = format!(
        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Routes for job `app` with builds 5..=1, newest first. Even builds pass.
fn app_routes(host: &str) -> Routes {
    let numbers = [5u64, 4, 3, 2, 1];
    let listing: Vec<String> = numbers
        .iter()
        .map(|n| format!(r#"{{"number": {n}, "url": "{host}/job/app/{n}/"}}"#))
        .collect();

    let mut routes = HashMap::new();
    routes.insert(
        "/job/app/api/json".to_string(),
        (200, format!(r#"{{"builds": [{}]}}"#, listing.join(","))),
    );
    for n in numbers {
        let result = if n % 2 == 0 { "SUCCESS" } else { "FAILURE" };
        let body = format!(
            r#"{{"id": "{n}", "result": "{result}", "description": "build {n}", "builtOn": "agent-{n}",
                "timestamp": 1500000000000,
                "actions": [{{"_class": "hudson.model.ParametersAction",
                              "parameters": [{{"name": "BUILD_TAG", "value": "tag{n}"}}]}}]}}"#
        );
        routes.insert(format!("/job/app/{n}/api/json"), (200, body));
    }
    routes
}

#[test]
fn test_parse_prints_grouping() {
    let tmp = TempDir::new().unwrap();
    let output = run(jenq_cmd(tmp.path()).args(["parse", "a=1 & b=2 | c=3"]));

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(stdout(&output).trim(), "a = 1 & (b = 2 | c = 3)");
}

#[test]
fn test_parse_tokens() {
    let tmp = TempDir::new().unwrap();
    let output = run(jenq_cmd(tmp.path()).args(["parse", "--tokens", "x!=5"]));

    assert!(output.status.success(), "{:?}", output);
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains("NotEqual"));
    assert_eq!(lines[3], "x != 5");
}

#[test]
fn test_parse_syntax_error() {
    let tmp = TempDir::new().unwrap();
    let output = run(jenq_cmd(tmp.path()).args(["parse", "x!5"]));

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Syntax error at 1"), "{}", err);
    assert!(err.contains("   ^"), "{}", err);
}

#[test]
fn test_builds_requires_job() {
    let tmp = TempDir::new().unwrap();
    let output = run(jenq_cmd(tmp.path()).args(["builds"]));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Job not specified"));
}

#[test]
fn test_builds_requires_host() {
    let tmp = TempDir::new().unwrap();
    let output = run(jenq_cmd(tmp.path())
        .env("JENKINS_API_TOKEN", "token")
        .args(["builds", "app"]));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("JENKINS_HOST_URL is empty"));
}

#[test]
fn test_builds_bad_filter_fails_before_fetching() {
    let tmp = TempDir::new().unwrap();
    // No host configured: the filter error must win
    let output = run(jenq_cmd(tmp.path()).args(["builds", "app", "-f", "status="]));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid expression"));
}

#[test]
fn test_config_set_host_and_job() {
    let tmp = TempDir::new().unwrap();

    let output = run(jenq_cmd(tmp.path()).args(["config", "set-host", "https://ci.example.com//"]));
    assert!(output.status.success(), "{:?}", output);
    let output = run(jenq_cmd(tmp.path()).args(["config", "set-job", "team/app"]));
    assert!(output.status.success(), "{:?}", output);

    assert!(tmp.path().join("config.toml").exists());

    let output = run(jenq_cmd(tmp.path()).args(["config"]));
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("https://ci.example.com/\n"), "{}", out);
    assert!(out.contains("team/app"), "{}", out);
    assert!(out.contains("ci-bot"), "{}", out);
}

#[test]
fn test_env_overrides_stored_host() {
    let tmp = TempDir::new().unwrap();
    run(jenq_cmd(tmp.path()).args(["config", "set-host", "https://stored.example.com"]));

    let output = run(jenq_cmd(tmp.path())
        .env("JENKINS_HOST_URL", "https://env.example.com")
        .args(["config", "show"]));
    assert!(stdout(&output).contains("https://env.example.com/"));
}

#[test]
fn test_builds_lists_in_order() {
    let tmp = TempDir::new().unwrap();
    let host = serve(app_routes);

    let output = run(jenq_cmd(tmp.path())
        .env("JENKINS_HOST_URL", &host)
        .env("JENKINS_API_TOKEN", "token")
        .args(["builds", "app", "-w", "3"]));

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        stdout(&output).lines().collect::<Vec<_>>(),
        vec![
            "FAILURE build 5",
            "SUCCESS build 4",
            "FAILURE build 3",
            "SUCCESS build 2",
            "FAILURE build 1",
        ]
    );
}

#[test]
fn test_builds_filter_and_json() {
    let tmp = TempDir::new().unwrap();
    let host = serve(app_routes);

    let output = run(jenq_cmd(tmp.path())
        .env("JENKINS_HOST_URL", &host)
        .env("JENKINS_DEFAULT_JOB", "app")
        .env("JENKINS_API_TOKEN", "token")
        .args(["b", "-f", "status=SUCCESS & BUILD_TAG!=tag4", "--format", "json"]));

    assert!(output.status.success(), "{:?}", output);
    let out = stdout(&output);
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], "2");
    assert_eq!(lines[0]["builtOn"], "agent-2");
}

#[test]
fn test_builds_failed_fetch_keeps_going() {
    let tmp = TempDir::new().unwrap();
    let host = serve(|host| {
        let mut routes = app_routes(host);
        routes.insert("/job/app/3/api/json".to_string(), (500, "boom".to_string()));
        routes
    });

    let output = run(jenq_cmd(tmp.path())
        .env("JENKINS_HOST_URL", &host)
        .env("JENKINS_API_TOKEN", "token")
        .args(["builds", "app"]));

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output).lines().count(), 4);
    assert!(stderr(&output).contains("wanted 200, got 500"), "{}", stderr(&output));
}

#[test]
fn test_builds_unknown_job_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let host = serve(|_| Routes::new());

    let output = run(jenq_cmd(tmp.path())
        .env("JENKINS_HOST_URL", &host)
        .env("JENKINS_API_TOKEN", "token")
        .args(["builds", "missing"]));

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("got 404"));
}
