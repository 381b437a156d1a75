//! Presentation helpers for build listings.

use chrono::{Local, TimeZone};
use colored::{ColoredString, Colorize};
use jenkins::{Build, BuildResult, Error};

const TIME_FMT: &str = "%Y-%m-%d %H:%M";

/// Status label, coloured by outcome. Jenkins reports running builds with
/// no result; they are shown as RUNNING.
pub fn status(result: &BuildResult) -> ColoredString {
    match result {
        BuildResult::Pending => "RUNNING".yellow(),
        BuildResult::Success => "SUCCESS".green(),
        BuildResult::Failure => "FAILURE".red(),
        BuildResult::Aborted => "ABORTED".magenta(),
        other => other.as_str().normal(),
    }
}

/// Strip the anchor Jenkins wraps some descriptions in.
///
/// Descriptions look like `<a title="{desc}" href="{href}">{number}: </a> {desc}`;
/// anything else is returned unchanged.
pub fn description(desc: &str) -> &str {
    const PREFIX: &str = "<a title=\"";
    let Some(rest) = desc.strip_prefix(PREFIX) else {
        return desc;
    };
    match rest.find("\" href=\"") {
        Some(end) => &rest[..end],
        None => desc,
    }
}

/// Format a Jenkins timestamp (milliseconds since the unix epoch) as
/// `YYYY-MM-DD HH:MM` in local time.
pub fn timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format(TIME_FMT).to_string(),
        None => "-".to_string(),
    }
}

/// Short description of the first recorded cause, if any.
pub fn cause(build: &Build) -> Option<String> {
    let cause = build.causes().next()?;
    match cause.upstream() {
        Some(upstream) => Some(format!("upstream {}#{}", upstream.project, upstream.build)),
        None if !cause.short_description.is_empty() => Some(cause.short_description.clone()),
        None => None,
    }
}

/// `STATUS description`, one build per line.
pub fn compact_line(build: &Build) -> String {
    let desc = build.description.as_deref().map(description).unwrap_or("");
    format!("{} {}", status(&build.result), desc)
}

/// The build as a single line of JSON.
pub fn json_line(build: &Build) -> jenkins::Result<String> {
    serde_json::to_string(build).map_err(|source| Error::Encode {
        what: format!("build {}", build.number),
        source,
    })
}

pub fn table_header() -> String {
    format!("{:<8} {:<10} {:<17} {:<14} DESCRIPTION", "NUMBER", "STATUS", "STARTED", "WORKER")
}

pub fn table_line(build: &Build) -> String {
    let desc = build.description.as_deref().map(description).unwrap_or("");
    let worker = if build.built_on.is_empty() { "-" } else { &build.built_on };
    // Pad by the plain label width so escape codes do not skew the columns
    let label_width = match &build.result {
        BuildResult::Pending => "RUNNING".len(),
        other => other.as_str().len(),
    };
    let status_cell = format!(
        "{}{}",
        status(&build.result),
        " ".repeat(10usize.saturating_sub(label_width))
    );

    let mut line = format!(
        "{:<8} {} {:<17} {:<14} {}",
        build.number,
        status_cell,
        timestamp(build.timestamp),
        worker,
        desc
    );
    if let Some(cause) = cause(build) {
        line.push_str(&format!("  [{}]", cause).dimmed().to_string());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use jenkins::{Action, Cause};

    #[test]
    fn test_description_strips_anchor() {
        let desc = r#"<a title="deploy api" href="/job/x/12/">12: </a> deploy api"#;
        assert_eq!(description(desc), "deploy api");
    }

    #[test]
    fn test_description_passthrough() {
        assert_eq!(description("plain text"), "plain text");
        assert_eq!(description("<a title=\"unterminated"), "<a title=\"unterminated");
        assert_eq!(description(""), "");
    }

    #[test]
    fn test_status_labels() {
        colored::control::set_override(false);
        assert_eq!(status(&BuildResult::Pending).to_string(), "RUNNING");
        assert_eq!(status(&BuildResult::Success).to_string(), "SUCCESS");
        assert_eq!(status(&BuildResult::Other("CANCELLED".into())).to_string(), "CANCELLED");
    }

    #[test]
    fn test_timestamp_format() {
        let formatted = timestamp(1_500_000_000_000);
        assert_eq!(formatted.len(), 16);
        assert_eq!(&formatted[4..5], "-");
        assert_eq!(&formatted[10..11], " ");
    }

    #[test]
    fn test_cause_summary() {
        let mut build = Build::default();
        assert_eq!(cause(&build), None);

        build.actions.push(Action::Causes(vec![Cause {
            class: jenkins::schema::CAUSE_CLASS_UPSTREAM.to_string(),
            short_description: "Started by upstream project".to_string(),
            upstream_build: Some(88),
            upstream_project: Some("pipeline".to_string()),
            upstream_url: None,
        }]));
        assert_eq!(cause(&build).as_deref(), Some("upstream pipeline#88"));

        build.actions = vec![Action::Causes(vec![Cause {
            class: jenkins::schema::CAUSE_CLASS_USER_ID.to_string(),
            short_description: "Started by user alice".to_string(),
            ..Default::default()
        }])];
        assert_eq!(cause(&build).as_deref(), Some("Started by user alice"));
    }

    #[test]
    fn test_compact_line() {
        colored::control::set_override(false);
        let build = Build {
            result: BuildResult::Failure,
            description: Some("nightly".to_string()),
            ..Default::default()
        };
        assert_eq!(compact_line(&build), "FAILURE nightly");
    }

    #[test]
    fn test_json_line() {
        let build = Build {
            number: "9".to_string(),
            result: BuildResult::Success,
            built_on: "agent-1".to_string(),
            ..Default::default()
        };
        let line = json_line(&build).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["id"], "9");
        assert_eq!(value["result"], "SUCCESS");
        assert_eq!(value["builtOn"], "agent-1");
    }

    #[test]
    fn test_table_line_columns() {
        colored::control::set_override(false);
        let mut build = Build {
            number: "42".to_string(),
            result: BuildResult::Pending,
            description: Some("smoke".to_string()),
            ..Default::default()
        };
        let line = table_line(&build);
        assert!(line.starts_with("42       RUNNING    "), "{line}");
        assert!(line.contains(" -              smoke"), "{line}");

        build.actions.push(Action::Causes(vec![Cause {
            short_description: "Started by timer".to_string(),
            ..Default::default()
        }]));
        assert!(table_line(&build).ends_with("smoke  [Started by timer]"));
    }
}
