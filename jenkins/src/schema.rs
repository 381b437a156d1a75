//! Schema definitions for Jenkins JSON payloads.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Action class carrying build parameters.
pub const ACTION_CLASS_PARAMETERS: &str = "hudson.model.ParametersAction";

/// Action class carrying the causes that triggered a build.
pub const ACTION_CLASS_CAUSE: &str = "hudson.model.CauseAction";

/// Cause class for builds triggered by another job.
pub const CAUSE_CLASS_UPSTREAM: &str = "hudson.model.Cause$UpstreamCause";

/// Cause class for builds started by a user.
pub const CAUSE_CLASS_USER_ID: &str = "hudson.model.Cause$UserIdCause";

/// Cause class used by the Naginator retry plugin. Its short description
/// looks like `Started by Naginator after build #1971 failure`.
pub const CAUSE_CLASS_NAGINATOR: &str = "com.chikli.hudson.plugin.naginator.NaginatorCause";

/// A Jenkins build (`{build url}/api/json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Build {
    /// Build number as reported by Jenkins.
    #[serde(rename = "id", default)]
    pub number: String,

    /// Free-form description; Jenkins often wraps it in an anchor tag.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub result: BuildResult,

    /// Name of the agent the build ran on (empty for the built-in node).
    #[serde(rename = "builtOn", default)]
    pub built_on: String,

    #[serde(default)]
    pub actions: Vec<Action>,

    /// Milliseconds since the unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl Build {
    /// Look up a build parameter by name.
    ///
    /// Searches every parameters action in order, not only the first one;
    /// the first match wins.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.actions
            .iter()
            .filter_map(Action::parameters)
            .find_map(|params| params.get(name))
    }

    /// All causes recorded on the build, in action order.
    pub fn causes(&self) -> impl Iterator<Item = &Cause> {
        self.actions.iter().filter_map(Action::causes).flatten()
    }
}

/// Outcome of a build. Jenkins reports a running build as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BuildResult {
    #[default]
    Pending,
    Success,
    Failure,
    Aborted,
    Unstable,
    NotBuilt,
    /// Any literal this client does not know about.
    Other(String),
}

impl BuildResult {
    /// The literal Jenkins uses for this result (empty for pending).
    pub fn as_str(&self) -> &str {
        match self {
            BuildResult::Pending => "",
            BuildResult::Success => "SUCCESS",
            BuildResult::Failure => "FAILURE",
            BuildResult::Aborted => "ABORTED",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Other(s) => s,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BuildResult::Pending)
    }
}

impl From<&str> for BuildResult {
    fn from(s: &str) -> Self {
        match s {
            "" => BuildResult::Pending,
            "SUCCESS" => BuildResult::Success,
            "FAILURE" => BuildResult::Failure,
            "ABORTED" => BuildResult::Aborted,
            "UNSTABLE" => BuildResult::Unstable,
            "NOT_BUILT" => BuildResult::NotBuilt,
            other => BuildResult::Other(other.to_string()),
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BuildResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BuildResult::Pending => serializer.serialize_none(),
            other => serializer.serialize_str(other.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for BuildResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(BuildResult::from).unwrap_or_default())
    }
}

/// Something Jenkins recorded about a build, discriminated by `_class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAction", into = "RawAction")]
pub enum Action {
    /// `hudson.model.ParametersAction`
    Parameters(Parameters),
    /// `hudson.model.CauseAction`
    Causes(Vec<Cause>),
    /// Any other action; Jenkins also emits `{}` placeholders.
    Other { class: Option<String> },
}

impl Action {
    pub fn class(&self) -> Option<&str> {
        match self {
            Action::Parameters(_) => Some(ACTION_CLASS_PARAMETERS),
            Action::Causes(_) => Some(ACTION_CLASS_CAUSE),
            Action::Other { class } => class.as_deref(),
        }
    }

    pub fn parameters(&self) -> Option<&Parameters> {
        match self {
            Action::Parameters(params) => Some(params),
            _ => None,
        }
    }

    pub fn causes(&self) -> Option<&[Cause]> {
        match self {
            Action::Causes(causes) => Some(causes),
            _ => None,
        }
    }
}

/// Wire shape of an action before it is discriminated.
#[derive(Serialize, Deserialize)]
struct RawAction {
    #[serde(rename = "_class", default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    causes: Option<Vec<Cause>>,
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        match raw.class.as_deref() {
            Some(ACTION_CLASS_PARAMETERS) => Action::Parameters(raw.parameters.unwrap_or_default()),
            Some(ACTION_CLASS_CAUSE) => Action::Causes(raw.causes.unwrap_or_default()),
            _ => Action::Other { class: raw.class },
        }
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Parameters(params) => RawAction {
                class: Some(ACTION_CLASS_PARAMETERS.to_string()),
                parameters: Some(params),
                causes: None,
            },
            Action::Causes(causes) => RawAction {
                class: Some(ACTION_CLASS_CAUSE.to_string()),
                parameters: None,
                causes: Some(causes),
            },
            Action::Other { class } => RawAction {
                class,
                parameters: None,
                causes: None,
            },
        }
    }
}

/// A single build parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Boolean and numeric parameter values are kept in their JSON text form.
    #[serde(default, deserialize_with = "value_as_string")]
    pub value: String,
}

/// Ordered build parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(pub Vec<Parameter>);

impl Parameters {
    /// Value of the first parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.0.iter()
    }
}

fn value_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Why a build was started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    /// Java class of the cause; decides which fields are populated.
    #[serde(rename = "_class", default)]
    pub class: String,

    #[serde(rename = "shortDescription", default)]
    pub short_description: String,

    #[serde(rename = "upstreamBuild", default, skip_serializing_if = "Option::is_none")]
    pub upstream_build: Option<u64>,

    #[serde(rename = "upstreamProject", default, skip_serializing_if = "Option::is_none")]
    pub upstream_project: Option<String>,

    /// Path part of the upstream job URL, e.g. `job/{project}/`.
    #[serde(rename = "upstreamUrl", default, skip_serializing_if = "Option::is_none")]
    pub upstream_url: Option<String>,
}

/// Reference to the build that triggered an upstream cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamRef<'a> {
    pub project: &'a str,
    pub build: u64,
    pub url: Option<&'a str>,
}

impl Cause {
    /// The triggering build, for upstream causes.
    pub fn upstream(&self) -> Option<UpstreamRef<'_>> {
        if self.class != CAUSE_CLASS_UPSTREAM {
            return None;
        }
        Some(UpstreamRef {
            project: self.upstream_project.as_deref()?,
            build: self.upstream_build?,
            url: self.upstream_url.as_deref(),
        })
    }
}

/// Job summary (`{job url}/api/json`), only the fields the lister needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSummary {
    #[serde(default)]
    pub builds: Vec<BuildRef>,
}

/// A build entry in a job summary.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildRef {
    #[serde(default)]
    pub number: Option<u64>,
    pub url: String,
}
