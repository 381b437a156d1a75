//! Field resolution for filtering builds.
//!
//! Canonical names map to build attributes; anything else is looked up
//! as a build parameter.

use std::borrow::Cow;

use crate::query::FieldResolver;
use crate::schema::Build;

/// Canonical field names understood by [`BuildFields`].
pub const CANONICAL_FIELDS: &[&str] = &["number", "id", "worker", "status", "result", "description"];

/// Resolves filter fields against a [`Build`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildFields;

impl FieldResolver<Build> for BuildFields {
    fn resolve<'r>(&self, build: &'r Build, field: &str) -> Cow<'r, str> {
        Cow::Borrowed(resolve_field(build, field))
    }
}

/// Resolve `field` on `build`, falling back to build parameters.
///
/// Returns an empty string when nothing matches. A running build's status
/// resolves to the empty string.
pub fn resolve_field<'b>(build: &'b Build, field: &str) -> &'b str {
    match field {
        "number" | "id" => &build.number,
        "worker" => &build.built_on,
        "status" | "result" => build.result.as_str(),
        "description" => build.description.as_deref().unwrap_or(""),
        name => build.parameter(name).unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{compile, parse_query};
    use crate::schema::{Action, BuildResult, Parameter, Parameters};

    fn build_with_params(params: &[(&str, &str)]) -> Build {
        let params = params
            .iter()
            .map(|(name, value)| Parameter {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect();
        Build {
            number: "12".to_string(),
            result: BuildResult::Success,
            built_on: "agent-1".to_string(),
            actions: vec![
                Action::Other { class: None },
                Action::Parameters(Parameters(params)),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_canonical_fields() {
        let build = build_with_params(&[]);
        assert_eq!(resolve_field(&build, "number"), "12");
        assert_eq!(resolve_field(&build, "worker"), "agent-1");
        assert_eq!(resolve_field(&build, "status"), "SUCCESS");
        assert_eq!(resolve_field(&build, "description"), "");
    }

    #[test]
    fn test_parameter_fallback() {
        let build = build_with_params(&[("BUILD_TAG", "42")]);
        assert_eq!(resolve_field(&build, "BUILD_TAG"), "42");

        let eq = compile(&parse_query("BUILD_TAG=42").unwrap(), BuildFields);
        assert!(eq.matches(&build));
    }

    #[test]
    fn test_missing_field_resolves_empty() {
        let build = build_with_params(&[]);
        assert_eq!(resolve_field(&build, "BUILD_TAG"), "");

        let eq = compile(&parse_query("BUILD_TAG=42").unwrap(), BuildFields);
        let ne = compile(&parse_query("BUILD_TAG!=42").unwrap(), BuildFields);
        assert!(!eq.matches(&build));
        assert!(ne.matches(&build));
    }

    #[test]
    fn test_canonical_name_shadows_parameter() {
        let build = build_with_params(&[("worker", "from-param")]);
        assert_eq!(resolve_field(&build, "worker"), "agent-1");
    }

    #[test]
    fn test_parameters_across_actions() {
        let mut build = build_with_params(&[("A", "1")]);
        build.actions.push(Action::Parameters(Parameters(vec![Parameter {
            name: "B".to_string(),
            value: "2".to_string(),
        }])));
        assert_eq!(resolve_field(&build, "A"), "1");
        assert_eq!(resolve_field(&build, "B"), "2");
    }

    #[test]
    fn test_pending_status_is_empty() {
        let build = Build::default();
        let running = compile(&parse_query("status!=SUCCESS").unwrap(), BuildFields);
        assert_eq!(resolve_field(&build, "status"), "");
        assert!(running.matches(&build));
    }
}
