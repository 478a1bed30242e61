use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use tracing::warn;

use super::validation::validate_calls;
use crate::types::{ExtractedCall, ToolSchema};

const MAX_SCHEMA_ERRORS: usize = 3;

/// Validation strategies for extracted call parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validator {
    /// Name, required, unexpected and primitive type checks
    #[default]
    Structural,
    /// Structural checks, then full JSON Schema (draft 7) validation once those pass
    Strict,
}

impl Validator {
    /// Validate calls against the declared schemas; an empty result means valid.
    pub fn validate(&self, calls: &[ExtractedCall], schemas: &[ToolSchema]) -> Vec<String> {
        let errors = validate_calls(calls, schemas);

        match self {
            Validator::Structural => errors,
            Validator::Strict if !errors.is_empty() => errors,
            Validator::Strict => calls
                .iter()
                .filter_map(|call| {
                    schemas
                        .iter()
                        .find(|schema| schema.name == call.name)
                        .map(|schema| strict_validate(call, schema))
                })
                .flatten()
                .collect(),
        }
    }
}

fn strict_validate(call: &ExtractedCall, schema: &ToolSchema) -> Vec<String> {
    let compiled = match JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema.parameters)
    {
        Ok(compiled) => compiled,
        Err(err) => {
            warn!(
                target: "claude_tools::schema",
                function = %schema.name,
                error = %err,
                "parameter schema does not compile, skipping strict validation"
            );
            return Vec::new();
        }
    };

    let instance = Value::Object(call.parameters.clone());
    let mut details = Vec::new();

    if let Err(errors) = compiled.validate(&instance) {
        let mut truncated = false;

        for (idx, error) in errors.enumerate() {
            if idx < MAX_SCHEMA_ERRORS {
                let mut path = error.instance_path.to_string();
                if path.is_empty() {
                    path = "<root>".to_string();
                }
                details.push(format!(
                    "parameters of function '{}' at {}: {}",
                    call.name, path, error
                ));
            } else {
                truncated = true;
                break;
            }
        }

        if truncated {
            details.push(format!(
                "additional schema errors for function '{}' truncated",
                call.name
            ));
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schemas() -> Vec<ToolSchema> {
        vec![ToolSchema::new(
            "SetUnits",
            "Set display units",
            json!({
                "type": "object",
                "properties": {
                    "units": {"type": "string", "enum": ["celsius", "fahrenheit"]}
                },
                "required": ["units"]
            }),
        )]
    }

    fn call(units: &str) -> ExtractedCall {
        serde_json::from_value(json!({"name": "SetUnits", "parameters": {"units": units}})).unwrap()
    }

    #[test]
    fn test_structural_ignores_enum_constraints() {
        assert!(Validator::Structural
            .validate(&[call("kelvin")], &schemas())
            .is_empty());
    }

    #[test]
    fn test_strict_reports_enum_violation_with_path() {
        let errors = Validator::Strict.validate(&[call("kelvin")], &schemas());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("/units"), "got: {}", errors[0]);
    }

    #[test]
    fn test_strict_returns_structural_errors_first() {
        let bad: ExtractedCall =
            serde_json::from_value(json!({"name": "SetUnits", "parameters": {}})).unwrap();
        let errors = Validator::Strict.validate(&[bad], &schemas());
        assert_eq!(
            errors,
            vec!["missing required parameter 'units' for function 'SetUnits'"]
        );
    }

    #[test]
    fn test_strict_accepts_valid_call() {
        assert!(Validator::Strict
            .validate(&[call("celsius")], &schemas())
            .is_empty());
    }
}
