pub mod validation;
pub mod validator;

use schemars::{
    schema::{ObjectValidation, RootSchema, Schema, SchemaObject},
    JsonSchema,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::types::ToolSchema;

pub use validation::{validate_call, validate_calls};
pub use validator::Validator;

/// A Rust parameter type that describes one callable function.
///
/// Usually implemented with the `#[function_schema]` attribute, which caches
/// the generated [`ToolSchema`] for the lifetime of the process.
pub trait FunctionSchema: DeserializeOwned + Send + Sync + 'static {
    fn tool_schema() -> &'static ToolSchema;
}

impl ToolSchema {
    /// Build a schema from a `schemars` root; the `$schema` marker is dropped.
    pub fn from_root_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        root: RootSchema,
    ) -> Self {
        let mut parameters = serde_json::to_value(root)
            .unwrap_or_else(|_| json!({"type": "object", "properties": {}, "required": []}));

        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
        }

        ToolSchema::new(name, description, parameters)
    }

    /// Derive the parameter schema from `T` without the attribute macro.
    pub fn for_type<T: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::from_root_schema(name, description, schemars::schema_for!(T))
    }
}

/// Apply doc comments captured by the procedural macro to the generated schema metadata.
pub fn apply_doc_comments(
    root: &mut RootSchema,
    title: &'static str,
    description: Option<&'static str>,
    field_docs: &[(&'static str, &'static str)],
) {
    let schema_object = &mut root.schema;
    apply_struct_metadata(schema_object, title, description);

    if let Some(object_validation) = schema_object.object.as_mut() {
        apply_field_metadata(object_validation.as_mut(), field_docs);
    }
}

fn apply_struct_metadata(
    schema_object: &mut SchemaObject,
    title: &'static str,
    description: Option<&'static str>,
) {
    let metadata = schema_object.metadata();
    metadata.title = Some(title.to_string());

    if let Some(description) = description {
        if metadata.description.is_none() {
            metadata.description = Some(description.to_string());
        }
    }
}

fn apply_field_metadata(
    object_validation: &mut ObjectValidation,
    field_docs: &[(&'static str, &'static str)],
) {
    for (field, doc) in field_docs {
        if let Some(Schema::Object(field_object)) = object_validation.properties.get_mut(*field) {
            let metadata = field_object.metadata();
            if metadata.description.is_none() {
                metadata.description = Some((*doc).to_string());
            }
        }
    }
}
