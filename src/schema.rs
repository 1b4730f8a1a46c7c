//! Input schemas derived from typed parameter structs, and the argument validator
//! the dispatcher runs before any handler sees a call.

use std::fmt;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::{Map, Value};
use thiserror::Error;

/// A JSON object, as used for tool arguments and MCP input schemas.
pub type JsonObject = Map<String, Value>;

/// Errors raised while deriving a schema. These are programmer errors and abort startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("JSON schema serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("input schema must be a JSON object")]
    NotAnObject,

    #[error("input schema root must have type \"object\", found {0}")]
    RootNotObject(String),

    #[error("property `{0}` has a malformed schema")]
    MalformedProperty(String),

    #[error("input schema does not compile: {0}")]
    Compile(String),
}

/// One top-level field of an input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// JSON key name.
    pub name: String,
    pub required: bool,
    /// Free-text description shown to the model.
    pub description: Option<String>,
}

/// A failed argument check, naming the offending field when there is one.
///
/// Nested fields are dotted paths, e.g. `authentication_ids.1`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    fn from_violation(violation: &jsonschema::ValidationError<'_>) -> Self {
        let mut path = violation.instance_path.clone().into_vec();
        match &violation.kind {
            ValidationErrorKind::Required { property } => {
                if let Some(property) = property.as_str() {
                    path.push(property.to_string());
                }
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                if let Some(first) = unexpected.first() {
                    path.push(first.clone());
                }
            }
            _ => {}
        }

        Self {
            field: (!path.is_empty()).then(|| path.join(".")),
            message: violation.to_string(),
        }
    }
}

/// The structural schema of a tool's parameters.
///
/// Holds the raw JSON Schema advertised to MCP clients, the compiled validator built
/// from it once at bind time, and a flat view of the top-level fields.
#[derive(Clone)]
pub struct InputSchema {
    raw: Arc<JsonObject>,
    validator: Arc<JSONSchema>,
    fields: Vec<FieldSchema>,
}

impl fmt::Debug for InputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSchema")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl InputSchema {
    /// Derive the schema of a parameter type.
    ///
    /// Sub-schemas are inlined so that clients never have to resolve `$ref`s. The type must
    /// be a struct with named fields (use `struct Empty {}` rather than a unit struct).
    pub fn describe<T: JsonSchema>() -> Result<Self, SchemaError> {
        let generator = SchemaSettings::draft07()
            .with(|settings| settings.inline_subschemas = true)
            .into_generator();
        let root = generator.into_root_schema_for::<T>();
        Self::from_json(serde_json::to_value(&root)?)
    }

    /// Build a schema from an already serialized JSON Schema document.
    ///
    /// Unknown top-level fields are rejected unless the document says otherwise.
    pub fn from_json(value: Value) -> Result<Self, SchemaError> {
        let Value::Object(mut raw) = value else {
            return Err(SchemaError::NotAnObject);
        };

        match raw.get("type") {
            Some(Value::String(t)) if t == "object" => {}
            Some(other) => return Err(SchemaError::RootNotObject(other.to_string())),
            None => return Err(SchemaError::RootNotObject("nothing".to_string())),
        }

        let required: Vec<String> = raw
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let mut fields = Vec::new();
        if let Some(properties) = raw.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| SchemaError::MalformedProperty("properties".to_string()))?;
            for (name, property) in properties {
                let property = property
                    .as_object()
                    .ok_or_else(|| SchemaError::MalformedProperty(name.clone()))?;
                fields.push(FieldSchema {
                    name: name.clone(),
                    required: required.contains(name),
                    description: property
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }

        raw.entry("additionalProperties").or_insert(Value::Bool(false));

        let document = Value::Object(raw);
        let validator =
            JSONSchema::compile(&document).map_err(|e| SchemaError::Compile(e.to_string()))?;
        let Value::Object(raw) = document else {
            return Err(SchemaError::NotAnObject);
        };

        Ok(Self {
            raw: Arc::new(raw),
            validator: Arc::new(validator),
            fields,
        })
    }

    /// The JSON Schema document, shared with every MCP `Tool` built from it.
    pub fn as_json(&self) -> Arc<JsonObject> {
        self.raw.clone()
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check raw call arguments against the schema.
    ///
    /// A missing or `null` argument bag is an empty object. `null` on a declared field
    /// counts as absent and is stripped before validation, so a `null` required field is
    /// reported as missing. Everything else is the compiled schema's call: unknown fields,
    /// types (never coerced), enumerations and nested shapes. The first violation is
    /// returned. On success the normalized argument object is ready for decoding.
    pub fn validate(&self, arguments: Value) -> Result<Value, ValidationError> {
        let mut arguments = match arguments {
            Value::Null => JsonObject::new(),
            Value::Object(map) => map,
            other => {
                return Err(ValidationError {
                    field: None,
                    message: format!("arguments must be a JSON object, got {}", json_type(&other)),
                })
            }
        };

        arguments.retain(|key, value| !(value.is_null() && self.field(key).is_some()));
        let arguments = Value::Object(arguments);

        let violation = self.validator.validate(&arguments).err().and_then(|mut violations| {
            violations
                .next()
                .map(|violation| ValidationError::from_violation(&violation))
        });
        match violation {
            Some(violation) => Err(violation),
            None => Ok(arguments),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
