//! Request schema metadata.
//!
//! The schema collaborator describes what a request expects as input and
//! output. The bridge never inspects caller types directly; it receives the
//! field name, a type label the collaborator computed, a description, and an
//! optional default, and serializes them opaquely into the payload.

use serde_json::{json, Value};

/// Description of a single named field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Type label computed by the schema collaborator (e.g. `"str"`).
    pub type_label: String,
    /// Free-text description.
    pub description: String,
    /// Default value. `None` means the field is required.
    pub default: Option<Value>,
}

impl FieldSpec {
    /// Create a required field with the given name and type label.
    pub fn required(name: impl Into<String>, type_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_label: type_label.into(),
            description: String::new(),
            default: None,
        }
    }

    /// Set the field description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set a default value, making the field optional.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Serialize to the payload representation.
    ///
    /// A required field serializes its default as `null`; the "required"
    /// marker itself never appears on the wire.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.type_label,
            "description": self.description,
            "default": self.default.clone().unwrap_or(Value::Null),
        })
    }
}

/// Declarative description of a request: name, instructions, field lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaSpec {
    /// Schema name.
    pub name: String,
    /// Free-text instructions for the downstream process.
    pub instructions: String,
    /// Ordered input field descriptors.
    pub inputs: Vec<FieldSpec>,
    /// Ordered output field descriptors.
    pub outputs: Vec<FieldSpec>,
}

impl SchemaSpec {
    /// Create an empty schema with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Append an input field.
    #[must_use]
    pub fn with_input(mut self, field: FieldSpec) -> Self {
        self.inputs.push(field);
        self
    }

    /// Append an output field.
    #[must_use]
    pub fn with_output(mut self, field: FieldSpec) -> Self {
        self.outputs.push(field);
        self
    }

    /// Serialize to the payload representation.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({
            "name": self.name,
            "instructions": self.instructions,
            "inputs": self.inputs.iter().map(FieldSpec::to_payload).collect::<Vec<_>>(),
            "outputs": self.outputs.iter().map(FieldSpec::to_payload).collect::<Vec<_>>(),
        })
    }
}
