//! Generation requests and sampling options.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{InputValue, Message, SchemaSpec};

/// Sampling options forwarded to the downstream process.
///
/// Keys are arbitrary; only `n` (requested completion count) is interpreted
/// by the bridge itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationOptions {
    entries: BTreeMap<String, Value>,
}

impl GenerationOptions {
    /// Empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value under the same key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Set the requested completion count.
    #[must_use]
    pub fn with_n(self, n: u64) -> Self {
        self.with("n", Value::from(n))
    }

    /// Requested completion count.
    ///
    /// Returns 1 when `n` is absent. An explicit `n` must be a non-negative
    /// integer; `Some(0)` is a valid (if unusual) request for an empty
    /// result. Returns `None` when `n` is present but not a non-negative
    /// integer.
    #[must_use]
    pub fn n(&self) -> Option<usize> {
        match self.entries.get("n") {
            None => Some(1),
            Some(value) => value
                .as_u64()
                .and_then(|count| usize::try_from(count).ok()),
        }
    }

    /// Look up a raw option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// All option entries, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Render as a JSON object for the payload.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

/// A prior example input/output pair, passed through to the process as
/// context. Opaque to the bridge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Demo {
    /// Example inputs.
    pub inputs: BTreeMap<String, InputValue>,
    /// Example outputs.
    pub outputs: BTreeMap<String, InputValue>,
}

impl Demo {
    /// Render as a JSON object with `inputs` and `outputs` keys.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let render = |entries: &BTreeMap<String, InputValue>| {
            Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            )
        };
        serde_json::json!({
            "inputs": render(&self.inputs),
            "outputs": render(&self.outputs),
        })
    }
}

/// An immutable generation request: conversation, input values, optional
/// schema metadata, and sampling options. Built once per call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    messages: Vec<Message>,
    inputs: BTreeMap<String, InputValue>,
    demos: Vec<Demo>,
    schema: Option<SchemaSpec>,
    options: GenerationOptions,
}

impl GenerationRequest {
    /// Create a request from an ordered message sequence.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            inputs: BTreeMap::new(),
            demos: Vec::new(),
            schema: None,
            options: GenerationOptions::default(),
        }
    }

    /// Shorthand: a single user message.
    #[must_use]
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![Message::user(prompt)])
    }

    /// Add a named input value.
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    /// Append a demonstration pair.
    #[must_use]
    pub fn with_demo(mut self, demo: Demo) -> Self {
        self.demos.push(demo);
        self
    }

    /// Attach schema metadata.
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaSpec) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the sampling options.
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Ordered message sequence.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Named input values.
    #[must_use]
    pub fn inputs(&self) -> &BTreeMap<String, InputValue> {
        &self.inputs
    }

    /// Demonstration pairs.
    #[must_use]
    pub fn demos(&self) -> &[Demo] {
        &self.demos
    }

    /// Schema metadata, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&SchemaSpec> {
        self.schema.as_ref()
    }

    /// Sampling options.
    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }
}
