//! Process specification and builder.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};

use super::BridgeError;

/// Configuration option keys excluded from state export.
const REDACTED_OPTIONS: &[&str] = &["api_key"];

/// Immutable description of the external command to run.
///
/// Owned by the bridge and reused across invocations. The command is always
/// an ordered argument vector, never a single shell string; callers must
/// tokenize explicitly so shell metacharacters cannot change meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSpec {
    command: Vec<String>,
    env: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    encoding: String,
    options: BTreeMap<String, Value>,
}

impl ProcessSpec {
    /// Start building a spec for the given argument vector.
    pub fn builder<I, S>(command: I) -> ProcessSpecBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProcessSpecBuilder {
            command: command.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
            working_dir: None,
            timeout: None,
            encoding: "utf-8".to_string(),
            options: BTreeMap::new(),
        }
    }

    /// Build a spec with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::EmptyCommand`] when the vector is empty.
    pub fn new<I, S>(command: I) -> Result<Self, BridgeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(command).build()
    }

    /// The argument vector.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Environment overrides, merged on top of the inherited environment.
    #[must_use]
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Working directory, if set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Invocation deadline, if set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Text encoding label. Always `"utf-8"`.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Passthrough options, uninterpreted by the bridge.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    /// Shell-escaped command line, for diagnostics.
    #[must_use]
    pub fn display_command(&self) -> String {
        self.command
            .iter()
            .map(|arg| shell_escape::escape(Cow::Borrowed(arg.as_str())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Describe the configuration as a plain JSON map.
    ///
    /// Credential-like passthrough options (`api_key`) are excluded.
    #[must_use]
    pub fn dump_state(&self) -> Map<String, Value> {
        let mut state = Map::new();
        state.insert(
            "command".to_string(),
            Value::Array(self.command.iter().cloned().map(Value::String).collect()),
        );
        state.insert(
            "env".to_string(),
            Value::Object(
                self.env
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                    .collect(),
            ),
        );
        state.insert(
            "working_dir".to_string(),
            self.working_dir
                .as_ref()
                .map_or(Value::Null, |dir| Value::String(dir.display().to_string())),
        );
        state.insert(
            "timeout_secs".to_string(),
            self.timeout
                .map_or(Value::Null, |timeout| {
                    Value::from(timeout.as_secs_f64())
                }),
        );
        state.insert(
            "encoding".to_string(),
            Value::String(self.encoding.clone()),
        );
        for (key, value) in &self.options {
            if REDACTED_OPTIONS.contains(&key.as_str()) {
                continue;
            }
            state.insert(key.clone(), value.clone());
        }
        state
    }
}

/// Builder for [`ProcessSpec`].
#[derive(Debug, Clone)]
pub struct ProcessSpecBuilder {
    command: Vec<String>,
    env: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    encoding: String,
    options: BTreeMap<String, Value>,
}

impl ProcessSpecBuilder {
    /// Add one environment override.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add several environment overrides.
    #[must_use]
    pub fn envs<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.env.insert(key.into(), value.into());
        }
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the invocation deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the text encoding label.
    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Add a passthrough option, exported by `dump_state` but otherwise
    /// uninterpreted.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Validate and build the spec.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::EmptyCommand`] for an empty argument vector and
    /// [`BridgeError::UnsupportedEncoding`] for any encoding other than
    /// UTF-8.
    pub fn build(self) -> Result<ProcessSpec, BridgeError> {
        if self.command.is_empty() {
            return Err(BridgeError::EmptyCommand);
        }
        let normalized = self.encoding.to_ascii_lowercase();
        if normalized != "utf-8" && normalized != "utf8" {
            return Err(BridgeError::UnsupportedEncoding(self.encoding));
        }
        Ok(ProcessSpec {
            command: self.command,
            env: self.env,
            working_dir: self.working_dir,
            timeout: self.timeout,
            encoding: "utf-8".to_string(),
            options: self.options,
        })
    }
}
