use serde_yaml::{Mapping, Value};

/// Failures raised while reading installer script text.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("installer script is empty")]
    Empty,
    #[error("invalid installer script: {0}")]
    Syntax(#[from] serde_yaml::Error),
    #[error("installer script must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

const DOCUMENT_MARKERS: [&str; 3] = ["game_slug", "runner", "version"];

/// Parsed installer script. The root is always a YAML mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallerScript {
    root: Mapping,
}

impl InstallerScript {
    /// Parse YAML (or JSON) text. Full installer documents are unwrapped to their `script`.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        Self::parse_document(text).map(|(script, _)| script)
    }

    /// Like [`InstallerScript::parse`], also returning the runner a full document declares.
    pub fn parse_document(text: &str) -> Result<(Self, Option<String>), ScriptError> {
        if text.trim().is_empty() {
            return Err(ScriptError::Empty);
        }

        let value: Value = serde_yaml::from_str(text)?;
        Self::unwrap_document(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ScriptError> {
        Self::unwrap_document(value).map(|(script, _)| script)
    }

    fn unwrap_document(value: Value) -> Result<(Self, Option<String>), ScriptError> {
        let mut root = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Err(ScriptError::Empty),
            other => return Err(ScriptError::NotAMapping(kind_of(&other))),
        };

        let is_document = DOCUMENT_MARKERS.iter().any(|key| root.contains_key(*key))
            && matches!(root.get("script"), Some(Value::Mapping(_)));
        if !is_document {
            return Ok((Self { root }, None));
        }

        let runner = root.get("runner").and_then(scalar_string);
        match root.remove("script") {
            Some(Value::Mapping(script)) => Ok((Self { root: script }, runner)),
            _ => Ok((Self { root }, runner)),
        }
    }

    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    pub fn mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Top-level keys rendered as text; non-string keys use their YAML form.
    pub fn top_level_keys(&self) -> Vec<String> {
        self.root
            .iter()
            .map(|(key, _)| scalar_string(key).unwrap_or_else(|| render_inline(key)))
            .collect()
    }

    pub fn section(&self, name: &str) -> Option<&Mapping> {
        self.root.get(name).and_then(Value::as_mapping)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Mapping> {
        self.root.get_mut(name).and_then(Value::as_mapping_mut)
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.root.insert(Value::from(key), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.root.remove(key)
    }

    pub fn game(&self) -> Option<&Mapping> {
        self.section("game")
    }

    /// Scalar value of a `game` key, numbers and booleans rendered as text.
    pub fn game_value(&self, key: &str) -> Option<String> {
        self.game()
            .and_then(|game| game.get(key))
            .and_then(scalar_string)
    }

    pub fn wine_version(&self) -> Option<String> {
        self.section("wine")
            .and_then(|wine| wine.get("version"))
            .and_then(scalar_string)
    }

    /// Well-formed entries of the `files` list.
    pub fn files(&self) -> Vec<FileEntry> {
        self.root
            .get("files")
            .and_then(Value::as_sequence)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| FileEntry::from_value(entry).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Well-formed steps of the `installer` list.
    pub fn tasks(&self) -> Vec<Task> {
        self.root
            .get("installer")
            .and_then(Value::as_sequence)
            .map(|steps| {
                steps
                    .iter()
                    .filter_map(|step| Task::from_value(step).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tasks_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.root
            .get_mut("installer")
            .and_then(Value::as_sequence_mut)
    }

    pub fn to_value(&self) -> Value {
        Value::Mapping(self.root.clone())
    }

    pub fn to_yaml(&self) -> Result<String, ScriptError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    pub fn to_json(&self) -> Option<serde_json::Value> {
        serde_json::to_value(&self.root).ok()
    }
}

/// Where an installer file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Url(String),
    Detailed {
        url: Option<String>,
        filename: Option<String>,
    },
}

/// One `files` entry: `- <id>: <url>` or `- <id>: {url: ..., filename: ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: String,
    pub source: FileSource,
}

impl FileEntry {
    pub(crate) fn from_value(value: &Value) -> Result<Self, String> {
        let (id, body) = single_entry(value)?;
        let source = match body {
            Value::Mapping(details) => FileSource::Detailed {
                url: details.get("url").and_then(scalar_string),
                filename: details.get("filename").and_then(scalar_string),
            },
            other => FileSource::Url(scalar_string(other).unwrap_or_default()),
        };
        Ok(Self { id, source })
    }
}

/// One step of the `installer` list, keyed by its directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub directive: String,
    pub body: Value,
}

impl Task {
    pub(crate) fn from_value(value: &Value) -> Result<Self, String> {
        let (directive, body) = single_entry(value)?;
        Ok(Self {
            directive,
            body: body.clone(),
        })
    }

    fn field(&self, key: &str) -> Option<String> {
        self.body
            .as_mapping()
            .and_then(|body| body.get(key))
            .and_then(scalar_string)
    }

    /// Name of a `task` directive (`create_prefix`, `winetricks`, ...).
    pub fn task_name(&self) -> Option<String> {
        if self.directive == "task" {
            self.field("name")
        } else {
            None
        }
    }

    pub fn arch(&self) -> Option<String> {
        self.field("arch")
    }
}

fn single_entry(value: &Value) -> Result<(String, &Value), String> {
    let mapping = value
        .as_mapping()
        .ok_or_else(|| format!("expected a mapping, found {}", kind_of(value)))?;
    if mapping.len() != 1 {
        return Err(format!(
            "expected a single key mapping, found {} keys",
            mapping.len()
        ));
    }
    let (key, body) = mapping
        .iter()
        .next()
        .ok_or_else(|| "empty mapping".to_string())?;
    let key = scalar_string(key).ok_or_else(|| "key must be a string".to_string())?;
    Ok((key, body))
}

pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn render_inline(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|_| kind_of(value).to_string())
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
