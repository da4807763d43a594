//! The execution plan handed to the external engine.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::path::PathBuf;

use crate::templates::ScriptTemplate;
use crate::topology::Topology;

/// Ordered name → value mapping exported to the executed script.
///
/// A `None` value means the variable is omitted (unset in the child
/// environment); `Some("")` is a variable that is present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    entries: Vec<(String, Option<String>)>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`, keeping its original position on replace.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_opt(name, Some(value.into()));
    }

    pub fn set_opt(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Set `name` to `TRUE` when `flag` holds, otherwise omit it.
    pub fn set_flag(&mut self, name: impl Into<String>, flag: bool) {
        self.set_opt(name, flag.then(|| "TRUE".to_string()));
    }

    /// Value of a present variable; omitted and unknown names give `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn is_omitted(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(existing, value)| existing == name && value.is_none())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extend(&mut self, other: VariableMap) {
        for (name, value) in other.entries {
            self.set_opt(name, value);
        }
    }

    /// All entries, including omitted ones.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    /// Only the variables that are exported.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name.as_str(), v)))
    }
}

impl Serialize for VariableMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Everything the execution engine needs to run one search.
///
/// Built once per invocation and never modified after emission.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    pub working_dir: PathBuf,
    pub topology: Topology,
    pub template: ScriptTemplate,
    /// Script to execute; the translated wrapper when one is active.
    pub program: PathBuf,
    pub variables: VariableMap,
    /// Positional arguments; the last one is the working directory.
    pub filenames: Vec<PathBuf>,
}
