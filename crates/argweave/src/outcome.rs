use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Diagnostic;
use crate::value::{Value, ValueSource};

/// Result of a full parse.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// Every token matched and every value validated.
    Success(ParsedArgs),
    /// `-h`/`--help` was given; carries the rendered help of the active scope.
    Help(String),
    /// `--version` was given; carries the rendered version line.
    Version(String),
    /// One or more diagnostics; no values are usable.
    Failure(Vec<Diagnostic>),
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn parsed(&self) -> Option<&ParsedArgs> {
        match self {
            Self::Success(parsed) => Some(parsed),
            _ => None,
        }
    }

    pub fn into_parsed(self) -> Option<ParsedArgs> {
        match self {
            Self::Success(parsed) => Some(parsed),
            _ => None,
        }
    }

    /// Diagnostics of a failed parse; empty otherwise.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Failure(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

/// Typed values of a successful parse.
///
/// Keys are canonical argument names from every scope on the active command
/// path, in path then declaration order. Flags that were neither given nor
/// defaulted are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedArgs {
    command: Vec<String>,
    values: IndexMap<String, Vec<Value>>,
    sources: IndexMap<String, ValueSource>,
    #[serde(skip)]
    occurrences: IndexMap<String, usize>,
}

impl ParsedArgs {
    pub(crate) fn new(command: Vec<String>) -> Self {
        Self {
            command,
            ..Default::default()
        }
    }

    pub(crate) fn insert(&mut self, name: &str, values: Vec<Value>, source: ValueSource) {
        self.values.insert(name.to_string(), values);
        self.sources.insert(name.to_string(), source);
    }

    pub(crate) fn set_occurrences(&mut self, name: &str, count: usize) {
        self.occurrences.insert(name.to_string(), count);
    }

    /// Sub-command names from the root to the active scope.
    pub fn command_path(&self) -> &[String] {
        &self.command
    }

    /// Last value of an argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(|v| v.last())
    }

    /// All values of an argument in argv order.
    pub fn get_all(&self, name: &str) -> &[Value] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Whether a flag is on (given, or set by env/default).
    pub fn flag(&self, name: &str) -> bool {
        self.get_bool(name).unwrap_or(false)
    }

    /// How many times an argument occurred on the command line (`-vvv` → 3).
    ///
    /// A space-joined run such as `--in a b` is one occurrence with two
    /// values; env and default values count as none.
    pub fn occurrences(&self, name: &str) -> usize {
        self.occurrences.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn source(&self, name: &str) -> Option<ValueSource> {
        self.sources.get(name).copied()
    }

    /// Whether the argument was given in argv (not env or default).
    pub fn is_explicit(&self, name: &str) -> bool {
        self.source(name) == Some(ValueSource::CommandLine)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
