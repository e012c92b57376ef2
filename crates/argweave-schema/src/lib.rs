//! JSON documents describing an argweave command tree.
//!
//! The data types here mirror `argweave::CommandSpec`/`ArgumentSpec` so a
//! command line can be declared outside Rust code, e.g.:
//!
//! ```json
//! {
//!   "name": "tool",
//!   "version": "1.0.0",
//!   "args": [
//!     { "name": "verbose", "kind": "flag", "short": ["v"], "long": ["verbose"] },
//!     { "name": "level", "kind": "single", "long": ["level"], "type": "integer",
//!       "min": 0, "max": 9, "default": 3 }
//!   ],
//!   "subcommands": [
//!     { "name": "convert", "args": [ { "name": "file", "kind": "positional", "required": true } ] }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use argweave::{ArgumentSpec, BuildError, CommandSpec, Parser, Value, ValueType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("argument '{arg}': {reason}")]
    InvalidArg { arg: String, reason: String },

    #[error(transparent)]
    Build(#[from] BuildError),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgKindSchema {
    Flag,
    #[default]
    Single,
    Multi,
    Positional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueTypeSchema {
    String,
    Integer,
    Float,
    Boolean,
    #[serde(alias = "enumerated")]
    Enum,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ArgSchema {
    pub name: String,
    #[serde(default)]
    pub kind: ArgKindSchema,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short: Vec<char>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub long: Vec<String>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueTypeSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandSchema>,
}

impl CommandSchema {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Convert into the builder form accepted by `argweave`.
    pub fn to_spec(&self) -> Result<CommandSpec> {
        let mut spec = CommandSpec::new(self.name.clone())
            .summary(self.summary.clone())
            .description(self.description.clone())
            .version(self.version.clone());
        for alias in &self.aliases {
            spec = spec.alias(alias.clone());
        }
        for example in &self.examples {
            spec = spec.example(example.clone());
        }
        if self.hidden {
            spec = spec.hidden();
        }
        for arg in &self.args {
            spec = spec.arg(arg.to_spec()?);
        }
        for child in &self.subcommands {
            spec = spec.subcommand(child.to_spec()?);
        }
        Ok(spec)
    }

    /// Convert and validate in one step.
    pub fn to_parser(&self) -> Result<Parser> {
        Ok(Parser::new(self.to_spec()?)?)
    }
}

impl ArgSchema {
    fn invalid(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidArg {
            arg: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn resolved_type(&self) -> Result<ValueType> {
        let declared = match (self.value_type, self.kind) {
            (Some(t), _) => t,
            (None, ArgKindSchema::Flag) => ValueTypeSchema::Boolean,
            (None, _) if !self.choices.is_empty() => ValueTypeSchema::Enum,
            (None, _) => ValueTypeSchema::String,
        };
        if declared != ValueTypeSchema::Enum && !self.choices.is_empty() {
            return Err(self.invalid("choices are only allowed on enum arguments"));
        }
        Ok(match declared {
            ValueTypeSchema::String => ValueType::String,
            ValueTypeSchema::Integer => ValueType::Integer,
            ValueTypeSchema::Float => ValueType::Float,
            ValueTypeSchema::Boolean => ValueType::Boolean,
            ValueTypeSchema::Enum => ValueType::Enumerated(self.choices.clone()),
        })
    }

    fn default_value(&self, value_type: &ValueType) -> Result<Option<Value>> {
        let Some(raw) = &self.default else {
            return Ok(None);
        };
        let value = match (value_type, raw) {
            (ValueType::Integer, serde_json::Value::Number(n)) => n.as_i64().map(Value::Integer),
            (ValueType::Float, serde_json::Value::Number(n)) => n.as_f64().map(Value::Float),
            (ValueType::Boolean, serde_json::Value::Bool(b)) => Some(Value::Boolean(*b)),
            // Strings go through the same coercion as argv values.
            (_, serde_json::Value::String(s)) => value_type.coerce(s),
            _ => None,
        };
        value
            .map(Some)
            .ok_or_else(|| self.invalid(format!("default {raw} is not a valid {}", value_type.describe())))
    }

    pub fn to_spec(&self) -> Result<ArgumentSpec> {
        let mut spec = match self.kind {
            ArgKindSchema::Flag => ArgumentSpec::flag(self.name.clone()),
            ArgKindSchema::Single => ArgumentSpec::single(self.name.clone()),
            ArgKindSchema::Multi => ArgumentSpec::multi(self.name.clone()),
            ArgKindSchema::Positional => ArgumentSpec::positional(self.name.clone()),
        };
        if self.variadic {
            if self.kind != ArgKindSchema::Positional {
                return Err(self.invalid("only positional arguments can be variadic"));
            }
            spec = spec.variadic();
        }

        for &short in &self.short {
            spec = spec.short(short);
        }
        for long in &self.long {
            spec = spec.long(long.clone());
        }

        let value_type = self.resolved_type()?;
        if let Some(default) = self.default_value(&value_type)? {
            spec = spec.default_value(default);
        }
        spec = spec.value_type(value_type);

        if self.required {
            spec = spec.required();
        }
        if let Some(group) = &self.group {
            spec = spec.exclusive_group(group.clone());
        }
        if !self.help.is_empty() {
            spec = spec.help(self.help.clone());
        }
        if self.min.is_some() || self.max.is_some() {
            spec = spec.range(self.min, self.max);
        }
        if let Some(value_name) = &self.value_name {
            spec = spec.value_name(value_name.clone());
        }
        if let Some(env) = &self.env {
            spec = spec.env(env.clone());
        }
        for other in &self.requires {
            spec = spec.requires(other.clone());
        }
        if self.hidden {
            spec = spec.hidden();
        }
        Ok(spec)
    }
}
