use std::fmt;

use serde::Serialize;

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Floats, and integers widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        self.as_f64()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Declared type of an argument's values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    /// One of a fixed set of literal strings.
    Enumerated(Vec<String>),
}

impl ValueType {
    pub fn enumerated<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enumerated(choices.into_iter().map(Into::into).collect())
    }

    /// Human name used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Enumerated(_) => "choice",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn choices(&self) -> &[String] {
        match self {
            Self::Enumerated(choices) => choices,
            _ => &[],
        }
    }

    /// Whether a pre-typed default fits this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Integer, Value::Integer(_))
            | (Self::Float, Value::Float(_) | Value::Integer(_))
            | (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Enumerated(choices), Value::String(s)) => choices.iter().any(|c| c == s),
            _ => false,
        }
    }

    /// Convert a raw string. Choice membership is checked separately.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            Self::String | Self::Enumerated(_) => Some(Value::String(raw.to_string())),
            Self::Integer => parse_integer(raw).map(Value::Integer),
            Self::Float => parse_float(raw).map(Value::Float),
            Self::Boolean => parse_bool(raw).map(Value::Boolean),
        }
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: &Value) -> bool {
        let Some(n) = value.as_number() else {
            return true;
        };
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min}..={max}"),
            (Some(min), None) => write!(f, ">= {min}"),
            (None, Some(max)) => write!(f, "<= {max}"),
            (None, None) => f.write_str("any"),
        }
    }
}

/// Where a parsed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueSource {
    CommandLine,
    Environment,
    Default,
}

fn has_number_shape(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

fn parse_integer(raw: &str) -> Option<i64> {
    if !has_number_shape(raw) {
        return None;
    }
    raw.parse().ok()
}

fn parse_float(raw: &str) -> Option<f64> {
    // Rejects `inf`, `NaN` and friends that `f64::from_str` would accept.
    if !has_number_shape(raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Whether `raw` reads as a number (used for `-5` style positionals).
pub(crate) fn looks_numeric(raw: &str) -> bool {
    parse_float(raw).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_accept_sign_only() {
        assert_eq!(ValueType::Integer.coerce("42"), Some(Value::Integer(42)));
        assert_eq!(ValueType::Integer.coerce("-7"), Some(Value::Integer(-7)));
        assert_eq!(ValueType::Integer.coerce("+7"), Some(Value::Integer(7)));
        assert_eq!(ValueType::Integer.coerce("1,000"), None);
        assert_eq!(ValueType::Integer.coerce("1.5"), None);
        assert_eq!(ValueType::Integer.coerce(""), None);
        assert_eq!(ValueType::Integer.coerce(" 1"), None);
    }

    #[test]
    fn floats_reject_non_finite_words() {
        assert_eq!(ValueType::Float.coerce("1.5"), Some(Value::Float(1.5)));
        assert_eq!(ValueType::Float.coerce("-.5"), Some(Value::Float(-0.5)));
        assert_eq!(ValueType::Float.coerce("1e3"), Some(Value::Float(1000.0)));
        assert_eq!(ValueType::Float.coerce("inf"), None);
        assert_eq!(ValueType::Float.coerce("NaN"), None);
        assert_eq!(ValueType::Float.coerce("1.5.2"), None);
    }

    #[test]
    fn booleans_are_case_insensitive() {
        assert_eq!(ValueType::Boolean.coerce("TRUE"), Some(Value::Boolean(true)));
        assert_eq!(ValueType::Boolean.coerce("off"), Some(Value::Boolean(false)));
        assert_eq!(ValueType::Boolean.coerce("maybe"), None);
    }

    #[test]
    fn defaults_must_fit_type() {
        let color = ValueType::enumerated(["red", "blue"]);
        assert!(color.accepts(&Value::from("red")));
        assert!(!color.accepts(&Value::from("green")));
        assert!(ValueType::Float.accepts(&Value::Integer(3)));
        assert!(!ValueType::Integer.accepts(&Value::Float(3.0)));
    }

    #[test]
    fn range_is_inclusive() {
        let range = Range::new(Some(1.0), Some(10.0));
        assert!(range.contains(&Value::Integer(1)));
        assert!(range.contains(&Value::Integer(10)));
        assert!(!range.contains(&Value::Integer(11)));
        assert!(!range.contains(&Value::Float(0.5)));
        assert_eq!(range.to_string(), "1..=10");
    }
}
