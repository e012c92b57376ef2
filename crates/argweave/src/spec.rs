//! Declarations the caller builds before parsing.
//!
//! ```
//! use argweave::{ArgumentSpec, CommandSpec, ValueType};
//!
//! let root = CommandSpec::new("tool")
//!     .version("1.2.0")
//!     .arg(ArgumentSpec::flag("verbose").short('v').long("verbose"))
//!     .subcommand(
//!         CommandSpec::new("convert")
//!             .summary("Convert a file")
//!             .arg(ArgumentSpec::single("input").long("input").required())
//!             .arg(ArgumentSpec::single("level").short('l').value_type(ValueType::Integer)),
//!     );
//! assert_eq!(root.subcommands().len(), 1);
//! ```

use crate::value::{Range, Value, ValueType};

/// How an argument consumes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Presence-only switch.
    Flag,
    /// Named argument with exactly one value per occurrence.
    Single,
    /// Named argument collecting values across occurrences.
    Multi,
    /// Matched by position; a variadic positional takes every remaining value.
    Positional { variadic: bool },
}

impl ArgKind {
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Flag)
    }

    pub fn is_positional(self) -> bool {
        matches!(self, Self::Positional { .. })
    }

    pub fn is_variadic(self) -> bool {
        matches!(self, Self::Positional { variadic: true })
    }
}

/// One declared argument.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub(crate) name: String,
    pub(crate) shorts: Vec<char>,
    pub(crate) longs: Vec<String>,
    pub(crate) kind: ArgKind,
    pub(crate) value_type: ValueType,
    pub(crate) default: Option<Value>,
    pub(crate) required: bool,
    pub(crate) exclusive_group: Option<String>,
    pub(crate) help: String,
    pub(crate) range: Option<Range>,
    pub(crate) value_name: Option<String>,
    pub(crate) env: Option<String>,
    pub(crate) requires: Vec<String>,
    pub(crate) hidden: bool,
    /// `.variadic()` was called; only valid on positionals.
    pub(crate) variadic: bool,
}

impl ArgumentSpec {
    fn with_kind(name: impl Into<String>, kind: ArgKind, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            shorts: Vec::new(),
            longs: Vec::new(),
            kind,
            value_type,
            default: None,
            required: false,
            exclusive_group: None,
            help: String::new(),
            range: None,
            value_name: None,
            env: None,
            requires: Vec::new(),
            hidden: false,
            variadic: false,
        }
    }

    /// A boolean switch such as `--verbose`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::with_kind(name, ArgKind::Flag, ValueType::Boolean)
    }

    /// A named argument taking one value, such as `--output out.txt`.
    pub fn single(name: impl Into<String>) -> Self {
        Self::with_kind(name, ArgKind::Single, ValueType::String)
    }

    /// A named argument that may repeat or take several values.
    pub fn multi(name: impl Into<String>) -> Self {
        Self::with_kind(name, ArgKind::Multi, ValueType::String)
    }

    /// A positional argument.
    pub fn positional(name: impl Into<String>) -> Self {
        Self::with_kind(name, ArgKind::Positional { variadic: false }, ValueType::String)
    }

    /// Add a short form (`-c`).
    pub fn short(mut self, letter: char) -> Self {
        self.shorts.push(letter);
        self
    }

    /// Add a long form (`--compile`). Leading dashes are optional.
    pub fn long(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix("--").map(str::to_string).unwrap_or(name);
        self.longs.push(name);
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Shorthand for `value_type(ValueType::Enumerated(..))`.
    pub fn choices<I, S>(self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_type(ValueType::enumerated(choices))
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn exclusive_group(mut self, group: impl Into<String>) -> Self {
        self.exclusive_group = Some(group.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Inclusive bounds for numeric values.
    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.range = Some(Range::new(min, max));
        self
    }

    /// Placeholder shown in help (`<FILE>`).
    pub fn value_name(mut self, value_name: impl Into<String>) -> Self {
        self.value_name = Some(value_name.into());
        self
    }

    /// Environment key consulted when the argument is absent from argv.
    pub fn env(mut self, key: impl Into<String>) -> Self {
        self.env = Some(key.into());
        self
    }

    /// Another argument of the same scope that must be present alongside this one.
    pub fn requires(mut self, other: impl Into<String>) -> Self {
        self.requires.push(other.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Mark a positional as taking every remaining value.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        if let ArgKind::Positional { variadic } = &mut self.kind {
            *variadic = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorts(&self) -> &[char] {
        &self.shorts
    }

    pub fn longs(&self) -> &[String] {
        &self.longs
    }

    pub fn kind(&self) -> ArgKind {
        self.kind
    }

    pub fn get_value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn get_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn group(&self) -> Option<&str> {
        self.exclusive_group.as_deref()
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn get_range(&self) -> Option<Range> {
        self.range
    }

    pub fn get_env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn get_requires(&self) -> &[String] {
        &self.requires
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Placeholder for help and usage; defaults to the upper-cased name.
    pub fn placeholder(&self) -> String {
        self.value_name
            .clone()
            .unwrap_or_else(|| self.name.to_ascii_uppercase().replace('-', "_"))
    }

    /// Preferred spelling in diagnostics: long form, then short, then `<NAME>`.
    pub fn display_name(&self) -> String {
        if let Some(long) = self.longs.first() {
            format!("--{long}")
        } else if let Some(short) = self.shorts.first() {
            format!("-{short}")
        } else {
            format!("<{}>", self.placeholder())
        }
    }
}

/// A scope: the root program or one sub-command.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub(crate) name: String,
    pub(crate) summary: String,
    pub(crate) description: String,
    pub(crate) version: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) examples: Vec<String>,
    pub(crate) hidden: bool,
    pub(crate) arguments: Vec<ArgumentSpec>,
    pub(crate) subcommands: Vec<CommandSpec>,
}

impl CommandSpec {
    /// For the root, `name` is only the program name shown in help.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn arg(mut self, arg: ArgumentSpec) -> Self {
        self.arguments.push(arg);
        self
    }

    pub fn args<I: IntoIterator<Item = ArgumentSpec>>(mut self, args: I) -> Self {
        self.arguments.extend(args);
        self
    }

    pub fn subcommand(mut self, command: CommandSpec) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn subcommands(&self) -> &[CommandSpec] {
        &self.subcommands
    }
}
