use thiserror::Error;

/// A user-input problem found while matching or validating argv.
///
/// `arg` fields hold the argument's display spelling (`--output`, `-o`,
/// `<FILE>`); `token`/`value` fields hold the offending raw text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("unknown argument '{token}'")]
    UnknownArgument { token: String },

    #[error("missing value for '{arg}'")]
    MissingValue { arg: String },

    #[error("'{arg}' does not take a value (got '{value}')")]
    UnexpectedValue { arg: String, value: String },

    #[error("missing required argument: {arg}")]
    MissingRequired { arg: String },

    #[error("invalid value '{value}' for '{arg}': expected {expected}")]
    InvalidType {
        arg: String,
        value: String,
        expected: &'static str,
    },

    #[error("value '{value}' for '{arg}' is out of range ({range})")]
    InvalidRange {
        arg: String,
        value: String,
        range: String,
    },

    #[error("invalid value '{value}' for '{arg}'. possible values: {}", choices.join(", "))]
    InvalidChoice {
        arg: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("arguments cannot be used together: {}", args.join(", "))]
    ConflictingArguments { group: String, args: Vec<String> },

    #[error("argument '{arg}' requires '{requires}'")]
    MissingDependency { arg: String, requires: String },
}

/// Tag for matching on a diagnostic without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UnknownArgument,
    MissingValue,
    UnexpectedValue,
    MissingRequired,
    InvalidType,
    InvalidRange,
    InvalidChoice,
    ConflictingArguments,
    MissingDependency,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::UnknownArgument { .. } => DiagnosticKind::UnknownArgument,
            Self::MissingValue { .. } => DiagnosticKind::MissingValue,
            Self::UnexpectedValue { .. } => DiagnosticKind::UnexpectedValue,
            Self::MissingRequired { .. } => DiagnosticKind::MissingRequired,
            Self::InvalidType { .. } => DiagnosticKind::InvalidType,
            Self::InvalidRange { .. } => DiagnosticKind::InvalidRange,
            Self::InvalidChoice { .. } => DiagnosticKind::InvalidChoice,
            Self::ConflictingArguments { .. } => DiagnosticKind::ConflictingArguments,
            Self::MissingDependency { .. } => DiagnosticKind::MissingDependency,
        }
    }
}

/// A malformed declaration tree, reported before any parse runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{scope}: '{form}' maps to both '{first}' and '{second}'")]
    DuplicateForm {
        scope: String,
        form: String,
        first: String,
        second: String,
    },

    #[error("{scope}: '{form}' is reserved for built-in help/version handling")]
    ReservedForm { scope: String, form: String },

    #[error("{scope}: argument name '{name}' is declared more than once on the command path")]
    DuplicateName { scope: String, name: String },

    #[error("{scope}: invalid form '{form}' on '{name}'")]
    InvalidForm {
        scope: String,
        name: String,
        form: String,
    },

    #[error("{scope}: '{name}' must declare at least one short or long form")]
    MissingForm { scope: String, name: String },

    #[error("{scope}: positional '{name}' cannot declare short or long forms")]
    PositionalWithForm { scope: String, name: String },

    #[error("{scope}: '{name}' is not positional and cannot be variadic")]
    VariadicNamed { scope: String, name: String },

    #[error("{scope}: variadic positional '{name}' must be the last positional")]
    VariadicNotLast { scope: String, name: String },

    #[error("{scope}: '{name}' cannot be both required and defaulted")]
    RequiredWithDefault { scope: String, name: String },

    #[error("{scope}: exclusive group '{group}' needs at least two members (found {members})")]
    UndersizedGroup {
        scope: String,
        group: String,
        members: usize,
    },

    #[error("{scope}: '{name}' declares an empty choice set")]
    EmptyChoices { scope: String, name: String },

    #[error("{scope}: default of '{name}' does not fit its {expected} type")]
    DefaultTypeMismatch {
        scope: String,
        name: String,
        expected: &'static str,
    },

    #[error("{scope}: '{name}' declares a range but is not numeric")]
    RangeOnNonNumeric { scope: String, name: String },

    #[error("{scope}: flag '{name}' must be boolean-typed")]
    FlagValueType { scope: String, name: String },

    #[error("{scope}: '{name}' requires unknown argument '{other}'")]
    UnknownRequirement {
        scope: String,
        name: String,
        other: String,
    },

    #[error("{scope}: sub-command name or alias '{name}' is declared more than once")]
    DuplicateSubcommand { scope: String, name: String },
}
