//! Declarative command-line argument matching, validation and help rendering.
//!
//! A [`CommandSpec`] tree is validated once into a [`Parser`]; each call to
//! [`Parser::parse`] then runs the lexer, matcher and validator over one argv
//! and returns a [`ParseOutcome`]:
//!
//! ```
//! use argweave::{ArgumentSpec, CommandSpec, ParseOutcome, Parser};
//!
//! let parser = Parser::new(
//!     CommandSpec::new("tool")
//!         .arg(ArgumentSpec::flag("verbose").short('v').long("verbose"))
//!         .arg(ArgumentSpec::single("compile").short('c').long("compile")),
//! )
//! .unwrap();
//!
//! let ParseOutcome::Success(args) = parser.parse(&["-vcfast"]) else {
//!     panic!("expected success");
//! };
//! assert!(args.flag("verbose"));
//! assert_eq!(args.get_str("compile"), Some("fast"));
//! ```
//!
//! `-h`/`--help` and `--version` are reserved in every scope and stop parsing
//! with [`ParseOutcome::Help`] / [`ParseOutcome::Version`].

pub mod error;
pub mod lexer;
pub mod outcome;
pub mod registry;
pub mod render;
pub mod spec;
pub mod value;

mod matcher;
mod validate;

pub use error::{BuildError, Diagnostic, DiagnosticKind};
pub use outcome::{ParseOutcome, ParsedArgs};
pub use registry::{CommandId, Registry};
pub use render::{DefaultTemplate, Template};
pub use spec::{ArgKind, ArgumentSpec, CommandSpec};
pub use value::{Range, Value, ValueSource, ValueType};

use matcher::{MatchResult, Matcher};
use render::{FailureContext, help_context, version_context};

/// A validated registry plus the template used to render text.
///
/// `Parser` is `Send + Sync`; build it once and parse from any thread.
pub struct Parser {
    registry: Registry,
    template: Box<dyn Template>,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Validate `root` and build a parser with the default template.
    pub fn new(root: CommandSpec) -> Result<Self, BuildError> {
        Ok(Self {
            registry: Registry::build(root)?,
            template: Box::new(DefaultTemplate),
        })
    }

    /// Replace the help/version/failure template.
    pub fn with_template(mut self, template: impl Template + 'static) -> Self {
        self.template = Box::new(template);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parse `argv` (without the program name).
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> ParseOutcome {
        self.parse_with_env(argv, &[])
    }

    /// Parse `argv`, filling absent arguments that declare an env key from
    /// `env`.
    ///
    /// Value precedence is:
    /// 1) CLI argv
    /// 2) env
    /// 3) default
    pub fn parse_with_env<S: AsRef<str>>(
        &self,
        argv: &[S],
        env: &[(String, String)],
    ) -> ParseOutcome {
        let outcome = match Matcher::new(&self.registry, argv).run() {
            MatchResult::Help(id) => ParseOutcome::Help(self.render_help(id)),
            MatchResult::Version(id) => ParseOutcome::Version(
                self.template
                    .version(&version_context(&self.registry, id)),
            ),
            MatchResult::Failed(diagnostics) => ParseOutcome::Failure(diagnostics),
            MatchResult::Matched { scope, collected } => {
                match validate::validate(&self.registry, scope, &collected, env) {
                    Ok(parsed) => ParseOutcome::Success(parsed),
                    Err(diagnostics) => ParseOutcome::Failure(diagnostics),
                }
            }
        };

        match &outcome {
            ParseOutcome::Success(parsed) => {
                tracing::debug!(command = ?parsed.command_path(), "parsed arguments")
            }
            ParseOutcome::Failure(diagnostics) => {
                tracing::debug!(count = diagnostics.len(), "argument parsing failed")
            }
            ParseOutcome::Help(_) | ParseOutcome::Version(_) => {}
        }
        outcome
    }

    /// Help text for the scope reached by `path` (sub-command names or
    /// aliases), or `None` if the path does not exist.
    pub fn help<S: AsRef<str>>(&self, path: &[S]) -> Option<String> {
        self.registry.lookup(path).map(|id| self.render_help(id))
    }

    pub fn version<S: AsRef<str>>(&self, path: &[S]) -> Option<String> {
        self.registry.lookup(path).map(|id| {
            self.template
                .version(&version_context(&self.registry, id))
        })
    }

    /// Render diagnostics the way the template reports failures.
    pub fn render_failure(&self, diagnostics: &[Diagnostic]) -> String {
        self.template.failure(&FailureContext {
            program: self.registry.display_path(self.registry.root()),
            diagnostics,
        })
    }

    fn render_help(&self, id: CommandId) -> String {
        self.template.help(&help_context(&self.registry, id))
    }

    /// Render command-line-sourced values back into argv form.
    ///
    /// Named arguments come out as `--long=value` (or `-s=value` when the
    /// argument has no long form) in declaration order, followed by the next
    /// sub-command name, or by the positionals of the innermost scope behind a
    /// `--` when any of them starts with `-` or the first one names a
    /// sub-command. Env and default values are left
    /// out since a re-parse supplies them again.
    pub fn unparse(&self, parsed: &ParsedArgs) -> Vec<String> {
        let Some(active) = self.registry.lookup(parsed.command_path()) else {
            return Vec::new();
        };
        let chain = self.registry.ancestry(active);
        let mut argv = Vec::new();

        for (depth, &id) in chain.iter().enumerate() {
            let scope = self.registry.scope(id);
            let mut positionals: Vec<String> = Vec::new();

            for arg in scope.arguments() {
                if !parsed.is_explicit(arg.name()) {
                    continue;
                }
                let values = parsed.get_all(arg.name());
                if arg.kind().is_positional() {
                    positionals.extend(values.iter().map(Value::to_string));
                    continue;
                }
                let form = arg
                    .longs()
                    .first()
                    .map(|l| format!("--{l}"))
                    .or_else(|| arg.shorts().first().map(|s| format!("-{s}")))
                    .unwrap_or_default();
                for value in values {
                    if arg.kind() == ArgKind::Flag {
                        argv.push(form.clone());
                    } else {
                        argv.push(format!("{form}={value}"));
                    }
                }
            }

            if let Some(&next) = chain.get(depth + 1) {
                argv.push(self.registry.scope(next).name().to_string());
            } else if !positionals.is_empty() {
                let ambiguous = positionals.iter().any(|p| p.starts_with('-'))
                    || scope.find_subcommand(&positionals[0]).is_some();
                if ambiguous {
                    argv.push("--".to_string());
                }
                argv.extend(positionals);
            }
        }
        argv
    }
}
