//! Token consumption against the registry.

use std::borrow::Cow;
use std::collections::HashMap;
use std::iter::Peekable;

use crate::error::Diagnostic;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::registry::{CommandId, Registry, Resolution, Scope};
use crate::spec::ArgKind;
use crate::value::looks_numeric;

/// Raw (untyped) values per `(scope, argument index)`, in argv order.
///
/// Flag occurrences are recorded as the literal `"true"`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Collected<'a> {
    entries: HashMap<(CommandId, usize), Vec<Cow<'a, str>>>,
    occurrences: HashMap<(CommandId, usize), usize>,
}

impl<'a> Collected<'a> {
    /// Start a new occurrence with its first value.
    fn record(&mut self, scope: CommandId, index: usize, value: Cow<'a, str>) {
        *self.occurrences.entry((scope, index)).or_default() += 1;
        self.push(scope, index, value);
    }

    /// Append a value to the current occurrence.
    fn push(&mut self, scope: CommandId, index: usize, value: Cow<'a, str>) {
        self.entries.entry((scope, index)).or_default().push(value);
    }

    pub(crate) fn occurrences(&self, scope: CommandId, index: usize) -> usize {
        self.occurrences.get(&(scope, index)).copied().unwrap_or(0)
    }

    pub(crate) fn get(&self, scope: CommandId, index: usize) -> Option<&[Cow<'a, str>]> {
        self.entries.get(&(scope, index)).map(Vec::as_slice)
    }
}

/// Terminal state of the matcher.
#[derive(Debug)]
pub(crate) enum MatchResult<'a> {
    Matched {
        scope: CommandId,
        collected: Collected<'a>,
    },
    Help(CommandId),
    Version(CommandId),
    Failed(Vec<Diagnostic>),
}

enum Stop {
    Help,
    Version,
}

pub(crate) struct Matcher<'r, 'a, S: AsRef<str>> {
    registry: &'r Registry,
    tokens: Peekable<Lexer<'a, S>>,
    scope: CommandId,
    consumed_positionals: usize,
    positional_only: bool,
    collected: Collected<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl<'r, 'a, S: AsRef<str>> Matcher<'r, 'a, S> {
    pub(crate) fn new(registry: &'r Registry, argv: &'a [S]) -> Self {
        Self {
            registry,
            tokens: Lexer::new(argv).peekable(),
            scope: registry.root(),
            consumed_positionals: 0,
            positional_only: false,
            collected: Collected::default(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> MatchResult<'a> {
        while let Some(token) = self.tokens.next() {
            let stop = match token.kind {
                TokenKind::Separator => {
                    self.positional_only = true;
                    None
                }
                TokenKind::LongFlag => self.long(token),
                TokenKind::ShortFlag | TokenKind::ShortCluster if self.is_negative_number(&token) => {
                    self.bare(token.raw);
                    None
                }
                TokenKind::ShortFlag => self.short(token),
                TokenKind::ShortCluster => self.cluster(token),
                TokenKind::Bare => {
                    self.bare(token.raw);
                    None
                }
            };

            match stop {
                Some(Stop::Help) => {
                    tracing::debug!(scope = %self.registry.display_path(self.scope), "help requested");
                    return MatchResult::Help(self.scope);
                }
                Some(Stop::Version) => {
                    tracing::debug!(scope = %self.registry.display_path(self.scope), "version requested");
                    return MatchResult::Version(self.scope);
                }
                None => {}
            }
        }

        if self.diagnostics.is_empty() {
            MatchResult::Matched {
                scope: self.scope,
                collected: self.collected,
            }
        } else {
            tracing::debug!(count = self.diagnostics.len(), "matching failed");
            MatchResult::Failed(self.diagnostics)
        }
    }

    fn current(&self) -> &'r Scope {
        self.registry.scope(self.scope)
    }

    fn long(&mut self, token: Token<'a>) -> Option<Stop> {
        let name = token.long_name().unwrap_or_default();
        match self.current().resolve_long(name) {
            Some(Resolution::Help) => Some(Stop::Help),
            Some(Resolution::Version) => Some(Stop::Version),
            Some(Resolution::Argument(index)) => {
                self.named(index, token.flag_text(), token.inline_value);
                None
            }
            None => {
                self.unknown(token.flag_text());
                None
            }
        }
    }

    fn short(&mut self, token: Token<'a>) -> Option<Stop> {
        let letter = token.short_letter()?;
        match self.current().resolve_short(letter) {
            Some(Resolution::Help) => Some(Stop::Help),
            Some(Resolution::Version) => Some(Stop::Version),
            Some(Resolution::Argument(index)) => {
                self.named(index, token.flag_text(), token.inline_value);
                None
            }
            None => {
                self.unknown(token.flag_text());
                None
            }
        }
    }

    /// `-abc` and `-cfast`: flags consume one letter each, the first
    /// value-taking letter takes the remainder.
    fn cluster(&mut self, token: Token<'a>) -> Option<Stop> {
        let body = token.cluster()?;
        for (offset, letter) in body.char_indices() {
            let rest = &body[offset + letter.len_utf8()..];
            let index = match self.current().resolve_short(letter) {
                Some(Resolution::Argument(index)) => index,
                Some(Resolution::Help) => return Some(Stop::Help),
                Some(Resolution::Version) => return Some(Stop::Version),
                None => {
                    self.unknown(&format!("-{letter}"));
                    // `=` ends the letters; the rest belongs to the unknown one.
                    if rest.starts_with('=') {
                        break;
                    }
                    continue;
                }
            };

            let form = format!("-{letter}");
            if self.current().argument(index).kind() == ArgKind::Flag {
                match rest.strip_prefix('=') {
                    Some(value) => {
                        self.named(index, &form, Some(value));
                        break;
                    }
                    None => {
                        self.named(index, &form, None);
                        continue;
                    }
                }
            }

            let rest = rest.strip_prefix('=').unwrap_or(rest);
            if rest.is_empty() {
                self.named(index, &form, None);
            } else {
                self.named(index, &form, Some(rest));
            }
            break;
        }
        None
    }

    /// Record one occurrence of a named argument.
    ///
    /// `attached` is a value joined to the flag (`=value` or glued); without
    /// one, the next token is taken and multi-value arguments keep taking
    /// bare tokens.
    fn named(&mut self, index: usize, form: &str, attached: Option<&'a str>) {
        let kind = self.current().argument(index).kind();
        match kind {
            ArgKind::Flag => {
                if let Some(value) = attached {
                    self.diagnostics.push(Diagnostic::UnexpectedValue {
                        arg: form.to_string(),
                        value: value.to_string(),
                    });
                } else {
                    self.collected
                        .record(self.scope, index, Cow::Borrowed("true"));
                }
            }
            ArgKind::Single | ArgKind::Multi => {
                if let Some(value) = attached {
                    self.collected.record(self.scope, index, Cow::Borrowed(value));
                    return;
                }
                let Some(value) = self.next_value() else {
                    self.diagnostics.push(Diagnostic::MissingValue {
                        arg: form.to_string(),
                    });
                    return;
                };
                self.collected.record(self.scope, index, Cow::Borrowed(value));
                if kind == ArgKind::Multi {
                    while let Some(&next) = self.tokens.peek() {
                        if next.is_flag_like() && !self.is_negative_number(&next) {
                            break;
                        }
                        self.tokens.next();
                        self.collected
                            .push(self.scope, index, Cow::Borrowed(next.raw));
                    }
                }
            }
            // Positionals have no surface forms.
            ArgKind::Positional { .. } => {}
        }
    }

    /// The next raw token as a value; a separator is never a value.
    fn next_value(&mut self) -> Option<&'a str> {
        let next = self.tokens.peek()?;
        if next.kind == TokenKind::Separator {
            return None;
        }
        self.tokens.next().map(|t| t.raw)
    }

    fn bare(&mut self, raw: &'a str) {
        let scope = self.current();

        if !self.positional_only && self.consumed_positionals == 0 {
            if let Some(child) = scope.find_subcommand(raw) {
                tracing::debug!(
                    from = %self.registry.display_path(self.scope),
                    to = %self.registry.display_path(child),
                    "entering sub-command"
                );
                self.scope = child;
                self.consumed_positionals = 0;
                return;
            }
        }

        let positionals = scope.positionals();
        let slot = positionals.get(self.consumed_positionals).copied().or_else(|| {
            positionals
                .last()
                .copied()
                .filter(|&index| scope.argument(index).kind().is_variadic())
        });

        match slot {
            Some(index) => {
                self.consumed_positionals += 1;
                self.collected.record(self.scope, index, Cow::Borrowed(raw));
            }
            None => self.unknown(raw),
        }
    }

    /// `-5` / `-1.5` read as numbers when no short form claims the digit.
    fn is_negative_number(&self, token: &Token<'a>) -> bool {
        matches!(token.kind, TokenKind::ShortFlag | TokenKind::ShortCluster)
            && token.inline_value.is_none()
            && looks_numeric(token.raw)
            && token.raw[1..]
                .chars()
                .next()
                .is_some_and(|c| self.current().resolve_short(c).is_none())
    }

    fn unknown(&mut self, token: &str) {
        self.diagnostics.push(Diagnostic::UnknownArgument {
            token: token.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ArgumentSpec, CommandSpec};

    fn registry() -> Registry {
        Registry::build(
            CommandSpec::new("tool")
                .arg(ArgumentSpec::flag("all").short('a'))
                .arg(ArgumentSpec::flag("brief").short('b'))
                .arg(ArgumentSpec::single("compile").short('c').long("compile"))
                .arg(ArgumentSpec::multi("input").short('i').long("input"))
                .arg(ArgumentSpec::positional("src"))
                .arg(ArgumentSpec::positional("rest").variadic())
                .subcommand(CommandSpec::new("sub").arg(ArgumentSpec::flag("force").long("force"))),
        )
        .unwrap()
    }

    fn raw<'a>(collected: &'a Collected<'_>, scope: CommandId, index: usize) -> Vec<&'a str> {
        collected
            .get(scope, index)
            .map(|values| values.iter().map(|v| v.as_ref()).collect())
            .unwrap_or_default()
    }

    fn matched(registry: &Registry, argv: &[&str]) -> (CommandId, Vec<Vec<String>>) {
        match Matcher::new(registry, argv).run() {
            MatchResult::Matched { scope, collected } => {
                let count = registry.scope(scope).arguments().len();
                let values = (0..count)
                    .map(|i| raw(&collected, scope, i).into_iter().map(String::from).collect())
                    .collect();
                (scope, values)
            }
            other => panic!("expected Matched, got: {other:?}"),
        }
    }

    #[test]
    fn cluster_with_glued_value_stops_at_value_letter() {
        let registry = registry();
        let (_, values) = matched(&registry, &["-abcfast"]);
        assert_eq!(values[0], vec!["true"]);
        assert_eq!(values[1], vec!["true"]);
        assert_eq!(values[2], vec!["fast"]);
    }

    #[test]
    fn value_letter_at_cluster_end_takes_next_token() {
        let registry = registry();
        let (_, values) = matched(&registry, &["-ac", "fast"]);
        assert_eq!(values[2], vec!["fast"]);
        assert!(values[4].is_empty());
    }

    #[test]
    fn multi_is_greedy_only_when_space_joined() {
        let registry = registry();
        let (_, values) = matched(&registry, &["--input", "a", "b", "-a", "c"]);
        assert_eq!(values[3], vec!["a", "b"]);
        assert_eq!(values[4], vec!["c"]);

        let (_, values) = matched(&registry, &["--input=a", "b"]);
        assert_eq!(values[3], vec!["a"]);
        assert_eq!(values[4], vec!["b"]);
    }

    #[test]
    fn positionals_fill_then_variadic() {
        let registry = registry();
        let (_, values) = matched(&registry, &["one", "two", "three"]);
        assert_eq!(values[4], vec!["one"]);
        assert_eq!(values[5], vec!["two", "three"]);
    }

    #[test]
    fn subcommand_only_before_positionals() {
        let registry = registry();
        let (scope, _) = matched(&registry, &["sub", "--force"]);
        assert_eq!(registry.command_path(scope), vec!["sub"]);

        let (scope, values) = matched(&registry, &["file", "sub"]);
        assert_eq!(scope, registry.root());
        assert_eq!(values[5], vec!["sub"]);
    }

    #[test]
    fn separator_disables_flags_and_subcommands() {
        let registry = registry();
        let (scope, values) = matched(&registry, &["--", "sub", "--compile"]);
        assert_eq!(scope, registry.root());
        assert_eq!(values[4], vec!["sub"]);
        assert_eq!(values[5], vec!["--compile"]);
    }

    #[test]
    fn negative_numbers_are_values() {
        let registry = registry();
        let (_, values) = matched(&registry, &["--input", "1", "-2", "-3.5", "-5"]);
        assert_eq!(values[3], vec!["1", "-2", "-3.5", "-5"]);
    }

    #[test]
    fn collects_every_unknown_and_missing_value() {
        let registry = registry();
        let result = Matcher::new(&registry, &["-axb", "--nope=1", "--compile"]).run();
        let MatchResult::Failed(diagnostics) = result else {
            panic!("expected Failed");
        };
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::UnknownArgument { token: "-x".into() },
                Diagnostic::UnknownArgument { token: "--nope".into() },
                Diagnostic::MissingValue { arg: "--compile".into() },
            ]
        );
    }

    #[test]
    fn flag_with_inline_value_is_rejected() {
        let registry = registry();
        let MatchResult::Failed(diagnostics) = Matcher::new(&registry, &["-a=yes"]).run() else {
            panic!("expected Failed");
        };
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnexpectedValue {
                arg: "-a".into(),
                value: "yes".into()
            }]
        );
    }

    #[test]
    fn flag_at_cluster_end_rejects_inline_value() {
        let registry = registry();
        let MatchResult::Failed(diagnostics) = Matcher::new(&registry, &["-ab=yes"]).run() else {
            panic!("expected Failed");
        };
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnexpectedValue {
                arg: "-b".into(),
                value: "yes".into()
            }]
        );

        // Letters after `=` are never read as more flags.
        let MatchResult::Failed(diagnostics) = Matcher::new(&registry, &["-ab=a"]).run() else {
            panic!("expected Failed");
        };
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnexpectedValue {
                arg: "-b".into(),
                value: "a".into()
            }]
        );

        let MatchResult::Failed(diagnostics) = Matcher::new(&registry, &["-az=b"]).run() else {
            panic!("expected Failed");
        };
        assert_eq!(diagnostics, vec![Diagnostic::UnknownArgument { token: "-z".into() }]);
    }

    #[test]
    fn value_never_swallows_separator() {
        let registry = registry();
        let MatchResult::Failed(diagnostics) = Matcher::new(&registry, &["-c", "--", "x"]).run() else {
            panic!("expected Failed");
        };
        assert_eq!(diagnostics, vec![Diagnostic::MissingValue { arg: "-c".into() }]);
    }

    #[test]
    fn help_in_cluster_and_in_subcommand() {
        let registry = registry();
        assert!(matches!(
            Matcher::new(&registry, &["-ah"]).run(),
            MatchResult::Help(id) if id == registry.root()
        ));
        let sub = registry.lookup(&["sub"]).unwrap();
        assert!(matches!(
            Matcher::new(&registry, &["sub", "--help", "--bogus"]).run(),
            MatchResult::Help(id) if id == sub
        ));
        assert!(matches!(
            Matcher::new(&registry, &["--bogus", "--version"]).run(),
            MatchResult::Version(_)
        ));
    }
}
