//! Typing and constraint checks over matched raw values.

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::error::Diagnostic;
use crate::matcher::Collected;
use crate::outcome::ParsedArgs;
use crate::registry::{CommandId, Registry};
use crate::spec::{ArgKind, ArgumentSpec};
use crate::value::{Value, ValueSource, ValueType};

fn env_lookup<'e>(env: &'e [(String, String)], key: &str) -> Option<&'e str> {
    env.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Type and check every argument on the path to `active`.
///
/// All checks run; the returned diagnostics are ordered by scope, then
/// declaration order, with group and requirement checks last per scope.
pub(crate) fn validate(
    registry: &Registry,
    active: CommandId,
    collected: &Collected<'_>,
    env: &[(String, String)],
) -> Result<ParsedArgs, Vec<Diagnostic>> {
    let mut parsed = ParsedArgs::new(registry.command_path(active));
    let mut diagnostics = Vec::new();

    for scope_id in registry.ancestry(active) {
        let scope = registry.scope(scope_id);
        // `given` tracks argv only; env values also satisfy `requires`.
        let mut given = vec![false; scope.arguments().len()];
        let mut present = vec![false; scope.arguments().len()];

        for (index, arg) in scope.arguments().iter().enumerate() {
            let (raw, source): (Vec<Cow<'_, str>>, ValueSource) =
                match collected.get(scope_id, index) {
                    Some(values) => (values.to_vec(), ValueSource::CommandLine),
                    None => match arg.get_env().and_then(|key| env_lookup(env, key)) {
                        Some(value) => (vec![Cow::Borrowed(value)], ValueSource::Environment),
                        None => (Vec::new(), ValueSource::Default),
                    },
                };

            if raw.is_empty() {
                if let Some(default) = arg.get_default() {
                    parsed.insert(arg.name(), vec![default.clone()], ValueSource::Default);
                } else if arg.is_required() {
                    diagnostics.push(Diagnostic::MissingRequired {
                        arg: arg.display_name(),
                    });
                }
                continue;
            }
            present[index] = true;
            given[index] = source == ValueSource::CommandLine;

            // Single-valued arguments keep the last occurrence.
            let raw = match arg.kind() {
                ArgKind::Single | ArgKind::Positional { variadic: false } => {
                    &raw[raw.len() - 1..]
                }
                _ => &raw[..],
            };

            let before = diagnostics.len();
            let typed: Vec<Value> = raw
                .iter()
                .filter_map(|text| check_value(arg, text, &mut diagnostics))
                .collect();
            if diagnostics.len() == before {
                parsed.insert(arg.name(), typed, source);
                if source == ValueSource::CommandLine {
                    parsed.set_occurrences(arg.name(), collected.occurrences(scope_id, index));
                }
            }
        }

        let mut groups: IndexMap<&str, Vec<String>> = IndexMap::new();
        for (index, arg) in scope.arguments().iter().enumerate() {
            if let Some(group) = arg.group() {
                if given[index] {
                    groups.entry(group).or_default().push(arg.display_name());
                }
            }
        }
        for (group, members) in groups {
            if members.len() > 1 {
                diagnostics.push(Diagnostic::ConflictingArguments {
                    group: group.to_string(),
                    args: members,
                });
            }
        }

        for (index, arg) in scope.arguments().iter().enumerate() {
            if !present[index] {
                continue;
            }
            for other in arg.get_requires() {
                let Some((other_index, other_arg)) = scope.find_argument(other) else {
                    continue;
                };
                if !present[other_index] {
                    diagnostics.push(Diagnostic::MissingDependency {
                        arg: arg.display_name(),
                        requires: other_arg.display_name(),
                    });
                }
            }
        }
    }

    if diagnostics.is_empty() {
        Ok(parsed)
    } else {
        Err(diagnostics)
    }
}

fn check_value(arg: &ArgumentSpec, text: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<Value> {
    let value_type = arg.get_value_type();
    let Some(value) = value_type.coerce(text) else {
        diagnostics.push(Diagnostic::InvalidType {
            arg: arg.display_name(),
            value: text.to_string(),
            expected: value_type.describe(),
        });
        return None;
    };

    if let ValueType::Enumerated(choices) = value_type {
        if !choices.iter().any(|c| c == text) {
            diagnostics.push(Diagnostic::InvalidChoice {
                arg: arg.display_name(),
                value: text.to_string(),
                choices: choices.clone(),
            });
            return None;
        }
    }

    if let Some(range) = arg.get_range() {
        if !range.contains(&value) {
            diagnostics.push(Diagnostic::InvalidRange {
                arg: arg.display_name(),
                value: text.to_string(),
                range: range.to_string(),
            });
            return None;
        }
    }

    Some(value)
}
