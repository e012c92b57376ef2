//! The validated, immutable command tree.
//!
//! Scopes live in a flat arena; children are referenced by [`CommandId`] and
//! each scope keeps its parent's id for path reconstruction.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::BuildError;
use crate::spec::{ArgKind, ArgumentSpec, CommandSpec};
use crate::value::{Value, ValueType};

pub(crate) const HELP_LONG: &str = "help";
pub(crate) const HELP_SHORT: char = 'h';
pub(crate) const VERSION_LONG: &str = "version";

/// Index of a scope inside a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

impl CommandId {
    pub const ROOT: CommandId = CommandId(0);
}

/// What a surface form resolves to inside one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Index into [`Scope::arguments`].
    Argument(usize),
    Help,
    Version,
}

/// One frozen scope.
#[derive(Debug)]
pub struct Scope {
    name: String,
    summary: String,
    description: String,
    version: String,
    aliases: Vec<String>,
    examples: Vec<String>,
    hidden: bool,
    arguments: Vec<ArgumentSpec>,
    parent: Option<CommandId>,
    children: IndexMap<String, CommandId>,
    child_aliases: HashMap<String, CommandId>,
    longs: HashMap<String, usize>,
    shorts: HashMap<char, usize>,
    positionals: Vec<usize>,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn argument(&self, index: usize) -> &ArgumentSpec {
        &self.arguments[index]
    }

    pub fn find_argument(&self, name: &str) -> Option<(usize, &ArgumentSpec)> {
        self.arguments
            .iter()
            .enumerate()
            .find(|(_, arg)| arg.name == name)
    }

    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    /// Sub-commands in declaration order.
    pub fn subcommands(&self) -> impl Iterator<Item = (&str, CommandId)> + '_ {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn has_subcommands(&self) -> bool {
        !self.children.is_empty()
    }

    /// Match a bare token against sub-command names and aliases.
    pub fn find_subcommand(&self, token: &str) -> Option<CommandId> {
        self.children
            .get(token)
            .or_else(|| self.child_aliases.get(token))
            .copied()
    }

    /// Indices of positional arguments in declaration order.
    pub fn positionals(&self) -> &[usize] {
        &self.positionals
    }

    pub fn resolve_long(&self, name: &str) -> Option<Resolution> {
        if let Some(&index) = self.longs.get(name) {
            return Some(Resolution::Argument(index));
        }
        match name {
            HELP_LONG => Some(Resolution::Help),
            VERSION_LONG => Some(Resolution::Version),
            _ => None,
        }
    }

    pub fn resolve_short(&self, letter: char) -> Option<Resolution> {
        if let Some(&index) = self.shorts.get(&letter) {
            return Some(Resolution::Argument(index));
        }
        (letter == HELP_SHORT).then_some(Resolution::Help)
    }
}

/// Validated command tree shared by every parse.
#[derive(Debug)]
pub struct Registry {
    scopes: Vec<Scope>,
}

impl Registry {
    /// Validate `root` and freeze it.
    pub fn build(root: CommandSpec) -> Result<Self, BuildError> {
        let mut registry = Self { scopes: Vec::new() };
        let mut names = HashSet::new();
        registry.insert(root, None, &mut names)?;
        tracing::debug!(scopes = registry.scopes.len(), "built command registry");
        Ok(registry)
    }

    pub fn root(&self) -> CommandId {
        CommandId::ROOT
    }

    pub fn scope(&self, id: CommandId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scopes from the root down to `id`, inclusive.
    pub fn ancestry(&self, id: CommandId) -> Vec<CommandId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.scope(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Sub-command names leading to `id`, excluding the root.
    pub fn command_path(&self, id: CommandId) -> Vec<String> {
        self.ancestry(id)
            .into_iter()
            .skip(1)
            .map(|scope| self.scope(scope).name.clone())
            .collect()
    }

    /// Program name followed by sub-command names, space separated.
    pub fn display_path(&self, id: CommandId) -> String {
        self.ancestry(id)
            .into_iter()
            .map(|scope| {
                let name = self.scope(scope).name.as_str();
                if name.is_empty() { "program" } else { name }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Walk sub-command names (or aliases) from the root.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<CommandId> {
        path.iter().try_fold(self.root(), |id, name| {
            self.scope(id).find_subcommand(name.as_ref())
        })
    }

    /// Nearest non-empty version string on the path to the root.
    pub fn version_for(&self, id: CommandId) -> Option<&str> {
        self.ancestry(id)
            .into_iter()
            .rev()
            .map(|scope| self.scope(scope).version.trim())
            .find(|v| !v.is_empty())
    }

    fn insert(
        &mut self,
        spec: CommandSpec,
        parent: Option<CommandId>,
        path_names: &mut HashSet<String>,
    ) -> Result<CommandId, BuildError> {
        let id = CommandId(self.scopes.len());
        let label = match parent {
            Some(parent) => format!("{} {}", self.display_path(parent), spec.name),
            None if spec.name.is_empty() => "program".to_string(),
            None => spec.name.clone(),
        };

        let CommandSpec {
            name,
            summary,
            description,
            version,
            aliases,
            examples,
            hidden,
            arguments,
            subcommands,
        } = spec;

        let index = ScopeIndex::build(&label, arguments, path_names)?;

        self.scopes.push(Scope {
            name,
            summary,
            description,
            version,
            aliases,
            examples,
            hidden,
            arguments: index.arguments,
            parent,
            children: IndexMap::new(),
            child_aliases: HashMap::new(),
            longs: index.longs,
            shorts: index.shorts,
            positionals: index.positionals,
        });

        let own_names: Vec<String> = self.scopes[id.0]
            .arguments
            .iter()
            .map(|a| a.name.clone())
            .collect();
        path_names.extend(own_names.iter().cloned());

        let mut taken: HashSet<String> = HashSet::new();
        for child in subcommands {
            for token in std::iter::once(&child.name).chain(child.aliases.iter()) {
                if token.trim().is_empty() || !taken.insert(token.clone()) {
                    return Err(BuildError::DuplicateSubcommand {
                        scope: label.clone(),
                        name: token.clone(),
                    });
                }
            }
            let child_name = child.name.clone();
            let child_aliases = child.aliases.clone();
            let child_id = self.insert(child, Some(id), path_names)?;
            let scope = &mut self.scopes[id.0];
            scope.children.insert(child_name, child_id);
            for alias in child_aliases {
                scope.child_aliases.insert(alias, child_id);
            }
        }

        for name in &own_names {
            path_names.remove(name);
        }
        Ok(id)
    }
}

struct ScopeIndex {
    arguments: Vec<ArgumentSpec>,
    longs: HashMap<String, usize>,
    shorts: HashMap<char, usize>,
    positionals: Vec<usize>,
}

impl ScopeIndex {
    fn build(
        scope: &str,
        mut arguments: Vec<ArgumentSpec>,
        path_names: &HashSet<String>,
    ) -> Result<Self, BuildError> {
        let mut longs: HashMap<String, usize> = HashMap::new();
        let mut shorts: HashMap<char, usize> = HashMap::new();
        let mut positionals = Vec::new();
        let mut names: HashSet<&str> = HashSet::new();
        let mut groups: IndexMap<&str, usize> = IndexMap::new();

        let err_scope = || scope.to_string();

        for (idx, arg) in arguments.iter().enumerate() {
            let name = arg.name.as_str();
            if name.trim().is_empty() {
                return Err(BuildError::InvalidForm {
                    scope: err_scope(),
                    name: name.to_string(),
                    form: name.to_string(),
                });
            }
            if !names.insert(name) || path_names.contains(name) {
                return Err(BuildError::DuplicateName {
                    scope: err_scope(),
                    name: name.to_string(),
                });
            }

            if arg.variadic && !arg.kind.is_positional() {
                return Err(BuildError::VariadicNamed {
                    scope: err_scope(),
                    name: name.to_string(),
                });
            }

            let has_forms = !arg.shorts.is_empty() || !arg.longs.is_empty();
            match arg.kind {
                ArgKind::Positional { .. } if has_forms => {
                    return Err(BuildError::PositionalWithForm {
                        scope: err_scope(),
                        name: name.to_string(),
                    });
                }
                ArgKind::Positional { .. } => positionals.push(idx),
                _ if !has_forms => {
                    return Err(BuildError::MissingForm {
                        scope: err_scope(),
                        name: name.to_string(),
                    });
                }
                _ => {}
            }

            for long in &arg.longs {
                if long.is_empty()
                    || long.starts_with('-')
                    || long.contains('=')
                    || long.chars().any(char::is_whitespace)
                {
                    return Err(BuildError::InvalidForm {
                        scope: err_scope(),
                        name: name.to_string(),
                        form: format!("--{long}"),
                    });
                }
                if long == HELP_LONG || long == VERSION_LONG {
                    return Err(BuildError::ReservedForm {
                        scope: err_scope(),
                        form: format!("--{long}"),
                    });
                }
                if let Some(prev) = longs.insert(long.clone(), idx) {
                    return Err(BuildError::DuplicateForm {
                        scope: err_scope(),
                        form: format!("--{long}"),
                        first: arguments[prev].name.clone(),
                        second: name.to_string(),
                    });
                }
            }

            for &short in &arg.shorts {
                if short == '-' || short == '=' || short.is_whitespace() {
                    return Err(BuildError::InvalidForm {
                        scope: err_scope(),
                        name: name.to_string(),
                        form: format!("-{short}"),
                    });
                }
                if short == HELP_SHORT {
                    return Err(BuildError::ReservedForm {
                        scope: err_scope(),
                        form: format!("-{short}"),
                    });
                }
                if let Some(prev) = shorts.insert(short, idx) {
                    return Err(BuildError::DuplicateForm {
                        scope: err_scope(),
                        form: format!("-{short}"),
                        first: arguments[prev].name.clone(),
                        second: name.to_string(),
                    });
                }
            }

            if arg.kind == ArgKind::Flag && arg.value_type != ValueType::Boolean {
                return Err(BuildError::FlagValueType {
                    scope: err_scope(),
                    name: name.to_string(),
                });
            }
            if let ValueType::Enumerated(choices) = &arg.value_type {
                if choices.is_empty() {
                    return Err(BuildError::EmptyChoices {
                        scope: err_scope(),
                        name: name.to_string(),
                    });
                }
            }
            if arg.required && arg.default.is_some() {
                return Err(BuildError::RequiredWithDefault {
                    scope: err_scope(),
                    name: name.to_string(),
                });
            }
            if let Some(default) = &arg.default {
                if !arg.value_type.accepts(default) {
                    return Err(BuildError::DefaultTypeMismatch {
                        scope: err_scope(),
                        name: name.to_string(),
                        expected: arg.value_type.describe(),
                    });
                }
            }
            if arg.range.is_some() && !arg.value_type.is_numeric() {
                return Err(BuildError::RangeOnNonNumeric {
                    scope: err_scope(),
                    name: name.to_string(),
                });
            }
            if let Some(group) = arg.exclusive_group.as_deref() {
                *groups.entry(group).or_default() += 1;
            }
        }

        if let Some((pos, &idx)) = positionals
            .iter()
            .enumerate()
            .find(|(_, idx)| arguments[**idx].kind.is_variadic())
        {
            if pos + 1 != positionals.len() {
                return Err(BuildError::VariadicNotLast {
                    scope: err_scope(),
                    name: arguments[idx].name.clone(),
                });
            }
        }

        if let Some((group, &members)) = groups.iter().find(|(_, members)| **members < 2) {
            return Err(BuildError::UndersizedGroup {
                scope: err_scope(),
                group: group.to_string(),
                members,
            });
        }

        for arg in &arguments {
            for other in &arg.requires {
                if other == &arg.name || !names.contains(other.as_str()) {
                    return Err(BuildError::UnknownRequirement {
                        scope: err_scope(),
                        name: arg.name.clone(),
                        other: other.clone(),
                    });
                }
            }
        }

        // Integer defaults on float arguments are widened once here.
        for arg in &mut arguments {
            if arg.value_type == ValueType::Float {
                if let Some(Value::Integer(n)) = arg.default {
                    arg.default = Some(Value::Float(n as f64));
                }
            }
        }

        Ok(Self {
            arguments,
            longs,
            shorts,
            positionals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ArgumentSpec, CommandSpec};

    fn build(root: CommandSpec) -> Result<Registry, BuildError> {
        Registry::build(root)
    }

    #[test]
    fn resolves_forms_and_builtins() {
        let registry = build(
            CommandSpec::new("tool")
                .arg(ArgumentSpec::flag("verbose").short('v').long("verbose"))
                .arg(ArgumentSpec::single("output").long("--output")),
        )
        .unwrap();
        let root = registry.scope(registry.root());
        assert_eq!(root.resolve_short('v'), Some(Resolution::Argument(0)));
        assert_eq!(root.resolve_long("output"), Some(Resolution::Argument(1)));
        assert_eq!(root.resolve_long("help"), Some(Resolution::Help));
        assert_eq!(root.resolve_short('h'), Some(Resolution::Help));
        assert_eq!(root.resolve_long("version"), Some(Resolution::Version));
        assert_eq!(root.resolve_long("nope"), None);
    }

    #[test]
    fn rejects_form_collision() {
        let err = build(
            CommandSpec::new("tool")
                .arg(ArgumentSpec::flag("a").short('x'))
                .arg(ArgumentSpec::flag("b").short('x')),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateForm { ref form, .. } if form == "-x"));
    }

    #[test]
    fn rejects_reserved_forms() {
        let err = build(CommandSpec::new("tool").arg(ArgumentSpec::flag("h").short('h'))).unwrap_err();
        assert!(matches!(err, BuildError::ReservedForm { .. }));
        let err =
            build(CommandSpec::new("tool").arg(ArgumentSpec::flag("v").long("version"))).unwrap_err();
        assert!(matches!(err, BuildError::ReservedForm { .. }));
    }

    #[test]
    fn rejects_variadic_before_last_positional() {
        let err = build(
            CommandSpec::new("tool")
                .arg(ArgumentSpec::positional("files").variadic())
                .arg(ArgumentSpec::positional("dest")),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::VariadicNotLast { ref name, .. } if name == "files"));
    }

    #[test]
    fn rejects_two_variadic_positionals() {
        let err = build(
            CommandSpec::new("tool")
                .arg(ArgumentSpec::positional("first").variadic())
                .arg(ArgumentSpec::positional("second").variadic()),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::VariadicNotLast { ref name, .. } if name == "first"));
    }

    #[test]
    fn rejects_variadic_before_last_positional_in_subcommand() {
        let err = build(
            CommandSpec::new("tool").subcommand(
                CommandSpec::new("cp")
                    .arg(ArgumentSpec::positional("sources").variadic())
                    .arg(ArgumentSpec::positional("dest")),
            ),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BuildError::VariadicNotLast {
                scope: "tool cp".to_string(),
                name: "sources".to_string(),
            }
        );
    }

    #[test]
    fn rejects_variadic_on_named_argument() {
        let err = build(
            CommandSpec::new("tool").arg(ArgumentSpec::multi("tag").long("tag").variadic()),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::VariadicNamed { ref name, .. } if name == "tag"));
    }

    #[test]
    fn rejects_required_with_default() {
        let err = build(
            CommandSpec::new("tool").arg(
                ArgumentSpec::single("mode")
                    .long("mode")
                    .required()
                    .default_value("fast"),
            ),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::RequiredWithDefault { .. }));
    }

    #[test]
    fn rejects_single_member_group() {
        let err = build(
            CommandSpec::new("tool")
                .arg(ArgumentSpec::flag("json").long("json").exclusive_group("format"))
                .arg(ArgumentSpec::flag("yaml").long("yaml")),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BuildError::UndersizedGroup {
                scope: "tool".to_string(),
                group: "format".to_string(),
                members: 1,
            }
        );
    }

    #[test]
    fn rejects_bad_defaults_and_ranges() {
        let err = build(CommandSpec::new("tool").arg(
            ArgumentSpec::single("n")
                .long("n")
                .value_type(ValueType::Integer)
                .default_value("three"),
        ))
        .unwrap_err();
        assert!(matches!(err, BuildError::DefaultTypeMismatch { expected: "integer", .. }));

        let err = build(
            CommandSpec::new("tool").arg(ArgumentSpec::single("s").long("s").range(Some(0.0), None)),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::RangeOnNonNumeric { .. }));

        let err = build(CommandSpec::new("tool").arg(
            ArgumentSpec::single("c").long("c").choices(Vec::<String>::new()),
        ))
        .unwrap_err();
        assert!(matches!(err, BuildError::EmptyChoices { .. }));
    }

    #[test]
    fn rejects_forms_by_kind() {
        let err = build(CommandSpec::new("tool").arg(ArgumentSpec::flag("quiet"))).unwrap_err();
        assert!(matches!(err, BuildError::MissingForm { .. }));
        let err =
            build(CommandSpec::new("tool").arg(ArgumentSpec::positional("file").short('f'))).unwrap_err();
        assert!(matches!(err, BuildError::PositionalWithForm { .. }));
        let err = build(CommandSpec::new("tool").arg(ArgumentSpec::flag("x").long("a=b"))).unwrap_err();
        assert!(matches!(err, BuildError::InvalidForm { .. }));
    }

    #[test]
    fn rejects_names_shadowed_along_path() {
        let err = build(
            CommandSpec::new("tool")
                .arg(ArgumentSpec::flag("verbose").long("verbose"))
                .subcommand(CommandSpec::new("run").arg(ArgumentSpec::flag("verbose").short('v'))),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateName { ref scope, .. } if scope == "tool run"));
    }

    #[test]
    fn sibling_scopes_may_reuse_names() {
        let registry = build(
            CommandSpec::new("tool")
                .subcommand(CommandSpec::new("a").arg(ArgumentSpec::flag("force").long("force")))
                .subcommand(CommandSpec::new("b").arg(ArgumentSpec::flag("force").long("force"))),
        )
        .unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn rejects_unknown_requirement_and_duplicate_subcommands() {
        let err = build(
            CommandSpec::new("tool").arg(ArgumentSpec::flag("a").long("a").requires("b")),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::UnknownRequirement { .. }));

        let err = build(
            CommandSpec::new("tool")
                .subcommand(CommandSpec::new("run").alias("r"))
                .subcommand(CommandSpec::new("r")),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateSubcommand { ref name, .. } if name == "r"));
    }

    #[test]
    fn paths_and_versions() {
        let registry = build(
            CommandSpec::new("tool").version("2.0").subcommand(
                CommandSpec::new("remote")
                    .alias("rem")
                    .subcommand(CommandSpec::new("add").version("0.1")),
            ),
        )
        .unwrap();
        let remote = registry.lookup(&["rem"]).unwrap();
        let add = registry.lookup(&["remote", "add"]).unwrap();
        assert_eq!(registry.command_path(add), vec!["remote", "add"]);
        assert_eq!(registry.display_path(add), "tool remote add");
        assert_eq!(registry.version_for(remote), Some("2.0"));
        assert_eq!(registry.version_for(add), Some("0.1"));
        assert_eq!(registry.scope(add).parent(), Some(remote));
        assert!(registry.lookup(&["missing"]).is_none());
    }

    #[test]
    fn float_defaults_are_widened() {
        let registry = build(CommandSpec::new("tool").arg(
            ArgumentSpec::single("ratio")
                .long("ratio")
                .value_type(ValueType::Float)
                .default_value(2i64),
        ))
        .unwrap();
        let root = registry.scope(registry.root());
        assert_eq!(root.argument(0).get_default(), Some(&Value::Float(2.0)));
    }
}
