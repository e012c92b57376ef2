//! Help, version and failure text.
//!
//! The registry is turned into plain context structs; a [`Template`] turns
//! those into text. Callers wanting different wording implement `Template`
//! and override only the methods they care about.

use crate::error::Diagnostic;
use crate::registry::{CommandId, Registry, Scope};
use crate::spec::{ArgKind, ArgumentSpec};
use crate::value::ValueType;

/// One aligned line of a help section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpRow {
    pub left: String,
    pub help: String,
}

/// Data available to a help template.
#[derive(Debug, Clone)]
pub struct HelpContext<'a> {
    /// Program name followed by the sub-command path.
    pub program: String,
    pub summary: &'a str,
    pub description: &'a str,
    pub usage: String,
    pub arguments: Vec<HelpRow>,
    pub options: Vec<HelpRow>,
    pub commands: Vec<HelpRow>,
    pub examples: &'a [String],
}

#[derive(Debug, Clone)]
pub struct VersionContext<'a> {
    pub program: String,
    pub version: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct FailureContext<'a> {
    pub program: String,
    pub diagnostics: &'a [Diagnostic],
}

/// Text rendering customization point.
pub trait Template: Send + Sync {
    fn help(&self, ctx: &HelpContext<'_>) -> String {
        default_help(ctx)
    }

    fn version(&self, ctx: &VersionContext<'_>) -> String {
        match ctx.version {
            Some(version) => format!("{} {}\n", ctx.program, version),
            None => format!("{}\n", ctx.program),
        }
    }

    fn failure(&self, ctx: &FailureContext<'_>) -> String {
        let mut out = String::new();
        for diagnostic in ctx.diagnostics {
            out.push_str(&format!("error: {diagnostic}\n"));
        }
        out.push_str(&format!(
            "\nFor more information, try '{} --help'.\n",
            ctx.program
        ));
        out
    }
}

/// The stock wording.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTemplate;

impl Template for DefaultTemplate {}

fn push_section(out: &mut String, title: &str, rows: &[HelpRow]) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    let width = rows.iter().map(|r| r.left.len()).max().unwrap_or(0);
    for row in rows {
        if row.help.is_empty() {
            out.push_str(&format!("  {}\n", row.left));
        } else {
            out.push_str(&format!("  {:width$}  {}\n", row.left, row.help, width = width));
        }
    }
}

fn default_help(ctx: &HelpContext<'_>) -> String {
    let mut out = String::new();
    if ctx.summary.trim().is_empty() {
        out.push_str(&ctx.program);
        out.push('\n');
    } else {
        out.push_str(&format!("{} - {}\n", ctx.program, ctx.summary.trim()));
    }

    out.push_str(&format!("\nUsage: {}\n", ctx.usage));

    if !ctx.description.trim().is_empty() {
        out.push('\n');
        out.push_str(ctx.description.trim_end());
        out.push('\n');
    }

    push_section(&mut out, "Arguments", &ctx.arguments);
    push_section(&mut out, "Options", &ctx.options);
    push_section(&mut out, "Commands", &ctx.commands);

    let examples: Vec<&String> = ctx.examples.iter().filter(|e| !e.trim().is_empty()).collect();
    if !examples.is_empty() {
        out.push_str("\nExamples:\n");
        for example in examples {
            out.push_str(&format!("  {}\n", example.trim_end()));
        }
    }

    out
}

fn positional_label(arg: &ArgumentSpec) -> String {
    let name = arg.placeholder();
    let mut label = if arg.is_required() {
        format!("<{name}>")
    } else {
        format!("[{name}]")
    };
    if arg.kind().is_variadic() {
        label.push_str("...");
    }
    label
}

fn option_forms(arg: &ArgumentSpec) -> String {
    let names: Vec<String> = arg
        .shorts()
        .iter()
        .map(|s| format!("-{s}"))
        .chain(arg.longs().iter().map(|l| format!("--{l}")))
        .collect();
    names.join(", ")
}

fn value_suffix(arg: &ArgumentSpec) -> String {
    match arg.kind() {
        ArgKind::Flag | ArgKind::Positional { .. } => String::new(),
        ArgKind::Single => format!(" <{}>", arg.placeholder()),
        ArgKind::Multi => format!(" <{}>...", arg.placeholder()),
    }
}

fn arg_help(arg: &ArgumentSpec) -> String {
    let mut parts: Vec<String> = Vec::new();
    let help = arg.help_text().trim();
    if !help.is_empty() {
        parts.push(help.to_string());
    }
    if arg.is_required() && !arg.kind().is_positional() {
        parts.push("(required)".to_string());
    }
    if let ValueType::Enumerated(choices) = arg.get_value_type() {
        parts.push(format!("[possible values: {}]", choices.join(", ")));
    }
    if let Some(range) = arg.get_range() {
        parts.push(format!("[range: {range}]"));
    }
    if let Some(default) = arg.get_default() {
        parts.push(format!("[default: {default}]"));
    }
    if let Some(env) = arg.get_env() {
        parts.push(format!("[env: {env}]"));
    }
    parts.join(" ")
}

fn usage(registry: &Registry, id: CommandId, scope: &Scope) -> String {
    let mut parts = vec![registry.display_path(id), "[OPTIONS]".to_string()];
    for arg in scope.arguments() {
        if arg.is_hidden() || !arg.is_required() || arg.kind().is_positional() {
            continue;
        }
        let form = arg
            .longs()
            .first()
            .map(|l| format!("--{l}"))
            .or_else(|| arg.shorts().first().map(|s| format!("-{s}")))
            .unwrap_or_default();
        parts.push(format!("{form}{}", value_suffix(arg)));
    }
    for &index in scope.positionals() {
        let arg = scope.argument(index);
        if !arg.is_hidden() {
            parts.push(positional_label(arg));
        }
    }
    if scope.subcommands().any(|(_, child)| !registry.scope(child).is_hidden()) {
        parts.push("[COMMAND]".to_string());
    }
    parts.join(" ")
}

/// Collect everything a template needs to render help for `id`.
pub fn help_context(registry: &Registry, id: CommandId) -> HelpContext<'_> {
    let scope = registry.scope(id);

    let arguments = scope
        .positionals()
        .iter()
        .map(|&index| scope.argument(index))
        .filter(|arg| !arg.is_hidden())
        .map(|arg| HelpRow {
            left: positional_label(arg),
            help: arg_help(arg),
        })
        .collect();

    let mut options: Vec<HelpRow> = scope
        .arguments()
        .iter()
        .filter(|arg| !arg.is_hidden() && !arg.kind().is_positional())
        .map(|arg| HelpRow {
            left: format!("{}{}", option_forms(arg), value_suffix(arg)),
            help: arg_help(arg),
        })
        .collect();
    options.push(HelpRow {
        left: "-h, --help".to_string(),
        help: "Show help information".to_string(),
    });
    options.push(HelpRow {
        left: "--version".to_string(),
        help: "Show version information".to_string(),
    });

    let commands = scope
        .subcommands()
        .map(|(_, child)| registry.scope(child))
        .filter(|child| !child.is_hidden())
        .map(|child| {
            let mut left = child.name().to_string();
            if !child.aliases().is_empty() {
                left.push_str(&format!(" ({})", child.aliases().join(", ")));
            }
            HelpRow {
                left,
                help: child.summary().trim().to_string(),
            }
        })
        .collect();

    HelpContext {
        program: registry.display_path(id),
        summary: scope.summary(),
        description: scope.description(),
        usage: usage(registry, id, scope),
        arguments,
        options,
        commands,
        examples: scope.examples(),
    }
}

pub fn version_context(registry: &Registry, id: CommandId) -> VersionContext<'_> {
    VersionContext {
        program: registry.display_path(id),
        version: registry.version_for(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ArgumentSpec, CommandSpec};

    fn registry() -> Registry {
        Registry::build(
            CommandSpec::new("tool")
                .summary("Convert things")
                .version("1.4.0")
                .example("tool convert --output out.txt in.txt")
                .arg(ArgumentSpec::flag("verbose").short('v').long("verbose").help("Verbose output"))
                .arg(ArgumentSpec::flag("secret").long("secret").hidden())
                .subcommand(
                    CommandSpec::new("convert")
                        .summary("Convert a file")
                        .alias("conv")
                        .arg(
                            ArgumentSpec::single("output")
                                .short('o')
                                .long("output")
                                .value_name("FILE")
                                .required()
                                .help("Output file"),
                        )
                        .arg(
                            ArgumentSpec::single("format")
                                .long("format")
                                .choices(["json", "yaml"])
                                .default_value("json"),
                        )
                        .arg(ArgumentSpec::multi("tag").long("tag"))
                        .arg(ArgumentSpec::positional("input").required())
                        .arg(ArgumentSpec::positional("extra").variadic()),
                )
                .subcommand(CommandSpec::new("internal").hidden()),
        )
        .unwrap()
    }

    #[test]
    fn root_help_lists_options_and_commands() {
        let registry = registry();
        let text = DefaultTemplate.help(&help_context(&registry, registry.root()));
        assert!(text.starts_with("tool - Convert things\n"));
        assert!(text.contains("Usage: tool [OPTIONS] [COMMAND]"));
        assert!(text.contains("-v, --verbose  Verbose output"));
        assert!(text.contains("-h, --help"));
        assert!(text.contains("--version"));
        assert!(!text.contains("--secret"));
        assert!(text.contains("convert (conv)  Convert a file"));
        assert!(!text.contains("internal"));
        assert!(text.contains("Examples:\n  tool convert --output out.txt in.txt"));
    }

    #[test]
    fn subcommand_usage_notation() {
        let registry = registry();
        let convert = registry.lookup(&["convert"]).unwrap();
        let ctx = help_context(&registry, convert);
        assert_eq!(
            ctx.usage,
            "tool convert [OPTIONS] --output <FILE> <INPUT> [EXTRA]..."
        );
        let text = DefaultTemplate.help(&ctx);
        assert!(text.contains("-o, --output <FILE>"));
        assert!(text.contains("Output file (required)"));
        assert!(text.contains("[possible values: json, yaml] [default: json]"));
        assert!(text.contains("--tag <TAG>..."));
        assert!(text.contains("Arguments:\n  <INPUT>"));
    }

    #[test]
    fn version_and_failure_text() {
        let registry = registry();
        let convert = registry.lookup(&["convert"]).unwrap();
        assert_eq!(
            DefaultTemplate.version(&version_context(&registry, convert)),
            "tool convert 1.4.0\n"
        );

        let diagnostics = vec![Diagnostic::UnknownArgument {
            token: "--nope".to_string(),
        }];
        let text = DefaultTemplate.failure(&FailureContext {
            program: "tool".to_string(),
            diagnostics: &diagnostics,
        });
        assert_eq!(
            text,
            "error: unknown argument '--nope'\n\nFor more information, try 'tool --help'.\n"
        );
    }

    #[test]
    fn custom_template_overrides_one_method() {
        struct Terse;
        impl Template for Terse {
            fn help(&self, ctx: &HelpContext<'_>) -> String {
                format!("usage: {}\n", ctx.usage)
            }
        }
        let registry = registry();
        let ctx = help_context(&registry, registry.root());
        assert_eq!(Terse.help(&ctx), "usage: tool [OPTIONS] [COMMAND]\n");
        assert_eq!(Terse.version(&version_context(&registry, registry.root())), "tool 1.4.0\n");
    }
}
