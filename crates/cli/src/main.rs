use anyhow::{Context, Result, bail};
use argweave::ParseOutcome;
use argweave_schema::CommandSchema;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

/// Exit status for argv that failed to parse.
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(name = "argweave")]
#[command(version, about = "Parse command lines against a JSON command schema", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse arguments and print the typed result as JSON
    Parse(ParseArgs),

    /// Print the help text of a command
    Help(HelpArgs),

    /// Validate a schema without parsing anything
    Check(CheckArgs),
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the command schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Read environment values from a dotenv file
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Also read environment values from the process environment
    #[arg(long)]
    inherit_env: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,

    /// Arguments to parse (place them after `--`)
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,
}

#[derive(Parser)]
struct HelpArgs {
    /// Path to the command schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Sub-command path (names or aliases)
    #[arg(value_name = "COMMAND")]
    path: Vec<String>,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the command schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct CheckReport {
    program: String,
    commands: usize,
    arguments: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse(args) => parse(args),
        Commands::Help(args) => help(args),
        Commands::Check(args) => check(args),
    }
}

fn load(path: &Path) -> Result<(CommandSchema, argweave::Parser)> {
    let schema = CommandSchema::from_path(path)?;
    let parser = schema
        .to_parser()
        .with_context(|| format!("invalid command schema: {}", path.display()))?;
    tracing::debug!(commands = parser.registry().len(), "loaded schema");
    Ok((schema, parser))
}

/// Values from `--env-file` win over inherited ones.
fn env_snapshot(args: &ParseArgs) -> Result<Vec<(String, String)>> {
    let mut env: IndexMap<String, String> = IndexMap::new();
    if args.inherit_env {
        env.extend(std::env::vars());
    }
    if let Some(path) = &args.env_file {
        let entries = dotenvy::from_path_iter(path)
            .with_context(|| format!("failed to read env file: {}", path.display()))?;
        for entry in entries {
            let (key, value) =
                entry.with_context(|| format!("invalid env file: {}", path.display()))?;
            env.insert(key, value);
        }
    }
    Ok(env.into_iter().collect())
}

fn parse(args: ParseArgs) -> Result<()> {
    let (_, parser) = load(&args.schema)?;
    let env = env_snapshot(&args)?;
    tracing::debug!(argc = args.args.len(), env = env.len(), "parsing arguments");

    match parser.parse_with_env(&args.args, &env) {
        ParseOutcome::Success(parsed) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&parsed)?
            } else {
                serde_json::to_string(&parsed)?
            };
            println!("{json}");
        }
        ParseOutcome::Help(text) | ParseOutcome::Version(text) => print!("{text}"),
        ParseOutcome::Failure(diagnostics) => {
            eprint!("{}", parser.render_failure(&diagnostics));
            std::process::exit(EXIT_USAGE);
        }
    }
    Ok(())
}

fn help(args: HelpArgs) -> Result<()> {
    let (_, parser) = load(&args.schema)?;
    let Some(text) = parser.help(&args.path) else {
        bail!("unknown command: {}", args.path.join(" "));
    };
    print!("{text}");
    Ok(())
}

fn count_arguments(schema: &CommandSchema) -> usize {
    schema.args.len() + schema.subcommands.iter().map(count_arguments).sum::<usize>()
}

fn check(args: CheckArgs) -> Result<()> {
    let (schema, parser) = load(&args.schema)?;
    let report = CheckReport {
        program: parser.registry().display_path(parser.registry().root()),
        commands: parser.registry().len(),
        arguments: count_arguments(&schema),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "OK: {} ({} commands, {} arguments)",
            report.program, report.commands, report.arguments
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
