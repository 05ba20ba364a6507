use crate::{
    config::ToolConfig,
    deployment::{MappingProgress, ProgressCallback},
    session::{DisplayEntry, Session, SortKey},
};
use anyhow::{bail, Context, Result};
use std::{path::PathBuf, sync::Arc};

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

struct GlobalOptions {
    format: OutputFormat,
    config: Option<PathBuf>,
}

enum CliCommand {
    Load(SessionOptions),
    Check(SessionOptions),
    Run(SessionOptions, RunOptions),
    Help,
    Version,
}

enum SourceOptions {
    Mo2 {
        profile: PathBuf,
        mods: Option<PathBuf>,
    },
    Vortex {
        manifest: PathBuf,
        staging: Option<PathBuf>,
    },
}

struct SessionOptions {
    source: SourceOptions,
    sort: SortKey,
    reverse: bool,
    legacy: bool,
}

struct RunOptions {
    output: PathBuf,
    start: Option<i32>,
    select: Option<Vec<String>>,
}

/// True when `--format json` is among `args`; status output is then kept quiet.
pub fn wants_json(args: &[String]) -> bool {
    parse_global_options(args).0.format == OutputFormat::Json
}

pub fn run(args: &[String]) -> Result<()> {
    let (global, tokens) = parse_global_options(args);
    let command = parse_command(&tokens)?;
    match command {
        CliCommand::Help => {
            print_help();
            Ok(())
        }
        CliCommand::Version => {
            println!("PriOARity v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let config = ToolConfig::load(global.config.as_deref())?;
            run_command(command, config, global.format)
        }
    }
}

fn parse_global_options(args: &[String]) -> (GlobalOptions, Vec<String>) {
    let mut format = OutputFormat::Text;
    let mut config = None;
    let mut tokens = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--format=") {
            if let Some(parsed) = OutputFormat::parse(value) {
                format = parsed;
            }
            continue;
        }
        if arg == "--format" {
            if let Some(parsed) = iter.next().and_then(|value| OutputFormat::parse(value)) {
                format = parsed;
            }
            continue;
        }
        if let Some(value) = arg.strip_prefix("--config=") {
            config = Some(PathBuf::from(value));
            continue;
        }
        if arg == "--config" {
            if let Some(value) = iter.next() {
                config = Some(PathBuf::from(value));
            }
            continue;
        }
        tokens.push(arg.to_string());
    }

    (GlobalOptions { format, config }, tokens)
}

fn parse_command(tokens: &[String]) -> Result<CliCommand> {
    let Some(head) = tokens.first() else {
        return Ok(CliCommand::Help);
    };
    let rest = tokens.get(1..).unwrap_or(&[]);
    match head.as_str() {
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "--version" | "-V" | "version" => Ok(CliCommand::Version),
        "load" => Ok(CliCommand::Load(parse_session_options(rest)?.0)),
        "check" => Ok(CliCommand::Check(parse_session_options(rest)?.0)),
        "run" => {
            let (session, run) = parse_session_options(rest)?;
            let Some(output) = run.output else {
                bail!("run requires --output <dir>");
            };
            Ok(CliCommand::Run(
                session,
                RunOptions {
                    output,
                    start: run.start,
                    select: run.select,
                },
            ))
        }
        other => bail!("Unknown command: {other} (use 'load', 'check', 'run' or 'help')"),
    }
}

#[derive(Default)]
struct PartialRun {
    output: Option<PathBuf>,
    start: Option<i32>,
    select: Option<Vec<String>>,
}

fn parse_session_options(args: &[String]) -> Result<(SessionOptions, PartialRun)> {
    let mut mo2 = None;
    let mut mods = None;
    let mut vortex = None;
    let mut staging = None;
    let mut sort = SortKey::Index;
    let mut reverse = false;
    let mut legacy = false;
    let mut run = PartialRun::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = || -> Result<String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => iter
                    .next()
                    .cloned()
                    .with_context(|| format!("{flag} requires a value")),
            }
        };
        match flag {
            "--mo2" => mo2 = Some(PathBuf::from(value()?)),
            "--mods" => mods = Some(PathBuf::from(value()?)),
            "--vortex" => vortex = Some(PathBuf::from(value()?)),
            "--staging" => staging = Some(PathBuf::from(value()?)),
            "--output" | "-o" => run.output = Some(PathBuf::from(value()?)),
            "--start" => {
                let raw = value()?;
                let start = raw
                    .parse::<i32>()
                    .with_context(|| format!("--start expects an integer, got '{raw}'"))?;
                run.start = Some(start);
            }
            "--select" => {
                let names = value()?
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                run.select = Some(names);
            }
            "--sort" => sort = parse_sort_key(&value()?)?,
            "--reverse" | "-r" => reverse = true,
            "--legacy" | "--dar" => legacy = true,
            other => bail!("Unknown option: {other}"),
        }
    }

    let source = match (mo2, vortex) {
        (Some(profile), None) => SourceOptions::Mo2 { profile, mods },
        (None, Some(manifest)) => SourceOptions::Vortex { manifest, staging },
        (Some(_), Some(_)) => bail!("--mo2 and --vortex are mutually exclusive"),
        (None, None) => bail!("a load source is required: --mo2 <profile> or --vortex <manifest>"),
    };
    Ok((
        SessionOptions {
            source,
            sort,
            reverse,
            legacy,
        },
        run,
    ))
}

fn parse_sort_key(value: &str) -> Result<SortKey> {
    match value {
        "index" | "order" => Ok(SortKey::Index),
        "name" => Ok(SortKey::Name),
        "range" => Ok(SortKey::Range),
        _ => bail!("Unknown sort key: {value}"),
    }
}

fn run_command(command: CliCommand, config: ToolConfig, format: OutputFormat) -> Result<()> {
    match command {
        CliCommand::Load(options) => {
            let session = open_session(&options, config, format)?;
            print_entries(&session.display_entries(), format)
        }
        CliCommand::Check(options) => {
            let mut session = open_session(&options, config, format)?;
            let legacy = options.legacy || session.config.include_legacy;
            let summary = session.check(legacy);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => {
                    for line in &summary.lines {
                        println!("{line}");
                    }
                }
            }
            Ok(())
        }
        CliCommand::Run(options, run) => {
            let mut session = open_session(&options, config, format)?;
            let legacy = options.legacy || session.config.include_legacy;
            let start = run.start.unwrap_or(session.config.default_start_priority);
            let selection: Vec<String> = match &run.select {
                Some(names) => {
                    for name in names.iter().filter(|name| !session.display.contains(*name)) {
                        tracing::warn!("selected add-on not loaded: {name}");
                    }
                    session
                        .display
                        .iter()
                        .filter(|source| names.contains(*source))
                        .cloned()
                        .collect()
                }
                None => session.display.clone(),
            };
            let summary = session.run(&selection, &run.output, start, legacy)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => {
                    println!("{}", summary.log_text);
                    println!();
                    println!("Next priority: {}", summary.next_priority);
                    if let Some(path) = &summary.log_file {
                        println!("Log: {}", path.display());
                    }
                }
            }
            Ok(())
        }
        CliCommand::Help | CliCommand::Version => Ok(()),
    }
}

fn open_session(
    options: &SessionOptions,
    config: ToolConfig,
    format: OutputFormat,
) -> Result<Session> {
    let mut session = match &options.source {
        SourceOptions::Mo2 { profile, mods } => {
            Session::load_mo2(profile, mods.as_deref(), config)?
        }
        SourceOptions::Vortex { manifest, staging } => {
            let progress: Option<ProgressCallback> = match format {
                OutputFormat::Text => Some(Arc::new(|progress: MappingProgress| {
                    tracing::debug!("{} ({}/{})", progress.label, progress.current, progress.total);
                })),
                OutputFormat::Json => None,
            };
            Session::load_vortex(manifest, staging.as_deref(), config, progress.as_ref())?
        }
    };
    if options.sort == SortKey::Range {
        let legacy = options.legacy || session.config.include_legacy;
        session.check(legacy);
    }
    session.sort_display(options.sort, options.reverse);
    Ok(session)
}

fn print_entries(entries: &[DisplayEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No animation add-ons found.");
            }
            for entry in entries {
                let range = entry.range.as_deref().unwrap_or("-");
                let kind = entry
                    .kind
                    .map(|kind| format!("{kind:?}"))
                    .unwrap_or_else(|| "-".to_string());
                let marker = if entry.conflict { "!" } else { " " };
                let folder = match &entry.folder {
                    Some(folder) if *folder != entry.source => format!(" -> {folder}"),
                    Some(_) => String::new(),
                    None => " (unmapped)".to_string(),
                };
                println!(
                    "{index:>3} {marker} {kind:<16} {range:<16} {source}{folder}",
                    index = entry.index,
                    source = entry.source
                );
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!("PriOARity v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  prioarity load  <source>              List animation add-ons in load order");
    println!("  prioarity check <source> [--legacy]   Report duplicate priorities");
    println!("  prioarity run   <source> --output <dir> [--start <n>] [--legacy]");
    println!("                  [--select <a,b,...>]  Renumber priorities into <dir>");
    println!();
    println!("Sources:");
    println!("  --mo2 <profile_dir> [--mods <dir>]    MO2 profile (modlist.txt)");
    println!("  --vortex <manifest> [--staging <dir>] Vortex deployment manifest");
    println!();
    println!("Options:");
    println!("  --sort <index|name|range>             Display order (run follows it)");
    println!("  -r, --reverse                         Reverse the display order");
    println!("  --legacy                              Include DAR folders");
    println!();
    println!("Global options:");
    println!("  --format <json|text>                  Output format");
    println!("  --config <file>                       Tool config (JSON)");
    println!("  -h, --help                            Show help");
    println!("  -V, --version                         Show version");
}
