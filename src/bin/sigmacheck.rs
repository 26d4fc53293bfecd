use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sigmacheck::{rules_from_json, rules_from_yaml, validate_all, Engine, Event, Rule};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sigmacheck")]
#[command(about = "Validate detection rules and check events against them", version)]
struct Cli {
    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lint rule files without matching any events
    Validate {
        /// Rule files or directories (searched recursively for .yml/.yaml/.json)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Match events against rules
    Check {
        /// Rule files or directories
        #[arg(short, long, required = true)]
        rules: Vec<PathBuf>,
        /// Event files: one JSON object, an array of objects, or NDJSON
        #[arg(required = true)]
        events: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("sigmacheck: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Command::Validate { paths } => {
            let rules = load_rules(paths)?;
            debug!(count = rules.len(), "rules loaded");
            let issues = validate_all(&rules);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&issues)?);
            } else {
                for issue in &issues {
                    println!("{issue}");
                }
                eprintln!("{} rules, {} findings", rules.len(), issues.len());
            }
            Ok(!sigmacheck::validate::has_errors(&issues))
        }
        Command::Check { rules, events } => {
            let rules = load_rules(rules)?;
            let events = load_events(events)?;
            debug!(
                rules = rules.len(),
                events = events.len(),
                "running check"
            );

            let report = Engine::new().check(&rules, &events);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for failure in &report.failures {
                    eprintln!("error: rule {} failed to compile: {}", failure.rule, failure.error);
                }
                for result in report.matches() {
                    println!(
                        "match: rule {} event #{} (selections: {})",
                        result.rule,
                        result.event_index,
                        result.matched_selections.join(", ")
                    );
                }
                eprintln!(
                    "{} rules, {} events, {} matches",
                    rules.len(),
                    events.len(),
                    report.matches().count()
                );
            }
            Ok(!report.has_failures())
        }
    }
}

fn load_rules(paths: &[PathBuf]) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path) {
                let entry = entry.with_context(|| format!("walking {}", path.display()))?;
                if entry.file_type().is_file() && is_rule_file(entry.path()) {
                    load_rule_file(entry.path(), &mut rules)?;
                }
            }
        } else {
            load_rule_file(path, &mut rules)?;
        }
    }
    if rules.is_empty() {
        bail!("no rules found");
    }
    Ok(rules)
}

fn is_rule_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml" | "json")
    )
}

fn load_rule_file(path: &Path, rules: &mut Vec<Rule>) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        rules_from_json(&data)
    } else {
        rules_from_yaml(&data)
    };
    let mut parsed = parsed.with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), count = parsed.len(), "loaded rule file");
    rules.append(&mut parsed);
    Ok(())
}

/// Load events: one object, an array of objects, or NDJSON (one object
/// per line)
fn load_events(paths: &[PathBuf]) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for path in paths {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match serde_json::from_str::<serde_json::Value>(&data) {
            Ok(serde_json::Value::Array(items)) => {
                events.extend(items.into_iter().map(Event::new));
            }
            Ok(single) => events.push(Event::new(single)),
            // Whole-file parse failed; fall back to line-delimited JSON
            Err(_) => {
                for (lineno, line) in data.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value: serde_json::Value =
                        serde_json::from_str(line).with_context(|| {
                            format!("parsing {} line {}", path.display(), lineno + 1)
                        })?;
                    events.push(Event::new(value));
                }
            }
        }
    }
    if events.is_empty() {
        bail!("no events found");
    }
    Ok(events)
}
