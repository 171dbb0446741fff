use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use rulegate::{
    DynObject, MapResolver, MetadataRegistry, NullResolver, PassDiagnostic, RuleDefinition,
    Severity, ValidationEngine,
};

#[derive(Parser, Debug)]
#[command(name = "rulegate", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a JSON object snapshot against a JSON rule table.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Rule table JSON ({"type": "...", "rules": [...]}).
    #[arg(long)]
    rules: PathBuf,

    /// Object snapshot JSON.
    #[arg(long)]
    object: PathBuf,

    /// Optional localization table JSON (key → text).
    #[arg(long)]
    messages: Option<PathBuf>,

    /// Emit all messages as JSON instead of plain text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, serde::Deserialize)]
struct RulesFile {
    #[serde(rename = "type")]
    type_name: String,
    rules: Vec<RuleDefinition>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
    }
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse '{}'", path.display()))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let rules_file: RulesFile = serde_json::from_value(read_json(&args.rules)?)
        .with_context(|| "parse rule table")?;
    let object = DynObject::from_json(&rules_file.type_name, &read_json(&args.object)?)?;

    let registry = Arc::new(MetadataRegistry::new());
    registry.install(&object, |builder| {
        for rule in rules_file.rules {
            builder.rule(rule);
        }
    })?;

    let engine = match &args.messages {
        Some(path) => {
            let table: BTreeMap<String, String> = serde_json::from_value(read_json(path)?)
                .with_context(|| "parse localization table")?;
            ValidationEngine::with_registry(registry, MapResolver::new(table))
        }
        None => ValidationEngine::with_registry(registry, NullResolver),
    };

    let outcome = engine.validate_object(&object)?;
    for diagnostic in &outcome.diagnostics {
        match diagnostic {
            PassDiagnostic::GateCycle { property, gate } => {
                eprintln!("diagnostic: gate cycle on '{property}' via '{gate}'");
            }
            PassDiagnostic::HandlerFault { property, detail } => {
                eprintln!("diagnostic: handler fault on '{property}': {detail}");
            }
        }
    }

    let all = engine.aggregator().all_messages();
    if args.json {
        let printable: BTreeMap<&String, &[rulegate::ValidationMessage]> = all
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(p, set)| (p, set.as_ref()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&printable)?);
    } else {
        for (property, set) in &all {
            for message in set.iter() {
                let tag = match message.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                println!("{property}: [{tag}] {}", message.text);
            }
        }
    }

    if !engine.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}
