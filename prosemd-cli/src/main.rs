// Command-line interface for prosemd
//
// This binary converts documents between Markdown and the schema-driven
// document tree, and exposes the import pipeline for inspection.
//
// Usage:
//  prosemd <input> --to <format> [--from <format>] [--output <file>]  - Convert between formats (default)
//  prosemd convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above (explicit)
//  prosemd inspect <path> [<transform>]      - Execute a transform (defaults to "tree-viz")
//  prosemd check <path>                      - Verify the file round-trips through the tree
//  prosemd --list-transforms                 - List available transforms
//
// Configuration:
//
// Defaults are embedded; a prosemd.toml in the working directory is layered
// on top when present, then the file named by --config.
//
// Extra Parameters:
//
// Configuration keys can be overridden using --extra-<parameter-name> <value>.
// Example:
//  prosemd notes.md --to markdown --extra-bullet-marker - --extra-features tables

use prosemd_cli::transforms;

use clap::{Arg, ArgAction, Command, ValueHint};
use prosemd_config::{Loader, ProsemdConfig};
use prosemd_core::{Format, MarkdownFormat, Node};
use std::collections::HashMap;
use std::fs;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            // A following "-" is a value (a bullet marker), not a flag
            let has_value = match args.get(i + 1) {
                Some(next) => next == "-" || !next.starts_with('-'),
                None => false,
            };

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("prosemd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert between Markdown and document trees")
        .long_about(
            "prosemd converts Markdown to schema-driven document trees and back.\n\n\
            Commands:\n  \
            - convert: Transform between document formats (markdown, json, tree)\n  \
            - inspect: View internal representations (tokens, tree)\n  \
            - check:   Verify a Markdown file survives a round trip\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> <value> to override configuration:\n  \
            bullet-marker, emphasis-marker, strong-marker, hard-break,\n  \
            features, nodes, marks (lists are comma-separated).\n\n\
            Examples:\n  \
            prosemd notes.md --to json                     # Markdown to ProseMirror JSON\n  \
            prosemd doc.json --to markdown -o doc.md       # JSON back to Markdown\n  \
            prosemd inspect notes.md token-simple          # View the token stream\n  \
            prosemd check notes.md                         # Round-trip check",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-transforms")
                .long("list-transforms")
                .help("List available transforms")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a prosemd.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect the token stream or tree of a Markdown file")
                .long_about(
                    "View a Markdown file at different stages of the import pipeline.\n\n\
                    Transforms (stage-format):\n  \
                    - tree-viz:     Document tree outline (default)\n  \
                    - tree-json:    Document tree as ProseMirror JSON\n  \
                    - token-simple: Token stream, one token per line\n  \
                    - token-json:   Token stream as JSON\n\n\
                    The configured schema applies: syntax it has no node or mark\n\
                    for is shown as the literal text it becomes.",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the Markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("transform")
                        .help("Transform to apply (stage-format). Defaults to 'tree-viz'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            transforms::AVAILABLE_TRANSFORMS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between different formats.\n\n\
                    Supported formats:\n  \
                    - markdown: Markdown (.md, .markdown)\n  \
                    - json:     ProseMirror JSON (.json)\n  \
                    - tree:     Indented tree outline (output only)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default, or use -o to specify a file.",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check that a Markdown file round-trips")
                .long_about(
                    "Parses the file, serializes the tree and parses the result again.\n\n\
                    Fails when the second tree differs from the first, or when\n\
                    serializing it again does not reproduce the same Markdown.",
                )
                .arg(
                    Arg::new("input")
                        .help("Markdown file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                ),
        )
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let (cleaned_args, extra_params) = parse_extra_args(&args);

    // If no subcommand is provided, inject "convert"
    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !["inspect", "convert", "check", "help"].contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    let config = load_cli_config(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        &extra_params,
    );

    if matches.get_flag("list-transforms") {
        handle_list_transforms_command(&config);
        return;
    }

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => {
            let path = required(sub_matches.get_one::<String>("path"), "path");
            let transform = sub_matches
                .get_one::<String>("transform")
                .map(|s| s.as_str())
                .unwrap_or(transforms::DEFAULT_TRANSFORM);
            handle_inspect_command(path, transform, &config);
        }
        Some(("convert", sub_matches)) => {
            let input = required(sub_matches.get_one::<String>("input"), "input");
            let to = required(sub_matches.get_one::<String>("to"), "to");
            let from = sub_matches.get_one::<String>("from").map(|s| s.as_str());
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(input, from, to, output, &config);
        }
        Some(("check", sub_matches)) => {
            let input = required(sub_matches.get_one::<String>("input"), "input");
            handle_check_command(input, &config);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// Clap enforces required arguments; this only guards the lookup.
fn required<'a>(value: Option<&'a String>, name: &str) -> &'a str {
    match value {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: missing argument '{name}'");
            std::process::exit(2);
        }
    }
}

/// Handle the inspect command
fn handle_inspect_command(path: &str, transform: &str, config: &ProsemdConfig) {
    let source = read_input(path);
    let format = markdown_format(config);

    let output = transforms::execute_transform(&source, transform, format.parser())
        .unwrap_or_else(|e| {
            eprintln!("Execution error: {e}");
            std::process::exit(1);
        });

    println!("{output}");
}

/// Handle the convert command
fn handle_convert_command(
    input: &str,
    from: Option<&str>,
    to: &str,
    output: Option<&str>,
    config: &ProsemdConfig,
) {
    let registry = config.registry().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    // Auto-detect --from if not provided
    let from = match from {
        Some(f) => f.to_string(),
        None => match registry.detect_format_from_filename(input) {
            Some(detected) => detected,
            None => {
                eprintln!("Error: Could not detect format from filename '{input}'");
                eprintln!("Please specify --from explicitly");
                std::process::exit(1);
            }
        },
    };

    for name in [from.as_str(), to] {
        if let Err(e) = registry.get(name) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    let source = read_input(input);

    let doc = registry.parse(&source, &from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });
    tracing::debug!(from = %from, to = %to, "parsed input");

    let text = registry.serialize(&doc, to).unwrap_or_else(|e| {
        eprintln!("Serialization error: {e}");
        std::process::exit(1);
    });

    match output {
        Some(path) => {
            fs::write(path, format!("{text}\n")).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        None => println!("{text}"),
    }
}

/// Handle the check command
fn handle_check_command(input: &str, config: &ProsemdConfig) {
    let source = read_input(input);
    let format = markdown_format(config);

    let doc = format.parser().parse(&source);
    let serialize = |doc: &Node| {
        format.serialize(doc).unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        })
    };

    let canonical = serialize(&doc);
    let reparsed = format.parser().parse(&canonical);
    if reparsed != doc {
        eprintln!("{input}: the serialized Markdown parses to a different tree");
        std::process::exit(1);
    }
    if serialize(&reparsed) != canonical {
        eprintln!("{input}: serialization is not idempotent");
        std::process::exit(1);
    }

    println!("{input}: ok");
}

/// Handle the list-transforms command
fn handle_list_transforms_command(config: &ProsemdConfig) {
    println!("Available transforms:\n");
    println!("Stages:");
    println!("  token  - Markdown tokenization (flat open/close stream)");
    println!("  tree   - Document tree built by the schema-bound parser\n");

    println!("Formats:");
    println!("  json   - JSON output (all stages)");
    println!("  simple - One token per line, indented by nesting");
    println!("  viz    - Indented tree outline\n");

    println!("Available transform combinations:");
    for transform_name in transforms::AVAILABLE_TRANSFORMS {
        println!("  {transform_name}");
    }

    println!("\nConversion formats:");
    match config.registry() {
        Ok(registry) => {
            for format_name in registry.list_formats() {
                println!("  {format_name}");
            }
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn read_input(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn markdown_format(config: &ProsemdConfig) -> MarkdownFormat {
    let built = config.schema().and_then(|schema| {
        let options = config.serializer_options()?;
        let features = config.tokenizer.extra_features.iter().copied();
        Ok(MarkdownFormat::configured(&schema, options, features)?)
    });
    built.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    })
}

fn load_cli_config(
    explicit_path: Option<&str>,
    extra_params: &HashMap<String, String>,
) -> ProsemdConfig {
    let loader = Loader::new().with_optional_file("prosemd.toml");
    let mut loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    let mut params: Vec<_> = extra_params.iter().collect();
    params.sort();
    for (key, value) in params {
        let result = match config_override(key, value) {
            Some((path, Override::Scalar(value))) => loader.set_override(path, value),
            Some((path, Override::List(values))) => loader.set_override(path, values),
            None => {
                tracing::warn!(parameter = %key, "ignoring unknown --extra parameter");
                continue;
            }
        };
        loader = result.unwrap_or_else(|err| {
            eprintln!("Invalid override --extra-{key}: {err}");
            std::process::exit(1);
        });
    }

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

#[derive(Debug, PartialEq)]
enum Override {
    Scalar(String),
    List(Vec<String>),
}

/// Maps an `--extra-<key>` parameter onto a configuration key.
fn config_override(key: &str, raw: &str) -> Option<(&'static str, Override)> {
    let scalar = || Override::Scalar(raw.to_string());
    let list = || {
        Override::List(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )
    };

    match key {
        "bullet-marker" => Some(("serializer.bullet_marker", scalar())),
        "emphasis-marker" | "em-marker" => Some(("serializer.emphasis_marker", scalar())),
        "strong-marker" => Some(("serializer.strong_marker", scalar())),
        "hard-break" => Some(("serializer.hard_break", scalar())),
        "features" | "extra-features" => Some(("tokenizer.extra_features", list())),
        "nodes" => Some(("schema.nodes", list())),
        "marks" => Some(("schema.marks", list())),
        _ => None,
    }
}
