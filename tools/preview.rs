/// Preview: interactive shell for playing through chambers.
///
/// Usage: preview [--config <path>] [--content <path>]... [--builtin]
///
/// Commands:
///   list                     - list loaded chambers
///   open <context> <variant> - start a playthrough (baseline/fallback apply)
///   show                     - print the current node
///   choose <id>              - take a choice
///   next                     - follow a node's `next` link
///   undo                     - step back one transition
///   reset                    - restart the chamber
///   state                    - print the session state as RON
///   help                     - list commands
///   quit                     - exit
use chamber_narrative::core::catalog::Catalog;
use chamber_narrative::core::config::CatalogConfig;
use chamber_narrative::core::playthrough::Playthrough;
use chamber_narrative::core::variant::{Resolution, VariantSelector};
use chamber_narrative::schema::node::Node;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path = None;
    let mut content_paths = Vec::new();
    let mut builtin = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--content" if i + 1 < args.len() => {
                i += 1;
                content_paths.push(args[i].clone());
            }
            "--builtin" => builtin = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(ref path) => match CatalogConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        },
        None => CatalogConfig {
            include_builtin: content_paths.is_empty(),
            ..CatalogConfig::default()
        },
    };
    config.content_dirs.extend(content_paths.iter().map(Into::into));
    if builtin {
        config.include_builtin = true;
    }

    let catalog = Catalog::from_config(&config);
    if let Err(e) = catalog.initialize() {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
    let selector = match VariantSelector::from_config(&catalog, &config) {
        Ok(selector) => selector,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} chambers", catalog.list_graphs().len());
    println!("Type 'help' for commands.\n");

    let mut playthrough: Option<Playthrough> = None;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "list" | "ls" => {
                for context in catalog.contexts() {
                    println!("  {}: {}", context, catalog.variants(context).join(", "));
                }
            }
            "open" => {
                if parts.len() < 3 {
                    println!("Usage: open <context> <variant>");
                    continue;
                }
                match selector.resolve(parts[1], parts[2]) {
                    Resolution::Graph(graph) => {
                        println!("Opened {}", graph.key);
                        playthrough = Some(Playthrough::new(graph));
                    }
                    Resolution::Baseline(graph) => {
                        println!("No {}/{}; opened baseline {}", parts[1], parts[2], graph.key);
                        playthrough = Some(Playthrough::new(graph));
                    }
                    Resolution::Fallback(lines) => {
                        println!("No chamber for {}/{}.", parts[1], parts[2]);
                        if let Some(text) = lines.line("default") {
                            println!("  [{}] {}", lines.variant, text);
                        }
                        playthrough = None;
                        continue;
                    }
                }
                show(playthrough.as_ref());
            }
            "show" | "s" => show(playthrough.as_ref()),
            "choose" | "c" => {
                let Some(p) = playthrough.as_mut() else {
                    println!("No chamber open. Use 'open' first.");
                    continue;
                };
                if parts.len() < 2 {
                    match p.choices() {
                        Ok(choices) => {
                            for choice in choices {
                                println!("  [{}] {}", choice.id, choice.text);
                            }
                        }
                        Err(e) => println!("ERROR: {}", e),
                    }
                    continue;
                }
                let result = p.choose(parts[1]).map(|_| ());
                match result {
                    Ok(()) => show(playthrough.as_ref()),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "next" | "n" => {
                let Some(p) = playthrough.as_mut() else {
                    println!("No chamber open. Use 'open' first.");
                    continue;
                };
                let result = p.advance().map(|_| ());
                match result {
                    Ok(()) => show(playthrough.as_ref()),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "undo" | "u" => {
                let undone = playthrough.as_mut().map(Playthrough::undo);
                match undone {
                    Some(true) => show(playthrough.as_ref()),
                    Some(false) => println!("Nothing to undo."),
                    None => println!("No chamber open."),
                }
            }
            "reset" => {
                if let Some(p) = playthrough.as_mut() {
                    p.reset();
                }
                show(playthrough.as_ref());
            }
            "state" => match playthrough.as_ref() {
                Some(p) => {
                    match ron::ser::to_string_pretty(p.state(), ron::ser::PrettyConfig::default()) {
                        Ok(text) => println!("{}", text),
                        Err(e) => println!("ERROR: {}", e),
                    }
                }
                None => println!("No chamber open."),
            },
            _ => {
                println!("Unknown command: '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn show(playthrough: Option<&Playthrough>) {
    let Some(p) = playthrough else {
        println!("No chamber open.");
        return;
    };
    match p.current_node() {
        Ok(node) => {
            print_node(node);
            println!(
                "  (progress {}, {} steps{})",
                p.state().progress_score,
                p.steps(),
                if p.is_complete() { ", complete" } else { "" }
            );
        }
        Err(e) => println!("ERROR: {}", e),
    }
}

fn print_node(node: &Node) {
    println!("\n[{} · {}]", node.id, node.kind.name());
    println!("{}", node.text);
    for choice in &node.choices {
        println!("  [{}] {}", choice.id, choice.text);
    }
    if node.next.is_some() {
        println!("  (next)");
    }
    println!();
}

fn print_usage() {
    println!("Usage: preview [--config <path>] [--content <path>]... [--builtin]");
    println!();
    println!("Without --config or --content, the built-in chambers are loaded.");
}

fn print_help() {
    println!("Commands:");
    println!("  list                     - list loaded chambers");
    println!("  open <context> <variant> - start a playthrough");
    println!("  show                     - print the current node");
    println!("  choose <id>              - take a choice (no id lists them)");
    println!("  next                     - follow the node's next link");
    println!("  undo                     - step back one transition");
    println!("  reset                    - restart the chamber");
    println!("  state                    - print the session state as RON");
    println!("  help                     - this message");
    println!("  quit                     - exit");
}
