/// Chamber Linter: validates authored chamber files and reports
/// authoring smells.
///
/// Usage: chamber_linter <chamber_dir_or_file>... [--builtin]
///
/// Hard invariant violations (dangling targets, ambiguous routing, ...)
/// are errors. Reachability problems are warnings.
use chamber_narrative::core::analysis::lint_graph;
use chamber_narrative::core::builtin::BuiltinSource;
use chamber_narrative::core::content::{ContentSource, RonPathSource};
use chamber_narrative::core::validate::violations;
use chamber_narrative::schema::graph::NarrativeGraph;
use std::collections::HashSet;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: chamber_linter <chamber_dir_or_file>... [--builtin]");
        process::exit(0);
    }

    let mut sources: Vec<Box<dyn ContentSource>> = Vec::new();
    for arg in &args[1..] {
        if arg == "--builtin" {
            sources.push(Box::new(BuiltinSource));
        } else {
            sources.push(Box::new(RonPathSource::new(arg.as_str())));
        }
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut graphs: Vec<NarrativeGraph> = Vec::new();

    for source in &sources {
        match source.load() {
            Ok(loaded) => {
                println!("  Loaded: {} ({} chambers)", source.describe(), loaded.len());
                graphs.extend(loaded);
            }
            Err(e) => errors.push(format!("{}: {}", source.describe(), e)),
        }
    }

    let mut seen = HashSet::new();
    for graph in &graphs {
        if !seen.insert(graph.key.clone()) {
            errors.push(format!("{}: defined more than once", graph.key));
        }
        for violation in violations(graph) {
            errors.push(format!("{}: {}", graph.key, violation));
        }
        for warning in lint_graph(graph) {
            warnings.push(format!("{}: {}", graph.key, warning));
        }
    }

    println!("\n=== Chamber Lint Report ===\n");
    println!("Checked {} chambers", graphs.len());

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}
