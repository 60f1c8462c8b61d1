/// Walkthrough: plays every chamber with seeded random choices and
/// reports completion and coverage.
///
/// Usage: walkthrough [--content <path>]... [--builtin] [--runs <n>] [--seed <n>] [--max-steps <n>]
use chamber_narrative::core::analysis::summarize_walks;
use chamber_narrative::core::catalog::Catalog;
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: walkthrough [--content <path>]... [--builtin] [--runs <n>] [--seed <n>] [--max-steps <n>]";

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| {
            eprintln!("Error: {} expects a number", flag);
            process::exit(1);
        })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut builder = Catalog::builder();
    let mut any_source = false;
    let mut runs = 100usize;
    let mut seed = 42u64;
    let mut max_steps = 200usize;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--content" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    eprintln!("Error: --content expects a path");
                    process::exit(1);
                };
                builder = builder.content_path(path.as_str());
                any_source = true;
            }
            "--builtin" => {
                builder = builder.builtin();
                any_source = true;
            }
            "--runs" => {
                i += 1;
                runs = parse_number("--runs", args.get(i));
            }
            "--seed" => {
                i += 1;
                seed = parse_number("--seed", args.get(i));
            }
            "--max-steps" => {
                i += 1;
                max_steps = parse_number("--max-steps", args.get(i));
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    if !any_source {
        builder = builder.builtin();
    }

    let catalog = builder.build();
    if let Err(e) = catalog.initialize() {
        eprintln!("Error loading chambers: {}", e);
        process::exit(1);
    }

    println!(
        "Walking {} chambers: {} runs each, seed {}, max {} steps\n",
        catalog.list_graphs().len(),
        runs,
        seed,
        max_steps
    );

    let mut incomplete = 0;
    for graph in catalog.list_graphs() {
        let summary = match summarize_walks(graph, runs, seed, max_steps) {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("{}: {}", graph.key, e);
                incomplete += 1;
                continue;
            }
        };

        let uncovered: Vec<&str> = graph
            .sorted_node_ids()
            .into_iter()
            .filter(|id| !summary.covered.contains(*id))
            .map(|id| id.as_str())
            .collect();

        println!("{}", graph.key);
        println!(
            "  completed {}/{}  dead ends {}  step limit {}",
            summary.completed, summary.runs, summary.dead_ends, summary.step_limited
        );
        println!(
            "  avg steps {:.1}  avg progress {:.1}",
            summary.average_steps(),
            summary.average_progress()
        );
        println!(
            "  coverage {}/{} nodes",
            graph.node_count() - uncovered.len(),
            graph.node_count()
        );
        if !uncovered.is_empty() {
            println!("  never visited: {}", uncovered.join(", "));
        }
        println!();

        if summary.completed < summary.runs {
            incomplete += 1;
        }
    }

    if incomplete > 0 {
        println!("{} chambers had walks that did not complete", incomplete);
        process::exit(1);
    }
}
