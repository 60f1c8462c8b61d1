/// Emotion Chamber example: plays the built-in compassionate_friend chamber.
///
/// A short visit: arrival → check-in → holding space → a breath → settled.
/// The session is saved to JSON halfway through and resumed, the way a
/// client would persist it between requests.
///
/// Run with: cargo run --example emotion_chamber
use chamber_narrative::core::catalog::Catalog;
use chamber_narrative::core::engine;
use chamber_narrative::core::playthrough::Playthrough;
use chamber_narrative::core::session::SessionState;
use chamber_narrative::core::variant::VariantSelector;
use chamber_narrative::schema::node::Node;

fn print_node(node: &Node) {
    println!("[{}] {}", node.kind.name(), node.text);
    for choice in &node.choices {
        println!("    ({}) {}", choice.id, choice.text);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("chamber_narrative=info"))
        .init();

    // --- Load the built-in chambers ---
    let catalog = Catalog::builder().builtin().build();
    catalog.initialize().expect("Built-in chambers failed to load");

    println!("=== Chambers ===");
    for context in catalog.contexts() {
        println!("  {}: {}", context, catalog.variants(context).join(", "));
    }
    println!();

    // --- Resolve the chamber for a visitor ---
    let selector = VariantSelector::new(&catalog).with_baseline("compassionate_friend");
    let graph = selector
        .resolve("emotion", "compassionate_friend")
        .graph()
        .cloned()
        .expect("No emotion chamber");

    let mut playthrough = Playthrough::new(graph.clone());
    print_node(playthrough.current_node().expect("Missing start node"));

    // arrival → check_in
    print_node(playthrough.advance().expect("arrival has no next"));

    // check_in → hold_space
    println!("  > heavy");
    print_node(playthrough.choose("heavy").expect("No 'heavy' choice"));

    // --- Save and restore, as a client would between requests ---
    let saved = serde_json::to_string(playthrough.state()).expect("Failed to serialize state");
    println!("\n  saved session: {}\n", saved);
    let restored: SessionState = serde_json::from_str(&saved).expect("Failed to parse state");

    // The engine itself is stateless: the same call on the same state
    // always produces the same next state.
    let preview = engine::advance(&graph, &restored).expect("hold_space has no next");
    println!("  (next would be '{}')\n", preview.current_node_id);

    let mut playthrough = Playthrough::resume(graph, restored).expect("Stale session");

    // hold_space → breathe → breath_insight → settled
    print_node(playthrough.advance().expect("hold_space has no next"));
    println!("  > try");
    print_node(playthrough.choose("try").expect("No 'try' choice"));
    print_node(playthrough.advance().expect("breath_insight has no next"));

    let state = playthrough.state();
    println!("\n=== Session ===");
    println!("  complete: {}", playthrough.is_complete());
    println!("  progress: {}", state.progress_score);
    for (key, value) in &state.variables {
        println!("  {} = {}", key, value);
    }
    let path: Vec<&str> = state.visited.iter().map(|id| id.as_str()).collect();
    println!("  path: {}", path.join(" → "));

    // --- A variant with no chamber of its own falls back to the baseline ---
    let fallback = selector.resolve("growth", "wise_detective");
    match fallback.graph() {
        Some(g) => println!("\ngrowth/wise_detective is served by {}", g.key),
        None => println!("\ngrowth/wise_detective has no chamber"),
    }
}
