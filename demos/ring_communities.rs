use commune::community::Detector;
use commune::config::{PipelineConfig, TrainingConfig, WalkConfig};
use commune::{fit_graph, Concatenation, Graph};
use std::collections::BTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Walks -> Louvain communities -> node + community embeddings.
    //
    // Run with `RUST_LOG=commune=debug` to see job queueing and worker exits.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Two rings of five joined by one bridge edge.
    let mut edges: Vec<(u32, u32)> = Vec::new();
    for ring in [0u32, 5] {
        for i in 0..5 {
            edges.push((ring + i, ring + (i + 1) % 5));
        }
    }
    edges.push((0, 5));
    let graph = Graph::from_edges(edges);

    let walks = WalkConfig::default().with_num_walks(20).with_walk_length(20);
    let training = TrainingConfig::new()
        .with_dims(16, 16)
        .with_window(3)
        .with_workers(2)
        .with_batch_words(200)
        .with_epochs(3);
    let config = PipelineConfig::new().with_training(training);

    let model = fit_graph(&graph, &walks, &Detector::from_name("louvain")?, &config)?;

    let mut by_comm: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
    for id in model.detection().ids() {
        if let Some(c) = model.detection().dominant_community(id) {
            by_comm.entry(c).or_default().push(*id);
        }
    }
    println!("communities={}", by_comm.len());
    for (cid, ids) in &by_comm {
        println!("  community {cid}: {ids:?}");
    }

    let report = model.community_report();
    println!(
        "community pass: {} walks, {} tokens, {:.0} tokens/s",
        report.examples,
        report.effective_tokens,
        report.tokens_per_sec()
    );

    let stdout = std::io::stdout();
    model.write_community_embeddings(stdout.lock())?;
    let joined = model.concatenated(Concatenation::Average)?;
    println!("concatenated shape = {:?}", joined.dim());

    Ok(())
}
