//! Basic example streaming a synthetic series through the detector
//!
//! Run with: cargo run --example basic -p cascade

use cascade::{ConfirmationPolicy, Pipeline, PipelineConfig, RecordingSink};
use cascade_sim::{GeneratorConfig, SyntheticStream};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== cascade Basic Example ===\n");

    // 1. A synthetic stream: trend, two seasons, noise and ~5% spikes
    let stream = SyntheticStream::new(GeneratorConfig::with_seed(7))?.take_points(500);

    // 2. Default detector: z-score window 40, neighbor window 10, batch 50
    let config = PipelineConfig::builder()
        .confirmation_policy(ConfirmationPolicy::DedupeByArrival)
        .build()?;
    println!("Config: {}", describe(&config));

    let mut pipeline = Pipeline::new(config)?;
    let mut sink = RecordingSink::new();
    let confirmed = pipeline.run(stream, &mut sink).to_vec();

    // 3. Results
    let stats = pipeline.stats();
    println!("Points:     {}", stats.points);
    println!("Candidates: {}", stats.candidates);
    println!(
        "Passes:     {} run, {} skipped",
        stats.passes_run, stats.passes_skipped
    );
    println!("Confirmed:  {}\n", confirmed.len());

    for anomaly in &confirmed {
        println!(
            "   index {:>3}  value {:>8.3}  score {:.3}  (pass {})",
            anomaly.index,
            anomaly.value(),
            anomaly.score,
            anomaly.pass
        );
    }

    println!("\n=== Example Complete ===");
    Ok(())
}

fn describe(config: &PipelineConfig) -> String {
    format!(
        "window={}, z={}, neighbors={}, neighbor_threshold={}, model_window={}, batch={}",
        config.sliding_window_size,
        config.z_threshold,
        config.neighbor_window_size,
        config.neighbor_threshold,
        config.model_window,
        config.batch_size
    )
}
