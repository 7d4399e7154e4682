//! # cascade-cli
//!
//! Command-line interface for the cascade anomaly detector.

use cascade::{ConfirmedAnomaly, Observation, Pipeline, PipelineConfig, PipelineStats, TracingSink};
use cascade_sim::{GeneratorConfig, SyntheticStream};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = std::result::Result<T, String>;

#[derive(Parser)]
#[command(name = "cascade")]
#[command(about = "Two-stage streaming anomaly detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detector on a synthetic stream
    Simulate {
        /// Number of points to generate
        #[arg(short, long, default_value = "1000")]
        points: u64,

        /// Generator seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        detector: DetectorArgs,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the detector over a recorded series
    Detect {
        /// Input file (CSV with timestamp,value columns, or JSON)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        detector: DetectorArgs,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Detector configuration: an optional JSON file plus per-field overrides.
#[derive(Args)]
struct DetectorArgs {
    /// Pipeline configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Z-score sliding window size
    #[arg(long)]
    window: Option<usize>,

    /// Z-score threshold
    #[arg(long)]
    z_threshold: Option<f64>,

    /// Neighbor window size
    #[arg(long)]
    neighbor_window: Option<usize>,

    /// Neighbor deviation threshold
    #[arg(long)]
    neighbor_threshold: Option<f64>,

    /// Points between validation passes
    #[arg(long)]
    batch_size: Option<usize>,
}

impl DetectorArgs {
    fn resolve(&self) -> CliResult<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file =
                    File::open(path).map_err(|e| format!("Failed to open config: {}", e))?;
                PipelineConfig::from_reader(BufReader::new(file)).map_err(|e| e.to_string())?
            }
            None => PipelineConfig::default(),
        };

        if let Some(window) = self.window {
            config.sliding_window_size = window;
        }
        if let Some(threshold) = self.z_threshold {
            config.z_threshold = threshold;
        }
        if let Some(window) = self.neighbor_window {
            config.neighbor_window_size = window;
        }
        if let Some(threshold) = self.neighbor_threshold {
            config.neighbor_threshold = threshold;
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }

        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

/// Load observations from a CSV file with `timestamp,value` columns
fn load_csv_data(path: &Path) -> CliResult<Vec<Observation>> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut data = Vec::new();
    for result in reader.deserialize::<Observation>() {
        let observation = result.map_err(|e| format!("Failed to read record: {}", e))?;
        data.push(observation);
    }

    if data.is_empty() {
        return Err("No observations found".to_string());
    }
    Ok(data)
}

/// Load observations from a JSON file.
///
/// Accepts an array of `{ "timestamp", "value" }` objects or a bare array of
/// numbers, which are numbered from 0.
fn load_json_data(path: &Path) -> CliResult<Vec<Observation>> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Failed to parse JSON: {}", e))?;

    let arr = json
        .as_array()
        .ok_or_else(|| "Expected a JSON array".to_string())?;
    if arr.is_empty() {
        return Err("No observations found".to_string());
    }

    if arr.iter().all(|v| v.is_number()) {
        return Ok(arr
            .iter()
            .filter_map(|v| v.as_f64())
            .enumerate()
            .map(|(i, value)| Observation::new(i as u64, value))
            .collect());
    }

    serde_json::from_value(json).map_err(|e| format!("Failed to parse observations: {}", e))
}

/// Load data from file (auto-detect format)
fn load_data(path: &Path) -> CliResult<Vec<Observation>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => load_csv_data(path),
        "json" => load_json_data(path),
        _ => load_csv_data(path).or_else(|_| load_json_data(path)),
    }
}

fn detect<I>(config: PipelineConfig, source: I) -> CliResult<(Vec<ConfirmedAnomaly>, PipelineStats)>
where
    I: IntoIterator<Item = Observation>,
{
    let mut pipeline = Pipeline::new(config).map_err(|e| e.to_string())?;
    let confirmed = pipeline.run(source, TracingSink::new()).to_vec();
    Ok((confirmed, pipeline.stats()))
}

/// Print a summary and optionally write the confirmed anomalies as JSON
fn report(
    confirmed: &[ConfirmedAnomaly],
    stats: PipelineStats,
    config: &PipelineConfig,
    output: Option<&PathBuf>,
) -> CliResult<()> {
    println!("Points processed: {}", stats.points);
    println!("Candidates: {}", stats.candidates);
    println!(
        "Validation passes: {} run, {} skipped",
        stats.passes_run, stats.passes_skipped
    );
    println!("Confirmed anomalies: {}", confirmed.len());

    if !confirmed.is_empty() {
        println!("\nAnomaly details:");
        for anomaly in confirmed {
            println!(
                "  Index {}: timestamp={}, value={:.4}, score={:.4}, pass={}",
                anomaly.index,
                anomaly.timestamp(),
                anomaly.value(),
                anomaly.score,
                anomaly.pass
            );
        }
    }

    if let Some(path) = output {
        let json = serde_json::json!({
            "config": config,
            "stats": stats,
            "confirmed": confirmed,
        });
        let mut file = File::create(path).map_err(|e| format!("Failed to create output: {}", e))?;
        serde_json::to_writer_pretty(&mut file, &json)
            .map_err(|e| format!("Failed to write JSON: {}", e))?;
        println!("\nResults written to {:?}", path);
    }

    Ok(())
}

/// Run simulate command
fn run_simulate(
    points: u64,
    seed: u64,
    detector: DetectorArgs,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let config = detector.resolve()?;
    let stream = SyntheticStream::new(GeneratorConfig::with_seed(seed))
        .map_err(|e| e.to_string())?
        .take_points(points);
    println!("Simulating {} points (seed {})", points, seed);

    let (confirmed, stats) = detect(config.clone(), stream)?;
    report(&confirmed, stats, &config, output.as_ref())
}

/// Run detect command
fn run_detect(input: PathBuf, detector: DetectorArgs, output: Option<PathBuf>) -> CliResult<()> {
    let config = detector.resolve()?;
    let data = load_data(&input)?;
    println!(
        "Loaded {} observations from {:?}",
        data.len(),
        input.file_name().unwrap_or_default()
    );

    let (confirmed, stats) = detect(config.clone(), data)?;
    report(&confirmed, stats, &config, output.as_ref())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cascade=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            points,
            seed,
            detector,
            output,
        } => run_simulate(points, seed, detector, output),

        Commands::Detect {
            input,
            detector,
            output,
        } => run_detect(input, detector, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cascade-cli-{}-{}", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn no_overrides() -> DetectorArgs {
        DetectorArgs {
            config: None,
            window: None,
            z_threshold: None,
            neighbor_window: None,
            neighbor_threshold: None,
            batch_size: None,
        }
    }

    #[test]
    fn test_cli_parses_simulate() {
        let cli = Cli::try_parse_from(["cascade", "simulate", "--points", "200", "--window", "20"])
            .unwrap();
        match cli.command {
            Commands::Simulate { points, detector, .. } => {
                assert_eq!(points, 200);
                assert_eq!(detector.window, Some(20));
            }
            Commands::Detect { .. } => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_overrides_apply_on_defaults() {
        let args = DetectorArgs {
            window: Some(15),
            batch_size: Some(25),
            ..no_overrides()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.sliding_window_size, 15);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.neighbor_window_size, 10);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = DetectorArgs {
            z_threshold: Some(0.0),
            ..no_overrides()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_config_file_then_override() {
        let path = temp_file("config.json", r#"{ "sliding_window_size": 30, "batch_size": 20 }"#);
        let args = DetectorArgs {
            config: Some(path.clone()),
            batch_size: Some(40),
            ..no_overrides()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.sliding_window_size, 30);
        assert_eq!(config.batch_size, 40);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_csv() {
        let path = temp_file("series.csv", "timestamp,value\n1,10.5\n2,11.0\n3,42.0\n");
        let data = load_data(&path).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[2], Observation::new(3, 42.0));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_json_objects_and_numbers() {
        let path = temp_file(
            "objects.json",
            r#"[{"timestamp": 5, "value": 1.5}, {"timestamp": 6, "value": 2.5}]"#,
        );
        let data = load_data(&path).unwrap();
        assert_eq!(data, vec![Observation::new(5, 1.5), Observation::new(6, 2.5)]);
        std::fs::remove_file(path).ok();

        let path = temp_file("numbers.json", "[3.0, 4.0, 5.0]");
        let data = load_data(&path).unwrap();
        assert_eq!(data[1], Observation::new(1, 4.0));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_empty_inputs_rejected() {
        let path = temp_file("empty.json", "[]");
        assert_eq!(load_data(&path).unwrap_err(), "No observations found");
        std::fs::remove_file(path).ok();

        let path = temp_file("empty.csv", "timestamp,value\n");
        assert_eq!(load_data(&path).unwrap_err(), "No observations found");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_detect_on_loaded_series() {
        let mut values: Vec<f64> = (0..100).map(|i| 10.0 + ((i * 37) % 11) as f64 * 0.05).collect();
        values[70] += 8.0;
        let data: Vec<Observation> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation::new(i as u64, v))
            .collect();

        let (confirmed, stats) = detect(PipelineConfig::default(), data).unwrap();
        assert_eq!(stats.points, 100);
        assert_eq!(stats.passes_run + stats.passes_skipped, 2);
        assert!(confirmed.iter().all(|c| c.index >= 39));
    }
}
