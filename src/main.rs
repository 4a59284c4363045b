//! ctrnn - CLI Entry Point
//!
//! Generates genomes, drives networks and manages checkpoints.

use clap::{Parser, Subcommand};
use ctrnn::checkpoint::{Checkpoint, CheckpointManager};
use ctrnn::{benchmark, drive, Ctrnn, CtrnnConfiguration, RunOutcome, Settings};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ctrnn")]
#[command(version)]
#[command(about = "Continuous-time recurrent neural network simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate default settings file
    Init {
        /// Output path
        #[arg(short, long, default_value = "settings.yaml")]
        output: PathBuf,
    },

    /// Generate a random genome
    Genome {
        /// Number of input nodes
        #[arg(short, long, default_value = "2")]
        inputs: usize,

        /// Number of hidden (output) nodes
        #[arg(long, default_value = "3")]
        hidden: usize,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Output path (.json, .yaml or .yml)
        #[arg(short, long, default_value = "genome.json")]
        output: PathBuf,
    },

    /// Drive a network built from a genome
    Run {
        /// Settings file (YAML)
        #[arg(short, long, default_value = "settings.yaml")]
        settings: PathBuf,

        /// Genome file (JSON or YAML)
        #[arg(short, long)]
        genome: PathBuf,

        /// Number of steps (defaults to the settings value)
        #[arg(long)]
        steps: Option<u64>,

        /// Constant input vector, comma separated
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        input: Vec<f64>,

        /// Output directory for checkpoints and the trace
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Continue a network from a checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional steps
        #[arg(long, default_value = "1000")]
        steps: u64,

        /// Constant input vector, comma separated
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        input: Vec<f64>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "100000")]
        steps: u64,

        /// Number of input nodes
        #[arg(short, long, default_value = "4")]
        inputs: usize,

        /// Number of hidden nodes
        #[arg(long, default_value = "8")]
        hidden: usize,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The run command takes its default level from the settings file
    let level = match &cli.command {
        Commands::Run { settings, .. } if settings.exists() => Settings::from_file(settings)
            .map(|s| s.logging.log_level)
            .unwrap_or_else(|_| "info".to_string()),
        _ => "info".to_string(),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Init { output } => generate_settings(output),

        Commands::Genome {
            inputs,
            hidden,
            seed,
            output,
        } => generate_genome(inputs, hidden, seed, output),

        Commands::Run {
            settings,
            genome,
            steps,
            input,
            output,
            quiet,
        } => run_network(settings, genome, steps, input, output, quiet),

        Commands::Resume {
            checkpoint,
            steps,
            input,
            output,
        } => resume_network(checkpoint, steps, input, output),

        Commands::Benchmark {
            steps,
            inputs,
            hidden,
        } => run_benchmark(steps, inputs, hidden),

        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),
    }
}

fn generate_settings(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    Settings::default().save(&output)?;
    println!("Settings saved to: {:?}", output);
    Ok(())
}

fn generate_genome(
    inputs: usize,
    hidden: usize,
    seed: Option<u64>,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let genome = match seed {
        Some(s) => CtrnnConfiguration::with_seed(inputs, hidden, s),
        None => CtrnnConfiguration::random(inputs, hidden, &mut rand::thread_rng()),
    };
    genome.save(&output)?;
    println!(
        "Genome saved to: {:?} ({} input, {} hidden, {} genes)",
        output,
        inputs,
        hidden,
        genome.num_genes()
    );
    Ok(())
}

/// Input vector for a network: the given values, or zeros when none were given
fn input_vector(input: Vec<f64>, net: &Ctrnn) -> Vec<f64> {
    if input.is_empty() {
        vec![0.0; net.num_input_nodes()]
    } else {
        input
    }
}

fn run_network(
    settings_path: PathBuf,
    genome_path: PathBuf,
    steps: Option<u64>,
    input: Vec<f64>,
    output: PathBuf,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = if settings_path.exists() {
        log::info!("Loading settings from: {:?}", settings_path);
        Settings::from_file(&settings_path)?
    } else {
        log::info!("Using default settings");
        Settings::default()
    };
    let genome = CtrnnConfiguration::from_file(&genome_path)?;

    let mut net = Ctrnn::with_mapper(settings.mapping.clone());
    net.set_configuration(genome);
    net.initialise(settings.simulation.time_step)?;

    let steps = steps.unwrap_or(settings.simulation.steps);
    let values = input_vector(input, &net);

    println!("Starting network");
    println!(
        "  Nodes: {} input, {} hidden",
        net.num_input_nodes(),
        net.num_hidden_nodes()
    );
    println!("  Time step: {}", settings.simulation.time_step);
    println!("  Steps: {}", steps);
    println!();

    std::fs::create_dir_all(&output)?;
    let checkpoint_mgr = CheckpointManager::new(
        output.to_string_lossy().to_string(),
        settings.simulation.checkpoint_interval,
        10, // Keep last 10 checkpoints
    );

    let outcome = run_with_reports(
        &mut net,
        0,
        steps,
        &values,
        settings.simulation.report_interval,
        checkpoint_mgr,
        quiet,
    )?;

    finish(net, &outcome, &output)
}

fn resume_network(
    checkpoint_path: PathBuf,
    steps: u64,
    input: Vec<f64>,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading checkpoint: {:?}", checkpoint_path);

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let start_time = checkpoint.time;
    let mut net = checkpoint.network;
    let values = input_vector(input, &net);

    println!("Resumed at step {}", start_time);
    println!("Running {} additional steps", steps);
    println!();

    std::fs::create_dir_all(&output)?;
    let checkpoint_mgr = CheckpointManager::new(output.to_string_lossy().to_string(), 0, 10);

    let outcome = run_with_reports(&mut net, start_time, steps, &values, 100, checkpoint_mgr, false)?;
    finish(net, &outcome, &output)
}

/// Drive the network, printing reports and writing periodic checkpoints
fn run_with_reports(
    net: &mut Ctrnn,
    start_time: u64,
    steps: u64,
    values: &[f64],
    report_interval: u64,
    mut checkpoint_mgr: CheckpointManager,
    quiet: bool,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let outcome = drive(net, start_time, steps, values, |net, sample| {
        if !quiet && sample.time % report_interval == 0 {
            println!("{}", sample.summary());
        }

        if checkpoint_mgr.should_save(sample.time) {
            let checkpoint = Checkpoint::new(sample.time, net.clone());
            match checkpoint_mgr.save(&checkpoint) {
                Ok(path) => log::info!("Checkpoint saved: {}", path),
                Err(e) => log::error!("Checkpoint save failed: {}", e),
            }
        }
    })?;

    let elapsed = start.elapsed();
    println!();
    println!("=== Run Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {}", outcome.trace.len());
    println!(
        "Speed: {:.1} steps/s",
        outcome.trace.len() as f64 / elapsed.as_secs_f64()
    );

    Ok(outcome)
}

fn finish(net: Ctrnn, outcome: &RunOutcome, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(sample) = outcome.trace.last() {
        println!("Final outputs: {:?}", sample.outputs);
    }

    // A diverged network cannot be resumed
    if outcome.diverged {
        log::warn!(
            "Network diverged after step {}; no final checkpoint written",
            outcome.last_time
        );
    } else {
        let final_path = output.join("checkpoint_final.bin");
        Checkpoint::new(outcome.last_time, net).save(&final_path)?;
        println!("Final checkpoint: {:?}", final_path);
    }

    let trace_path = output.join("trace.json");
    outcome.trace.save(&trace_path.to_string_lossy())?;
    println!("Output trace: {:?}", trace_path);

    Ok(())
}

fn run_benchmark(steps: u64, inputs: usize, hidden: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== CTRNN Benchmark ===");
    println!("Steps: {}", steps);
    println!("Nodes: {} input, {} hidden", inputs, hidden);
    println!();

    let result = benchmark(steps, inputs, hidden)?;
    println!("{}", result);

    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let net = &checkpoint.network;

    println!("Step: {}", checkpoint.time);
    println!(
        "Nodes: {} input, {} hidden ({} total)",
        net.num_input_nodes(),
        net.num_hidden_nodes(),
        net.num_nodes()
    );
    match net.time_step() {
        Some(dt) => println!("Time step: {}", dt),
        None => println!("Time step: (not initialised)"),
    }
    println!("Outputs: {:?}", net.outputs());

    for (i, node) in net.hidden_nodes().iter().enumerate() {
        let p = node.parameters();
        println!(
            "  hidden {}: gain={:.3} bias={:+.3} tau={:.3} sine={:.3} freq={:.3}",
            i, p.gain, p.bias, p.time_constant, p.sine_coefficient, p.frequency_multiplier
        );
    }

    println!();
    println!(
        "Checkpoint size: {:.2} KB",
        checkpoint.size_bytes() as f64 / 1_000.0
    );

    Ok(())
}
