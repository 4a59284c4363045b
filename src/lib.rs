//! # ctrnn
//!
//! Continuous-time recurrent neural network engine for evolvable controllers.
//!
//! ## Features
//!
//! - **Leaky integrators**: explicit Euler integration of first-order neurons
//! - **Synchronous**: every node in a step reads the previous step's outputs
//! - **Genome mapping**: normalized genes mapped through configurable ranges
//! - **Oscillatory transfer**: `tanh` response plus a sine term
//! - **Reproducible**: seeded genomes, bit-identical checkpoints
//!
//! ## Quick Start
//!
//! ```rust
//! use ctrnn::{Ctrnn, CtrnnConfiguration};
//!
//! // Random genome with 2 input nodes and 3 hidden nodes
//! let genome = CtrnnConfiguration::with_seed(2, 3, 42);
//!
//! let mut net = Ctrnn::new();
//! net.set_configuration(genome);
//! net.initialise(0.1).unwrap();
//!
//! // One control cycle
//! net.feed_inputs(&[0.5, -0.5]).unwrap();
//! net.update();
//! assert_eq!(net.outputs().len(), 3);
//! ```
//!
//! ## Parameter ranges
//!
//! ```rust
//! use ctrnn::{Ctrnn, ParamRange, ParameterMapper};
//!
//! let mapper = ParameterMapper {
//!     weight: ParamRange::new(-16.0, 16.0),
//!     ..ParameterMapper::default()
//! };
//! let net = Ctrnn::with_mapper(mapper);
//! assert_eq!(net.mapper().map_weight(1.0), 16.0);
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use ctrnn::{Ctrnn, CtrnnConfiguration};
//! use ctrnn::checkpoint::Checkpoint;
//!
//! let mut net = Ctrnn::new();
//! net.set_configuration(CtrnnConfiguration::with_seed(2, 2, 7));
//! net.initialise(0.1).unwrap();
//!
//! Checkpoint::new(0, net).save("checkpoint.bin").unwrap();
//! let restored = Checkpoint::load("checkpoint.bin").unwrap().network;
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod genome;
pub mod neural;
pub mod trace;

// Re-export main types
pub use config::Settings;
pub use error::{CtrnnError, Result};
pub use genome::{CtrnnConfiguration, NodeGenome};
pub use neural::{Ctrnn, LeakyIntegrator, NodeParameters, ParamRange, ParameterMapper};
pub use trace::{OutputTrace, Sample};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of [`drive`]
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Outputs of every finite step
    pub trace: OutputTrace,
    /// Last step whose outputs were all finite
    pub last_time: u64,
    /// The run stopped early on a NaN or infinite output
    pub diverged: bool,
}

/// Step `net` with a constant input, numbering steps from `start_time + 1`.
///
/// `on_step` is called after every step that leaves all outputs finite. The
/// first step that does not stops the run and is not recorded.
pub fn drive<F>(
    net: &mut Ctrnn,
    start_time: u64,
    steps: u64,
    values: &[f64],
    mut on_step: F,
) -> Result<RunOutcome>
where
    F: FnMut(&Ctrnn, &Sample),
{
    let mut trace = OutputTrace::new();
    let mut last_time = start_time;
    let mut diverged = false;

    for time in start_time + 1..=start_time + steps {
        let outputs = net.step(values)?;
        if !net.is_valid() {
            log::error!("Network diverged at step {}", time);
            diverged = true;
            break;
        }

        trace.record(time, outputs);
        last_time = time;
        if let Some(sample) = trace.last() {
            on_step(net, sample);
        }
    }

    Ok(RunOutcome {
        trace,
        last_time,
        diverged,
    })
}

/// Time `steps` updates of a random network
pub fn benchmark(steps: u64, inputs: usize, hidden: usize) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let mut net = Ctrnn::new();
    net.set_configuration(CtrnnConfiguration::with_seed(inputs, hidden, 42));
    net.initialise(0.1)?;
    let values = vec![0.5; inputs];

    let start = Instant::now();
    for _ in 0..steps {
        net.feed_inputs(&values)?;
        net.update();
    }
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps,
        input_nodes: inputs,
        hidden_nodes: hidden,
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
        final_outputs: net.outputs(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub input_nodes: usize,
    pub hidden_nodes: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub final_outputs: Vec<f64>,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Nodes: {} input, {} hidden", self.input_nodes, self.hidden_nodes)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(100, 3, 5).unwrap();

        assert_eq!(result.steps, 100);
        assert_eq!(result.final_outputs.len(), 5);
        assert!(result.steps_per_second > 0.0);
    }

    #[test]
    fn test_drive_records_every_step() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(2, 3, 11));
        net.initialise(0.1).unwrap();

        let mut seen = Vec::new();
        let outcome =
            drive(&mut net, 40, 25, &[0.2, -0.4], |_, sample| seen.push(sample.time)).unwrap();

        assert!(!outcome.diverged);
        assert_eq!(outcome.last_time, 65);
        assert_eq!(outcome.trace.len(), 25);
        assert_eq!(seen, (41..=65).collect::<Vec<u64>>());
        assert_eq!(outcome.trace.last().map(|s| s.outputs.clone()), Some(net.outputs()));
    }

    #[test]
    fn test_drive_stops_at_divergence() {
        // Time constant 0.1 with dt = 10: each step overshoots by a factor of 99
        let node = |weights: Vec<f64>| NodeGenome {
            weights,
            gain: 0.5,
            bias: 1.0,
            time_constant: 0.0,
            sine_coefficient: 0.0,
            frequency_multiplier: 0.5,
        };
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration {
            i_ns: 1,
            h_ns: 1,
            input_nodes: vec![node(vec![1.0])],
            hidden_nodes: vec![node(vec![1.0, 1.0])],
        });
        net.initialise(10.0).unwrap();

        let mut calls = 0;
        let outcome = drive(&mut net, 0, 1000, &[1.0], |net, _| {
            assert!(net.is_valid());
            calls += 1;
        })
        .unwrap();

        assert!(outcome.diverged);
        assert!(outcome.last_time < 1000);
        assert_eq!(outcome.trace.len() as u64, outcome.last_time);
        assert_eq!(calls, outcome.trace.len());
        assert!(outcome
            .trace
            .samples
            .iter()
            .all(|s| s.outputs.iter().all(|y| y.is_finite())));
        assert!(!net.is_valid());
    }
}
