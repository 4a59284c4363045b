//! Genome-to-parameter mapping and the node transfer function.
//!
//! Genes are normalized to `[0, 1]`. Each parameter kind has its own
//! [`ParamRange`]; a gene is clamped and then linearly interpolated into it.
//! The ranges are data, not constants baked into the node, so a different
//! genome encoding only needs a different [`ParameterMapper`].

use crate::error::{CtrnnError, Result};
use crate::genome::NodeGenome;
use serde::{Deserialize, Serialize};

/// Closed target interval for one parameter kind
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Map a normalized gene into the range
    #[inline]
    pub fn map(&self, gene: f64) -> f64 {
        self.min + (self.max - self.min) * gene.clamp(0.0, 1.0)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(CtrnnError::InvalidParameter(format!(
                "{} range [{}, {}] is not a finite ordered interval",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Mapped dynamical parameters of a single node
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeParameters {
    pub gain: f64,
    pub bias: f64,
    pub time_constant: f64,
    pub sine_coefficient: f64,
    pub frequency_multiplier: f64,
}

impl Default for NodeParameters {
    /// Unit gain, no bias, unit time constant, no oscillation
    fn default() -> Self {
        Self {
            gain: 1.0,
            bias: 0.0,
            time_constant: 1.0,
            sine_coefficient: 0.0,
            frequency_multiplier: 1.0,
        }
    }
}

impl NodeParameters {
    /// All values finite and the time constant strictly positive
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("gain", self.gain),
            ("bias", self.bias),
            ("time constant", self.time_constant),
            ("sine coefficient", self.sine_coefficient),
            ("frequency multiplier", self.frequency_multiplier),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(CtrnnError::InvalidParameter(format!(
                    "{} is not finite ({})",
                    name, value
                )));
            }
        }
        if self.time_constant <= 0.0 {
            return Err(CtrnnError::InvalidParameter(format!(
                "time constant must be > 0, got {}",
                self.time_constant
            )));
        }
        Ok(())
    }
}

/// Ranges used to turn a normalized genome into concrete node parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterMapper {
    pub weight: ParamRange,
    pub gain: ParamRange,
    pub bias: ParamRange,
    /// Must stay strictly positive
    pub time_constant: ParamRange,
    pub sine_coefficient: ParamRange,
    pub frequency_multiplier: ParamRange,
}

impl Default for ParameterMapper {
    fn default() -> Self {
        Self {
            weight: ParamRange::new(-5.0, 5.0),
            gain: ParamRange::new(0.1, 5.0),
            bias: ParamRange::new(-3.0, 3.0),
            time_constant: ParamRange::new(0.1, 5.0),
            sine_coefficient: ParamRange::new(0.0, 1.0),
            frequency_multiplier: ParamRange::new(0.1, 5.0),
        }
    }
}

impl ParameterMapper {
    #[inline]
    pub fn map_weight(&self, gene: f64) -> f64 {
        self.weight.map(gene)
    }

    #[inline]
    pub fn map_gain(&self, gene: f64) -> f64 {
        self.gain.map(gene)
    }

    #[inline]
    pub fn map_bias(&self, gene: f64) -> f64 {
        self.bias.map(gene)
    }

    #[inline]
    pub fn map_time_constant(&self, gene: f64) -> f64 {
        self.time_constant.map(gene)
    }

    #[inline]
    pub fn map_sine_coefficient(&self, gene: f64) -> f64 {
        self.sine_coefficient.map(gene)
    }

    #[inline]
    pub fn map_frequency_multiplier(&self, gene: f64) -> f64 {
        self.frequency_multiplier.map(gene)
    }

    /// Map the scalar genes of a node record
    pub fn map_parameters(&self, genome: &NodeGenome) -> NodeParameters {
        NodeParameters {
            gain: self.map_gain(genome.gain),
            bias: self.map_bias(genome.bias),
            time_constant: self.map_time_constant(genome.time_constant),
            sine_coefficient: self.map_sine_coefficient(genome.sine_coefficient),
            frequency_multiplier: self.map_frequency_multiplier(genome.frequency_multiplier),
        }
    }

    /// Map the first `num_inputs` weight genes of a node record.
    ///
    /// The caller guarantees `genome.weights.len() >= num_inputs`.
    pub fn map_weights(&self, genome: &NodeGenome, num_inputs: usize) -> Vec<f64> {
        genome.weights[..num_inputs]
            .iter()
            .map(|&w| self.map_weight(w))
            .collect()
    }

    /// Check every range is usable; the time-constant range must exclude zero
    pub fn validate(&self) -> Result<()> {
        self.weight.check("weight")?;
        self.gain.check("gain")?;
        self.bias.check("bias")?;
        self.time_constant.check("time constant")?;
        self.sine_coefficient.check("sine coefficient")?;
        self.frequency_multiplier.check("frequency multiplier")?;
        if self.time_constant.min <= 0.0 {
            return Err(CtrnnError::InvalidParameter(format!(
                "time constant range must be strictly positive, min is {}",
                self.time_constant.min
            )));
        }
        Ok(())
    }

    /// Largest magnitude the transfer function can reach under these ranges
    pub fn activation_bound(&self) -> f64 {
        1.0 + self
            .sine_coefficient
            .min
            .abs()
            .max(self.sine_coefficient.max.abs())
    }
}

/// Transfer function: gain-scaled tanh plus a sine term.
///
/// `f(x) = tanh(gain * x) + sine_coefficient * sin(frequency_multiplier * x)`
///
/// `x` is the weighted input sum with bias already added.
#[inline]
pub fn tanh_sine(x: f64, params: &NodeParameters) -> f64 {
    (params.gain * x).tanh() + params.sine_coefficient * (params.frequency_multiplier * x).sin()
}
