//! Leaky-integrator neuron with a two-phase candidate/commit update.
//!
//! ```text
//! x          = Σ inputs[i] × weights[i] + bias
//! target     = tanh(gain × x) + sine_coefficient × sin(frequency_multiplier × x)
//! candidate  = output + (time_step / time_constant) × (target − output)
//! ```
//!
//! `compute_candidate` only writes the candidate; `commit` is the single place
//! the visible `output` changes. A network calls `compute_candidate` on every
//! node before committing any of them, so all nodes in a step read the same
//! previous outputs.

use super::mapping::{tanh_sine, NodeParameters};
use crate::error::{CtrnnError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeakyIntegrator {
    inputs: Vec<f64>,
    weights: Vec<f64>,
    params: NodeParameters,
    time_step: f64,
    /// Last committed output
    output: f64,
    /// Output computed from the current inputs, not yet committed
    temp_output: f64,
}

impl LeakyIntegrator {
    /// Create a node with one input slot per weight.
    ///
    /// Fails if a weight or parameter is not finite, or if the time constant
    /// or time step is not strictly positive.
    pub fn new(weights: Vec<f64>, params: NodeParameters, time_step: f64) -> Result<Self> {
        params.validate()?;
        check_time_step(time_step)?;
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(CtrnnError::InvalidParameter(format!(
                "weight is not finite ({})",
                w
            )));
        }

        Ok(Self {
            inputs: vec![0.0; weights.len()],
            weights,
            params,
            time_step,
            output: 0.0,
            temp_output: 0.0,
        })
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Store `value` in input slot `index`
    pub fn set_input(&mut self, index: usize, value: f64) -> Result<()> {
        match self.inputs.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CtrnnError::InvalidInput { index, value }),
        }
    }

    /// Overwrite every input slot from `values`, which must have `num_inputs` entries
    #[inline]
    pub(crate) fn load_inputs(&mut self, values: &[f64]) {
        self.inputs.copy_from_slice(values);
    }

    /// Biased weighted input sum
    #[inline]
    pub fn net_input(&self) -> f64 {
        self.inputs
            .iter()
            .zip(&self.weights)
            .map(|(i, w)| i * w)
            .sum::<f64>()
            + self.params.bias
    }

    /// Integrate one Euler step from the committed output into the candidate
    #[inline]
    pub fn compute_candidate(&mut self) {
        let target = tanh_sine(self.net_input(), &self.params);
        self.temp_output =
            self.output + (self.time_step / self.params.time_constant) * (target - self.output);
    }

    /// Make the candidate the visible output
    #[inline]
    pub fn commit(&mut self) {
        self.output = self.temp_output;
    }

    /// Zero the dynamical state; weights and parameters are kept
    pub fn reset_state(&mut self) {
        self.output = 0.0;
        self.temp_output = 0.0;
    }

    /// Change the integration step without touching the current output
    pub fn set_time_step(&mut self, time_step: f64) -> Result<()> {
        check_time_step(time_step)?;
        self.time_step = time_step;
        Ok(())
    }

    #[inline]
    pub fn output(&self) -> f64 {
        self.output
    }

    #[inline]
    pub fn candidate(&self) -> f64 {
        self.temp_output
    }

    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn parameters(&self) -> &NodeParameters {
        &self.params
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }
}

pub(crate) fn check_time_step(time_step: f64) -> Result<()> {
    if !time_step.is_finite() || time_step <= 0.0 {
        return Err(CtrnnError::InvalidParameter(format!(
            "time step must be a positive finite number, got {}",
            time_step
        )));
    }
    Ok(())
}
