//! Neural core of the CTRNN.
//!
//! - `mapping`: genome-to-parameter ranges and the transfer function
//! - `integrator`: the leaky-integrator neuron
//! - `network`: the fully recurrent network and its two-phase update

pub mod integrator;
pub mod mapping;
pub mod network;

pub use integrator::LeakyIntegrator;
pub use mapping::{tanh_sine, NodeParameters, ParamRange, ParameterMapper};
pub use network::Ctrnn;
