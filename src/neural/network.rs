//! Fully recurrent CTRNN built from a genome.
//!
//! Input nodes each read one external value. Hidden nodes read the outputs of
//! every input node followed by every hidden node, themselves included. The
//! hidden nodes are also the outputs of the network.

use super::integrator::{check_time_step, LeakyIntegrator};
use super::mapping::ParameterMapper;
use crate::error::{CtrnnError, Result};
use crate::genome::CtrnnConfiguration;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ctrnn {
    input_nodes: Vec<LeakyIntegrator>,
    hidden_nodes: Vec<LeakyIntegrator>,
    num_input_nodes: usize,
    num_hidden_nodes: usize,
    num_output_nodes: usize,
    num_nodes: usize,
    /// Last configuration set; survives `reset(true)`
    configuration: Option<CtrnnConfiguration>,
    mapper: ParameterMapper,
    time_step: Option<f64>,
    initialised: bool,
    /// Committed outputs of all nodes at the start of the current update
    #[serde(skip)]
    previous: Vec<f64>,
}

impl Ctrnn {
    /// Empty network using the default parameter ranges
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty network mapping genomes through `mapper`
    pub fn with_mapper(mapper: ParameterMapper) -> Self {
        Self {
            mapper,
            ..Self::default()
        }
    }

    pub fn set_configuration(&mut self, configuration: CtrnnConfiguration) {
        self.configuration = Some(configuration);
    }

    pub fn configuration(&self) -> Option<&CtrnnConfiguration> {
        self.configuration.as_ref()
    }

    /// Build all nodes from the current configuration.
    ///
    /// Existing nodes are dropped first. If the configuration is missing or
    /// cannot produce valid nodes the network is left empty.
    pub fn initialise(&mut self, time_step: f64) -> Result<()> {
        self.reset(true);

        let config = self
            .configuration
            .as_ref()
            .ok_or(CtrnnError::ConfigurationMissing)?;

        check_time_step(time_step)?;
        self.mapper.validate()?;
        config.validate()?;

        let num_nodes = config.num_nodes();
        let input_nodes = build_nodes(&self.mapper, &config.input_nodes, 1, time_step)?;
        let hidden_nodes = build_nodes(&self.mapper, &config.hidden_nodes, num_nodes, time_step)?;

        self.num_input_nodes = config.i_ns;
        self.num_hidden_nodes = config.h_ns;
        self.num_output_nodes = config.h_ns;
        self.num_nodes = num_nodes;
        self.input_nodes = input_nodes;
        self.hidden_nodes = hidden_nodes;
        self.previous = Vec::with_capacity(num_nodes);
        self.time_step = Some(time_step);
        self.initialised = true;

        log::debug!(
            "CTRNN initialised: {} input nodes, {} hidden nodes, dt={}",
            self.num_input_nodes,
            self.num_hidden_nodes,
            time_step
        );
        Ok(())
    }

    /// Set the external input of every input node.
    ///
    /// Entries beyond the number of input nodes are ignored. Nothing is
    /// written unless every required entry is present and finite.
    pub fn feed_inputs(&mut self, values: &[f64]) -> Result<()> {
        if values.len() < self.num_input_nodes {
            return Err(CtrnnError::TooFewInputs {
                expected: self.num_input_nodes,
                actual: values.len(),
            });
        }
        if let Some((index, &value)) = values[..self.num_input_nodes]
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(CtrnnError::InvalidInput { index, value });
        }

        for (node, &value) in self.input_nodes.iter_mut().zip(values) {
            node.set_input(0, value)?;
        }
        Ok(())
    }

    /// Advance every node by one time step.
    ///
    /// All candidates are computed from the outputs committed at the end of
    /// the previous step before any node commits.
    pub fn update(&mut self) {
        for node in &mut self.input_nodes {
            node.compute_candidate();
        }

        self.previous.clear();
        self.previous
            .extend(self.input_nodes.iter().map(LeakyIntegrator::output));
        self.previous
            .extend(self.hidden_nodes.iter().map(LeakyIntegrator::output));

        for node in &mut self.hidden_nodes {
            node.load_inputs(&self.previous);
            node.compute_candidate();
        }

        for node in self.input_nodes.iter_mut().chain(&mut self.hidden_nodes) {
            node.commit();
        }

        log::trace!("CTRNN step: outputs={:?}", self.outputs());
    }

    /// Feed `values`, advance one step and return the new outputs
    pub fn step(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        self.feed_inputs(values)?;
        self.update();
        Ok(self.outputs())
    }

    /// Committed output of each output (hidden) node, in order
    pub fn outputs(&self) -> Vec<f64> {
        self.hidden_nodes[..self.num_output_nodes]
            .iter()
            .map(LeakyIntegrator::output)
            .collect()
    }

    /// Drop all nodes (`clear_all`), or only zero their dynamical state
    pub fn reset(&mut self, clear_all: bool) {
        if clear_all {
            self.input_nodes.clear();
            self.hidden_nodes.clear();
            self.previous.clear();
            self.num_input_nodes = 0;
            self.num_hidden_nodes = 0;
            self.num_output_nodes = 0;
            self.num_nodes = 0;
            self.time_step = None;
            self.initialised = false;
            log::debug!("CTRNN cleared");
        } else {
            for node in self.input_nodes.iter_mut().chain(&mut self.hidden_nodes) {
                node.reset_state();
            }
            log::debug!("CTRNN state reset");
        }
    }

    /// Use a new integration step on every node; outputs are kept
    pub fn change_timestep(&mut self, time_step: f64) -> Result<()> {
        check_time_step(time_step)?;
        for node in self.input_nodes.iter_mut().chain(&mut self.hidden_nodes) {
            node.set_time_step(time_step)?;
        }
        self.time_step = Some(time_step);
        log::debug!("CTRNN time step changed to {}", time_step);
        Ok(())
    }

    /// Last `initialise` succeeded and no `reset(true)` followed
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn num_input_nodes(&self) -> usize {
        self.num_input_nodes
    }

    pub fn num_hidden_nodes(&self) -> usize {
        self.num_hidden_nodes
    }

    pub fn num_output_nodes(&self) -> usize {
        self.num_output_nodes
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn input_nodes(&self) -> &[LeakyIntegrator] {
        &self.input_nodes
    }

    pub fn hidden_nodes(&self) -> &[LeakyIntegrator] {
        &self.hidden_nodes
    }

    pub fn mapper(&self) -> &ParameterMapper {
        &self.mapper
    }

    /// Time step given to the last `initialise` or `change_timestep`;
    /// `None` once the network is cleared
    pub fn time_step(&self) -> Option<f64> {
        self.time_step
    }

    /// No node carries a NaN or infinite output
    pub fn is_valid(&self) -> bool {
        self.input_nodes
            .iter()
            .chain(&self.hidden_nodes)
            .all(|n| n.output().is_finite())
    }
}

fn build_nodes(
    mapper: &ParameterMapper,
    records: &[crate::genome::NodeGenome],
    num_inputs: usize,
    time_step: f64,
) -> Result<Vec<LeakyIntegrator>> {
    records
        .iter()
        .map(|record| {
            let weights = mapper.map_weights(record, num_inputs);
            LeakyIntegrator::new(weights, mapper.map_parameters(record), time_step)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::NodeGenome;
    use crate::neural::mapping::ParamRange;

    /// Ranges under which the genes used below map to round numbers:
    /// weight 0.5 -> 0, 1.0 -> 1; gain 0.5 -> 1; bias 0.5 -> 0;
    /// time constant 0.5 -> 1; sine coefficient 0 -> 0.
    fn exact_mapper() -> ParameterMapper {
        ParameterMapper {
            weight: ParamRange::new(-1.0, 1.0),
            gain: ParamRange::new(0.0, 2.0),
            bias: ParamRange::new(-1.0, 1.0),
            time_constant: ParamRange::new(0.5, 1.5),
            sine_coefficient: ParamRange::new(0.0, 1.0),
            frequency_multiplier: ParamRange::new(1.0, 3.0),
        }
    }

    fn node(weights: Vec<f64>) -> NodeGenome {
        NodeGenome {
            weights,
            gain: 0.5,
            bias: 0.5,
            time_constant: 0.5,
            sine_coefficient: 0.0,
            frequency_multiplier: 0.0,
        }
    }

    /// Two inputs feeding one hidden node with weights [1, 1] and no self-loop
    fn worked_example() -> CtrnnConfiguration {
        CtrnnConfiguration {
            i_ns: 2,
            h_ns: 1,
            input_nodes: vec![node(vec![1.0]), node(vec![1.0])],
            hidden_nodes: vec![node(vec![1.0, 1.0, 0.5])],
        }
    }

    #[test]
    fn test_initialise_requires_configuration() {
        let mut net = Ctrnn::new();
        assert_eq!(net.initialise(0.1), Err(CtrnnError::ConfigurationMissing));
        assert!(!net.is_initialised());
        assert!(net.outputs().is_empty());
    }

    #[test]
    fn test_initialise_shape() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(3, 4, 9));
        net.initialise(0.1).unwrap();

        assert_eq!(net.num_input_nodes(), 3);
        assert_eq!(net.num_hidden_nodes(), 4);
        assert_eq!(net.num_output_nodes(), 4);
        assert_eq!(net.num_nodes(), 7);
        assert!(net.input_nodes().iter().all(|n| n.num_inputs() == 1));
        assert!(net.hidden_nodes().iter().all(|n| n.num_inputs() == 7));
        assert!(net.hidden_nodes().iter().all(|n| n.time_step() == 0.1));
        assert_eq!(net.outputs(), vec![0.0; 4]);
    }

    #[test]
    fn test_mapped_parameters_applied() {
        let mut net = Ctrnn::with_mapper(exact_mapper());
        net.set_configuration(worked_example());
        net.initialise(1.0).unwrap();

        let hidden = &net.hidden_nodes()[0];
        assert_eq!(hidden.weights(), &[1.0, 1.0, 0.0]);
        assert_eq!(hidden.parameters().gain, 1.0);
        assert_eq!(hidden.parameters().bias, 0.0);
        assert_eq!(hidden.parameters().time_constant, 1.0);
        assert_eq!(hidden.parameters().sine_coefficient, 0.0);
        assert_eq!(net.input_nodes()[0].weights(), &[1.0]);
    }

    #[test]
    fn test_worked_example_trace() {
        let mut net = Ctrnn::with_mapper(exact_mapper());
        net.set_configuration(worked_example());
        net.initialise(1.0).unwrap();

        // The hidden node only sees input activity one step later
        let first = net.step(&[1.0, 0.0]).unwrap();
        assert_eq!(first, vec![0.0]);
        assert!((net.input_nodes()[0].output() - 0.7615941559557649).abs() < 1e-12);

        let second = net.step(&[0.0, 0.0]).unwrap();
        assert!((second[0] - 0.6420149920119997).abs() < 1e-12);
        assert_eq!(net.input_nodes()[0].output(), 0.0);
    }

    #[test]
    fn test_self_loop_reads_previous_step() {
        // One hidden node, self weight 1, bias 1 (gene 1.0), tau = dt
        let config = CtrnnConfiguration {
            i_ns: 0,
            h_ns: 1,
            input_nodes: vec![],
            hidden_nodes: vec![NodeGenome {
                bias: 1.0,
                ..node(vec![1.0])
            }],
        };
        let mut net = Ctrnn::with_mapper(exact_mapper());
        net.set_configuration(config);
        net.initialise(1.0).unwrap();

        net.update();
        let y1 = net.outputs()[0];
        assert!((y1 - 1.0f64.tanh()).abs() < 1e-12);

        net.update();
        let y2 = net.outputs()[0];
        assert!((y2 - (y1 + 1.0).tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_feed_inputs_validation_is_atomic() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(3, 2, 1));
        net.initialise(0.1).unwrap();
        net.feed_inputs(&[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(
            net.feed_inputs(&[4.0, 5.0]),
            Err(CtrnnError::TooFewInputs {
                expected: 3,
                actual: 2
            })
        );
        let err = net.feed_inputs(&[4.0, 5.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, CtrnnError::InvalidInput { index: 2, .. }));

        let inputs: Vec<f64> = net.input_nodes().iter().map(|n| n.inputs()[0]).collect();
        assert_eq!(inputs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_feed_inputs_ignores_excess() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(2, 2, 1));
        net.initialise(0.1).unwrap();
        net.feed_inputs(&[1.0, 2.0, f64::NAN, 9.0]).unwrap();
        assert_eq!(net.input_nodes()[1].inputs(), &[2.0]);
    }

    #[test]
    fn test_reset_state_only() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(2, 3, 4));
        net.initialise(0.1).unwrap();
        for _ in 0..10 {
            net.step(&[0.5, -0.5]).unwrap();
        }
        let weights = net.hidden_nodes()[0].weights().to_vec();

        net.reset(false);
        assert_eq!(net.num_hidden_nodes(), 3);
        assert_eq!(net.outputs(), vec![0.0; 3]);
        assert_eq!(net.hidden_nodes()[0].weights(), weights.as_slice());
    }

    #[test]
    fn test_reset_clear_all_keeps_configuration() {
        let config = CtrnnConfiguration::with_seed(2, 3, 4);
        let mut net = Ctrnn::new();
        net.set_configuration(config.clone());
        net.initialise(0.1).unwrap();

        net.reset(true);
        assert!(!net.is_initialised());
        assert_eq!(net.time_step(), None);
        assert!(net.hidden_nodes().is_empty());
        assert!(net.outputs().is_empty());
        assert_eq!(net.configuration(), Some(&config));

        net.initialise(0.1).unwrap();
        assert_eq!(net.num_nodes(), 5);
    }

    #[test]
    fn test_initialise_rejects_bad_weights_and_leaves_network_empty() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(2, 2, 3));
        net.initialise(0.1).unwrap();

        let mut config = CtrnnConfiguration::with_seed(2, 2, 3);
        config.hidden_nodes[0].weights.truncate(3);
        net.set_configuration(config);

        assert!(matches!(
            net.initialise(0.1),
            Err(CtrnnError::WeightCountMismatch { expected: 4, actual: 3, .. })
        ));
        assert!(!net.is_initialised());
        assert_eq!(net.num_nodes(), 0);
        assert_eq!(net.time_step(), None);
    }

    #[test]
    fn test_empty_configuration_initialises() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration {
            i_ns: 0,
            h_ns: 0,
            input_nodes: vec![],
            hidden_nodes: vec![],
        });
        net.initialise(0.1).unwrap();

        assert!(net.is_initialised());
        assert_eq!(net.num_nodes(), 0);
        assert_eq!(net.time_step(), Some(0.1));
        assert!(net.step(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_initialise_rejects_zero_time_constant_range() {
        let mapper = ParameterMapper {
            time_constant: ParamRange::new(0.0, 1.0),
            ..ParameterMapper::default()
        };
        let mut net = Ctrnn::with_mapper(mapper);
        net.set_configuration(CtrnnConfiguration::with_seed(1, 1, 3));
        assert!(matches!(
            net.initialise(0.1),
            Err(CtrnnError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_change_timestep() {
        let mut net = Ctrnn::new();
        net.set_configuration(CtrnnConfiguration::with_seed(2, 2, 8));
        net.initialise(0.1).unwrap();
        net.step(&[1.0, 1.0]).unwrap();
        let before = net.outputs();

        net.change_timestep(0.05).unwrap();
        assert_eq!(net.outputs(), before);
        assert_eq!(net.time_step(), Some(0.05));
        assert!(net
            .input_nodes()
            .iter()
            .chain(net.hidden_nodes())
            .all(|n| n.time_step() == 0.05));

        assert!(net.change_timestep(-1.0).is_err());
        assert_eq!(net.time_step(), Some(0.05));
    }
}
