//! Network genome: the normalized configuration a CTRNN is built from.
//!
//! Field names on disk follow the established genome layout (`iNs`, `hNs`,
//! `inputNodes`, `hiddenNodes`, `w`, `t`, `sineCoefficient`,
//! `frequencyMultiplier`), so genomes exchanged with other tools load as-is.
//! Files ending in `.yaml`/`.yml` are read as YAML, everything else as JSON.

use crate::error::{CtrnnError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Genes of one node, each normalized to `[0, 1]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGenome {
    /// One weight per input slot
    #[serde(rename = "w")]
    pub weights: Vec<f64>,
    pub gain: f64,
    pub bias: f64,
    #[serde(rename = "t")]
    pub time_constant: f64,
    pub sine_coefficient: f64,
    pub frequency_multiplier: f64,
}

impl NodeGenome {
    /// Node record with `num_weights` uniform random genes
    pub fn random<R: Rng + ?Sized>(num_weights: usize, rng: &mut R) -> Self {
        Self {
            weights: (0..num_weights).map(|_| rng.gen::<f64>()).collect(),
            gain: rng.gen(),
            bias: rng.gen(),
            time_constant: rng.gen(),
            sine_coefficient: rng.gen(),
            frequency_multiplier: rng.gen(),
        }
    }

    fn genes(&self) -> impl Iterator<Item = f64> + '_ {
        self.weights.iter().copied().chain([
            self.gain,
            self.bias,
            self.time_constant,
            self.sine_coefficient,
            self.frequency_multiplier,
        ])
    }
}

/// Complete network genome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtrnnConfiguration {
    /// Number of input nodes
    #[serde(rename = "iNs")]
    pub i_ns: usize,
    /// Number of hidden nodes; every hidden node is also an output
    #[serde(rename = "hNs")]
    pub h_ns: usize,
    pub input_nodes: Vec<NodeGenome>,
    pub hidden_nodes: Vec<NodeGenome>,
}

impl CtrnnConfiguration {
    /// Random genome drawn from `rng`
    pub fn random<R: Rng + ?Sized>(i_ns: usize, h_ns: usize, rng: &mut R) -> Self {
        let input_nodes = (0..i_ns).map(|_| NodeGenome::random(1, &mut *rng)).collect();
        let hidden_nodes = (0..h_ns)
            .map(|_| NodeGenome::random(i_ns + h_ns, &mut *rng))
            .collect();

        Self {
            i_ns,
            h_ns,
            input_nodes,
            hidden_nodes,
        }
    }

    /// Random genome from a fixed seed; the same seed always yields the same genome
    pub fn with_seed(i_ns: usize, h_ns: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::random(i_ns, h_ns, &mut rng)
    }

    /// Total number of input and hidden nodes
    pub fn num_nodes(&self) -> usize {
        self.i_ns + self.h_ns
    }

    /// Total number of genes across all node records
    pub fn num_genes(&self) -> usize {
        self.input_nodes
            .iter()
            .chain(&self.hidden_nodes)
            .map(|n| n.weights.len() + 5)
            .sum()
    }

    /// Check the record shape and that every gene is a finite number
    pub fn validate(&self) -> Result<()> {
        if self.input_nodes.len() != self.i_ns {
            return Err(CtrnnError::InvalidParameter(format!(
                "iNs is {} but {} input node records were supplied",
                self.i_ns,
                self.input_nodes.len()
            )));
        }
        if self.hidden_nodes.len() != self.h_ns {
            return Err(CtrnnError::InvalidParameter(format!(
                "hNs is {} but {} hidden node records were supplied",
                self.h_ns,
                self.hidden_nodes.len()
            )));
        }

        for (i, node) in self.input_nodes.iter().enumerate() {
            if node.weights.is_empty() {
                return Err(CtrnnError::WeightCountMismatch {
                    node: format!("input node {}", i),
                    expected: 1,
                    actual: 0,
                });
            }
            check_genes(node, "input", i)?;
        }

        let expected = self.num_nodes();
        for (i, node) in self.hidden_nodes.iter().enumerate() {
            if node.weights.len() != expected {
                return Err(CtrnnError::WeightCountMismatch {
                    node: format!("hidden node {}", i),
                    expected,
                    actual: node.weights.len(),
                });
            }
            check_genes(node, "hidden", i)?;
        }

        Ok(())
    }

    /// Load a genome from a JSON or YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: CtrnnConfiguration = if is_yaml(path) {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save the genome as JSON or YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let contents = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn check_genes(node: &NodeGenome, kind: &str, index: usize) -> Result<()> {
    if node.genes().any(|g| !g.is_finite()) {
        return Err(CtrnnError::InvalidParameter(format!(
            "{} node {} has a non-finite gene",
            kind, index
        )));
    }
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
